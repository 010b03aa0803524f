// Integration tests for dashboard stats aggregation

use anyhow::Result;
use callcoach::dashboard::{DashboardStats, NO_DATA, NO_WEAK_POINTS};
use callcoach::model::Training;
use chrono::Utc;

fn training(client_id: i64, score: Option<u8>, points: Option<&[&str]>) -> Training {
    Training {
        id: 0,
        actor_id: 1,
        client_id,
        kind: "voice".to_string(),
        recorded_at: Utc::now(),
        transcript: serde_json::json!({}),
        summary: String::new(),
        score,
        improvement_points: points.map(|p| p.iter().map(|s| s.to_string()).collect()),
        feedback: None,
        recording_url: None,
    }
}

#[test]
fn test_empty_input_gives_defaults() {
    let stats = DashboardStats::from_trainings(&[]);
    assert_eq!(stats.average_score, 0.0);
    assert_eq!(stats.best_score, 0);
    assert_eq!(stats.weak_points, NO_DATA);
    assert_eq!(stats.total_clients, 0);
    assert_eq!(stats, DashboardStats::default());
}

#[test]
fn test_mean_best_and_clients() {
    let trainings = vec![
        training(1, Some(8), Some(&["closing", "pricing"])),
        training(2, Some(6), Some(&["pricing"])),
        training(1, None, None),
    ];

    let stats = DashboardStats::from_trainings(&trainings);
    assert!((stats.average_score - 14.0 / 3.0).abs() < 1e-9);
    assert_eq!(stats.best_score, 8);
    assert_eq!(stats.weak_points, "pricing");
    assert_eq!(stats.total_clients, 2);
}

#[test]
fn test_missing_scores_count_as_zero() {
    let stats = DashboardStats::from_trainings(&[training(1, None, None), training(1, None, None)]);
    assert_eq!(stats.average_score, 0.0);
    assert_eq!(stats.best_score, 0);
    assert_eq!(stats.total_clients, 1);
}

#[test]
fn test_weak_point_tie_goes_to_first_seen() {
    let trainings = vec![
        training(1, Some(5), Some(&["rapport", "discovery"])),
        training(2, Some(5), Some(&["discovery", "rapport"])),
    ];
    assert_eq!(DashboardStats::from_trainings(&trainings).weak_points, "rapport");
}

#[test]
fn test_no_points_anywhere() {
    let stats = DashboardStats::from_trainings(&[training(3, Some(9), None)]);
    assert_eq!(stats.weak_points, NO_WEAK_POINTS);
}

#[test]
fn test_wire_names_are_camel_case() -> Result<()> {
    let json = serde_json::to_value(DashboardStats::default())?;
    assert_eq!(
        json,
        serde_json::json!({
            "averageScore": 0.0,
            "bestScore": 0,
            "weakPoints": "No data",
            "totalClients": 0
        })
    );
    Ok(())
}
