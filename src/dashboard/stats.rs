use crate::model::Training;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Label used when the actor has no trainings yet
pub const NO_DATA: &str = "No data";

/// Label used when trainings exist but none lists improvement points
pub const NO_WEAK_POINTS: &str = "None";

/// Summary metrics shown at the top of the dashboard
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    /// Mean score, missing scores counted as 0
    pub average_score: f64,

    /// Highest score, missing scores counted as 0
    pub best_score: u8,

    /// Most frequent improvement point
    pub weak_points: String,

    /// Distinct clients with at least one training
    pub total_clients: usize,
}

impl Default for DashboardStats {
    fn default() -> Self {
        Self {
            average_score: 0.0,
            best_score: 0,
            weak_points: NO_DATA.to_string(),
            total_clients: 0,
        }
    }
}

impl DashboardStats {
    /// Derive stats from recent trainings (newest first). Never fails.
    pub fn from_trainings(trainings: &[Training]) -> Self {
        if trainings.is_empty() {
            return Self::default();
        }

        let scores: Vec<u8> = trainings.iter().map(|t| t.score.unwrap_or(0)).collect();
        let total: u32 = scores.iter().map(|&s| s as u32).sum();
        let average_score = total as f64 / scores.len() as f64;
        let best_score = scores.iter().copied().max().unwrap_or(0);

        let weak_points = most_frequent_point(trainings)
            .unwrap_or(NO_WEAK_POINTS)
            .to_string();

        let total_clients = trainings
            .iter()
            .map(|t| t.client_id)
            .collect::<HashSet<_>>()
            .len();

        Self {
            average_score,
            best_score,
            weak_points,
            total_clients,
        }
    }
}

/// Highest-count improvement point; ties go to the first one seen.
fn most_frequent_point(trainings: &[Training]) -> Option<&str> {
    let mut counts: Vec<(&str, usize)> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    let points = trainings
        .iter()
        .filter_map(|t| t.improvement_points.as_ref())
        .flatten();

    for point in points {
        match index.get(point.as_str()) {
            Some(&i) => counts[i].1 += 1,
            None => {
                index.insert(point.as_str(), counts.len());
                counts.push((point.as_str(), 1));
            }
        }
    }

    let mut best: Option<(&str, usize)> = None;
    for (point, count) in counts {
        if best.map_or(true, |(_, best_count)| count > best_count) {
            best = Some((point, count));
        }
    }

    best.map(|(point, _)| point)
}
