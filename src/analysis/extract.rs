//! Turns the post-call analysis payload into a training report.
//!
//! The payload shape is not contractually guaranteed, so every field is
//! optional and each rule degrades to "absent" instead of failing.

use super::client::recording_url;
use super::messages::{CallAnalysis, ConversationData, CriterionResult};
use crate::error::Result;
use crate::model::{ActorId, Client, NewTraining, TRAINING_KIND_VOICE};
use crate::voice::TranscriptMessage;
use chrono::{DateTime, Utc};
use regex::Regex;
use serde_json::json;
use std::sync::OnceLock;

/// Evaluation criterion carrying the overall sales score
pub const SCORE_CRITERION: &str = "sales_effectiveness_score";
pub const COMMUNICATION_CRITERION: &str = "professional_communication";
pub const NEEDS_CRITERION: &str = "identified_client_needs";

pub const IMPROVEMENT_FIELD: &str = "improvement_areas";
pub const STRENGTHS_FIELD: &str = "positive_highlights";
pub const OBJECTIONS_FIELD: &str = "client_objections";
pub const NEXT_STEPS_FIELD: &str = "next_steps_suggested";

pub const MAX_SCORE: u8 = 10;

fn score_pattern() -> &'static Regex {
    static SCORE_RE: OnceLock<Regex> = OnceLock::new();
    SCORE_RE.get_or_init(|| {
        Regex::new(r"(?i)(\d+)/10|score[:\s]+(\d+)|(\d+)\s*out of 10")
            .expect("score regex must compile")
    })
}

/// Numeric score from a rationale: "7/10", "score: 7" or "7 out of 10".
pub fn score_from_rationale(rationale: &str) -> Option<u8> {
    let caps = score_pattern().captures(rationale)?;
    let digits = caps.get(1).or(caps.get(2)).or(caps.get(3))?.as_str();

    // Digit runs too long for u64 are certainly above the ceiling
    let value = digits.parse::<u64>().unwrap_or(u64::MAX);
    Some(value.min(MAX_SCORE as u64) as u8)
}

/// Coarse score for a categorical criterion result.
pub fn score_from_result(result: &str) -> Option<u8> {
    match result {
        "success" => Some(8),
        "unknown" => Some(5),
        "failure" => Some(3),
        _ => None,
    }
}

/// Score from the sales-effectiveness criterion; `None` when it is absent.
pub fn extract_score(analysis: Option<&CallAnalysis>) -> Option<u8> {
    let criterion = analysis?.evaluation_criteria_results.get(SCORE_CRITERION)?;

    criterion
        .rationale
        .as_deref()
        .and_then(score_from_rationale)
        .or_else(|| criterion.result.as_deref().and_then(score_from_result))
        .map(|score| score.min(MAX_SCORE))
}

/// Comma-delimited improvement areas, trimmed; `None` when absent.
pub fn extract_improvement_points(analysis: Option<&CallAnalysis>) -> Option<Vec<String>> {
    let raw = analysis?
        .data_collection_results
        .get(IMPROVEMENT_FIELD)?
        .text()?;

    Some(raw.split(',').map(|s| s.trim().to_string()).collect())
}

fn outcome_marker(result: &str) -> &'static str {
    match result {
        "success" => "✅",
        "failure" => "❌",
        _ => "⚠️",
    }
}

fn criterion_section(label: &str, criterion: &CriterionResult) -> String {
    let result = criterion.result.as_deref().unwrap_or("unknown");
    let mut section = format!(
        "{} {}: {}",
        outcome_marker(result),
        label,
        result.to_uppercase()
    );
    if let Some(rationale) = criterion.rationale.as_deref() {
        section.push('\n');
        section.push_str(rationale);
    }
    section
}

/// Human-readable feedback assembled from every evaluation section present.
pub fn build_feedback(data: Option<&ConversationData>) -> Option<String> {
    let data = data?;
    let mut sections: Vec<String> = Vec::new();

    if let Some(analysis) = data.analysis.as_ref() {
        if let Some(outcome) = analysis.call_successful.as_deref() {
            sections.push(format!(
                "{} Call Outcome: {}",
                outcome_marker(outcome),
                outcome.to_uppercase()
            ));
        }

        let criteria = &analysis.evaluation_criteria_results;
        if let Some(comm) = criteria.get(COMMUNICATION_CRITERION) {
            sections.push(criterion_section("Professional Communication", comm));
        }
        if let Some(needs) = criteria.get(NEEDS_CRITERION) {
            sections.push(criterion_section("Client Needs Identification", needs));
        }

        let collected = &analysis.data_collection_results;
        if let Some(strengths) = collected.get(STRENGTHS_FIELD).and_then(|v| v.text()) {
            sections.push(format!("✅ Strengths:\n{}", strengths));
        }
        if let Some(objections) = collected.get(OBJECTIONS_FIELD).and_then(|v| v.text()) {
            if objections != "None" {
                sections.push(format!("⚠️ Client Objections:\n{}", objections));
            }
        }
        if let Some(next) = collected.get(NEXT_STEPS_FIELD).and_then(|v| v.text()) {
            sections.push(format!("📋 Next Steps:\n{}", next));
        }
    }

    let duration = data
        .metadata
        .as_ref()
        .and_then(|m| m.call_duration_secs)
        .filter(|&secs| secs > 0);
    if let Some(secs) = duration {
        sections.push(format!("⏱️ Call Duration: {}m {}s", secs / 60, secs % 60));
    }

    if sections.is_empty() {
        None
    } else {
        Some(sections.join("\n\n"))
    }
}

pub fn build_summary(data: Option<&ConversationData>, client: &Client) -> String {
    data.and_then(|d| d.analysis.as_ref())
        .and_then(|a| a.transcript_summary.as_deref())
        .filter(|s| !s.trim().is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| {
            format!(
                "Training session with {} from {}",
                client.name, client.company
            )
        })
}

/// Everything needed to turn one finished call into a training row
pub struct CallReport<'a> {
    pub actor_id: ActorId,
    pub client: &'a Client,
    pub analysis: Option<&'a ConversationData>,
    pub transcript: &'a [TranscriptMessage],
    /// REST base the recording URL is built under
    pub api_base: &'a str,
    pub recorded_at: DateTime<Utc>,
}

impl CallReport<'_> {
    pub fn into_training(self) -> Result<NewTraining> {
        let analysis = self.analysis.and_then(|d| d.analysis.as_ref());

        let transcript = match self.analysis {
            Some(data) => serde_json::to_value(data)?,
            None => json!({ "messages": self.transcript }),
        };

        let recording_url = self
            .analysis
            .and_then(|d| d.conversation_id.as_deref())
            .map(|id| recording_url(self.api_base, id));

        Ok(NewTraining {
            actor_id: self.actor_id,
            client_id: self.client.id,
            kind: TRAINING_KIND_VOICE.to_string(),
            recorded_at: self.recorded_at,
            transcript,
            summary: build_summary(self.analysis, self.client),
            score: extract_score(analysis),
            improvement_points: extract_improvement_points(analysis),
            feedback: build_feedback(self.analysis),
            recording_url,
        })
    }
}
