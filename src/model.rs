//! Rows shared by the store, the dashboard and the training controller.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

pub type ActorId = i64;
pub type ClientId = i64;
pub type TrainingId = i64;

/// Type tag stored on every voice roleplay training.
pub const TRAINING_KIND_VOICE: &str = "voice";

/// How pressing the lead's need is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Urgency {
    Low,
    #[default]
    Medium,
    High,
}

impl Urgency {
    /// Accepts the English labels as well as the Portuguese ones the
    /// enrichment model answers with.
    pub fn parse_lenient(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "low" | "baixa" => Some(Urgency::Low),
            "medium" | "média" | "media" => Some(Urgency::Medium),
            "high" | "alta" => Some(Urgency::High),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Urgency::Low => "low",
            Urgency::Medium => "medium",
            Urgency::High => "high",
        }
    }
}

impl fmt::Display for Urgency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lead's prior exposure to AI tooling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AiExperience {
    None,
    #[default]
    Basic,
    Intermediate,
    Advanced,
}

impl AiExperience {
    pub fn parse_lenient(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "none" | "nenhuma" => Some(AiExperience::None),
            "basic" | "básica" | "basica" => Some(AiExperience::Basic),
            "intermediate" | "intermédia" | "intermedia" | "intermediária" => {
                Some(AiExperience::Intermediate)
            }
            "advanced" | "avançada" | "avancada" => Some(AiExperience::Advanced),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AiExperience::None => "none",
            AiExperience::Basic => "basic",
            AiExperience::Intermediate => "intermediate",
            AiExperience::Advanced => "advanced",
        }
    }
}

impl fmt::Display for AiExperience {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A prospect the sales actor trains against
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Client {
    pub id: ClientId,

    /// Contact person
    pub name: String,

    pub company: String,

    pub email: String,

    pub sector: String,

    pub team_size: u32,

    /// What the lead wants to achieve
    pub objective: String,

    /// Budget band, e.g. "10k-20k"
    pub budget_range: String,

    pub urgency: Urgency,

    pub ai_experience: AiExperience,

    /// Free-text sales preparation notes from enrichment
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub insights: Option<String>,

    pub created_at: DateTime<Utc>,
}

/// Client fields supplied on insert; the store assigns id and timestamp
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewClient {
    pub name: String,
    pub company: String,
    pub email: String,
    pub sector: String,
    pub team_size: u32,
    pub objective: String,
    pub budget_range: String,
    pub urgency: Urgency,
    pub ai_experience: AiExperience,
    #[serde(default)]
    pub insights: Option<String>,
}

/// The authenticated sales person
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Actor {
    pub id: ActorId,
    pub name: String,
    pub email: String,
}

impl Actor {
    /// Up to two uppercase initials, "U" when the name is blank.
    pub fn initials(&self) -> String {
        let initials: String = self
            .name
            .split_whitespace()
            .filter_map(|word| word.chars().next())
            .flat_map(|c| c.to_uppercase())
            .take(2)
            .collect();

        if initials.is_empty() {
            "U".to_string()
        } else {
            initials
        }
    }
}

/// One finished coaching call and its derived report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Training {
    pub id: TrainingId,
    pub actor_id: ActorId,
    pub client_id: ClientId,

    /// Type tag, "voice" for roleplay calls
    pub kind: String,

    pub recorded_at: DateTime<Utc>,

    /// Full analysis payload, or `{"messages": [...]}` when none was fetched
    pub transcript: serde_json::Value,

    pub summary: String,

    /// 0-10
    pub score: Option<u8>,

    pub improvement_points: Option<Vec<String>>,

    pub feedback: Option<String>,

    /// Audio retrieval endpoint for the call recording
    pub recording_url: Option<String>,
}

/// Training fields supplied on insert
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewTraining {
    pub actor_id: ActorId,
    pub client_id: ClientId,
    pub kind: String,
    pub recorded_at: DateTime<Utc>,
    pub transcript: serde_json::Value,
    pub summary: String,
    pub score: Option<u8>,
    pub improvement_points: Option<Vec<String>>,
    pub feedback: Option<String>,
    pub recording_url: Option<String>,
}
