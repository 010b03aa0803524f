use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;

/// Status the analysis endpoint reports while it is still evaluating a call
pub const STATUS_PROCESSING: &str = "processing";

/// Post-call payload returned by `GET /conversations/{id}`
///
/// Only the fields the report needs are typed; everything else is kept in
/// `extra` so the full payload can be stored verbatim.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConversationData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analysis: Option<CallAnalysis>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<CallMetadata>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ConversationData {
    pub fn is_processing(&self) -> bool {
        self.status.as_deref() == Some(STATUS_PROCESSING)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CallAnalysis {
    /// "success", "failure" or "unknown"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub call_successful: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transcript_summary: Option<String>,

    #[serde(default, deserialize_with = "entries_or_empty")]
    pub evaluation_criteria_results: HashMap<String, CriterionResult>,

    #[serde(default, deserialize_with = "entries_or_empty")]
    pub data_collection_results: HashMap<String, CollectedValue>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Outcome of one evaluation criterion configured on the agent
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CriterionResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rationale: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One data-collection field extracted from the call
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CollectedValue {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl CollectedValue {
    /// The value as text; strings verbatim, numbers and booleans rendered.
    /// Empty strings count as absent.
    pub fn text(&self) -> Option<String> {
        match self.value.as_ref()? {
            Value::String(s) if s.is_empty() => None,
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CallMetadata {
    /// Whole seconds; fractional values are rounded, negative ones dropped
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient_secs"
    )]
    pub call_duration_secs: Option<u64>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A `null` map reads as empty, and `null` entries are skipped.
fn entries_or_empty<'de, D, T>(deserializer: D) -> Result<HashMap<String, T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    let entries = Option::<HashMap<String, Option<T>>>::deserialize(deserializer)?;
    Ok(entries
        .unwrap_or_default()
        .into_iter()
        .filter_map(|(key, value)| value.map(|v| (key, v)))
        .collect())
}

fn lenient_secs<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let secs = match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };

    Ok(secs
        .filter(|s| s.is_finite() && *s >= 0.0)
        .map(|s| s.round() as u64))
}
