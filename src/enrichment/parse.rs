use crate::error::{Error, Result};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Company attributes inferred by the research model
///
/// Field names follow the JSON the model is asked to produce. Every field
/// is optional; missing ones fall back to defaults when the lead is created.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompanyProfile {
    /// Primary contact, "Decision Maker" when unknown
    #[serde(rename = "nome", default, deserialize_with = "lenient_text")]
    pub contact_name: Option<String>,

    #[serde(rename = "empresa", default, deserialize_with = "lenient_text")]
    pub company: Option<String>,

    #[serde(rename = "setor", default, deserialize_with = "lenient_text")]
    pub sector: Option<String>,

    #[serde(rename = "tamanho_equipa", default, deserialize_with = "lenient_count")]
    pub team_size: Option<u32>,

    #[serde(rename = "objetivo", default, deserialize_with = "lenient_text")]
    pub objective: Option<String>,

    #[serde(rename = "orcamento_est", default, deserialize_with = "lenient_text")]
    pub budget_range: Option<String>,

    /// "baixa", "média" or "alta"
    #[serde(rename = "urgencia", default, deserialize_with = "lenient_text")]
    pub urgency: Option<String>,

    /// "nenhuma", "básica", "intermédia" or "avançada"
    #[serde(rename = "experiencia_ia", default, deserialize_with = "lenient_text")]
    pub ai_experience: Option<String>,

    #[serde(default, deserialize_with = "lenient_text")]
    pub insights: Option<String>,
}

/// Strings verbatim, lists joined one item per line, blanks dropped.
fn lenient_text<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let text = match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => Some(s),
        Some(Value::Array(items)) => Some(
            items
                .iter()
                .filter_map(|item| match item {
                    Value::String(s) => Some(s.clone()),
                    Value::Null => None,
                    other => Some(other.to_string()),
                })
                .collect::<Vec<_>>()
                .join("\n"),
        ),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    };

    Ok(text.map(|s| s.trim().to_string()).filter(|s| !s.is_empty()))
}

/// Numbers, or the leading digits of a string like "50 pessoas".
fn lenient_count<'de, D>(deserializer: D) -> std::result::Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let count = match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Number(n)) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f.round() as u64))
            .map(|n| n.min(u32::MAX as u64) as u32),
        Some(Value::String(s)) => {
            let digits: String = s
                .trim()
                .chars()
                .skip_while(|c| !c.is_ascii_digit())
                .take_while(|c| c.is_ascii_digit())
                .collect();
            digits.parse().ok()
        }
        _ => None,
    };

    Ok(count)
}

/// The span from the first `{` to the last `}`, tolerating prose around it.
pub fn extract_json_object(text: &str) -> &str {
    let text = text.trim();
    match (text.find('{'), text.rfind('}')) {
        (Some(start), Some(end)) if start < end => &text[start..=end],
        _ => text,
    }
}

/// Parse the model's answer into a profile.
pub fn parse_profile(output: &str) -> Result<CompanyProfile> {
    if output.trim().is_empty() {
        return Err(Error::Enrichment("No output from model".to_string()));
    }

    let json = extract_json_object(output);
    serde_json::from_str(json)
        .map_err(|e| Error::Enrichment(format!("model output is not a JSON object: {}", e)))
}
