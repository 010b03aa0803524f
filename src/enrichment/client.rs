use super::parse::{parse_profile, CompanyProfile};
use crate::config::EnrichmentConfig;
use crate::error::{Error, Result};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, error, info};

const JSON_ONLY: &str =
    "IMPORTANT: Return ONLY valid JSON, no other text. Start with { and end with }";

/// Company to research
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResearchRequest {
    #[serde(default)]
    pub company_name: String,

    #[serde(default)]
    pub company_website: Option<String>,
}

/// Lead enrichment through a search-augmented language model
#[async_trait::async_trait]
pub trait CompanyResearch: Send + Sync {
    async fn research(&self, request: &ResearchRequest) -> Result<CompanyProfile>;
}

/// Sales-preparation prompt for one company
pub fn research_prompt(request: &ResearchRequest) -> String {
    let company = request.company_name.trim();
    let focus = match request
        .company_website
        .as_deref()
        .map(str::trim)
        .filter(|w| !w.is_empty())
    {
        Some(website) => format!(
            "Research the company \"{}\" (website: {}). Find information about their business sector, team size, recent news, and challenges.",
            company, website
        ),
        None => format!(
            "Research the Portuguese company \"{}\". Find information about their business sector, team size, revenue, recent news, and business challenges.",
            company
        ),
    };

    format!(
        r#"You are a sales intelligence assistant. Use web search to research "{company}" and extract structured information for a sales preparation.

{focus}

Search for and analyze information about this company, then return a JSON object with the following fields:
{{
  "nome": "Primary contact name if found, otherwise 'Decision Maker'",
  "empresa": "{company}",
  "setor": "Industry/sector in Portuguese (e.g., tecnologia, saúde, finanças, indústria, consultoria, retalho)",
  "tamanho_equipa": estimated number of employees as integer (be realistic based on company info),
  "objetivo": "Likely business objective or challenge they might have - be specific and realistic in Portuguese",
  "orcamento_est": "Estimated budget range for AI consulting (e.g., '5k-10k', '10k-20k', '20k-50k', '50k+')",
  "urgencia": "Urgency level: 'baixa', 'média', or 'alta'",
  "experiencia_ia": "AI experience level: 'nenhuma', 'básica', 'intermédia', or 'avançada'",
  "insights": "3-4 bullet points of key insights for sales preparation in Portuguese (challenges, opportunities, recent news)"
}}

IMPORTANT:
- All text fields should be in European Portuguese
- Be realistic and base your estimates on the company size and sector
- If information is missing, make educated guesses based on industry standards
- Keep objetivo and insights practical and specific"#,
    )
}

/// Text of a responses-API answer: `output_text`, else the first
/// `output_text` content item.
pub fn output_text(response: &Value) -> Option<String> {
    if let Some(text) = response["output_text"].as_str().filter(|t| !t.trim().is_empty()) {
        return Some(text.to_string());
    }

    response["output"]
        .as_array()?
        .iter()
        .filter_map(|item| item["content"].as_array())
        .flatten()
        .filter(|content| content["type"].as_str().map_or(true, |t| t == "output_text"))
        .filter_map(|content| content["text"].as_str())
        .find(|text| !text.trim().is_empty())
        .map(str::to_string)
}

/// Client for the responses endpoint with web-search tooling
pub struct ResponsesClient {
    http: reqwest::Client,
    config: EnrichmentConfig,
}

impl ResponsesClient {
    pub fn new(config: EnrichmentConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        if let Some(ref key) = config.api_key {
            let val = HeaderValue::from_str(&format!("Bearer {}", key))
                .map_err(|e| Error::Config(format!("invalid API key header: {}", e)))?;
            headers.insert(AUTHORIZATION, val);
        }

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers(headers)
            .build()
            .map_err(|e| Error::Config(format!("HTTP client build failed: {}", e)))?;

        Ok(Self { http, config })
    }
}

#[async_trait::async_trait]
impl CompanyResearch for ResponsesClient {
    async fn research(&self, request: &ResearchRequest) -> Result<CompanyProfile> {
        if request.company_name.trim().is_empty() {
            return Err(Error::Validation("Company name is required".to_string()));
        }

        info!("Researching company: {}", request.company_name);
        debug!(
            "Website: {}",
            request.company_website.as_deref().unwrap_or("Not provided")
        );

        let body = json!({
            "model": self.config.model,
            "tools": [{ "type": "web_search" }],
            "tool_choice": "auto",
            "input": format!("{}\n\n{}", research_prompt(request), JSON_ONLY),
        });

        let url = format!("{}/responses", self.config.api_base.trim_end_matches('/'));
        let resp = self
            .http
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::Enrichment(format!("request failed: {}", e)))?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            error!("Research API error {}: {}", status, text);
            return Err(Error::Enrichment(format!("API error {}: {}", status, text)));
        }

        let payload: Value = resp
            .json()
            .await
            .map_err(|e| Error::Enrichment(format!("unreadable response: {}", e)))?;

        let text = output_text(&payload)
            .ok_or_else(|| Error::Enrichment("No output from model".to_string()))?;
        debug!("Model output: {}", text.chars().take(200).collect::<String>());

        let profile = parse_profile(&text)?;
        info!("Company research completed for {}", request.company_name);

        Ok(profile)
    }
}
