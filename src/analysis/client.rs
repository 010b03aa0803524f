use super::messages::ConversationData;
use crate::error::{Error, Result};
use reqwest::header::{HeaderMap, HeaderValue};
use std::time::Duration;
use tracing::{debug, info};

/// Post-call analysis and recording retrieval
#[async_trait::async_trait]
pub trait ConversationAnalysis: Send + Sync {
    /// `GET /conversations/{id}`
    async fn fetch_conversation(&self, conversation_id: &str) -> Result<ConversationData>;

    /// `GET /conversations/{id}/audio`
    async fn fetch_audio(&self, conversation_id: &str) -> Result<Vec<u8>>;

    /// Canonical URL of the recording for a conversation
    fn recording_url(&self, conversation_id: &str) -> String;
}

/// Builds the audio endpoint URL under `api_base`.
pub fn recording_url(api_base: &str, conversation_id: &str) -> String {
    format!(
        "{}/conversations/{}/audio",
        api_base.trim_end_matches('/'),
        conversation_id
    )
}

/// Conversation id of a URL built by [`recording_url`].
pub fn conversation_id_from_recording_url(url: &str) -> Option<&str> {
    let rest = url.strip_suffix("/audio")?;
    let (_, id) = rest.rsplit_once("/conversations/")?;
    (!id.is_empty() && !id.contains('/')).then_some(id)
}

/// HTTP client for the conversational AI REST API
pub struct ConvaiClient {
    http: reqwest::Client,
    api_base: String,
}

impl ConvaiClient {
    pub fn new(api_base: &str, api_key: Option<&str>, timeout: Duration) -> Result<Self> {
        let mut headers = HeaderMap::new();

        if let Some(key) = api_key {
            let val = HeaderValue::from_str(key)
                .map_err(|e| Error::Config(format!("invalid API key header: {}", e)))?;
            headers.insert("xi-api-key", val);
        }

        let http = reqwest::Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()
            .map_err(|e| Error::Config(format!("HTTP client build failed: {}", e)))?;

        Ok(Self {
            http,
            api_base: api_base.trim_end_matches('/').to_string(),
        })
    }

    async fn get(&self, url: &str) -> Result<reqwest::Response> {
        let resp = self.http.get(url).send().await?;
        let status = resp.status();

        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        Ok(resp)
    }
}

#[async_trait::async_trait]
impl ConversationAnalysis for ConvaiClient {
    async fn fetch_conversation(&self, conversation_id: &str) -> Result<ConversationData> {
        let url = format!("{}/conversations/{}", self.api_base, conversation_id);
        debug!("Fetching conversation analysis from {}", url);

        let data: ConversationData = self.get(&url).await?.json().await?;

        info!(
            "Fetched conversation {} (status={})",
            conversation_id,
            data.status.as_deref().unwrap_or("unknown")
        );

        Ok(data)
    }

    async fn fetch_audio(&self, conversation_id: &str) -> Result<Vec<u8>> {
        let url = self.recording_url(conversation_id);
        let bytes = self.get(&url).await?.bytes().await?;

        info!(
            "Fetched recording for conversation {} ({} bytes)",
            conversation_id,
            bytes.len()
        );

        Ok(bytes.to_vec())
    }

    fn recording_url(&self, conversation_id: &str) -> String {
        recording_url(&self.api_base, conversation_id)
    }
}
