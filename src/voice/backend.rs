use crate::error::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

/// Transport the voice service should use for the live call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Transport {
    #[default]
    WebSocket,
    WebRtc,
}

/// Who said a transcript line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Speaker {
    User,
    Agent,
}

/// A single transcript line delivered during the call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptMessage {
    pub source: Speaker,

    pub message: String,

    /// When this line was received
    pub timestamp: DateTime<Utc>,
}

impl TranscriptMessage {
    pub fn new(source: Speaker, message: impl Into<String>) -> Self {
        Self {
            source,
            message: message.into(),
            timestamp: Utc::now(),
        }
    }
}

/// Connection status reported by the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionStatus {
    Connecting,
    Connected,
    Disconnected,
}

/// Whether the AI persona is currently talking
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentMode {
    Speaking,
    Listening,
}

/// Callback hooks of the live session, delivered as a stream
#[derive(Debug, Clone, PartialEq)]
pub enum VoiceEvent {
    /// The service accepted the session. The id may arrive later.
    Connected { conversation_id: Option<String> },
    Disconnected { reason: Option<String> },
    Message(TranscriptMessage),
    Error(String),
    Status(ConnectionStatus),
    Mode(AgentMode),
}

/// What to open a live session with
#[derive(Debug, Clone)]
pub struct SessionRequest {
    /// System instruction for the persona
    pub prompt: String,

    /// Line the persona opens the call with
    pub first_message: String,

    pub transport: Transport,
}

/// Handle to an open live session
#[async_trait::async_trait]
pub trait VoiceSession: Send + Sync {
    async fn end_session(&mut self) -> Result<()>;

    async fn set_mic_muted(&mut self, muted: bool) -> Result<()>;

    /// Forward a chunk of 16-bit PCM user audio. Dropped while muted.
    async fn send_audio(&mut self, pcm: &[u8]) -> Result<()>;

    /// Conversation id assigned by the service, once known
    fn conversation_id(&self) -> Option<String>;
}

/// Real-time voice conversation service
///
/// Implementations:
/// - `ConvaiBackend`: websocket client for the conversational AI service
#[async_trait::async_trait]
pub trait VoiceBackend: Send + Sync {
    /// Open a live session
    ///
    /// Returns the session handle and a channel receiver for its events
    async fn open(
        &self,
        request: SessionRequest,
    ) -> Result<(Box<dyn VoiceSession>, mpsc::Receiver<VoiceEvent>)>;

    /// Get backend name for logging
    fn name(&self) -> &str;

    /// Whether the credentials needed to open a session are configured
    fn has_credentials(&self) -> bool {
        true
    }
}
