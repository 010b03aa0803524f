use super::backend::{
    AgentMode, ConnectionStatus, Speaker, SessionRequest, TranscriptMessage, Transport,
    VoiceBackend, VoiceEvent, VoiceSession,
};
use super::messages::{InitiationMessage, PongMessage, ServerMessage, UserAudioChunk};
use crate::error::{Error, Result};
use base64::Engine;
use futures::{SinkExt, StreamExt};
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, error, info, warn};

/// Default capacity for the per-session event channel.
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// How long `end_session` waits for the close frame to flush
const CLOSE_TIMEOUT: Duration = Duration::from_secs(2);

/// Websocket client for the conversational AI service
pub struct ConvaiBackend {
    ws_url: String,
    agent_id: Option<String>,
    api_key: Option<String>,
}

impl ConvaiBackend {
    pub fn new(ws_url: &str, agent_id: Option<String>, api_key: Option<String>) -> Self {
        Self {
            ws_url: ws_url.to_string(),
            agent_id,
            api_key,
        }
    }
}

#[async_trait::async_trait]
impl VoiceBackend for ConvaiBackend {
    async fn open(
        &self,
        request: SessionRequest,
    ) -> Result<(Box<dyn VoiceSession>, mpsc::Receiver<VoiceEvent>)> {
        if request.transport != Transport::WebSocket {
            return Err(Error::Connection(format!(
                "{:?} transport is not supported by the websocket backend",
                request.transport
            )));
        }

        let agent_id = self
            .agent_id
            .as_deref()
            .ok_or_else(|| Error::Capability("voice agent id is not configured".to_string()))?;

        let url = format!("{}?agent_id={}", self.ws_url, agent_id);
        info!("Connecting to voice service at {}", url);

        let mut ws_request = url
            .into_client_request()
            .map_err(|e| Error::Connection(format!("invalid voice url: {}", e)))?;
        if let Some(key) = self.api_key.as_deref() {
            let val = HeaderValue::from_str(key)
                .map_err(|e| Error::Config(format!("invalid API key header: {}", e)))?;
            ws_request.headers_mut().insert("xi-api-key", val);
        }

        let (stream, _) = tokio_tungstenite::connect_async(ws_request)
            .await
            .map_err(|e| Error::Connection(format!("voice socket: {}", e)))?;
        let (mut sink, mut source) = stream.split();

        let initiation = InitiationMessage::new(&request.prompt, &request.first_message);
        sink.send(Message::Text(serde_json::to_string(&initiation)?))
            .await
            .map_err(|e| Error::Connection(format!("failed to send initiation: {}", e)))?;

        info!("Voice socket open, initiation sent");

        let (events_tx, events_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let (outgoing_tx, mut outgoing_rx) = mpsc::channel::<Message>(EVENT_CHANNEL_CAPACITY);
        let (id_tx, id_rx) = watch::channel::<Option<String>>(None);

        let _ = events_tx.send(VoiceEvent::Status(ConnectionStatus::Connecting)).await;

        // Writer: everything outbound goes through one task
        let writer = tokio::spawn(async move {
            while let Some(msg) = outgoing_rx.recv().await {
                let closing = matches!(msg, Message::Close(_));
                if let Err(e) = sink.send(msg).await {
                    warn!("Voice socket write failed: {}", e);
                    break;
                }
                if closing {
                    break;
                }
            }
            let _ = sink.close().await;
            debug!("Voice writer task stopped");
        });

        // Reader: translate server events into session callbacks
        let pong_tx = outgoing_tx.clone();
        let reader = tokio::spawn(async move {
            let mut mode = AgentMode::Listening;

            while let Some(frame) = source.next().await {
                let text = match frame {
                    Ok(Message::Text(text)) => text,
                    Ok(Message::Close(frame)) => {
                        let reason = frame.map(|f| f.reason.to_string());
                        info!("Voice service closed the session: {:?}", reason);
                        let _ = events_tx.send(VoiceEvent::Disconnected { reason }).await;
                        let _ = events_tx
                            .send(VoiceEvent::Status(ConnectionStatus::Disconnected))
                            .await;
                        return;
                    }
                    Ok(_) => continue,
                    Err(e) => {
                        error!("Voice socket error: {}", e);
                        let _ = events_tx.send(VoiceEvent::Error(e.to_string())).await;
                        break;
                    }
                };

                let parsed = match serde_json::from_str::<ServerMessage>(&text) {
                    Ok(parsed) => parsed,
                    Err(e) => {
                        warn!("Failed to parse voice event: {}", e);
                        continue;
                    }
                };

                let event = match parsed {
                    ServerMessage::ConversationInitiationMetadata {
                        conversation_initiation_metadata_event: meta,
                    } => {
                        info!("Voice session connected: {}", meta.conversation_id);
                        let _ = id_tx.send(Some(meta.conversation_id.clone()));
                        let _ = events_tx
                            .send(VoiceEvent::Status(ConnectionStatus::Connected))
                            .await;
                        VoiceEvent::Connected {
                            conversation_id: Some(meta.conversation_id),
                        }
                    }
                    ServerMessage::UserTranscript {
                        user_transcription_event,
                    } => VoiceEvent::Message(TranscriptMessage::new(
                        Speaker::User,
                        user_transcription_event.user_transcript,
                    )),
                    ServerMessage::AgentResponse {
                        agent_response_event,
                    } => VoiceEvent::Message(TranscriptMessage::new(
                        Speaker::Agent,
                        agent_response_event.agent_response,
                    )),
                    ServerMessage::Ping { ping_event } => {
                        let pong = serde_json::to_string(&PongMessage::new(ping_event.event_id))
                            .unwrap_or_default();
                        let _ = pong_tx.send(Message::Text(pong)).await;
                        continue;
                    }
                    ServerMessage::Audio {} if mode != AgentMode::Speaking => {
                        mode = AgentMode::Speaking;
                        VoiceEvent::Mode(mode)
                    }
                    ServerMessage::Interruption {} if mode != AgentMode::Listening => {
                        mode = AgentMode::Listening;
                        VoiceEvent::Mode(mode)
                    }
                    _ => continue,
                };

                if events_tx.send(event).await.is_err() {
                    debug!("Voice event receiver dropped");
                    return;
                }
            }

            let _ = events_tx
                .send(VoiceEvent::Disconnected { reason: None })
                .await;
            let _ = events_tx
                .send(VoiceEvent::Status(ConnectionStatus::Disconnected))
                .await;
        });

        let session = ConvaiSession {
            outgoing: outgoing_tx,
            conversation_id: id_rx,
            muted: false,
            reader: Some(reader),
            writer: Some(writer),
        };

        Ok((Box::new(session), events_rx))
    }

    fn name(&self) -> &str {
        "convai-websocket"
    }

    fn has_credentials(&self) -> bool {
        self.agent_id.as_deref().is_some_and(|id| !id.is_empty())
            && self.api_key.as_deref().is_some_and(|key| !key.is_empty())
    }
}

/// Live websocket session handle
pub struct ConvaiSession {
    outgoing: mpsc::Sender<Message>,
    conversation_id: watch::Receiver<Option<String>>,
    muted: bool,
    reader: Option<JoinHandle<()>>,
    writer: Option<JoinHandle<()>>,
}

#[async_trait::async_trait]
impl VoiceSession for ConvaiSession {
    async fn end_session(&mut self) -> Result<()> {
        info!("Closing voice session");

        // The writer may already be gone if the server hung up first
        let _ = self.outgoing.send(Message::Close(None)).await;

        if let Some(writer) = self.writer.take() {
            if tokio::time::timeout(CLOSE_TIMEOUT, writer).await.is_err() {
                warn!("Voice writer did not stop within {:?}", CLOSE_TIMEOUT);
            }
        }
        if let Some(reader) = self.reader.take() {
            reader.abort();
        }

        Ok(())
    }

    async fn set_mic_muted(&mut self, muted: bool) -> Result<()> {
        self.muted = muted;
        info!("Microphone {}", if muted { "muted" } else { "unmuted" });
        Ok(())
    }

    async fn send_audio(&mut self, pcm: &[u8]) -> Result<()> {
        if self.muted {
            return Ok(());
        }

        let chunk = UserAudioChunk {
            user_audio_chunk: base64::engine::general_purpose::STANDARD.encode(pcm),
        };
        self.outgoing
            .send(Message::Text(serde_json::to_string(&chunk)?))
            .await
            .map_err(|_| Error::Connection("voice session is closed".to_string()))
    }

    fn conversation_id(&self) -> Option<String> {
        self.conversation_id.borrow().clone()
    }
}

impl Drop for ConvaiSession {
    fn drop(&mut self) {
        if let Some(reader) = self.reader.take() {
            reader.abort();
        }
        if let Some(writer) = self.writer.take() {
            writer.abort();
        }
    }
}
