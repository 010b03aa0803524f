use serde::{Deserialize, Serialize};

/// First frame sent after the socket opens
#[derive(Debug, Serialize, Deserialize)]
pub struct InitiationMessage {
    #[serde(rename = "type")]
    pub kind: String,
    pub conversation_config_override: ConfigOverride,
}

impl InitiationMessage {
    pub fn new(prompt: &str, first_message: &str) -> Self {
        Self {
            kind: "conversation_initiation_client_data".to_string(),
            conversation_config_override: ConfigOverride {
                agent: AgentOverride {
                    prompt: PromptOverride {
                        prompt: prompt.to_string(),
                    },
                    first_message: first_message.to_string(),
                },
            },
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ConfigOverride {
    pub agent: AgentOverride,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AgentOverride {
    pub prompt: PromptOverride,
    pub first_message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PromptOverride {
    pub prompt: String,
}

/// Reply to a server ping
#[derive(Debug, Serialize, Deserialize)]
pub struct PongMessage {
    #[serde(rename = "type")]
    pub kind: String,
    pub event_id: u64,
}

impl PongMessage {
    pub fn new(event_id: u64) -> Self {
        Self {
            kind: "pong".to_string(),
            event_id,
        }
    }
}

/// User audio frame
#[derive(Debug, Serialize, Deserialize)]
pub struct UserAudioChunk {
    pub user_audio_chunk: String, // Base64-encoded PCM bytes
}

/// Events received from the voice service
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    ConversationInitiationMetadata {
        conversation_initiation_metadata_event: InitiationMetadata,
    },
    UserTranscript {
        user_transcription_event: UserTranscription,
    },
    AgentResponse {
        agent_response_event: AgentResponse,
    },
    Ping {
        ping_event: PingEvent,
    },
    Audio {},
    Interruption {},
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
pub struct InitiationMetadata {
    pub conversation_id: String,
}

#[derive(Debug, Deserialize)]
pub struct UserTranscription {
    pub user_transcript: String,
}

#[derive(Debug, Deserialize)]
pub struct AgentResponse {
    pub agent_response: String,
}

#[derive(Debug, Deserialize)]
pub struct PingEvent {
    pub event_id: u64,
}
