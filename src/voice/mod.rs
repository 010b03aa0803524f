//! Live voice conversation plumbing
//!
//! - `backend`: the `VoiceBackend` / `VoiceSession` seam and its event types
//! - `convai`: websocket implementation for the conversational AI service
//! - `devices`: audio input capability probe
//! - `messages`: wire frames of the websocket protocol

pub mod backend;
pub mod convai;
pub mod devices;
pub mod messages;

pub use backend::{
    AgentMode, ConnectionStatus, SessionRequest, Speaker, TranscriptMessage, Transport,
    VoiceBackend, VoiceEvent, VoiceSession,
};
pub use convai::ConvaiBackend;
pub use devices::{InputDevice, InputDevices, StaticInputDevices, SystemInputDevices};
