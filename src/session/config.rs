use super::poll::PollPolicy;
use crate::voice::Transport;
use std::time::Duration;

/// Configuration for the training call controller
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Transport requested from the voice service
    pub transport: Transport,

    /// Analysis polling after the call ends
    pub poll: PollPolicy,

    /// How many times to ask the session handle for its conversation id
    /// when the connected event did not carry one
    pub id_poll_attempts: u32,

    /// Delay between conversation id lookups
    pub id_poll_interval: Duration,

    /// REST base used to build recording URLs
    pub api_base: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            transport: Transport::WebSocket,
            poll: PollPolicy::default(),
            id_poll_attempts: 5,
            id_poll_interval: Duration::from_millis(100),
            api_base: "https://api.elevenlabs.io/v1/convai".to_string(),
        }
    }
}
