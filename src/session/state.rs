use crate::error::{Error, Result};
use crate::model::Client;
use crate::voice::TranscriptMessage;
use serde::Serialize;

/// Call-scoped data that exists once the live session is being opened
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LiveCall {
    pub client: Client,
    pub conversation_id: Option<String>,
    pub transcript: Vec<TranscriptMessage>,
    pub muted: bool,
}

impl LiveCall {
    fn new(client: Client) -> Self {
        Self {
            client,
            conversation_id: None,
            transcript: Vec::new(),
            muted: false,
        }
    }
}

/// Lifecycle of one training call
#[derive(Debug, Clone, PartialEq, Default)]
pub enum CallState {
    #[default]
    Idle,
    Selecting {
        client: Client,
    },
    Preparing {
        client: Client,
    },
    Connecting(LiveCall),
    Connected(LiveCall),
    Ending(LiveCall),
}

impl CallState {
    pub fn name(&self) -> &'static str {
        match self {
            CallState::Idle => "idle",
            CallState::Selecting { .. } => "selecting",
            CallState::Preparing { .. } => "preparing",
            CallState::Connecting(_) => "connecting",
            CallState::Connected(_) => "connected",
            CallState::Ending(_) => "ending",
        }
    }

    pub fn client(&self) -> Option<&Client> {
        match self {
            CallState::Idle => None,
            CallState::Selecting { client } | CallState::Preparing { client } => Some(client),
            CallState::Connecting(call) | CallState::Connected(call) | CallState::Ending(call) => {
                Some(&call.client)
            }
        }
    }

    pub fn live_call(&self) -> Option<&LiveCall> {
        match self {
            CallState::Connecting(call) | CallState::Connected(call) | CallState::Ending(call) => {
                Some(call)
            }
            _ => None,
        }
    }
}

/// Inputs that move the lifecycle forward
#[derive(Debug, Clone, PartialEq)]
pub enum CallEvent {
    /// The actor picked a client
    Select(Client),
    /// The actor confirmed the start
    Confirm,
    CapabilityPassed,
    /// Capability check or connection failed
    SetupFailed,
    Connected { conversation_id: Option<String> },
    ConversationId(String),
    Message(TranscriptMessage),
    MuteSet(bool),
    EndRequested,
    TeardownComplete,
}

impl CallEvent {
    pub fn name(&self) -> &'static str {
        match self {
            CallEvent::Select(_) => "select",
            CallEvent::Confirm => "confirm",
            CallEvent::CapabilityPassed => "capability_passed",
            CallEvent::SetupFailed => "setup_failed",
            CallEvent::Connected { .. } => "connected",
            CallEvent::ConversationId(_) => "conversation_id",
            CallEvent::Message(_) => "message",
            CallEvent::MuteSet(_) => "mute",
            CallEvent::EndRequested => "end",
            CallEvent::TeardownComplete => "teardown_complete",
        }
    }
}

/// Next state for `event`, or `Error::InvalidTransition`.
pub fn reduce(state: &CallState, event: CallEvent) -> Result<CallState> {
    use CallEvent as E;
    use CallState as S;

    let next = match (state, event) {
        (S::Idle | S::Selecting { .. }, E::Select(client)) => S::Selecting { client },

        (S::Selecting { client }, E::Confirm) => S::Preparing {
            client: client.clone(),
        },

        (S::Preparing { client }, E::CapabilityPassed) => {
            S::Connecting(LiveCall::new(client.clone()))
        }

        (S::Preparing { .. } | S::Connecting(_), E::SetupFailed) => S::Idle,

        (S::Connecting(call), E::Connected { conversation_id }) => {
            let mut call = call.clone();
            if conversation_id.is_some() {
                call.conversation_id = conversation_id;
            }
            S::Connected(call)
        }

        (S::Connecting(call), E::ConversationId(id)) => {
            let mut call = call.clone();
            call.conversation_id = Some(id);
            S::Connecting(call)
        }
        (S::Connected(call), E::ConversationId(id)) => {
            let mut call = call.clone();
            call.conversation_id = Some(id);
            S::Connected(call)
        }

        (S::Connecting(call), E::Message(message)) => {
            let mut call = call.clone();
            call.transcript.push(message);
            S::Connecting(call)
        }
        (S::Connected(call), E::Message(message)) => {
            let mut call = call.clone();
            call.transcript.push(message);
            S::Connected(call)
        }

        (S::Connected(call), E::MuteSet(muted)) => {
            let mut call = call.clone();
            call.muted = muted;
            S::Connected(call)
        }

        (S::Selecting { .. } | S::Preparing { .. }, E::EndRequested) => S::Idle,
        (S::Connecting(call) | S::Connected(call), E::EndRequested) => S::Ending(call.clone()),

        (S::Ending(_), E::TeardownComplete) => S::Idle,

        (state, event) => {
            return Err(Error::InvalidTransition {
                state: state.name(),
                event: event.name(),
            })
        }
    };

    Ok(next)
}
