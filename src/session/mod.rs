//! Training call lifecycle
//!
//! This module provides the `TrainingController` that manages:
//! - Client selection and the audio capability check
//! - Opening the live voice session with a per-client persona
//! - Transcript collection and mute control while connected
//! - Teardown: closing the session, polling the analysis, saving the record
//!
//! The lifecycle itself is the pure `reduce` function over `CallState`.

mod config;
mod controller;
mod persona;
mod poll;
mod state;

pub use config::SessionConfig;
pub use controller::{CallStatus, EndOutcome, TrainingController, TrainingDeps};
pub use persona::PersonaScript;
pub use poll::{poll_analysis, PollOutcome, PollPolicy};
pub use state::{reduce, CallEvent, CallState, LiveCall};
