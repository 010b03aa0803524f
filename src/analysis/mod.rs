//! Post-call analysis
//!
//! - `client`: REST access to the conversation analysis and audio endpoints
//! - `messages`: the analysis payload, typed where the report needs it
//! - `extract`: pure rules turning the payload into a training record

pub mod client;
pub mod extract;
pub mod messages;

pub use client::{
    conversation_id_from_recording_url, recording_url, ConvaiClient, ConversationAnalysis,
};
pub use extract::CallReport;
pub use messages::{CallAnalysis, CallMetadata, CollectedValue, ConversationData, CriterionResult};
