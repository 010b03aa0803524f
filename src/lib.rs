pub mod analysis;
pub mod config;
pub mod dashboard;
pub mod enrichment;
pub mod error;
pub mod http;
pub mod leads;
pub mod model;
pub mod session;
pub mod store;
pub mod voice;

pub use analysis::{CallReport, ConvaiClient, ConversationAnalysis, ConversationData};
pub use config::Config;
pub use dashboard::{Dashboard, DashboardStats};
pub use enrichment::{CompanyProfile, CompanyResearch, ResearchRequest, ResponsesClient};
pub use error::{Error, Result};
pub use http::{create_router, AppState};
pub use leads::{LeadForm, LeadIntake};
pub use model::{Actor, ActorId, Client, ClientId, NewClient, NewTraining, Training, TrainingId};
pub use session::{
    CallEvent, CallState, CallStatus, EndOutcome, PollPolicy, SessionConfig, TrainingController,
    TrainingDeps,
};
pub use store::{MemoryStore, TrainingStore};
pub use voice::{ConvaiBackend, VoiceBackend, VoiceEvent, VoiceSession};
