//! HTTP API for the dashboard front-end
//!
//! - GET /health - Health check
//! - POST /research - Enrich a company without saving it
//! - GET /clients, POST /clients - List clients, submit a lead
//! - GET /dashboard - Actor profile, stats and recent trainings
//! - GET /trainings/:id, GET /trainings/:id/recording - Training detail and audio
//! - POST /training/{select,start,mute,audio,end}, GET /training/status - Live call
//!
//! Actor-scoped routes read the actor id from the `x-actor-id` header.

mod auth;
mod handlers;
mod routes;
mod state;

pub use auth::{AuthenticatedActor, ACTOR_HEADER};
pub use routes::create_router;
pub use state::AppState;
