use super::handlers;
use super::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Create the HTTP router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Lead enrichment and intake
        .route("/research", post(handlers::research_company))
        .route(
            "/clients",
            get(handlers::list_clients).post(handlers::create_client),
        )
        // Dashboard and history
        .route("/dashboard", get(handlers::get_dashboard))
        .route("/trainings/:id", get(handlers::get_training))
        .route(
            "/trainings/:id/recording",
            get(handlers::get_training_recording),
        )
        // Live training call
        .route("/training/select", post(handlers::select_client))
        .route("/training/start", post(handlers::start_training))
        .route("/training/mute", post(handlers::toggle_mute))
        .route("/training/audio", post(handlers::send_audio))
        .route("/training/end", post(handlers::end_training))
        .route("/training/status", get(handlers::training_status))
        .layer(CorsLayer::permissive())
        // Add tracing middleware for request logging
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
