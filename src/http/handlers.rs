use super::auth::AuthenticatedActor;
use super::state::AppState;
use crate::analysis::conversation_id_from_recording_url;
use crate::dashboard::{self, Dashboard, TrainingRow};
use crate::enrichment::ResearchRequest;
use crate::error::{Error, Result};
use crate::leads::LeadForm;
use crate::model::{Client, ClientId, TrainingId};
use crate::session::{CallStatus, EndOutcome};
use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{error, info};

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectClientRequest {
    pub client_id: ClientId,
}

#[derive(Debug, Serialize)]
pub struct MuteResponse {
    /// New mute state, `null` when there was no live call
    pub muted: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct AudioResponse {
    pub forwarded: bool,
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /health
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

/// POST /research
/// Enrich a company without saving anything
pub async fn research_company(
    State(state): State<AppState>,
    Json(req): Json<ResearchRequest>,
) -> Response {
    if req.company_name.trim().is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "success": false, "error": "Company name is required" })),
        )
            .into_response();
    }

    match state.research.research(&req).await {
        Ok(profile) => Json(json!({ "success": true, "data": profile })).into_response(),
        Err(e) => {
            error!("Research failed for {}: {}", req.company_name, e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "success": false, "error": e.to_string() })),
            )
                .into_response()
        }
    }
}

/// GET /clients
pub async fn list_clients(
    _actor: AuthenticatedActor,
    State(state): State<AppState>,
) -> Result<Json<Vec<Client>>> {
    let clients = state
        .store
        .clients()
        .await
        .map_err(|e| Error::DataFetch(format!("clients: {}", e)))?;
    Ok(Json(clients))
}

/// POST /clients
/// Lead intake: enrich and save a new client
pub async fn create_client(
    AuthenticatedActor(actor_id): AuthenticatedActor,
    State(state): State<AppState>,
    Json(form): Json<LeadForm>,
) -> Result<(StatusCode, Json<Client>)> {
    info!("Actor {} submitted lead {}", actor_id, form.company_name);
    let client = state.intake.submit(form).await?;
    Ok((StatusCode::CREATED, Json(client)))
}

/// GET /dashboard
pub async fn get_dashboard(
    AuthenticatedActor(actor_id): AuthenticatedActor,
    State(state): State<AppState>,
) -> Json<Dashboard> {
    Json(dashboard::load(state.store.as_ref(), actor_id, state.recent_limit).await)
}

/// GET /trainings/:id
pub async fn get_training(
    AuthenticatedActor(actor_id): AuthenticatedActor,
    State(state): State<AppState>,
    Path(training_id): Path<TrainingId>,
) -> Result<Json<TrainingRow>> {
    let training = state
        .store
        .training(actor_id, training_id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("training {}", training_id)))?;

    let client_name = match state.store.client(training.client_id).await {
        Ok(Some(client)) => client.name,
        Ok(None) => dashboard::UNKNOWN_CLIENT.to_string(),
        Err(e) => {
            error!("Failed to read client {}: {}", training.client_id, e);
            dashboard::UNKNOWN_CLIENT.to_string()
        }
    };

    Ok(Json(TrainingRow {
        training,
        client_name,
    }))
}

/// GET /trainings/:id/recording
/// Proxy the call audio so the API key stays server-side
pub async fn get_training_recording(
    AuthenticatedActor(actor_id): AuthenticatedActor,
    State(state): State<AppState>,
    Path(training_id): Path<TrainingId>,
) -> Result<Response> {
    let training = state
        .store
        .training(actor_id, training_id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("training {}", training_id)))?;

    let conversation_id = training
        .recording_url
        .as_deref()
        .and_then(conversation_id_from_recording_url)
        .ok_or_else(|| Error::NotFound(format!("recording for training {}", training_id)))?;

    let audio = state.deps.analysis.fetch_audio(conversation_id).await?;

    Ok(([(header::CONTENT_TYPE, "audio/mpeg")], audio).into_response())
}

/// POST /training/select
pub async fn select_client(
    AuthenticatedActor(actor_id): AuthenticatedActor,
    State(state): State<AppState>,
    Json(req): Json<SelectClientRequest>,
) -> Result<Json<CallStatus>> {
    let controller = state.controller(actor_id).await;
    Ok(Json(controller.select_client(req.client_id).await?))
}

/// POST /training/start
pub async fn start_training(
    AuthenticatedActor(actor_id): AuthenticatedActor,
    State(state): State<AppState>,
) -> Result<Json<CallStatus>> {
    let controller = state.controller(actor_id).await;
    match controller.start().await {
        Ok(status) => Ok(Json(status)),
        Err(e) => {
            if e.is_user_visible() {
                info!("Training start refused for actor {}: {}", actor_id, e);
            }
            Err(e)
        }
    }
}

/// POST /training/mute
pub async fn toggle_mute(
    AuthenticatedActor(actor_id): AuthenticatedActor,
    State(state): State<AppState>,
) -> Result<Json<MuteResponse>> {
    let controller = state.controller(actor_id).await;
    let muted = controller.toggle_mute().await?;
    Ok(Json(MuteResponse { muted }))
}

/// POST /training/audio
/// Raw PCM from the browser microphone
pub async fn send_audio(
    AuthenticatedActor(actor_id): AuthenticatedActor,
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<AudioResponse>> {
    let controller = state.controller(actor_id).await;
    let forwarded = controller.send_audio(&body).await?;
    Ok(Json(AudioResponse { forwarded }))
}

/// POST /training/end
pub async fn end_training(
    AuthenticatedActor(actor_id): AuthenticatedActor,
    State(state): State<AppState>,
) -> Json<EndOutcome> {
    let controller = state.controller(actor_id).await;
    Json(controller.end_call().await)
}

/// GET /training/status
pub async fn training_status(
    AuthenticatedActor(actor_id): AuthenticatedActor,
    State(state): State<AppState>,
) -> Json<CallStatus> {
    let controller = state.controller(actor_id).await;
    Json(controller.status().await)
}
