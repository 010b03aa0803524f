use super::state::AppState;
use crate::error::Error;
use crate::model::ActorId;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;

/// Header carrying the authenticated actor id, set by the auth proxy
pub const ACTOR_HEADER: &str = "x-actor-id";

/// Axum extractor for the actor making the request.
///
/// Handlers opt in by taking `AuthenticatedActor` as a parameter; requests
/// without a valid header are rejected with 401.
#[derive(Debug, Clone, Copy)]
pub struct AuthenticatedActor(pub ActorId);

#[async_trait::async_trait]
impl FromRequestParts<AppState> for AuthenticatedActor {
    type Rejection = Error;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get(ACTOR_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| Error::Unauthorized(format!("missing {} header", ACTOR_HEADER)))?;

        raw.parse::<ActorId>()
            .map(AuthenticatedActor)
            .map_err(|_| Error::Unauthorized(format!("invalid actor id: {}", raw)))
    }
}
