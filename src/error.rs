use axum::http::StatusCode;
use axum::response::{IntoResponse, Json};
use serde_json::json;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// No usable microphone, permission denied or missing voice credentials.
    #[error("Capability error: {0}")]
    Capability(String),

    /// The live voice session could not be opened.
    #[error("Connection error: {0}")]
    Connection(String),

    /// Failure while closing, fetching analysis or saving a finished call.
    #[error("Teardown error: {0}")]
    Teardown(String),

    #[error("Enrichment error: {0}")]
    Enrichment(String),

    #[error("Data fetch error: {0}")]
    DataFetch(String),

    #[error("Cannot apply '{event}' while {state}")]
    InvalidTransition {
        state: &'static str,
        event: &'static str,
    },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Upstream returned {status}: {body}")]
    Upstream { status: u16, body: String },

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Setup failures are shown to the user; everything else is logged.
    pub fn is_user_visible(&self) -> bool {
        matches!(self, Error::Capability(_) | Error::Connection(_))
    }

    fn status(&self) -> StatusCode {
        match self {
            Error::Capability(_) => StatusCode::PRECONDITION_FAILED,
            Error::Connection(_) => StatusCode::BAD_GATEWAY,
            Error::Teardown(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Error::Enrichment(_) => StatusCode::BAD_GATEWAY,
            Error::DataFetch(_) => StatusCode::SERVICE_UNAVAILABLE,
            Error::InvalidTransition { .. } => StatusCode::CONFLICT,
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::Validation(_) => StatusCode::BAD_REQUEST,
            Error::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Error::Upstream { .. } => StatusCode::BAD_GATEWAY,
            Error::Http(_) => StatusCode::BAD_GATEWAY,
            Error::Json(_) => StatusCode::BAD_REQUEST,
            Error::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> axum::response::Response {
        let status = self.status();
        let body = json!({ "error": self.to_string() });
        (status, Json(body)).into_response()
    }
}
