use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use session_core::SessionError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Datastore error: {0}")]
    Datastore(String),
}

impl From<SessionError> for ApiError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::InvalidTtl { .. } | SessionError::DatastoreNotFound { .. } => {
                ApiError::Configuration(err.to_string())
            }
            SessionError::Store(e) => ApiError::Datastore(e.to_string()),
            SessionError::Destroyed => ApiError::Conflict(err.to_string()),
            SessionError::Serialization(msg) => ApiError::BadRequest(msg),
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match self {
            ApiError::Configuration(msg) => {
                tracing::error!("Session configuration error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "ConfigurationError", msg)
            },
            ApiError::BadRequest(msg) => {
                tracing::warn!("Bad request: {}", msg);
                (StatusCode::BAD_REQUEST, "BadRequest", msg)
            },
            ApiError::Conflict(msg) => {
                tracing::warn!("Conflict: {}", msg);
                (StatusCode::CONFLICT, "Conflict", msg)
            },
            ApiError::Datastore(msg) => {
                tracing::error!("Datastore error: {}", msg);
                (StatusCode::SERVICE_UNAVAILABLE, "DatastoreError", msg)
            },
        };

        let body = Json(ErrorResponse {
            error: error_type.to_string(),
            message,
        });

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use session_core::StoreError;

    #[test]
    fn test_configuration_errors_are_server_errors() {
        let invalid_ttl = ApiError::from(SessionError::InvalidTtl { ttl: 1, min: 60, max: 34_560_000 });
        assert_eq!(invalid_ttl.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);

        let missing = ApiError::from(SessionError::DatastoreNotFound { binding: "KV".into() });
        assert!(matches!(missing, ApiError::Configuration(ref m) if m == "Session datastore was not found."));
        assert_eq!(missing.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_transient_errors_map_to_unavailable() {
        let err = ApiError::from(SessionError::Store(StoreError::Unavailable("down".into())));
        assert_eq!(err.into_response().status(), StatusCode::SERVICE_UNAVAILABLE);
        let err = ApiError::from(SessionError::Destroyed);
        assert_eq!(err.into_response().status(), StatusCode::CONFLICT);
    }
}
