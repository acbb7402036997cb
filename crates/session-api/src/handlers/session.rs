//! Handlers that read and persist the current session

use axum::{extract::Path, Extension, Json};
use serde::Serialize;
use serde_json::Value;
use session_core::{SessionData, SessionHandle};
use tracing::info;

use crate::error::ApiError;
use crate::response::ApiResponse;

/// Current session as seen by the client
#[derive(Debug, Serialize)]
pub struct SessionView {
    pub id: String,
    pub is_new: bool,
    pub data: SessionData,
}

#[derive(Debug, Serialize)]
pub struct VisitResponse {
    pub visits: u64,
}

#[derive(Debug, Serialize)]
pub struct DestroyResponse {
    pub destroyed: bool,
}

impl From<&SessionHandle> for SessionView {
    fn from(session: &SessionHandle) -> Self {
        Self {
            id: session.id().to_string(),
            is_new: session.is_new(),
            data: session.data(),
        }
    }
}

/// Show session - GET /api/session
pub async fn show(Extension(session): Extension<SessionHandle>) -> Json<ApiResponse<SessionView>> {
    Json(ApiResponse::success(SessionView::from(&session)))
}

/// Count a visit - POST /api/session/visit
pub async fn visit(
    Extension(session): Extension<SessionHandle>,
) -> Result<Json<ApiResponse<VisitResponse>>, ApiError> {
    let visits = session
        .get::<u64>("visits")
        .unwrap_or(0)
        .checked_add(1)
        .ok_or_else(|| ApiError::BadRequest("Visit counter is at its maximum".to_string()))?;
    session.insert("visits", visits)?;
    session.save().await?;
    Ok(Json(ApiResponse::success(VisitResponse { visits })))
}

/// Store a value - PUT /api/session/data/{key}
pub async fn put_value(
    Extension(session): Extension<SessionHandle>,
    Path(key): Path<String>,
    Json(value): Json<Value>,
) -> Result<Json<ApiResponse<SessionView>>, ApiError> {
    if key.trim().is_empty() {
        return Err(ApiError::BadRequest("Key must not be empty".to_string()));
    }
    session.with_data(|data| {
        data.insert(key, value);
    });
    session.save().await?;
    Ok(Json(ApiResponse::success(SessionView::from(&session))))
}

/// Destroy session - DELETE /api/session
///
/// The datastore outcome is reported rather than raised; the cookie is
/// expired either way.
pub async fn destroy(Extension(session): Extension<SessionHandle>) -> Json<ApiResponse<DestroyResponse>> {
    let destroyed = session.destroy().await.is_ok();
    info!(destroyed, "Session destroy requested");
    Json(ApiResponse::success(DestroyResponse { destroyed }))
}
