use std::sync::Arc;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use session_core::Session;
use tracing::debug;

use crate::cookies::RequestCookies;
use crate::error::ApiError;
use crate::state::SessionLayer;

/// Session middleware - resolve datastore, start session, expose handle to handlers.
///
/// Configuration errors are returned before any cookie is queued, so a failed
/// request carries no `Set-Cookie`. Cookie changes made by the handler (save,
/// destroy) are written after it returns.
pub async fn session_start(
    State(layer): State<SessionLayer>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let store = layer.config.datastore.resolve(layer.bindings.as_ref())?;

    let cookies = Arc::new(RequestCookies::from_headers(request.headers()));
    let session = Session::start(cookies.clone(), store, &layer.config)?;
    debug!(
        session = %session.id().short(),
        is_new = session.is_new(),
        "Session started"
    );

    let handle = session.load().await;
    request.extensions_mut().insert(handle);

    let mut response = next.run(request).await;
    cookies.apply(response.headers_mut());
    Ok(response)
}
