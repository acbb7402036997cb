//! # Session API
//! 
//! axum middleware, cookie transport, error mapping and HTTP handlers.

pub mod cookies;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod response;
pub mod routes;
pub mod state;

pub use cookies::RequestCookies;
pub use error::ApiError;
pub use middleware::session_start;
pub use routes::build_router;
pub use state::SessionLayer;
