use std::net::SocketAddr;

use axum::http::{header, HeaderValue, Method};
use tower_http::cors::CorsLayer;
use tracing::{error, info};

use session_api::{build_router, SessionLayer};
use session_core::SessionConfig;
use session_infrastructure::build_registry;
use session_shared::config::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize telemetry
    session_shared::telemetry::init_telemetry();

    info!("Session server starting...");

    // Load configuration (also reads .env)
    let config = match AppConfig::load() {
        Ok(c) => c,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    // Bind datastores
    let registry = build_registry(&config.datastores)?;
    info!("{} datastore binding(s) ready", registry.len());

    let session_config = SessionConfig::from(&config.session);
    info!(
        cookie = %session_config.cookie_name,
        prefix = %session_config.prefix,
        ttl = session_config.ttl,
        renewal = ?session_config.cookie_renewal,
        "Session middleware configured"
    );

    // Build router
    let app = build_router(SessionLayer::new(session_config, registry)).layer(
        CorsLayer::new()
            .allow_origin("http://localhost:5173".parse::<HeaderValue>()?)
            .allow_credentials(true)
            .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
            .allow_headers([header::CONTENT_TYPE]),
    );

    // Bind address
    let host: std::net::IpAddr = config.app.host.parse()?;
    let addr = SocketAddr::from((host, config.app.port));
    info!("Listening on {}", addr);

    // Start server
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
