//! `delve serve` -- browser front-end and JSON API over one research desk.
//!
//! Security features:
//! - CORS headers on all responses (permissive for local dev)
//! - Optional API key authentication via `server.api_key`
//! - Request bodies capped at 10 MB
//!
//! Endpoints:
//! - GET  /                    - Research page (`?parent=<id>` selects a parent)
//! - POST /research            - Multipart form submit; re-renders the page
//! - GET  /health              - Server status (exempt from auth)
//! - GET  /api/research        - Every stored record, oldest first
//! - GET  /api/research/{id}   - One record
//! - POST /api/research        - Run research from a JSON body

mod handlers;
mod middleware;
mod page;
mod state;

use std::path::PathBuf;
use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::http::{Method, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{middleware as axum_middleware, Json, Router};
use delve_engine::EngineError;
use tower_http::cors::{Any, CorsLayer};

use self::handlers::{
    handle_create_research, handle_get_research, handle_health, handle_list_research,
    handle_not_found,
};
use self::middleware::auth_middleware;
use self::page::{handle_index, handle_submit};
use self::state::AppState;
use crate::desk::{DeskError, ResearchDesk};

/// Maximum request body size: 10 MB.
const MAX_BODY_SIZE: usize = 10 * 1024 * 1024;

/// Where and how to listen.
#[derive(Debug, Clone)]
pub(crate) struct ServeOptions {
    pub(crate) host: String,
    pub(crate) port: u16,
    pub(crate) api_key: Option<String>,
    pub(crate) tls_cert: Option<PathBuf>,
    pub(crate) tls_key: Option<PathBuf>,
}

/// Construct a JSON error response with the given status code and message.
fn json_error(status: StatusCode, message: &str) -> impl IntoResponse {
    (status, Json(serde_json::json!({"error": message})))
}

/// Status code for a failed desk operation: caller mistakes are 400.
fn desk_error_status(error: &DeskError) -> StatusCode {
    match error {
        DeskError::EmptyQuery
        | DeskError::Extract(_)
        | DeskError::Engine(EngineError::EmptyQuery) => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any);

    Router::new()
        .route("/", get(handle_index))
        .route("/research", post(handle_submit))
        .route("/health", get(handle_health))
        .route(
            "/api/research",
            get(handle_list_research).post(handle_create_research),
        )
        .route("/api/research/{id}", get(handle_get_research))
        .fallback(handle_not_found)
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ))
        .layer(cors)
        .layer(DefaultBodyLimit::max(MAX_BODY_SIZE))
        .with_state(state)
}

/// Start the HTTP server and block until Ctrl+C.
///
/// When TLS cert/key paths are provided, the server listens over HTTPS
/// using `axum-server` with rustls. Otherwise it uses plain HTTP.
pub(crate) async fn start_server(desk: ResearchDesk, options: ServeOptions) -> anyhow::Result<()> {
    let api_key = options.api_key.filter(|k| !k.is_empty());
    if api_key.is_some() {
        eprintln!("API key authentication enabled");
    }
    let agent = desk.engine().agent_name().to_string();

    let app = router(Arc::new(AppState { desk, api_key }));
    let addr = format!("{}:{}", options.host, options.port);

    #[cfg(feature = "tls")]
    if let (Some(cert_path), Some(key_path)) = (&options.tls_cert, &options.tls_key) {
        let config =
            axum_server::tls_rustls::RustlsConfig::from_pem_file(cert_path, key_path).await?;
        let socket_addr: std::net::SocketAddr = addr.parse()?;
        eprintln!("delve listening on https://{} (agent: {})", addr, agent);
        axum_server::bind_rustls(socket_addr, config)
            .serve(app.into_make_service())
            .await?;
        return Ok(());
    }
    #[cfg(not(feature = "tls"))]
    if options.tls_cert.is_some() || options.tls_key.is_some() {
        anyhow::bail!("TLS support was not compiled in (rebuild with the `tls` feature)");
    }

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    eprintln!("delve listening on http://{} (agent: {})", addr, agent);
    tracing::info!(%addr, agent = %agent, "server started");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    eprintln!("\nServer shut down.");
    Ok(())
}

/// Wait for a shutdown signal (Ctrl+C).
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
    eprintln!("\nReceived shutdown signal...");
}
