//! JSON API handlers: health, list, get, create.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use delve_core::UploadedFile;
use serde::Deserialize;

use super::state::AppState;
use super::{desk_error_status, json_error};
use crate::desk::Submission;

/// File name used when a JSON upload omits one.
const DEFAULT_UPLOAD_NAME: &str = "upload.txt";

/// Fallback handler for unmatched routes.
pub(crate) async fn handle_not_found() -> impl IntoResponse {
    json_error(StatusCode::NOT_FOUND, "not found")
}

/// GET /health
pub(crate) async fn handle_health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let response = serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "agent": state.desk.engine().agent_name(),
    });
    (StatusCode::OK, Json(response))
}

/// GET /api/research
pub(crate) async fn handle_list_research(State(state): State<Arc<AppState>>) -> Response {
    match state.desk.list().await {
        Ok(records) => {
            (StatusCode::OK, Json(serde_json::json!({ "research": records }))).into_response()
        }
        Err(e) => json_error(desk_error_status(&e), &e.to_string()).into_response(),
    }
}

/// GET /api/research/{id}
pub(crate) async fn handle_get_research(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Response {
    match state.desk.get(&id).await {
        Ok(Some(record)) => (StatusCode::OK, Json(record)).into_response(),
        Ok(None) => json_error(
            StatusCode::NOT_FOUND,
            &format!("research '{}' not found", id),
        )
        .into_response(),
        Err(e) => json_error(desk_error_status(&e), &e.to_string()).into_response(),
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct CreateResearchRequest {
    query: String,
    #[serde(default)]
    parent_id: Option<String>,
    #[serde(default)]
    file_name: Option<String>,
    /// Inline document text, treated as an uploaded file.
    #[serde(default)]
    file_text: Option<String>,
}

/// POST /api/research
pub(crate) async fn handle_create_research(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreateResearchRequest>,
) -> Response {
    let upload = body.file_text.map(|text| {
        let name = body
            .file_name
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| DEFAULT_UPLOAD_NAME.to_string());
        UploadedFile::new(name, text)
    });
    let submission = Submission {
        query: body.query,
        parent_id: body.parent_id,
        upload,
    };

    let result = match state.desk.submit(submission).await {
        Ok(id) => state.desk.get(&id).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(Some(record)) => (StatusCode::CREATED, Json(record)).into_response(),
        Ok(None) => json_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "research record missing after run",
        )
        .into_response(),
        Err(e) => {
            tracing::error!(error = %e, "research request failed");
            json_error(desk_error_status(&e), &e.to_string()).into_response()
        }
    }
}
