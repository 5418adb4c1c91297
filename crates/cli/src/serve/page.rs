//! Browser front-end: `GET /` renders the research page, `POST /research`
//! accepts the multipart form and re-renders with the new active record.

use std::fmt::Write as _;
use std::sync::Arc;

use axum::extract::{Multipart, Query, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use delve_core::UploadedFile;
use delve_storage::ResearchRecord;
use pulldown_cmark::{html, Event, Options, Parser};
use serde::Deserialize;

use super::desk_error_status;
use super::state::AppState;
use crate::desk::{DeskError, HistoryEntry, Submission, START_FRESH_LABEL};
use crate::render::NO_SOURCES;

#[derive(Debug, Default, Deserialize)]
pub(crate) struct PageParams {
    parent: Option<String>,
}

/// GET /
pub(crate) async fn handle_index(
    State(state): State<Arc<AppState>>,
    Query(params): Query<PageParams>,
) -> Response {
    render(&state, params.parent.as_deref(), None, StatusCode::OK).await
}

/// POST /research
pub(crate) async fn handle_submit(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Response {
    let submission = match read_form(multipart).await {
        Ok(s) => s,
        Err(message) => {
            return render(&state, None, Some(&message), StatusCode::BAD_REQUEST).await;
        }
    };
    let parent = submission.parent_id.clone();

    match state.desk.submit(submission).await {
        Ok(id) => {
            tracing::info!(%id, "research submitted from page");
            render(&state, parent.as_deref(), None, StatusCode::OK).await
        }
        Err(e) => {
            let status = desk_error_status(&e);
            let message = match &e {
                DeskError::EmptyQuery => "Please enter a research question.".to_string(),
                other => format!("Research failed: {other}"),
            };
            render(&state, parent.as_deref(), Some(&message), status).await
        }
    }
}

/// Collect `query`, `parent_id` and the optional `file` field.
async fn read_form(mut multipart: Multipart) -> Result<Submission, String> {
    let mut submission = Submission::default();
    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => return Err(format!("invalid form: {e}")),
        };
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "query" => {
                submission.query = field.text().await.map_err(|e| e.to_string())?;
            }
            "parent_id" => {
                let parent = field.text().await.map_err(|e| e.to_string())?;
                submission.parent_id = Some(parent).filter(|p| !p.is_empty());
            }
            "file" => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let bytes = field.bytes().await.map_err(|e| e.to_string())?;
                // Browsers send an empty part when no file was chosen.
                if !file_name.is_empty() && !bytes.is_empty() {
                    submission.upload = Some(UploadedFile::new(file_name, bytes.to_vec()));
                }
            }
            _ => {}
        }
    }
    Ok(submission)
}

async fn render(
    state: &AppState,
    parent: Option<&str>,
    error: Option<&str>,
    status: StatusCode,
) -> Response {
    let history = match state.desk.history().await {
        Ok(h) => h,
        Err(e) => return page_error(&e),
    };
    let record = match state.desk.displayed(parent).await {
        Ok(r) => r,
        Err(e) => return page_error(&e),
    };
    let body = page_html(&history, parent, record.as_ref(), error);
    (status, Html(body)).into_response()
}

fn page_error(e: &DeskError) -> Response {
    tracing::error!(error = %e, "failed to render page");
    let body = format!(
        "<!DOCTYPE html><html><body><p>{}</p></body></html>",
        escape_html(&e.to_string())
    );
    (desk_error_status(e), Html(body)).into_response()
}

pub(crate) fn page_html(
    history: &[HistoryEntry],
    parent: Option<&str>,
    record: Option<&ResearchRecord>,
    error: Option<&str>,
) -> String {
    let mut out = String::new();
    out.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n");
    out.push_str("<title>Deep Research</title>\n");
    out.push_str("<style>\n");
    out.push_str("body { font-family: -apple-system, sans-serif; max-width: 960px; margin: 0 auto; padding: 20px; }\n");
    out.push_str(".error { color: #b00020; }\n");
    out.push_str(".hint { color: #666; font-size: 0.9em; }\n");
    out.push_str(".usage td { padding: 2px 12px 2px 0; }\n");
    out.push_str("</style>\n</head>\n<body>\n");
    out.push_str("<h1>Deep Research</h1>\n");

    if let Some(error) = error {
        let _ = writeln!(out, "<p class=\"error\">{}</p>", escape_html(error));
    }

    out.push_str("<form method=\"post\" action=\"/research\" enctype=\"multipart/form-data\">\n");
    out.push_str("<label>Continue from previous research<br>\n<select name=\"parent_id\">\n");
    let _ = writeln!(
        out,
        "<option value=\"\"{}>{}</option>",
        if parent.is_none() { " selected" } else { "" },
        START_FRESH_LABEL
    );
    for entry in history {
        let selected = parent == Some(entry.id.as_str());
        let _ = writeln!(
            out,
            "<option value=\"{}\"{}>{}</option>",
            escape_html(&entry.id),
            if selected { " selected" } else { "" },
            escape_html(&entry.label)
        );
    }
    out.push_str("</select></label>\n<br><br>\n");
    out.push_str("<label>Research question<br>\n<input type=\"text\" name=\"query\" size=\"80\"></label>\n<br><br>\n");
    out.push_str("<label>Context document (.pdf, .txt)<br>\n<input type=\"file\" name=\"file\" accept=\".pdf,.txt\"></label>\n<br><br>\n");
    out.push_str("<button type=\"submit\">Run Research</button>\n</form>\n");

    if let Some(record) = record {
        out.push_str("<hr>\n");
        record_html(&mut out, record);
    }

    out.push_str("</body>\n</html>\n");
    out
}

fn record_html(out: &mut String, record: &ResearchRecord) {
    let _ = writeln!(out, "<h2>{}</h2>", escape_html(&record.query));
    if let Some(parent) = &record.parent_id {
        let _ = writeln!(
            out,
            "<p class=\"hint\">Continued from research ID: {}</p>",
            escape_html(parent)
        );
    }

    out.push_str("<h3>Report</h3>\n<div class=\"report\">\n");
    out.push_str(&markdown_to_html(record.report.as_deref().unwrap_or_default()));
    out.push_str("</div>\n");

    if let Some(summary) = &record.summary {
        let _ = writeln!(out, "<h3>Summary</h3>\n<p>{}</p>", escape_html(summary));
    }

    out.push_str("<h3>Usage</h3>\n<table class=\"usage\">\n");
    let _ = writeln!(
        out,
        "<tr><td>Input Tokens</td><td>{}</td></tr>",
        record.tokens.input_or_zero()
    );
    let _ = writeln!(
        out,
        "<tr><td>Output Tokens</td><td>{}</td></tr>",
        record.tokens.output_or_zero()
    );
    out.push_str("</table>\n");
    let _ = writeln!(out, "<p>Estimated Cost: ${}</p>", record.cost);

    out.push_str("<h3>Sources</h3>\n");
    if record.sources.is_empty() {
        let _ = writeln!(out, "<p>{NO_SOURCES}</p>");
    } else {
        out.push_str("<ul>\n");
        for source in &record.sources {
            let _ = writeln!(out, "<li>{}</li>", escape_html(source));
        }
        out.push_str("</ul>\n");
    }

    if let Some(trace_id) = &record.trace_id {
        let _ = writeln!(
            out,
            "<p class=\"hint\">Trace ID: {}</p>",
            escape_html(trace_id)
        );
    }
}

/// Render Markdown, showing any raw HTML in the source as text.
fn markdown_to_html(markdown: &str) -> String {
    let options = Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH;
    let parser = Parser::new_ext(markdown, options).map(|event| match event {
        Event::Html(raw) | Event::InlineHtml(raw) => Event::Text(raw),
        other => other,
    });
    let mut out = String::new();
    html::push_html(&mut out, parser);
    out
}

/// Escape HTML special characters.
fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}
