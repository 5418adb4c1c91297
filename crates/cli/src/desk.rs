//! The presentation flow shared by the shell and the HTTP server.
//!
//! A desk owns the engine and remembers the "active" record: the result of
//! the most recent run. What gets displayed is the active record if there is
//! one, otherwise the selected continuation parent, otherwise nothing.

use delve_core::{
    extract_text_from_file, summarize_file_text, truncate_chars, ExtractError, UploadedFile,
};
use delve_engine::{EngineError, ResearchEngine, ResearchRequest};
use delve_storage::{ResearchRecord, StorageError};
use tokio::sync::RwLock;

/// Characters of a query shown in the history picker.
pub(crate) const HISTORY_LABEL_CHARS: usize = 40;

/// Label of the "no parent" history entry.
pub(crate) const START_FRESH_LABEL: &str = "None (Start fresh)";

#[derive(Debug, thiserror::Error)]
pub(crate) enum DeskError {
    #[error("enter a research question first")]
    EmptyQuery,

    #[error(transparent)]
    Extract(#[from] ExtractError),

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// One entry of the continuation picker.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub(crate) struct HistoryEntry {
    pub(crate) id: String,
    pub(crate) label: String,
}

/// A user's "run research" request.
#[derive(Debug, Clone, Default)]
pub(crate) struct Submission {
    pub(crate) query: String,
    pub(crate) parent_id: Option<String>,
    pub(crate) upload: Option<UploadedFile>,
}

pub(crate) struct ResearchDesk {
    engine: ResearchEngine,
    active: RwLock<Option<String>>,
}

impl ResearchDesk {
    pub(crate) fn new(engine: ResearchEngine) -> Self {
        Self {
            engine,
            active: RwLock::new(None),
        }
    }

    pub(crate) fn engine(&self) -> &ResearchEngine {
        &self.engine
    }

    /// Every stored run as (id, truncated query), oldest first.
    pub(crate) async fn history(&self) -> Result<Vec<HistoryEntry>, DeskError> {
        let records = self.engine.storage().list().await?;
        Ok(records
            .into_iter()
            .map(|r| HistoryEntry {
                label: truncate_label(&r.query, HISTORY_LABEL_CHARS),
                id: r.id,
            })
            .collect())
    }

    /// Extract the upload, look up the parent summary, run, and mark the new
    /// record active.
    pub(crate) async fn submit(&self, submission: Submission) -> Result<String, DeskError> {
        if submission.query.trim().is_empty() {
            return Err(DeskError::EmptyQuery);
        }

        let file_summary = match &submission.upload {
            Some(upload) => {
                let text = extract_text_from_file(upload)?;
                tracing::debug!(file = %upload.name, chars = text.chars().count(), "extracted upload");
                Some(summarize_file_text(&text))
            }
            None => None,
        };

        let id = match submission.parent_id.filter(|p| !p.is_empty()) {
            Some(parent_id) => {
                self.engine
                    .continue_from(&parent_id, submission.query, file_summary)
                    .await?
            }
            None => {
                let mut request = ResearchRequest::new(submission.query);
                request.file_summary = file_summary;
                self.engine.run(request).await?
            }
        };
        *self.active.write().await = Some(id.clone());
        Ok(id)
    }

    pub(crate) async fn active_id(&self) -> Option<String> {
        self.active.read().await.clone()
    }

    /// The record to show: active run first, then the selected parent.
    pub(crate) async fn displayed(
        &self,
        selected_parent: Option<&str>,
    ) -> Result<Option<ResearchRecord>, DeskError> {
        let storage = self.engine.storage();
        if let Some(active) = self.active_id().await {
            return Ok(storage.get(&active).await?);
        }
        match selected_parent.filter(|p| !p.is_empty()) {
            Some(parent) => Ok(storage.get(parent).await?),
            None => Ok(None),
        }
    }

    pub(crate) async fn get(&self, id: &str) -> Result<Option<ResearchRecord>, DeskError> {
        Ok(self.engine.storage().get(id).await?)
    }

    pub(crate) async fn list(&self) -> Result<Vec<ResearchRecord>, DeskError> {
        Ok(self.engine.storage().list().await?)
    }

    /// Forget the active record so the selected parent is shown again.
    pub(crate) async fn clear_active(&self) {
        *self.active.write().await = None;
    }
}

/// History label: the first `max` characters of the query followed by `...`.
pub(crate) fn truncate_label(query: &str, max: usize) -> String {
    format!("{}...", truncate_chars(query, max))
}
