//! Application state shared across request handlers.

use crate::desk::ResearchDesk;

pub(crate) struct AppState {
    /// Research flow over the server's single in-memory store.
    pub(crate) desk: ResearchDesk,
    /// Optional API key for authentication. None = no auth required.
    pub(crate) api_key: Option<String>,
}
