//! delve-core: the pure building blocks of a research run.
//!
//! - [`cost`] -- token pricing against a static table
//! - [`context`] -- labeled context blob for continuation and uploads
//! - [`extract`] -- `.txt` / `.pdf` text extraction and truncation summaries
//! - [`config`] -- layered figment configuration
//!
//! Nothing in this crate performs I/O beyond reading an upload or a config
//! file; storage and agent calls live in `delve-storage` and `delve-engine`.

pub mod config;
pub mod context;
pub mod cost;
pub mod error;
pub mod extract;
pub mod text;

pub use config::{AgentMode, AgentSettings, DelveConfig, SearchApi, ServerSettings};
pub use context::build_context;
pub use cost::{calculate_cost, estimate_cost, ModelPrice};
pub use error::{ConfigError, CostError, ExtractError};
pub use extract::{extract_text_from_file, summarize_file_text, DocumentKind, UploadedFile};
pub use text::truncate_chars;
