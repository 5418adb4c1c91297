/// Errors from the cost calculator.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CostError {
    /// The model has no entry in the price table.
    #[error("no pricing known for model '{model}'")]
    UnknownModel { model: String },

    /// Token counts too large to price without overflowing a Decimal.
    #[error("cost overflow for model '{model}'")]
    Overflow { model: String },
}

/// Errors from uploaded-document text extraction.
#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    /// The file extension is neither `.txt` nor `.pdf`.
    #[error("unsupported file format: '{name}' (expected .txt or .pdf)")]
    UnsupportedFormat { name: String },

    /// A `.txt` upload whose bytes are not valid UTF-8.
    #[error("'{name}' is not valid UTF-8 text: {source}")]
    InvalidUtf8 {
        name: String,
        #[source]
        source: std::string::FromUtf8Error,
    },

    /// The PDF document itself could not be parsed.
    #[error("failed to parse PDF '{name}': {message}")]
    Pdf { name: String, message: String },

    /// Reading the upload from disk failed.
    #[error("failed to read '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Configuration loading errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Figment extraction or merge error.
    #[error("configuration error: {0}")]
    Figment(#[from] Box<figment::Error>),

    /// A configuration field has an invalid value.
    #[error("invalid configuration value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        ConfigError::Figment(Box::new(err))
    }
}
