//! Error types for the cloud download engine

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CloudError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A single configuration entry was skipped; the rest of the run continues
    #[error("Unsupported format '{format}' for {report} reports, entry skipped")]
    UnsupportedFormat { report: String, format: String },

    #[error("Authentication failed: {description}")]
    Authentication { description: String },

    #[error("HTTP request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Service responded with error (code {status_code}, status {status}): {body}")]
    Service {
        status_code: u16,
        status: String,
        body: String,
    },

    #[error("Failed to decode service response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("File query returned errors: {}", messages.join("; "))]
    Query { messages: Vec<String> },

    #[error("Failed to persist {}: {source}", path.display())]
    Persistence {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl CloudError {
    pub fn config(message: impl Into<String>) -> Self {
        CloudError::Configuration(message.into())
    }

    /// Setup-phase errors halt the whole run.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            CloudError::Configuration(_) | CloudError::Authentication { .. }
        )
    }
}
