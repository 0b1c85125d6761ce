// Error types for ghdash.
// Covers upstream GitHub failures, payload decoding, and configuration errors.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DashError {
    #[error("HTTP transport error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("GitHub API request failed ({status} {reason}): {url}")]
    Upstream {
        url: String,
        status: u16,
        reason: String,
    },

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Rate limit exceeded, resets at {reset_at}")]
    RateLimited { reset_at: String },

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to decode content: {0}")]
    Decode(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

impl DashError {
    /// Upstream HTTP status carried by this error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            DashError::Upstream { status, .. } => Some(*status),
            DashError::NotFound(_) => Some(404),
            DashError::RateLimited { .. } => Some(403),
            DashError::Http(err) => err.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Whether the upstream reported the resource as missing.
    pub fn is_not_found(&self) -> bool {
        matches!(self, DashError::NotFound(_))
    }
}

pub type Result<T> = std::result::Result<T, DashError>;
