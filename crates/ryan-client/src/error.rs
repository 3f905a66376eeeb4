//! Error types for talking to the assistant backend

use ryan_core::Failure;
use thiserror::Error;

/// Result type alias for backend operations
pub type ClientResult<T> = Result<T, ClientError>;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("{0}")]
    Network(#[from] reqwest::Error),

    /// Non-2xx status. `content` is the body's `content` field when present.
    #[error("HTTP {status} {status_text}")]
    Http {
        status: u16,
        status_text: String,
        content: Option<String>,
    },

    #[error("Malformed response: {0}")]
    Malformed(String),

    #[error("Invalid URL: {0}")]
    Url(String),
}

impl ClientError {
    /// Body `content`, or the status text when the body carried none.
    pub fn http_detail(&self) -> Option<&str> {
        match self {
            Self::Http {
                status_text,
                content,
                ..
            } => Some(content.as_deref().unwrap_or(status_text)),
            _ => None,
        }
    }

    pub fn is_http(&self) -> bool {
        matches!(self, Self::Http { .. })
    }

    /// Collapses into the shape the core view models understand.
    pub fn to_failure(&self) -> Failure {
        match self.http_detail() {
            Some(detail) => Failure::Http(detail.to_string()),
            None => Failure::Network(self.to_string()),
        }
    }
}
