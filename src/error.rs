//! Error taxonomy shared by the transport, the managers and the client.

use std::time::Duration;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, JupyterServerError>;

#[derive(Debug, Error)]
pub enum JupyterServerError {
    /// The server answered, but not with something this client can use
    /// (missing `Location` header, undecodable body).
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Client-side deadline. The remote execution may still be running.
    #[error("Execution timed out after {0:?}")]
    Timeout(Duration),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Authentication failed ({status}): {message}")]
    Authentication { status: u16, message: String },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Server error ({status}): {message}")]
    Server { status: u16, message: String },

    #[error("Configuration error: {0}")]
    Config(String),
}

impl JupyterServerError {
    /// Map a non-success HTTP status and its body text to an error.
    pub fn from_status(status: u16, url: &str, body: String) -> Self {
        let message = if body.trim().is_empty() {
            url.to_string()
        } else {
            format!("{} - {}", url, body.trim())
        };
        match status {
            401 | 403 => Self::Authentication { status, message },
            404 => Self::NotFound(message),
            _ => Self::Server { status, message },
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// HTTP status carried by the error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Authentication { status, .. } | Self::Server { status, .. } => Some(*status),
            Self::NotFound(_) => Some(404),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for JupyterServerError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            return Self::InvalidResponse(e.to_string());
        }
        if let Some(status) = e.status() {
            return Self::from_status(status.as_u16(), e.url().map(|u| u.as_str()).unwrap_or(""), String::new());
        }
        if e.is_builder() {
            return Self::Config(e.to_string());
        }
        Self::Connection(e.to_string())
    }
}

impl From<serde_json::Error> for JupyterServerError {
    fn from(e: serde_json::Error) -> Self {
        Self::InvalidResponse(e.to_string())
    }
}
