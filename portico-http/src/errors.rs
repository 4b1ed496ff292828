//! Outbound HTTP error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum HttpError {
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Provider returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Response body is malformed: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("Webhook signature verification failed")]
    InvalidSignature,
}

impl HttpError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, HttpError::Request(err) if err.is_timeout())
    }
}
