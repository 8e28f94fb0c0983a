//! Error types for the webhook server

use thiserror::Error;

/// Errors raised while starting or configuring the webhook server
#[derive(Debug, Error)]
pub enum WebhookError {
    #[error("Failed to bind webhook listener on {addr}: {reason}")]
    Bind { addr: String, reason: String },

    #[error("Failed to create webhook runtime: {0}")]
    Runtime(String),

    #[error("Webhook server thread exited before it was ready")]
    NotReady,

    #[error("Invalid API user entry '{0}', expected user:password")]
    InvalidUsers(String),
}

/// Reasons an incoming CloudEvent envelope is refused
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EnvelopeError {
    #[error("Failed to decode CloudEvent JSON: {0}")]
    InvalidJson(String),

    #[error("Missing required attribute '{0}'")]
    MissingAttribute(&'static str),

    #[error("Unsupported specversion '{0}'")]
    UnsupportedSpecVersion(String),

    #[error("Invalid time attribute '{0}'")]
    InvalidTime(String),

    #[error("CRID '{0}' is not a valid CRID for this station")]
    InvalidCrid(String),

    #[error("Invalid data attribute: {0}")]
    InvalidData(String),
}
