use crate::store::RecipientId;
use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Diagnostic, Debug)]
pub enum StorageError {
    #[error("recipient {0} is not registered")]
    #[diagnostic(help("send /start first"))]
    UnknownRecipient(RecipientId),

    #[error("could not access {path}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed data in {path}")]
    Format {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Failure of a single send; never aborts a broadcast.
#[derive(Error, Diagnostic, Debug, Clone, PartialEq, Eq)]
#[error("delivery to {recipient} failed: {reason}")]
pub struct DeliveryError {
    pub recipient: RecipientId,
    pub reason: String,
}

#[derive(Error, Diagnostic, Debug, Clone, PartialEq, Eq)]
#[error("{0} is not an administrator")]
pub struct AuthorizationError(pub RecipientId);
