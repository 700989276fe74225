//! The ways a dispatch can fail.

use thiserror::Error;

use crate::client::ClientError;

/// Every failure aborts the dispatch; nothing is retried.
///
/// All variants except [`SendError::DeliveryFailed`] are raised before any
/// connection is opened.
#[derive(Debug, Error)]
pub enum SendError {
    /// No relay address was configured.
    #[error("no relay address configured")]
    MissingEndpoint,

    /// No recipient was configured.
    #[error("no recipient configured")]
    MissingRecipient,

    /// The `from` field isn't a single mailbox.
    #[error("invalid from address '{address}': {reason}")]
    InvalidAddress { address: String, reason: String },

    /// The relay address doesn't split into a host and a port.
    #[error("invalid relay address '{address}': {reason}")]
    InvalidEndpoint { address: String, reason: String },

    /// Connecting, authenticating or submitting failed.
    #[error("delivery failed: {0}")]
    DeliveryFailed(#[from] ClientError),
}

impl SendError {
    /// Whether the failure happened on the wire rather than in validation.
    #[must_use]
    pub const fn is_delivery(&self) -> bool {
        matches!(self, Self::DeliveryFailed(_))
    }
}
