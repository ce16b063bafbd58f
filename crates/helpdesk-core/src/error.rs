//! Error types for helpdesk-core

use helpdesk_types::errors::ErrorCategory;
use helpdesk_types::ChannelId;
use thiserror::Error;

/// Result type alias
pub type Result<T, E = TicketError> = std::result::Result<T, E>;

/// A failed call to the chat platform.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{message} ({kind:?})")]
pub struct GatewayError {
    pub kind: ErrorCategory,
    pub message: String,
}

impl GatewayError {
    pub fn new(kind: ErrorCategory, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(ErrorCategory::PermissionDenied, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorCategory::NotFound, message)
    }

    pub fn is_not_found(&self) -> bool {
        self.kind == ErrorCategory::NotFound
    }

    pub fn is_forbidden(&self) -> bool {
        self.kind == ErrorCategory::PermissionDenied
    }

    /// The recipient refused or no longer exists; DM sends are not retried.
    pub fn is_delivery_failure(&self) -> bool {
        matches!(
            self.kind,
            ErrorCategory::DeliveryRejected | ErrorCategory::NotFound
        )
    }
}

/// Errors surfaced by the ticket flows.
#[derive(Debug, Error)]
pub enum TicketError {
    #[error("actor is not allowed to close this ticket")]
    PermissionDenied,

    #[error("{0} is not configured")]
    NotConfigured(&'static str),

    #[error("ticket is already closing")]
    AlreadyClosing,

    #[error("ticket is already closed")]
    AlreadyClosed,

    #[error("channel {0} no longer exists")]
    ResourceMissing(ChannelId),

    #[error("gateway error: {0}")]
    Gateway(#[from] GatewayError),
}
