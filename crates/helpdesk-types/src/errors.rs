//! Platform API error classification.
//!
//! Maps the platform's JSON error codes that matter to the ticket and
//! onboarding flows onto a small set of categories.

use serde::{Deserialize, Serialize};

/// High-level category of a platform API error.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Rate limit hit.
    RateLimit,
    /// Channel, member, role or message no longer exists.
    NotFound,
    /// The bot lacks a permission for the action.
    PermissionDenied,
    /// A direct message was refused by the recipient.
    DeliveryRejected,
    /// Network or I/O error (transient).
    Network,
    /// Unknown or uncategorised error.
    Unknown,
}

/// Platform error code (subset relevant to the bot).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ApiErrorCode {
    /// 10003
    UnknownChannel,
    /// 10004
    UnknownGuild,
    /// 10007
    UnknownMember,
    /// 10008
    UnknownMessage,
    /// 10011
    UnknownRole,
    /// 10013
    UnknownUser,
    /// 50001
    MissingAccess,
    /// 50013
    MissingPermissions,
    /// 50007 - recipient has direct messages disabled or blocked the bot
    CannotSendToUser,
    /// HTTP 429
    RateLimited,
    /// 30013 - maximum number of guild channels reached
    MaxChannelsReached,
    /// Client-side network failure
    NetworkError,
    Unknown,
}

impl ApiErrorCode {
    pub fn from_raw(code: u32) -> Self {
        match code {
            10003 => Self::UnknownChannel,
            10004 => Self::UnknownGuild,
            10007 => Self::UnknownMember,
            10008 => Self::UnknownMessage,
            10011 => Self::UnknownRole,
            10013 => Self::UnknownUser,
            30013 => Self::MaxChannelsReached,
            50001 => Self::MissingAccess,
            50007 => Self::CannotSendToUser,
            50013 => Self::MissingPermissions,
            _ => Self::Unknown,
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::UnknownChannel
            | Self::UnknownGuild
            | Self::UnknownMember
            | Self::UnknownMessage
            | Self::UnknownRole
            | Self::UnknownUser => ErrorCategory::NotFound,
            Self::MissingAccess | Self::MissingPermissions => ErrorCategory::PermissionDenied,
            Self::CannotSendToUser => ErrorCategory::DeliveryRejected,
            Self::RateLimited => ErrorCategory::RateLimit,
            Self::NetworkError => ErrorCategory::Network,
            Self::MaxChannelsReached | Self::Unknown => ErrorCategory::Unknown,
        }
    }
}
