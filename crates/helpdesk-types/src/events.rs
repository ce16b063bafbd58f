//! Audit events posted to the logging channel.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::{ChannelId, SubjectId};

/// Which part of the bot an audit entry comes from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AuditScope {
    Process,
    Onboarding,
    Ticket,
}

impl AuditScope {
    /// Prefix put in front of the entry in the logging channel.
    pub fn prefix(&self) -> &'static str {
        match self {
            Self::Process => "📝",
            Self::Onboarding => "👋",
            Self::Ticket => "🎫",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AuditEvent {
    Startup {
        bot_name: String,
        guild_count: usize,
    },
    MemberJoined {
        subject_id: SubjectId,
        name: String,
        display_name: String,
    },
    TicketOpened {
        subject_id: SubjectId,
        subject_name: String,
        channel_id: ChannelId,
    },
    TicketClosed {
        channel_name: String,
        actor_id: SubjectId,
        actor_name: String,
    },
    TicketEvicted {
        channel_name: String,
    },
    TicketArchived {
        channel_name: String,
    },
    /// The archive category was unavailable, so the channel was deleted.
    TicketDeleted {
        channel_name: String,
    },
    PanelPosted {
        actor_id: SubjectId,
        actor_name: String,
        channel_id: ChannelId,
    },
    HandlerFailed {
        context: String,
        error: String,
    },
}

impl AuditEvent {
    pub fn scope(&self) -> AuditScope {
        match self {
            Self::Startup { .. } | Self::HandlerFailed { .. } => AuditScope::Process,
            Self::MemberJoined { .. } => AuditScope::Onboarding,
            Self::TicketOpened { .. }
            | Self::TicketClosed { .. }
            | Self::TicketEvicted { .. }
            | Self::TicketArchived { .. }
            | Self::TicketDeleted { .. }
            | Self::PanelPosted { .. } => AuditScope::Ticket,
        }
    }
}

impl fmt::Display for AuditEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Startup {
                bot_name,
                guild_count,
            } => write!(f, "🚀 {bot_name} has connected ({guild_count} servers)"),
            Self::MemberJoined {
                name, display_name, ..
            } => write!(f, "@{name} ({display_name}) joined the server"),
            Self::TicketOpened {
                subject_id,
                subject_name,
                channel_id,
            } => write!(
                f,
                "Ticket opened for <@{subject_id}> ({subject_name}) - channel: <#{channel_id}>"
            ),
            Self::TicketClosed {
                channel_name,
                actor_id,
                actor_name,
            } => write!(f, "Ticket #{channel_name} closed by <@{actor_id}> ({actor_name})"),
            Self::TicketEvicted { channel_name } => write!(
                f,
                "Deleted oldest ticket #{channel_name} (archive category full)"
            ),
            Self::TicketArchived { channel_name } => {
                write!(f, "Ticket #{channel_name} moved to the closed category")
            }
            Self::TicketDeleted { channel_name } => write!(
                f,
                "Ticket #{channel_name} deleted (closed category unavailable)"
            ),
            Self::PanelPosted {
                actor_id,
                actor_name,
                channel_id,
            } => write!(
                f,
                "Ticket panel posted by <@{actor_id}> ({actor_name}) in <#{channel_id}>"
            ),
            Self::HandlerFailed { context, error } => write!(f, "Error in {context}: {error}"),
        }
    }
}
