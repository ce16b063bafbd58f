//! Ticket model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{ChannelId, SubjectId};

/// Every ticket channel name starts with this.
pub const TICKET_CHANNEL_PREFIX: &str = "ticket-";

/// Maximum number of channels the archive category holds.
pub const ARCHIVE_CAPACITY: usize = 50;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TicketState {
    Open,
    Closing,
    Archived,
}

/// A support conversation backed by a guild text channel.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Ticket {
    pub subject_id: SubjectId,
    pub channel_id: ChannelId,
    pub state: TicketState,
    pub created_at: DateTime<Utc>,
}

impl Ticket {
    pub fn open(subject_id: SubjectId, channel_id: ChannelId, created_at: DateTime<Utc>) -> Self {
        Self {
            subject_id,
            channel_id,
            state: TicketState::Open,
            created_at,
        }
    }

    /// Open or Closing.
    pub fn is_active(&self) -> bool {
        matches!(self.state, TicketState::Open | TicketState::Closing)
    }
}

/// Channel name for a member's ticket: `ticket-<name>`, lowercased, spaces dashed.
pub fn ticket_channel_name(username: &str) -> String {
    format!(
        "{}{}",
        TICKET_CHANNEL_PREFIX,
        username.to_lowercase().replace(' ', "-")
    )
}
