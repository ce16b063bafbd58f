//! Snapshots of the platform entities the bot works with.
//!
//! Ids are the raw platform snowflakes, as everywhere else in the workspace.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::controls::ControlSpec;
use crate::ticket::TICKET_CHANNEL_PREFIX;

pub type SubjectId = u64;
pub type GuildId = u64;
pub type ChannelId = u64;
pub type RoleId = u64;
pub type MessageId = u64;

/// A guild member, looked up live per operation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Subject {
    pub id: SubjectId,
    /// Account name (unique handle)
    pub name: String,
    /// Nickname, global name or account name, whichever the guild shows
    pub display_name: String,
    pub bot: bool,
    #[serde(default)]
    pub roles: Vec<RoleId>,
}

impl Subject {
    pub fn mention(&self) -> String {
        format!("<@{}>", self.id)
    }
}

/// The member who activated a control or invoked a command.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Actor {
    pub subject: Subject,
    pub guild_id: GuildId,
    /// Whether the member holds the administrator permission in the guild
    pub administrator: bool,
}

impl Actor {
    /// Role id 0 means "not configured" and never matches.
    pub fn has_role(&self, role_id: RoleId) -> bool {
        role_id != 0 && self.subject.roles.contains(&role_id)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ChannelKind {
    Text,
    Category,
    Voice,
    Other,
}

/// A guild channel as seen by the bot.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChannelInfo {
    pub id: ChannelId,
    pub guild_id: GuildId,
    pub name: String,
    pub kind: ChannelKind,
    /// Category the channel sits in
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<ChannelId>,
    pub created_at: DateTime<Utc>,
    /// Members holding an individual (non-role) access grant on the channel
    #[serde(default)]
    pub member_grants: Vec<SubjectId>,
}

impl ChannelInfo {
    pub fn mention(&self) -> String {
        format!("<#{}>", self.id)
    }

    /// Text channel following the `ticket-<name>` naming convention.
    pub fn is_ticket(&self) -> bool {
        self.kind == ChannelKind::Text && self.name.starts_with(TICKET_CHANNEL_PREFIX)
    }

    pub fn is_in(&self, category_id: ChannelId) -> bool {
        category_id != 0 && self.parent_id == Some(category_id)
    }
}

/// Who an access grant applies to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(tag = "type", content = "id", rename_all = "snake_case")]
pub enum Principal {
    Role(RoleId),
    Member(SubjectId),
}

/// Access levels used on ticket channels.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Access {
    /// Channel hidden (view denied)
    Hidden,
    /// View, send, attach files and embed links
    Participant,
    /// View, send and manage the channel
    Bot,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct AccessGrant {
    pub principal: Principal,
    pub access: Access,
}

impl AccessGrant {
    pub fn new(principal: Principal, access: Access) -> Self {
        Self { principal, access }
    }
}

/// Where an outgoing message goes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "id", rename_all = "snake_case")]
pub enum Target {
    Channel(ChannelId),
    /// Direct message to a member
    Subject(SubjectId),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OutgoingMessage {
    pub content: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub controls: Vec<ControlSpec>,
}

impl OutgoingMessage {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            controls: Vec::new(),
        }
    }

    pub fn with_control(mut self, control: ControlSpec) -> Self {
        self.controls.push(control);
        self
    }
}

/// Parameters for creating a guild text channel.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NewChannel {
    pub guild_id: GuildId,
    pub name: String,
    pub parent_id: ChannelId,
    pub grants: Vec<AccessGrant>,
    pub topic: String,
}

/// A message from channel history, reduced to what recovery needs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RecentMessage {
    pub id: MessageId,
    pub channel_id: ChannelId,
    /// Custom ids of every interactive control attached to the message
    #[serde(default)]
    pub control_ids: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn channel(name: &str, kind: ChannelKind, parent: Option<u64>) -> ChannelInfo {
        ChannelInfo {
            id: 10,
            guild_id: 1,
            name: name.to_string(),
            kind,
            parent_id: parent,
            created_at: DateTime::<Utc>::default(),
            member_grants: vec![],
        }
    }

    #[test]
    fn test_ticket_channel_detection() {
        assert!(channel("ticket-alice", ChannelKind::Text, None).is_ticket());
        assert!(!channel("general", ChannelKind::Text, None).is_ticket());
        assert!(!channel("ticket-alice", ChannelKind::Voice, None).is_ticket());
    }

    #[test]
    fn test_is_in_ignores_unconfigured_category() {
        let c = channel("ticket-bob", ChannelKind::Text, Some(5));
        assert!(c.is_in(5));
        assert!(!c.is_in(6));
        assert!(!channel("x", ChannelKind::Text, None).is_in(0));
    }

    #[test]
    fn test_actor_role_zero_never_matches() {
        let actor = Actor {
            subject: Subject {
                id: 1,
                name: "a".into(),
                display_name: "A".into(),
                bot: false,
                roles: vec![0, 7],
            },
            guild_id: 1,
            administrator: false,
        };
        assert!(actor.has_role(7));
        assert!(!actor.has_role(0));
    }

    #[test]
    fn test_mentions() {
        let c = channel("ticket-x", ChannelKind::Text, None);
        assert_eq!(c.mention(), "<#10>");
    }

    #[test]
    fn test_target_serde_shape() {
        let json = serde_json::to_value(Target::Subject(42)).unwrap();
        assert_eq!(json, serde_json::json!({"type": "subject", "id": 42}));
    }
}
