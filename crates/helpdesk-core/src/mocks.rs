//! In-memory doubles for unit testing without a live connection.
//!
//! Enabled with the `test-support` feature:
//!
//! ```toml
//! [dev-dependencies]
//! helpdesk-core = { path = "...", features = ["test-support"] }
//! ```

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Utc};
use helpdesk_types::errors::ErrorCategory;
use helpdesk_types::{
    Access, ChannelId, ChannelInfo, ChannelKind, GuildId, MessageId, NewChannel, OutgoingMessage,
    Principal, RecentMessage, RoleId, Subject, SubjectId, Target,
};

use crate::clock::Clock;
use crate::error::GatewayError;
use crate::traits::Gateway;

/// Epoch the mock derives channel creation times from.
pub const BASE_TIMESTAMP: i64 = 1_700_000_000;

/// Creation time of a mock channel with this id: one second per id step.
pub fn created_at_for(id: ChannelId) -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp(BASE_TIMESTAMP + id as i64, 0).unwrap_or_default()
}

// ── MockGateway ───────────────────────────────────────────────────────────────

/// A successful state-changing call, in call order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayCall {
    CreateTextChannel(NewChannel),
    MoveChannel {
        channel_id: ChannelId,
        category_id: ChannelId,
    },
    DeleteChannel(ChannelId),
    SetAccessGrant {
        channel_id: ChannelId,
        principal: Principal,
        access: Option<Access>,
    },
    SendMessage {
        target: Target,
        message: OutgoingMessage,
    },
}

#[derive(Default)]
struct MockState {
    bot_id: SubjectId,
    channels: BTreeMap<ChannelId, ChannelInfo>,
    members: HashMap<(GuildId, SubjectId), Subject>,
    roles: HashSet<(GuildId, RoleId)>,
    /// Oldest first
    history: HashMap<ChannelId, Vec<RecentMessage>>,
    unreadable: HashSet<ChannelId>,
    dm_blocked: HashSet<SubjectId>,
    dm_unreachable: HashSet<SubjectId>,
    failing_channels: HashSet<ChannelId>,
    deny_channel_edits: bool,
    calls: Vec<GatewayCall>,
    history_reads: Vec<(ChannelId, u8)>,
    next_id: u64,
}

/// One guild's worth of channels, members and roles, held in memory.
///
/// Records every successful mutation; failure switches simulate missing
/// bot permissions, blocked DMs and unreadable channels.
#[derive(Clone)]
pub struct MockGateway {
    state: Arc<Mutex<MockState>>,
}

impl MockGateway {
    pub fn new(bot_id: SubjectId) -> Self {
        Self {
            state: Arc::new(Mutex::new(MockState {
                bot_id,
                next_id: 10_000,
                ..MockState::default()
            })),
        }
    }

    pub fn add_channel(&self, channel: ChannelInfo) {
        self.state.lock().unwrap().channels.insert(channel.id, channel);
    }

    pub fn add_category(&self, guild_id: GuildId, id: ChannelId, name: &str) -> ChannelInfo {
        let channel = ChannelInfo {
            id,
            guild_id,
            name: name.to_string(),
            kind: ChannelKind::Category,
            parent_id: None,
            created_at: created_at_for(id),
            member_grants: vec![],
        };
        self.add_channel(channel.clone());
        channel
    }

    pub fn add_text_channel(
        &self,
        guild_id: GuildId,
        id: ChannelId,
        name: &str,
        parent_id: Option<ChannelId>,
    ) -> ChannelInfo {
        let channel = ChannelInfo {
            id,
            guild_id,
            name: name.to_string(),
            kind: ChannelKind::Text,
            parent_id,
            created_at: created_at_for(id),
            member_grants: vec![],
        };
        self.add_channel(channel.clone());
        channel
    }

    pub fn grant_member(&self, channel_id: ChannelId, subject_id: SubjectId) {
        if let Some(c) = self.state.lock().unwrap().channels.get_mut(&channel_id) {
            if !c.member_grants.contains(&subject_id) {
                c.member_grants.push(subject_id);
            }
        }
    }

    pub fn add_member(&self, guild_id: GuildId, subject: Subject) {
        self.state
            .lock()
            .unwrap()
            .members
            .insert((guild_id, subject.id), subject);
    }

    pub fn remove_member(&self, guild_id: GuildId, subject_id: SubjectId) {
        self.state
            .lock()
            .unwrap()
            .members
            .remove(&(guild_id, subject_id));
    }

    pub fn add_role(&self, guild_id: GuildId, role_id: RoleId) {
        self.state.lock().unwrap().roles.insert((guild_id, role_id));
    }

    /// Append a message carrying the given control custom ids.
    pub fn push_history(&self, channel_id: ChannelId, control_ids: &[&str]) {
        let mut state = self.state.lock().unwrap();
        state.next_id += 1;
        let id = state.next_id;
        state.history.entry(channel_id).or_default().push(RecentMessage {
            id,
            channel_id,
            control_ids: control_ids.iter().map(|s| s.to_string()).collect(),
        });
    }

    /// Reading history of this channel fails with a permission error.
    pub fn make_unreadable(&self, channel_id: ChannelId) {
        self.state.lock().unwrap().unreadable.insert(channel_id);
    }

    /// Direct messages to this member are rejected.
    pub fn block_dms(&self, subject_id: SubjectId) {
        self.state.lock().unwrap().dm_blocked.insert(subject_id);
    }

    /// Direct messages to this member fail with a network error.
    pub fn break_dms(&self, subject_id: SubjectId) {
        self.state.lock().unwrap().dm_unreachable.insert(subject_id);
    }

    /// Sends to this channel fail with a permission error.
    pub fn fail_channel_sends(&self, channel_id: ChannelId) {
        self.state.lock().unwrap().failing_channels.insert(channel_id);
    }

    /// Grant changes, moves and deletions fail with a permission error.
    pub fn deny_channel_edits(&self) {
        self.state.lock().unwrap().deny_channel_edits = true;
    }

    pub fn channel_snapshot(&self, channel_id: ChannelId) -> Option<ChannelInfo> {
        self.state.lock().unwrap().channels.get(&channel_id).cloned()
    }

    pub fn children_of(&self, category_id: ChannelId) -> Vec<ChannelInfo> {
        self.state
            .lock()
            .unwrap()
            .channels
            .values()
            .filter(|c| c.parent_id == Some(category_id))
            .cloned()
            .collect()
    }

    pub fn calls(&self) -> Vec<GatewayCall> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.state.lock().unwrap().calls.clear();
    }

    pub fn sent_messages(&self) -> Vec<(Target, OutgoingMessage)> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                GatewayCall::SendMessage { target, message } => Some((target, message)),
                _ => None,
            })
            .collect()
    }

    pub fn direct_messages(&self, subject_id: SubjectId) -> Vec<String> {
        self.sent_messages()
            .into_iter()
            .filter(|(t, _)| *t == Target::Subject(subject_id))
            .map(|(_, m)| m.content)
            .collect()
    }

    pub fn created_channels(&self) -> Vec<NewChannel> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                GatewayCall::CreateTextChannel(n) => Some(n),
                _ => None,
            })
            .collect()
    }

    pub fn deleted_channels(&self) -> Vec<ChannelId> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                GatewayCall::DeleteChannel(id) => Some(id),
                _ => None,
            })
            .collect()
    }

    pub fn grant_changes(&self) -> Vec<GatewayCall> {
        self.calls()
            .into_iter()
            .filter(|c| matches!(c, GatewayCall::SetAccessGrant { .. }))
            .collect()
    }

    /// Every `(channel, limit)` history read, in order.
    pub fn history_reads(&self) -> Vec<(ChannelId, u8)> {
        self.state.lock().unwrap().history_reads.clone()
    }

    fn check_edits_allowed(state: &MockState) -> Result<(), GatewayError> {
        if state.deny_channel_edits {
            return Err(GatewayError::forbidden("Missing Permissions"));
        }
        Ok(())
    }
}

impl Gateway for MockGateway {
    fn bot_id(&self) -> SubjectId {
        self.state.lock().unwrap().bot_id
    }

    async fn channel(&self, channel_id: ChannelId) -> Result<Option<ChannelInfo>, GatewayError> {
        Ok(self.channel_snapshot(channel_id))
    }

    async fn guild_channels(&self, guild_id: GuildId) -> Result<Vec<ChannelInfo>, GatewayError> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .channels
            .values()
            .filter(|c| c.guild_id == guild_id)
            .cloned()
            .collect())
    }

    async fn member(
        &self,
        guild_id: GuildId,
        subject_id: SubjectId,
    ) -> Result<Option<Subject>, GatewayError> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .members
            .get(&(guild_id, subject_id))
            .cloned())
    }

    async fn role_exists(&self, guild_id: GuildId, role_id: RoleId) -> Result<bool, GatewayError> {
        Ok(self.state.lock().unwrap().roles.contains(&(guild_id, role_id)))
    }

    async fn create_text_channel(&self, channel: NewChannel) -> Result<ChannelInfo, GatewayError> {
        // Let concurrent requests interleave here, like a real round-trip would
        tokio::task::yield_now().await;

        let mut state = self.state.lock().unwrap();
        state.next_id += 1;
        let id = state.next_id;
        let info = ChannelInfo {
            id,
            guild_id: channel.guild_id,
            name: channel.name.clone(),
            kind: ChannelKind::Text,
            parent_id: Some(channel.parent_id),
            created_at: created_at_for(id),
            member_grants: channel
                .grants
                .iter()
                .filter_map(|g| match g.principal {
                    Principal::Member(m) => Some(m),
                    Principal::Role(_) => None,
                })
                .collect(),
        };
        state.channels.insert(id, info.clone());
        state.calls.push(GatewayCall::CreateTextChannel(channel));
        Ok(info)
    }

    async fn move_channel(
        &self,
        channel_id: ChannelId,
        category_id: ChannelId,
    ) -> Result<(), GatewayError> {
        let mut state = self.state.lock().unwrap();
        Self::check_edits_allowed(&state)?;
        let Some(channel) = state.channels.get_mut(&channel_id) else {
            return Err(GatewayError::not_found("Unknown Channel"));
        };
        channel.parent_id = Some(category_id);
        state.calls.push(GatewayCall::MoveChannel {
            channel_id,
            category_id,
        });
        Ok(())
    }

    async fn delete_channel(&self, channel_id: ChannelId) -> Result<(), GatewayError> {
        let mut state = self.state.lock().unwrap();
        Self::check_edits_allowed(&state)?;
        if state.channels.remove(&channel_id).is_none() {
            return Err(GatewayError::not_found("Unknown Channel"));
        }
        state.calls.push(GatewayCall::DeleteChannel(channel_id));
        Ok(())
    }

    async fn set_access_grant(
        &self,
        channel_id: ChannelId,
        principal: Principal,
        access: Option<Access>,
    ) -> Result<(), GatewayError> {
        let mut state = self.state.lock().unwrap();
        Self::check_edits_allowed(&state)?;
        let Some(channel) = state.channels.get_mut(&channel_id) else {
            return Err(GatewayError::not_found("Unknown Channel"));
        };
        if let Principal::Member(m) = principal {
            channel.member_grants.retain(|g| *g != m);
            if access.is_some() {
                channel.member_grants.push(m);
            }
        }
        state.calls.push(GatewayCall::SetAccessGrant {
            channel_id,
            principal,
            access,
        });
        Ok(())
    }

    async fn send_message(
        &self,
        target: Target,
        message: OutgoingMessage,
    ) -> Result<MessageId, GatewayError> {
        let mut state = self.state.lock().unwrap();
        match target {
            Target::Subject(s) if state.dm_blocked.contains(&s) => {
                return Err(GatewayError::new(
                    ErrorCategory::DeliveryRejected,
                    "Cannot send messages to this user",
                ));
            }
            Target::Subject(s) if state.dm_unreachable.contains(&s) => {
                return Err(GatewayError::new(ErrorCategory::Network, "connection reset"));
            }
            Target::Channel(c) if state.failing_channels.contains(&c) => {
                return Err(GatewayError::forbidden("Missing Access"));
            }
            _ => {}
        }
        state.next_id += 1;
        let id = state.next_id;
        if let Target::Channel(channel_id) = target {
            let control_ids = message
                .controls
                .iter()
                .map(|c| c.id.custom_id().to_string())
                .collect();
            state.history.entry(channel_id).or_default().push(RecentMessage {
                id,
                channel_id,
                control_ids,
            });
        }
        state.calls.push(GatewayCall::SendMessage { target, message });
        Ok(id)
    }

    async fn recent_messages(
        &self,
        channel_id: ChannelId,
        limit: u8,
    ) -> Result<Vec<RecentMessage>, GatewayError> {
        let mut state = self.state.lock().unwrap();
        state.history_reads.push((channel_id, limit));
        if state.unreadable.contains(&channel_id) {
            return Err(GatewayError::forbidden("Missing Access"));
        }
        Ok(state
            .history
            .get(&channel_id)
            .map(|h| h.iter().rev().take(limit as usize).cloned().collect())
            .unwrap_or_default())
    }
}

// ── MockClock ─────────────────────────────────────────────────────────────────

/// Clock whose `sleep()` returns immediately and records the request.
#[derive(Clone)]
pub struct MockClock {
    sleeps: Arc<Mutex<Vec<Duration>>>,
}

impl MockClock {
    pub fn new() -> Self {
        Self {
            sleeps: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Every duration passed to `sleep()`, in order.
    pub fn sleeps(&self) -> Vec<Duration> {
        self.sleeps.lock().unwrap().clone()
    }
}

impl Default for MockClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MockClock {
    async fn sleep(&self, duration: Duration) {
        self.sleeps.lock().unwrap().push(duration);
    }
}

/// A plain member for tests.
pub fn subject(id: SubjectId, name: &str) -> Subject {
    Subject {
        id,
        name: name.to_string(),
        display_name: name.to_string(),
        bot: false,
        roles: vec![],
    }
}
