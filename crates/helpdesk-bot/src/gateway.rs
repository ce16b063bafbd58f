//! `Gateway` over serenity's HTTP client.
//!
//! Lookups that Discord answers with an "Unknown …" error become `Ok(None)`.
//! A zero id is never sent to Discord; it is treated as unknown.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use helpdesk_core::{Gateway, GatewayError};
use helpdesk_types::{
    Access, AccessGrant, ChannelInfo, ChannelKind, ControlSpec, NewChannel, OutgoingMessage,
    Principal, RecentMessage, Subject, Target,
};
use serenity::all::{
    ActionRowComponent, ButtonKind, ChannelId, ChannelType, CreateActionRow, CreateButton,
    CreateChannel, CreateMessage, EditChannel, GetMessages, GuildChannel, GuildId, Http, Member,
    Message, PermissionOverwrite, PermissionOverwriteType, Permissions, RoleId, UserId,
};

use crate::errors::classify;

#[derive(Clone)]
pub struct SerenityGateway {
    http: Arc<Http>,
    bot_id: Arc<AtomicU64>,
}

impl SerenityGateway {
    pub fn new(http: Arc<Http>) -> Self {
        Self {
            http,
            bot_id: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Known once the gateway reports `ready`.
    pub fn set_bot_id(&self, id: u64) {
        self.bot_id.store(id, Ordering::Relaxed);
    }
}

fn nonzero<T>(raw: u64, new: fn(u64) -> T) -> Result<T, GatewayError> {
    if raw == 0 {
        return Err(GatewayError::not_found("id not configured"));
    }
    Ok(new(raw))
}

/// `Ok(None)` for "Unknown …" responses.
fn found<T>(result: serenity::Result<T>) -> Result<Option<T>, GatewayError> {
    match result {
        Ok(v) => Ok(Some(v)),
        Err(e) => {
            let err = classify(&e);
            if err.is_not_found() {
                Ok(None)
            } else {
                Err(err)
            }
        }
    }
}

fn snowflake_time(id: ChannelId) -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp(id.created_at().unix_timestamp(), 0).unwrap_or_default()
}

pub fn channel_info(channel: &GuildChannel) -> ChannelInfo {
    ChannelInfo {
        id: channel.id.get(),
        guild_id: channel.guild_id.get(),
        name: channel.name.clone(),
        kind: match channel.kind {
            ChannelType::Text => ChannelKind::Text,
            ChannelType::Category => ChannelKind::Category,
            ChannelType::Voice => ChannelKind::Voice,
            _ => ChannelKind::Other,
        },
        parent_id: channel.parent_id.map(|p| p.get()),
        created_at: snowflake_time(channel.id),
        member_grants: channel
            .permission_overwrites
            .iter()
            .filter_map(|o| match o.kind {
                PermissionOverwriteType::Member(user_id) => Some(user_id.get()),
                _ => None,
            })
            .collect(),
    }
}

pub fn subject_from_member(member: &Member) -> Subject {
    Subject {
        id: member.user.id.get(),
        name: member.user.name.clone(),
        display_name: member.display_name().to_string(),
        bot: member.user.bot,
        roles: member.roles.iter().map(|r| r.get()).collect(),
    }
}

fn overwrite(grant: &AccessGrant) -> PermissionOverwrite {
    let participant = Permissions::VIEW_CHANNEL
        | Permissions::SEND_MESSAGES
        | Permissions::ATTACH_FILES
        | Permissions::EMBED_LINKS;
    let (allow, deny) = match grant.access {
        Access::Hidden => (Permissions::empty(), Permissions::VIEW_CHANNEL),
        Access::Participant => (participant, Permissions::empty()),
        Access::Bot => (
            Permissions::VIEW_CHANNEL | Permissions::SEND_MESSAGES | Permissions::MANAGE_CHANNELS,
            Permissions::empty(),
        ),
    };
    PermissionOverwrite {
        allow,
        deny,
        kind: overwrite_target(grant.principal),
    }
}

fn overwrite_target(principal: Principal) -> PermissionOverwriteType {
    match principal {
        Principal::Role(id) => PermissionOverwriteType::Role(RoleId::new(id)),
        Principal::Member(id) => PermissionOverwriteType::Member(UserId::new(id)),
    }
}

fn button(control: &ControlSpec) -> CreateButton {
    let style = match control.style() {
        helpdesk_types::ButtonStyle::Primary => serenity::all::ButtonStyle::Primary,
        helpdesk_types::ButtonStyle::Danger => serenity::all::ButtonStyle::Danger,
    };
    CreateButton::new(control.id.custom_id())
        .label(control.label.clone())
        .style(style)
}

pub fn create_message(message: OutgoingMessage) -> CreateMessage {
    let builder = CreateMessage::new().content(message.content);
    if message.controls.is_empty() {
        return builder;
    }
    builder.components(vec![CreateActionRow::Buttons(
        message.controls.iter().map(button).collect(),
    )])
}

/// Custom ids of every non-link button on the message.
pub fn control_ids(message: &Message) -> Vec<String> {
    message
        .components
        .iter()
        .flat_map(|row| row.components.iter())
        .filter_map(|c| match c {
            ActionRowComponent::Button(b) => match &b.data {
                ButtonKind::NonLink { custom_id, .. } => Some(custom_id.clone()),
                _ => None,
            },
            _ => None,
        })
        .collect()
}

impl Gateway for SerenityGateway {
    fn bot_id(&self) -> u64 {
        self.bot_id.load(Ordering::Relaxed)
    }

    async fn channel(&self, channel_id: u64) -> Result<Option<ChannelInfo>, GatewayError> {
        if channel_id == 0 {
            return Ok(None);
        }
        let channel = found(ChannelId::new(channel_id).to_channel(&*self.http).await)?;
        Ok(channel.and_then(|c| c.guild()).map(|c| channel_info(&c)))
    }

    async fn guild_channels(&self, guild_id: u64) -> Result<Vec<ChannelInfo>, GatewayError> {
        let channels = nonzero(guild_id, GuildId::new)?
            .channels(&*self.http)
            .await
            .map_err(|e| classify(&e))?;
        Ok(channels.values().map(channel_info).collect())
    }

    async fn member(&self, guild_id: u64, subject_id: u64) -> Result<Option<Subject>, GatewayError> {
        if subject_id == 0 {
            return Ok(None);
        }
        let member = found(
            nonzero(guild_id, GuildId::new)?
                .member(&*self.http, UserId::new(subject_id))
                .await,
        )?;
        Ok(member.as_ref().map(subject_from_member))
    }

    async fn role_exists(&self, guild_id: u64, role_id: u64) -> Result<bool, GatewayError> {
        if role_id == 0 {
            return Ok(false);
        }
        let roles = nonzero(guild_id, GuildId::new)?
            .roles(&*self.http)
            .await
            .map_err(|e| classify(&e))?;
        Ok(roles.contains_key(&RoleId::new(role_id)))
    }

    async fn create_text_channel(&self, channel: NewChannel) -> Result<ChannelInfo, GatewayError> {
        let guild_id = nonzero(channel.guild_id, GuildId::new)?;
        let category = nonzero(channel.parent_id, ChannelId::new)?;
        let builder = CreateChannel::new(channel.name)
            .kind(ChannelType::Text)
            .category(category)
            .topic(channel.topic)
            .permissions(channel.grants.iter().map(overwrite).collect::<Vec<_>>());
        let created = guild_id
            .create_channel(&*self.http, builder)
            .await
            .map_err(|e| classify(&e))?;
        Ok(channel_info(&created))
    }

    async fn move_channel(&self, channel_id: u64, category_id: u64) -> Result<(), GatewayError> {
        let category = nonzero(category_id, ChannelId::new)?;
        nonzero(channel_id, ChannelId::new)?
            .edit(&*self.http, EditChannel::new().category(Some(category)))
            .await
            .map_err(|e| classify(&e))?;
        Ok(())
    }

    async fn delete_channel(&self, channel_id: u64) -> Result<(), GatewayError> {
        nonzero(channel_id, ChannelId::new)?
            .delete(&*self.http)
            .await
            .map_err(|e| classify(&e))?;
        Ok(())
    }

    async fn set_access_grant(
        &self,
        channel_id: u64,
        principal: Principal,
        access: Option<Access>,
    ) -> Result<(), GatewayError> {
        let channel = nonzero(channel_id, ChannelId::new)?;
        let result = match access {
            Some(access) => {
                channel
                    .create_permission(&*self.http, overwrite(&AccessGrant::new(principal, access)))
                    .await
            }
            None => {
                channel
                    .delete_permission(&*self.http, overwrite_target(principal))
                    .await
            }
        };
        result.map_err(|e| classify(&e))
    }

    async fn send_message(
        &self,
        target: Target,
        message: OutgoingMessage,
    ) -> Result<u64, GatewayError> {
        let builder = create_message(message);
        let sent = match target {
            Target::Channel(id) => {
                nonzero(id, ChannelId::new)?
                    .send_message(&*self.http, builder)
                    .await
            }
            Target::Subject(id) => {
                nonzero(id, UserId::new)?
                    .direct_message(&*self.http, builder)
                    .await
            }
        };
        sent.map(|m| m.id.get()).map_err(|e| classify(&e))
    }

    async fn recent_messages(
        &self,
        channel_id: u64,
        limit: u8,
    ) -> Result<Vec<RecentMessage>, GatewayError> {
        let messages = nonzero(channel_id, ChannelId::new)?
            .messages(&*self.http, GetMessages::new().limit(limit))
            .await
            .map_err(|e| classify(&e))?;
        Ok(messages
            .iter()
            .map(|m| RecentMessage {
                id: m.id.get(),
                channel_id,
                control_ids: control_ids(m),
            })
            .collect())
    }
}
