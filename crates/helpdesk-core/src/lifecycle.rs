//! Ticket lifecycle: Open → Closing → Archived | Deleted.
//!
//! `open` creates the member's ticket channel unless one is already active.
//! `request_close` checks the actor and moves the ticket to Closing;
//! `finish_after_grace` waits out the close delay and then archives the
//! channel, evicting the oldest archived tickets when the archive is full.

use std::sync::Arc;

use helpdesk_types::{
    render, ticket_channel_name, Access, AccessGrant, Actor, AuditEvent, ChannelId, ChannelInfo,
    ChannelKind, ControlBinding, ControlSpec, NewChannel, OutgoingMessage, Placeholders,
    Principal, SubjectId, Target, ARCHIVE_CAPACITY,
};
use tracing::{debug, info, warn};

use crate::archive;
use crate::audit::AuditLog;
use crate::bindings::ControlBindings;
use crate::clock::Clock;
use crate::config::TicketSettings;
use crate::error::{Result, TicketError};
use crate::registry::{Begin, CloseStart, TicketRegistry};
use crate::traits::Gateway;

pub const PANEL_TITLE: &str = "Support Tickets";
pub const PANEL_DESCRIPTION: &str = "Click the button below to create a new support ticket.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OpenOutcome {
    Created(ChannelInfo),
    /// The member already has this ticket channel.
    Existing(ChannelId),
    /// A concurrent request from the same member is creating the channel.
    InProgress,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CloseOutcome {
    Archived { evicted: Vec<ChannelId> },
    /// The archive category was unavailable.
    Deleted,
}

#[derive(Clone)]
pub struct TicketLifecycle<G, C> {
    gateway: G,
    clock: C,
    settings: TicketSettings,
    registry: Arc<TicketRegistry>,
    bindings: Arc<ControlBindings>,
    audit: AuditLog<G>,
}

impl<G: Gateway, C: Clock> TicketLifecycle<G, C> {
    pub fn new(
        gateway: G,
        clock: C,
        settings: TicketSettings,
        registry: Arc<TicketRegistry>,
        bindings: Arc<ControlBindings>,
        audit: AuditLog<G>,
    ) -> Self {
        Self {
            gateway,
            clock,
            settings,
            registry,
            bindings,
            audit,
        }
    }

    pub fn settings(&self) -> &TicketSettings {
        &self.settings
    }

    pub fn registry(&self) -> &TicketRegistry {
        &self.registry
    }

    /// The message carrying the open-ticket control.
    pub fn panel_message(&self) -> OutgoingMessage {
        OutgoingMessage::text(format!("**{PANEL_TITLE}**\n{PANEL_DESCRIPTION}"))
            .with_control(ControlSpec::open_ticket(self.settings.open_button_label.clone()))
    }

    /// Open a ticket for the actor, or report the one they already have.
    pub async fn open(&self, actor: &Actor) -> Result<OpenOutcome> {
        let subject_id = actor.subject.id;
        loop {
            match self.registry.try_begin(subject_id) {
                Begin::Reserved => break,
                Begin::InProgress => return Ok(OpenOutcome::InProgress),
                Begin::Existing(ticket) => {
                    if self.gateway.channel(ticket.channel_id).await?.is_some() {
                        return Ok(OpenOutcome::Existing(ticket.channel_id));
                    }
                    info!(
                        subject_id,
                        channel_id = ticket.channel_id,
                        "Ticket channel is gone, dropping stale entry"
                    );
                    self.registry.discard_stale(subject_id, ticket.channel_id);
                    self.bindings
                        .unregister(ControlBinding::CloseTicket(ticket.channel_id));
                }
            }
        }

        match self.create_channel(actor).await {
            Ok(channel) => Ok(OpenOutcome::Created(channel)),
            Err(e) => {
                self.registry.abandon(subject_id);
                Err(e)
            }
        }
    }

    async fn create_channel(&self, actor: &Actor) -> Result<ChannelInfo> {
        let guild_id = actor.guild_id;
        let subject = &actor.subject;
        let category_id = self.settings.ticket_category_id;

        if category_id == 0 {
            return Err(TicketError::NotConfigured("ticket category"));
        }
        match self.gateway.channel(category_id).await? {
            Some(c) if c.kind == ChannelKind::Category => {}
            _ => {
                warn!(category_id, "Ticket category not found");
                return Err(TicketError::NotConfigured("ticket category"));
            }
        }

        let mut grants = vec![
            AccessGrant::new(Principal::Role(guild_id), Access::Hidden),
            AccessGrant::new(Principal::Member(subject.id), Access::Participant),
            AccessGrant::new(Principal::Member(self.gateway.bot_id()), Access::Bot),
        ];
        let support_role_id = self.settings.support_role_id;
        if support_role_id != 0 {
            if self.gateway.role_exists(guild_id, support_role_id).await? {
                grants.push(AccessGrant::new(
                    Principal::Role(support_role_id),
                    Access::Participant,
                ));
            } else {
                warn!(role_id = support_role_id, "Support role not found");
            }
        }

        let mention = subject.mention();
        let placeholders = Placeholders {
            user_mention: &mention,
            user_name: &subject.display_name,
        };
        let channel = self
            .gateway
            .create_text_channel(NewChannel {
                guild_id,
                name: ticket_channel_name(&subject.name),
                parent_id: category_id,
                grants,
                topic: render(&self.settings.channel_topic, &placeholders),
            })
            .await?;

        self.registry.commit(subject.id, channel.id, channel.created_at);
        self.bindings
            .register(ControlBinding::CloseTicket(channel.id));

        let welcome = OutgoingMessage::text(render(&self.settings.open_message, &placeholders))
            .with_control(ControlSpec::close_ticket(
                self.settings.close_button_label.clone(),
            ));
        if let Err(e) = self
            .gateway
            .send_message(Target::Channel(channel.id), welcome)
            .await
        {
            warn!(channel_id = channel.id, "Failed to post ticket welcome: {}", e);
        }

        info!(
            channel_id = channel.id,
            subject_id = subject.id,
            "Created ticket channel {} for {}",
            channel.name,
            subject.name
        );
        self.audit
            .record(AuditEvent::TicketOpened {
                subject_id: subject.id,
                subject_name: subject.name.clone(),
                channel_id: channel.id,
            })
            .await;

        Ok(channel)
    }

    fn may_close(&self, actor: &Actor, channel: &ChannelInfo) -> bool {
        let actor_id = actor.subject.id;
        let owner = match self.registry.find_by_channel(channel.id) {
            Some(owner) => owner == actor_id,
            // Untracked ticket: the member grants name the owner
            None => actor_id != self.gateway.bot_id() && channel.member_grants.contains(&actor_id),
        };
        owner
            || actor.has_role(self.settings.support_role_id)
            || actor.has_role(self.settings.admin_role_id)
            || actor.administrator
    }

    /// Accept a close request: Open → Closing, announce it and audit it.
    ///
    /// Rejections leave the ticket untouched.
    pub async fn request_close(&self, actor: &Actor, channel_id: ChannelId) -> Result<ChannelInfo> {
        let Some(channel) = self.gateway.channel(channel_id).await? else {
            self.forget_channel(channel_id);
            return Err(TicketError::ResourceMissing(channel_id));
        };
        if channel.is_in(self.settings.closed_category_id) {
            return Err(TicketError::AlreadyClosed);
        }
        if !self.may_close(actor, &channel) {
            info!(
                channel_id,
                subject_id = actor.subject.id,
                "Close denied for {}",
                actor.subject.name
            );
            return Err(TicketError::PermissionDenied);
        }
        if self.registry.begin_close(channel_id) == CloseStart::AlreadyClosing {
            return Err(TicketError::AlreadyClosing);
        }

        let mention = actor.subject.mention();
        let announcement = render(
            &self.settings.closed_message,
            &Placeholders {
                user_mention: &mention,
                user_name: &actor.subject.display_name,
            },
        );
        if let Err(e) = self
            .gateway
            .send_message(Target::Channel(channel_id), OutgoingMessage::text(announcement))
            .await
        {
            warn!(channel_id, "Failed to post closing message: {}", e);
        }

        self.audit
            .record(AuditEvent::TicketClosed {
                channel_name: channel.name.clone(),
                actor_id: actor.subject.id,
                actor_name: actor.subject.name.clone(),
            })
            .await;

        Ok(channel)
    }

    /// Sleep for the close delay, then archive or delete the channel.
    pub async fn finish_after_grace(&self, channel_id: ChannelId) -> Result<CloseOutcome> {
        self.clock.sleep(self.settings.close_delay()).await;
        self.complete_close(channel_id).await
    }

    /// `request_close` followed by `finish_after_grace`.
    pub async fn close(&self, actor: &Actor, channel_id: ChannelId) -> Result<CloseOutcome> {
        self.request_close(actor, channel_id).await?;
        self.finish_after_grace(channel_id).await
    }

    /// Closing → Archived | Deleted.
    ///
    /// The registry entry and close binding are dropped first, so a failure
    /// part-way leaves the channel untracked rather than stuck in Closing.
    pub async fn complete_close(&self, channel_id: ChannelId) -> Result<CloseOutcome> {
        let ticket = self.registry.finish_close(channel_id);
        self.bindings
            .unregister(ControlBinding::CloseTicket(channel_id));

        let Some(channel) = self.gateway.channel(channel_id).await? else {
            return Err(TicketError::ResourceMissing(channel_id));
        };

        let bot_id = self.gateway.bot_id();
        for member in channel.member_grants.iter().filter(|m| **m != bot_id) {
            self.gateway
                .set_access_grant(channel_id, Principal::Member(*member), None)
                .await?;
        }

        let archive = self.archive_category().await?;
        let Some(archive_id) = archive else {
            warn!(
                category_id = self.settings.closed_category_id,
                "Closed ticket category not found, deleting {}", channel.name
            );
            self.gateway.delete_channel(channel_id).await?;
            self.audit
                .record(AuditEvent::TicketDeleted {
                    channel_name: channel.name,
                })
                .await;
            return Ok(CloseOutcome::Deleted);
        };

        let members = archive::members_of(
            self.gateway.guild_channels(channel.guild_id).await?,
            archive_id,
            channel_id,
        );
        let mut evicted = Vec::new();
        for old in archive::evictions(&members, ARCHIVE_CAPACITY) {
            match self.gateway.delete_channel(old.id).await {
                Ok(()) => {}
                Err(e) if e.is_not_found() => debug!(channel_id = old.id, "Already deleted"),
                Err(e) => return Err(e.into()),
            }
            self.forget_channel(old.id);
            info!(channel_id = old.id, "Deleted oldest ticket {} to make space", old.name);
            self.audit
                .record(AuditEvent::TicketEvicted {
                    channel_name: old.name,
                })
                .await;
            evicted.push(old.id);
        }

        self.gateway.move_channel(channel_id, archive_id).await?;
        let owner = ticket.map(|t| t.subject_id);
        info!(
            channel_id,
            owner = ?owner,
            "Moved ticket {} to closed category",
            channel.name
        );
        self.audit
            .record(AuditEvent::TicketArchived {
                channel_name: channel.name,
            })
            .await;

        Ok(CloseOutcome::Archived { evicted })
    }

    async fn archive_category(&self) -> Result<Option<ChannelId>> {
        let archive_id = self.settings.closed_category_id;
        if archive_id == 0 {
            return Ok(None);
        }
        Ok(self
            .gateway
            .channel(archive_id)
            .await?
            .filter(|c| c.kind == ChannelKind::Category)
            .map(|c| c.id))
    }

    /// The channel was deleted outside the close flow.
    pub fn on_channel_deleted(&self, channel_id: ChannelId) -> Option<SubjectId> {
        let owner = self.forget_channel(channel_id);
        if let Some(subject_id) = owner {
            info!(
                channel_id,
                subject_id, "Cleaned up active ticket due to channel deletion"
            );
        }
        owner
    }

    fn forget_channel(&self, channel_id: ChannelId) -> Option<SubjectId> {
        self.bindings
            .unregister(ControlBinding::CloseTicket(channel_id));
        self.registry.purge_channel(channel_id)
    }
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod lifecycle_tests;
