//! Restart recovery for live controls and active tickets.
//!
//! Control bindings live only in memory, so after a restart the bot reads
//! the most recent messages of every text channel and re-registers the
//! controls it finds there. Every open ticket channel gets its close control
//! bound whatever its history shows, and is adopted back into the registry
//! from its member grants. All passes are idempotent.

use std::sync::Arc;

use helpdesk_types::{ChannelId, ChannelInfo, ChannelKind, ControlBinding, ControlId, GuildId};
use tracing::{debug, info, warn};

use crate::bindings::ControlBindings;
use crate::error::GatewayError;
use crate::registry::TicketRegistry;
use crate::traits::Gateway;

/// Messages inspected per ordinary text channel.
pub const CHANNEL_SCAN_LIMIT: u8 = 50;
/// Messages inspected per open ticket channel.
pub const TICKET_SCAN_LIMIT: u8 = 10;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RecoveryReport {
    pub channels_scanned: usize,
    pub channels_skipped: usize,
    pub bindings_added: usize,
    pub tickets_adopted: usize,
}

pub struct Recovery<G> {
    gateway: G,
    bindings: Arc<ControlBindings>,
    registry: Arc<TicketRegistry>,
    ticket_category_id: ChannelId,
}

impl<G: Gateway> Recovery<G> {
    pub fn new(
        gateway: G,
        bindings: Arc<ControlBindings>,
        registry: Arc<TicketRegistry>,
        ticket_category_id: ChannelId,
    ) -> Self {
        Self {
            gateway,
            bindings,
            registry,
            ticket_category_id,
        }
    }

    /// Rebind controls and adopt open tickets for one guild.
    pub async fn run(&self, guild_id: GuildId) -> Result<RecoveryReport, GatewayError> {
        let channels = self.gateway.guild_channels(guild_id).await?;
        let mut report = self.rebind_channels(&channels).await;
        report.tickets_adopted = self.adopt_tickets(&channels);
        info!(
            guild_id,
            scanned = report.channels_scanned,
            skipped = report.channels_skipped,
            bindings = report.bindings_added,
            adopted = report.tickets_adopted,
            "Recovery finished"
        );
        Ok(report)
    }

    /// Only the control-binding pass.
    pub async fn rebind(&self, guild_id: GuildId) -> Result<RecoveryReport, GatewayError> {
        let channels = self.gateway.guild_channels(guild_id).await?;
        Ok(self.rebind_channels(&channels).await)
    }

    fn is_open_ticket(&self, channel: &ChannelInfo) -> bool {
        channel.is_ticket() && channel.is_in(self.ticket_category_id)
    }

    async fn rebind_channels(&self, channels: &[ChannelInfo]) -> RecoveryReport {
        let mut report = RecoveryReport::default();

        for channel in channels.iter().filter(|c| c.kind == ChannelKind::Text) {
            let limit = if self.is_open_ticket(channel) {
                TICKET_SCAN_LIMIT
            } else {
                CHANNEL_SCAN_LIMIT
            };
            let messages = match self.gateway.recent_messages(channel.id, limit).await {
                Ok(messages) => messages,
                Err(e) => {
                    if e.is_forbidden() {
                        debug!(channel_id = channel.id, "Skipping unreadable channel");
                    } else {
                        warn!(channel_id = channel.id, "Could not read channel history: {}", e);
                    }
                    report.channels_skipped += 1;
                    continue;
                }
            };
            report.channels_scanned += 1;

            let controls = messages
                .iter()
                .flat_map(|m| m.control_ids.iter())
                .filter_map(|id| ControlId::from_custom_id(id));
            for control in controls {
                let binding = match control {
                    ControlId::OpenTicket => ControlBinding::OpenTicket,
                    ControlId::CloseTicket if channel.is_ticket() => {
                        ControlBinding::CloseTicket(channel.id)
                    }
                    ControlId::CloseTicket => continue,
                };
                if self.bindings.register(binding) {
                    debug!(channel_id = channel.id, ?binding, "Rebound control");
                    report.bindings_added += 1;
                }
            }
        }

        // The close control of a busy ticket may sit beyond the scan window.
        for channel in channels.iter().filter(|c| self.is_open_ticket(c)) {
            if self.bindings.register(ControlBinding::CloseTicket(channel.id)) {
                debug!(channel_id = channel.id, "Bound close control of open ticket");
                report.bindings_added += 1;
            }
        }

        report
    }

    /// Track open ticket channels whose grants name exactly one member.
    fn adopt_tickets(&self, channels: &[ChannelInfo]) -> usize {
        let bot_id = self.gateway.bot_id();
        let mut adopted = 0;

        for channel in channels.iter().filter(|c| self.is_open_ticket(c)) {
            let owners: Vec<_> = channel
                .member_grants
                .iter()
                .filter(|m| **m != bot_id)
                .collect();
            let [owner] = owners.as_slice() else {
                debug!(
                    channel_id = channel.id,
                    "No single owner for {}, not adopting", channel.name
                );
                continue;
            };
            if self.registry.adopt(**owner, channel.id, channel.created_at) {
                info!(
                    channel_id = channel.id,
                    subject_id = **owner,
                    "Adopted existing ticket {}",
                    channel.name
                );
                adopted += 1;
            }
        }

        adopted
    }
}
