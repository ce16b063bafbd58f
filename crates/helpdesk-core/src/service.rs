//! The services wired together once at startup and shared by every handler.

use std::sync::Arc;

use helpdesk_types::{AuditEvent, ControlBinding, GuildId};
use serde::Serialize;
use tracing::warn;

use crate::audit::AuditLog;
use crate::bindings::ControlBindings;
use crate::clock::Clock;
use crate::config::HelpdeskSettings;
use crate::lifecycle::TicketLifecycle;
use crate::onboarding::Onboarding;
use crate::recovery::{Recovery, RecoveryReport};
use crate::registry::TicketRegistry;
use crate::scheduler::NotificationScheduler;
use crate::traits::Gateway;

/// Point-in-time counters for status replies and the health endpoint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct HelpdeskStatus {
    pub active_tickets: usize,
    pub pending_notifications: usize,
    pub bindings: usize,
}

pub struct Helpdesk<G, C> {
    pub settings: HelpdeskSettings,
    pub registry: Arc<TicketRegistry>,
    pub bindings: Arc<ControlBindings>,
    pub scheduler: Arc<NotificationScheduler<G, C>>,
    pub lifecycle: TicketLifecycle<G, C>,
    pub onboarding: Onboarding<G, C>,
    pub recovery: Recovery<G>,
    pub audit: AuditLog<G>,
}

impl<G: Gateway, C: Clock> Helpdesk<G, C> {
    pub fn new(gateway: G, clock: C, settings: HelpdeskSettings) -> Self {
        let registry = Arc::new(TicketRegistry::new());
        let bindings = Arc::new(ControlBindings::new());
        let audit = AuditLog::new(gateway.clone(), settings.log_channel_id);
        let scheduler = Arc::new(NotificationScheduler::new(gateway.clone(), clock.clone()));

        let lifecycle = TicketLifecycle::new(
            gateway.clone(),
            clock,
            settings.tickets.clone(),
            Arc::clone(&registry),
            Arc::clone(&bindings),
            audit.clone(),
        );
        let onboarding = Onboarding::new(
            gateway.clone(),
            settings.onboarding.clone(),
            Arc::clone(&scheduler),
            audit.clone(),
        );
        let recovery = Recovery::new(
            gateway,
            Arc::clone(&bindings),
            Arc::clone(&registry),
            settings.tickets.ticket_category_id,
        );

        Self {
            settings,
            registry,
            bindings,
            scheduler,
            lifecycle,
            onboarding,
            recovery,
            audit,
        }
    }

    /// Connection is up: audit it, bind the panel control and recover every guild.
    ///
    /// A guild whose channel list cannot be read is logged and skipped.
    pub async fn on_ready(&self, bot_name: &str, guild_ids: &[GuildId]) -> RecoveryReport {
        self.audit
            .record(AuditEvent::Startup {
                bot_name: bot_name.to_string(),
                guild_count: guild_ids.len(),
            })
            .await;

        let mut total = RecoveryReport::default();
        if self.bindings.register(ControlBinding::OpenTicket) {
            total.bindings_added += 1;
        }

        for &guild_id in guild_ids {
            match self.recovery.run(guild_id).await {
                Ok(report) => {
                    total.channels_scanned += report.channels_scanned;
                    total.channels_skipped += report.channels_skipped;
                    total.bindings_added += report.bindings_added;
                    total.tickets_adopted += report.tickets_adopted;
                }
                Err(e) => warn!(guild_id, "Recovery failed: {}", e),
            }
        }
        total
    }

    pub fn status(&self) -> HelpdeskStatus {
        HelpdeskStatus {
            active_tickets: self.registry.active_count(),
            pending_notifications: self.scheduler.pending_count(),
            bindings: self.bindings.len(),
        }
    }
}
