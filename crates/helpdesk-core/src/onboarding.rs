//! Member join/leave handling: welcome messages and follow-up DMs.

use std::sync::Arc;

use helpdesk_types::{
    render, AuditEvent, GuildId, OutgoingMessage, Placeholders, Subject, SubjectId, Target,
};
use tracing::{debug, info, warn};

use crate::audit::AuditLog;
use crate::clock::Clock;
use crate::config::OnboardingSettings;
use crate::scheduler::{Notification, NotificationHandle, NotificationScheduler};
use crate::traits::Gateway;

pub struct Onboarding<G, C> {
    gateway: G,
    settings: OnboardingSettings,
    scheduler: Arc<NotificationScheduler<G, C>>,
    audit: AuditLog<G>,
}

impl<G: Gateway, C: Clock> Onboarding<G, C> {
    pub fn new(
        gateway: G,
        settings: OnboardingSettings,
        scheduler: Arc<NotificationScheduler<G, C>>,
        audit: AuditLog<G>,
    ) -> Self {
        Self {
            gateway,
            settings,
            scheduler,
            audit,
        }
    }

    /// Greet a new member and schedule their follow-ups. Bots are ignored.
    pub async fn member_joined(
        &self,
        guild_id: GuildId,
        member: &Subject,
    ) -> Vec<NotificationHandle> {
        if member.bot {
            debug!(subject_id = member.id, "Ignoring bot join");
            return Vec::new();
        }

        self.audit
            .record(AuditEvent::MemberJoined {
                subject_id: member.id,
                name: member.name.clone(),
                display_name: member.display_name.clone(),
            })
            .await;

        let mention = member.mention();
        let placeholders = Placeholders {
            user_mention: &mention,
            user_name: &member.display_name,
        };

        let welcome_channel_id = self.settings.welcome_channel_id;
        if welcome_channel_id != 0 {
            let content = render(&self.settings.public_welcome, &placeholders);
            if let Err(e) = self
                .gateway
                .send_message(Target::Channel(welcome_channel_id), OutgoingMessage::text(content))
                .await
            {
                warn!(channel_id = welcome_channel_id, "Could not post public welcome: {}", e);
            }
        }

        let content = render(&self.settings.private_welcome, &placeholders);
        match self
            .gateway
            .send_message(Target::Subject(member.id), OutgoingMessage::text(content))
            .await
        {
            Ok(_) => info!(subject_id = member.id, "Sent welcome DM to {}", member.name),
            Err(e) if e.is_delivery_failure() => {
                info!(subject_id = member.id, "{} does not accept DMs: {}", member.name, e)
            }
            Err(e) => warn!(subject_id = member.id, "Could not DM {}: {}", member.name, e),
        }

        self.settings
            .follow_ups()
            .into_iter()
            .map(|follow_up| {
                self.scheduler.schedule(Notification {
                    guild_id,
                    subject_id: member.id,
                    label: follow_up.label.to_string(),
                    template: follow_up.template,
                    delay: follow_up.delay,
                })
            })
            .collect()
    }

    /// Drop the member's pending follow-ups. Returns how many were cancelled.
    pub fn member_left(&self, subject_id: SubjectId) -> usize {
        let cancelled = self.scheduler.cancel_all(subject_id);
        if cancelled > 0 {
            info!(subject_id, "Cancelled {} pending notifications", cancelled);
        }
        cancelled
    }
}
