//! Audit trail: every entry goes to the tracing log and to the logging channel.

use helpdesk_types::{AuditEvent, ChannelId, OutgoingMessage, Target};
use tracing::{info, warn};

use crate::traits::Gateway;

#[derive(Clone)]
pub struct AuditLog<G> {
    gateway: G,
    channel_id: ChannelId,
}

impl<G: Gateway> AuditLog<G> {
    /// `channel_id` 0 keeps the audit trail in the tracing log only.
    pub fn new(gateway: G, channel_id: ChannelId) -> Self {
        Self {
            gateway,
            channel_id,
        }
    }

    pub async fn record(&self, event: AuditEvent) {
        info!(scope = ?event.scope(), "{}", event);

        if self.channel_id == 0 {
            return;
        }

        let content = format!("{} {}", event.scope().prefix(), event);
        if let Err(e) = self
            .gateway
            .send_message(Target::Channel(self.channel_id), OutgoingMessage::text(content))
            .await
        {
            warn!("Failed to send log message: {}", e);
        }
    }
}
