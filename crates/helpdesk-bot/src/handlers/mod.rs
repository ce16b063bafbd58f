//! Serenity event handler implementation

mod commands;
mod tickets;

use std::sync::Arc;

use helpdesk_core::TicketError;
use helpdesk_types::AuditEvent;
use serenity::all::{ActivityData, GuildChannel};
use serenity::async_trait;
use serenity::model::application::Interaction;
use serenity::model::channel::Message;
use serenity::model::gateway::Ready;
use serenity::model::guild::Member;
use serenity::model::id::GuildId;
use serenity::model::user::User;
use serenity::prelude::*;
use tracing::{debug, error, info};

use crate::errors::log_error;
use crate::gateway::subject_from_member;
use crate::health::AppState;
use crate::services::Services;

pub struct Handler;

async fn services(ctx: &Context) -> Option<Arc<Services>> {
    let data = ctx.data.read().await;
    match data.get::<Services>() {
        Some(s) => Some(s.clone()),
        None => {
            error!("Services not found in context data");
            None
        }
    }
}

/// Log an unexpected failure and mirror it to the log channel.
pub(crate) async fn report_failure(services: &Services, context: &str, err: &TicketError) {
    match err {
        TicketError::Gateway(e) => log_error(context, e),
        other => error!("{}: {}", context, other),
    }
    services
        .helpdesk
        .audit
        .record(AuditEvent::HandlerFailed {
            context: context.to_string(),
            error: err.to_string(),
        })
        .await;
}

#[async_trait]
impl EventHandler for Handler {
    async fn ready(&self, ctx: Context, ready: Ready) {
        info!("Discord bot connected as {}", ready.user.name);

        let Some(services) = services(&ctx).await else {
            return;
        };
        services.gateway.set_bot_id(ready.user.id.get());

        let health = ctx.data.read().await.get::<AppState>().cloned();
        if let Some(state) = health {
            state.mark_ready(ready.user.name.clone()).await;
        }

        ctx.set_activity(Some(ActivityData::watching(services.activity.clone())));

        let guild_ids: Vec<u64> = ready.guilds.iter().map(|g| g.id.get()).collect();
        let report = services.helpdesk.on_ready(&ready.user.name, &guild_ids).await;
        info!(
            guilds = guild_ids.len(),
            channels_scanned = report.channels_scanned,
            channels_skipped = report.channels_skipped,
            bindings_added = report.bindings_added,
            tickets_adopted = report.tickets_adopted,
            "Recovery complete"
        );
    }

    async fn message(&self, ctx: Context, msg: Message) {
        // Skip bot messages
        if msg.author.bot {
            return;
        }
        let Some(services) = services(&ctx).await else {
            return;
        };
        commands::handle_message(&ctx, &services, &msg).await;
    }

    async fn interaction_create(&self, ctx: Context, interaction: Interaction) {
        let Some(services) = services(&ctx).await else {
            return;
        };

        match interaction {
            Interaction::Component(comp) => {
                tickets::handle_component(&ctx, &services, &comp).await;
            }
            _ => {
                // Slash commands, autocomplete and modals are not used
            }
        }
    }

    async fn guild_member_addition(&self, ctx: Context, new_member: Member) {
        let Some(services) = services(&ctx).await else {
            return;
        };

        let subject = subject_from_member(&new_member);
        let scheduled = services
            .helpdesk
            .onboarding
            .member_joined(new_member.guild_id.get(), &subject)
            .await;
        debug!(
            subject_id = subject.id,
            follow_ups = scheduled.len(),
            "Member onboarding started"
        );
    }

    async fn guild_member_removal(
        &self,
        ctx: Context,
        _guild_id: GuildId,
        user: User,
        _member_data: Option<Member>,
    ) {
        let Some(services) = services(&ctx).await else {
            return;
        };
        services.helpdesk.onboarding.member_left(user.id.get());
    }

    async fn channel_delete(
        &self,
        ctx: Context,
        channel: GuildChannel,
        _messages: Option<Vec<Message>>,
    ) {
        let Some(services) = services(&ctx).await else {
            return;
        };
        services.helpdesk.lifecycle.on_channel_deleted(channel.id.get());
    }
}
