//! Prefix commands: `ticket`, `ticketpanel` and `status`.
//!
//! Unauthorized invocations are dropped without a reply.

use std::time::Duration;

use helpdesk_core::{Gateway, TicketError};
use helpdesk_types::{AuditEvent, Subject, Target};
use serenity::all::{Context, GuildId, Message, RoleId};
use tracing::{debug, warn};

use super::report_failure;
use crate::errors::{classify, log_error};
use crate::services::Services;

const NOT_CONFIGURED: &str = "Ticket system is not configured properly. Please contact an admin.";
const NOTICE_LIFETIME: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Post the panel; requires the admin role
    Ticket,
    /// Post the panel; requires the administrator permission
    TicketPanel,
    /// Counters; requires the administrator permission
    Status,
}

impl Command {
    fn name(&self) -> &'static str {
        match self {
            Self::Ticket => "ticket",
            Self::TicketPanel => "ticketpanel",
            Self::Status => "status",
        }
    }
}

pub fn parse(prefix: &str, content: &str) -> Option<Command> {
    if prefix.is_empty() {
        return None;
    }
    let rest = content.trim_start().strip_prefix(prefix)?;
    let name = rest.split_whitespace().next()?;
    match name.to_lowercase().as_str() {
        "ticket" => Some(Command::Ticket),
        "ticketpanel" => Some(Command::TicketPanel),
        "status" => Some(Command::Status),
        _ => None,
    }
}

pub async fn handle_message(ctx: &Context, services: &Services, msg: &Message) {
    let Some(command) = parse(&services.command_prefix, &msg.content) else {
        return;
    };
    let Some(guild_id) = msg.guild_id else {
        return;
    };

    let invoker = match services
        .gateway
        .member(guild_id.get(), msg.author.id.get())
        .await
    {
        Ok(Some(subject)) => subject,
        Ok(None) => return,
        Err(e) => {
            log_error("Command invoker lookup", &e);
            return;
        }
    };

    let allowed = match command {
        Command::Ticket => {
            let admin_role = services.helpdesk.settings.tickets.admin_role_id;
            admin_role != 0 && invoker.roles.contains(&admin_role)
        }
        Command::TicketPanel | Command::Status => is_administrator(ctx, guild_id, &invoker).await,
    };
    if !allowed {
        debug!(
            user_id = invoker.id,
            command = command.name(),
            "Ignoring unauthorized command"
        );
        delete_invocation(ctx, msg).await;
        return;
    }

    match command {
        Command::Ticket => {
            if services.helpdesk.settings.tickets.ticket_category_id == 0 {
                say(ctx, msg, NOT_CONFIGURED).await;
                return;
            }
            delete_invocation(ctx, msg).await;
            post_panel(services, msg, &invoker).await;
        }
        Command::TicketPanel => {
            delete_invocation(ctx, msg).await;
            if let Some(message_id) = post_panel(services, msg, &invoker).await {
                post_notice(ctx, msg, format!("Ticket panel created! Message ID: {}", message_id))
                    .await;
            }
        }
        Command::Status => {
            let status = services.helpdesk.status();
            let text = format!(
                "**Bot status**\nServers: {}\nActive tickets: {}\nPending notifications: {}\nActive controls: {}",
                ctx.cache.guild_count(),
                status.active_tickets,
                status.pending_notifications,
                status.bindings,
            );
            say(ctx, msg, &text).await;
        }
    }
}

/// Guild owner, or any held role (including @everyone) with the
/// administrator permission.
async fn is_administrator(ctx: &Context, guild_id: GuildId, invoker: &Subject) -> bool {
    let is_owner = ctx
        .cache
        .guild(guild_id)
        .is_some_and(|g| g.owner_id.get() == invoker.id);
    if is_owner {
        return true;
    }

    let roles = match guild_id.roles(&ctx.http).await {
        Ok(roles) => roles,
        Err(e) => {
            log_error("Guild roles lookup", &classify(&e));
            return false;
        }
    };
    std::iter::once(guild_id.get())
        .chain(invoker.roles.iter().copied())
        .filter(|&id| id != 0)
        .filter_map(|id| roles.get(&RoleId::new(id)))
        .any(|role| role.permissions.administrator())
}

async fn post_panel(services: &Services, msg: &Message, invoker: &Subject) -> Option<u64> {
    let channel_id = msg.channel_id.get();
    let panel = services.helpdesk.lifecycle.panel_message();

    match services
        .gateway
        .send_message(Target::Channel(channel_id), panel)
        .await
    {
        Ok(message_id) => {
            services
                .helpdesk
                .audit
                .record(AuditEvent::PanelPosted {
                    actor_id: invoker.id,
                    actor_name: invoker.name.clone(),
                    channel_id,
                })
                .await;
            Some(message_id)
        }
        Err(e) => {
            report_failure(services, "ticket panel", &TicketError::Gateway(e)).await;
            None
        }
    }
}

async fn say(ctx: &Context, msg: &Message, text: &str) {
    if let Err(e) = msg.channel_id.say(&ctx.http, text).await {
        log_error("Command reply", &classify(&e));
    }
}

/// Short-lived confirmation, removed after [`NOTICE_LIFETIME`].
async fn post_notice(ctx: &Context, msg: &Message, text: String) {
    let notice = match msg.channel_id.say(&ctx.http, text).await {
        Ok(notice) => notice,
        Err(e) => {
            log_error("Command notice", &classify(&e));
            return;
        }
    };
    let http = ctx.http.clone();
    tokio::spawn(async move {
        tokio::time::sleep(NOTICE_LIFETIME).await;
        if let Err(e) = notice.delete(&http).await {
            debug!("Failed to remove notice: {}", e);
        }
    });
}

async fn delete_invocation(ctx: &Context, msg: &Message) {
    if let Err(e) = msg.delete(&ctx.http).await {
        warn!("Failed to delete command message: {}", e);
    }
}
