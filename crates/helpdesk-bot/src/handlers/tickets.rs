//! Ticket button clicks.

use helpdesk_core::{OpenOutcome, TicketError};
use helpdesk_types::{Actor, ChannelId, ControlBinding, ControlId};
use serenity::all::{
    ComponentInteraction, Context, CreateInteractionResponse, CreateInteractionResponseMessage,
};
use tracing::debug;

use super::report_failure;
use crate::errors::{classify, log_error};
use crate::gateway::subject_from_member;
use crate::services::Services;

const INACTIVE_CONTROL: &str = "This button is no longer active.";
const CREATE_FAILED: &str = "Error creating ticket. Please contact an administrator.";
const CLOSE_FAILED: &str = "Error closing ticket. Please contact an administrator.";

pub async fn handle_component(ctx: &Context, services: &Services, comp: &ComponentInteraction) {
    let Some(control) = ControlId::from_custom_id(&comp.data.custom_id) else {
        debug!(custom_id = %comp.data.custom_id, "Ignoring unknown component");
        return;
    };
    let Some(actor) = actor_from(comp) else {
        reply(ctx, comp, INACTIVE_CONTROL).await;
        return;
    };

    match services
        .helpdesk
        .bindings
        .resolve(control, comp.channel_id.get())
    {
        Some(ControlBinding::OpenTicket) => open_ticket(ctx, services, comp, &actor).await,
        Some(ControlBinding::CloseTicket(channel_id)) => {
            close_ticket(ctx, services, comp, &actor, channel_id).await
        }
        None => reply(ctx, comp, INACTIVE_CONTROL).await,
    }
}

/// Only guild clicks carry a member.
fn actor_from(comp: &ComponentInteraction) -> Option<Actor> {
    let guild_id = comp.guild_id?;
    let member = comp.member.as_ref()?;
    Some(Actor {
        subject: subject_from_member(member),
        guild_id: guild_id.get(),
        administrator: member.permissions.is_some_and(|p| p.administrator()),
    })
}

async fn open_ticket(
    ctx: &Context,
    services: &Services,
    comp: &ComponentInteraction,
    actor: &Actor,
) {
    match services.helpdesk.lifecycle.open(actor).await {
        Ok(outcome) => reply(ctx, comp, &open_reply(&outcome)).await,
        Err(e) => {
            report_failure(services, "ticket button", &e).await;
            reply(ctx, comp, CREATE_FAILED).await;
        }
    }
}

async fn close_ticket(
    ctx: &Context,
    services: &Services,
    comp: &ComponentInteraction,
    actor: &Actor,
    channel_id: ChannelId,
) {
    let lifecycle = &services.helpdesk.lifecycle;
    match lifecycle.request_close(actor, channel_id).await {
        Ok(_) => {
            acknowledge(ctx, comp).await;
            if let Err(e) = lifecycle.finish_after_grace(channel_id).await {
                report_failure(services, "close ticket", &e).await;
            }
        }
        Err(e) => match close_rejection(&e) {
            Some(text) => reply(ctx, comp, text).await,
            None => {
                report_failure(services, "close ticket", &e).await;
                reply(ctx, comp, CLOSE_FAILED).await;
            }
        },
    }
}

fn open_reply(outcome: &OpenOutcome) -> String {
    match outcome {
        OpenOutcome::Created(channel) => {
            format!("Ticket created! Here's your channel: {}", channel.mention())
        }
        OpenOutcome::Existing(channel_id) => {
            format!("You already have an open ticket: <#{}>", channel_id)
        }
        OpenOutcome::InProgress => "Your ticket is being created, hang on a moment.".to_string(),
    }
}

/// Expected refusals get a plain reply; anything else is a failure.
fn close_rejection(err: &TicketError) -> Option<&'static str> {
    match err {
        TicketError::PermissionDenied => Some("You don't have permission to close this ticket."),
        TicketError::AlreadyClosing => Some("This ticket is already closing."),
        TicketError::AlreadyClosed => Some("This ticket is already closed."),
        TicketError::ResourceMissing(_) => Some("This ticket no longer exists."),
        TicketError::NotConfigured(_) | TicketError::Gateway(_) => None,
    }
}

async fn reply(ctx: &Context, comp: &ComponentInteraction, content: &str) {
    let response = CreateInteractionResponse::Message(
        CreateInteractionResponseMessage::new()
            .content(content)
            .ephemeral(true),
    );
    if let Err(e) = comp.create_response(&ctx.http, response).await {
        log_error("Interaction reply", &classify(&e));
    }
}

async fn acknowledge(ctx: &Context, comp: &ComponentInteraction) {
    if let Err(e) = comp
        .create_response(&ctx.http, CreateInteractionResponse::Acknowledge)
        .await
    {
        log_error("Interaction acknowledge", &classify(&e));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use helpdesk_core::GatewayError;
    use helpdesk_types::ChannelKind;

    #[test]
    fn test_open_reply_created_links_channel() {
        let channel = helpdesk_types::ChannelInfo {
            id: 42,
            guild_id: 1,
            name: "ticket-bob".into(),
            kind: ChannelKind::Text,
            parent_id: Some(100),
            created_at: chrono::Utc::now(),
            member_grants: vec![5],
        };
        assert_eq!(
            open_reply(&OpenOutcome::Created(channel)),
            "Ticket created! Here's your channel: <#42>"
        );
    }

    #[test]
    fn test_open_reply_existing() {
        assert_eq!(
            open_reply(&OpenOutcome::Existing(7)),
            "You already have an open ticket: <#7>"
        );
    }

    #[test]
    fn test_expected_close_refusals() {
        assert_eq!(
            close_rejection(&TicketError::PermissionDenied),
            Some("You don't have permission to close this ticket.")
        );
        assert_eq!(
            close_rejection(&TicketError::AlreadyClosing),
            Some("This ticket is already closing.")
        );
        assert_eq!(
            close_rejection(&TicketError::AlreadyClosed),
            Some("This ticket is already closed.")
        );
        assert!(close_rejection(&TicketError::ResourceMissing(3)).is_some());
    }

    #[test]
    fn test_gateway_failure_is_not_a_refusal() {
        let err = TicketError::Gateway(GatewayError::forbidden("Missing Permissions"));
        assert_eq!(close_rejection(&err), None);
        assert_eq!(close_rejection(&TicketError::NotConfigured("closed category")), None);
    }
}
