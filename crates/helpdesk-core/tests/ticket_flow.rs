//! End-to-end ticket flow through the public API: panel → open → close →
//! archive, then a simulated restart.

use helpdesk_core::mocks::{subject, MockClock, MockGateway};
use helpdesk_core::{
    CloseOutcome, Gateway, Helpdesk, HelpdeskSettings, OpenOutcome, TicketError, TicketSettings,
};
use helpdesk_types::{Actor, ControlBinding, ControlId, Target, TicketState};

const GUILD: u64 = 1;
const BOT: u64 = 2;
const LOG: u64 = 77;
const PANEL_CHANNEL: u64 = 10;
const OPEN_CATEGORY: u64 = 100;
const CLOSED_CATEGORY: u64 = 200;
const SUPPORT_ROLE: u64 = 300;

fn guild() -> MockGateway {
    let gw = MockGateway::new(BOT);
    gw.add_category(GUILD, OPEN_CATEGORY, "Tickets");
    gw.add_category(GUILD, CLOSED_CATEGORY, "Closed");
    gw.add_text_channel(GUILD, PANEL_CHANNEL, "support", None);
    gw.add_role(GUILD, SUPPORT_ROLE);
    gw
}

fn settings() -> HelpdeskSettings {
    HelpdeskSettings {
        log_channel_id: LOG,
        tickets: TicketSettings {
            ticket_category_id: OPEN_CATEGORY,
            closed_category_id: CLOSED_CATEGORY,
            support_role_id: SUPPORT_ROLE,
            ..TicketSettings::default()
        },
        ..HelpdeskSettings::default()
    }
}

fn member(id: u64, name: &str) -> Actor {
    Actor {
        subject: subject(id, name),
        guild_id: GUILD,
        administrator: false,
    }
}

#[tokio::test]
async fn test_open_close_archive_flow() {
    let gw = guild();
    let helpdesk = Helpdesk::new(gw.clone(), MockClock::new(), settings());
    helpdesk.on_ready("helpdesk", &[GUILD]).await;

    // Panel posted, button click resolves to the open binding
    gw.send_message(
        Target::Channel(PANEL_CHANNEL),
        helpdesk.lifecycle.panel_message(),
    )
    .await
    .unwrap();
    assert_eq!(
        helpdesk.bindings.resolve(ControlId::OpenTicket, PANEL_CHANNEL),
        Some(ControlBinding::OpenTicket)
    );

    let bob = member(5, "bob");
    let OpenOutcome::Created(channel) = helpdesk.lifecycle.open(&bob).await.unwrap() else {
        panic!("ticket was not created");
    };
    assert_eq!(
        helpdesk.registry.find_by_subject(5).unwrap().state,
        TicketState::Open
    );

    // Someone else cannot close it
    let err = helpdesk
        .lifecycle
        .request_close(&member(6, "eve"), channel.id)
        .await
        .unwrap_err();
    assert!(matches!(err, TicketError::PermissionDenied));

    // Support closes it
    let mut support = member(7, "sam");
    support.subject.roles = vec![SUPPORT_ROLE];
    assert_eq!(
        helpdesk.lifecycle.close(&support, channel.id).await.unwrap(),
        CloseOutcome::Archived { evicted: vec![] }
    );
    assert!(helpdesk.registry.find_by_subject(5).is_none());
    assert_eq!(
        gw.channel_snapshot(channel.id).unwrap().parent_id,
        Some(CLOSED_CATEGORY)
    );

    // Bob can open a fresh one afterwards
    assert!(matches!(
        helpdesk.lifecycle.open(&bob).await.unwrap(),
        OpenOutcome::Created(ref c) if c.id != channel.id
    ));

    let log_entries = gw
        .sent_messages()
        .into_iter()
        .filter(|(t, _)| *t == Target::Channel(LOG))
        .count();
    // startup, opened, closed, archived, opened
    assert_eq!(log_entries, 5);
}

#[tokio::test]
async fn test_restart_recovers_bindings_and_open_tickets() {
    let gw = guild();
    let before = Helpdesk::new(gw.clone(), MockClock::new(), settings());
    before.on_ready("helpdesk", &[GUILD]).await;
    let bob = member(5, "bob");
    let OpenOutcome::Created(channel) = before.lifecycle.open(&bob).await.unwrap() else {
        panic!("ticket was not created");
    };
    drop(before);

    // Fresh process, same guild
    let after = Helpdesk::new(gw.clone(), MockClock::new(), settings());
    assert!(after.bindings.is_empty());
    let report = after.on_ready("helpdesk", &[GUILD]).await;

    assert_eq!(report.tickets_adopted, 1);
    assert!(after
        .bindings
        .resolve(ControlId::CloseTicket, channel.id)
        .is_some());
    assert_eq!(
        after.lifecycle.open(&bob).await.unwrap(),
        OpenOutcome::Existing(channel.id)
    );
    assert_eq!(gw.created_channels().len(), 1);

    // The owner can still close after the restart
    after.lifecycle.close(&bob, channel.id).await.unwrap();
    assert!(after.registry.find_by_subject(5).is_none());
}

#[tokio::test]
async fn test_busy_ticket_is_closable_after_restart() {
    let gw = guild();
    let before = Helpdesk::new(gw.clone(), MockClock::new(), settings());
    before.on_ready("helpdesk", &[GUILD]).await;
    let bob = member(5, "bob");
    let OpenOutcome::Created(channel) = before.lifecycle.open(&bob).await.unwrap() else {
        panic!("ticket was not created");
    };
    drop(before);

    // The conversation pushes the close button out of the recent history
    for _ in 0..12 {
        gw.push_history(channel.id, &[]);
    }

    let after = Helpdesk::new(gw.clone(), MockClock::new(), settings());
    after.on_ready("helpdesk", &[GUILD]).await;

    assert_eq!(
        after.bindings.resolve(ControlId::CloseTicket, channel.id),
        Some(ControlBinding::CloseTicket(channel.id))
    );
    assert_eq!(
        after.lifecycle.close(&bob, channel.id).await.unwrap(),
        CloseOutcome::Archived { evicted: vec![] }
    );
    assert!(matches!(
        after.lifecycle.open(&bob).await.unwrap(),
        OpenOutcome::Created(_)
    ));
}
