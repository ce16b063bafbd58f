//! Shared types for the helpdesk community bot
//!
//! Plain data passed between the ticket/onboarding core and the gateway
//! client. Nothing in here talks to the network.

pub mod controls;
pub mod errors;
pub mod events;
pub mod templates;
pub mod ticket;
pub mod types;

pub use controls::{
    ButtonStyle, ControlBinding, ControlId, ControlSpec, CLOSE_TICKET_CUSTOM_ID, OPEN_TICKET_CUSTOM_ID,
};
pub use events::{AuditEvent, AuditScope};
pub use templates::{render, Placeholders};
pub use ticket::{ticket_channel_name, Ticket, TicketState, ARCHIVE_CAPACITY, TICKET_CHANNEL_PREFIX};
pub use types::*;
