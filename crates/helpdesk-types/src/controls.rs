//! Interactive controls (buttons) and the bindings that route their clicks.

use serde::{Deserialize, Serialize};

use crate::types::ChannelId;

/// Stable custom id of the "open ticket" button.
pub const OPEN_TICKET_CUSTOM_ID: &str = "open_ticket_button";
/// Stable custom id of the "close ticket" button.
pub const CLOSE_TICKET_CUSTOM_ID: &str = "close_ticket_button";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ControlId {
    OpenTicket,
    CloseTicket,
}

impl ControlId {
    pub fn custom_id(&self) -> &'static str {
        match self {
            Self::OpenTicket => OPEN_TICKET_CUSTOM_ID,
            Self::CloseTicket => CLOSE_TICKET_CUSTOM_ID,
        }
    }

    pub fn from_custom_id(custom_id: &str) -> Option<Self> {
        match custom_id {
            OPEN_TICKET_CUSTOM_ID => Some(Self::OpenTicket),
            CLOSE_TICKET_CUSTOM_ID => Some(Self::CloseTicket),
            _ => None,
        }
    }

    pub fn style(&self) -> ButtonStyle {
        match self {
            Self::OpenTicket => ButtonStyle::Primary,
            Self::CloseTicket => ButtonStyle::Danger,
        }
    }
}

/// Button style
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ButtonStyle {
    Primary,
    Danger,
}

/// A button to attach to an outgoing message.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ControlSpec {
    pub id: ControlId,
    pub label: String,
}

impl ControlSpec {
    pub fn open_ticket(label: impl Into<String>) -> Self {
        Self {
            id: ControlId::OpenTicket,
            label: label.into(),
        }
    }

    pub fn close_ticket(label: impl Into<String>) -> Self {
        Self {
            id: ControlId::CloseTicket,
            label: label.into(),
        }
    }

    pub fn style(&self) -> ButtonStyle {
        self.id.style()
    }
}

/// What a live control does when clicked.
///
/// Open-ticket buttons behave the same wherever they are posted; a
/// close-ticket button only ever closes the channel hosting it.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(tag = "type", content = "channel_id", rename_all = "snake_case")]
pub enum ControlBinding {
    OpenTicket,
    CloseTicket(ChannelId),
}

impl ControlBinding {
    /// The binding a click on `control` inside `channel_id` would hit.
    pub fn for_click(control: ControlId, channel_id: ChannelId) -> Self {
        match control {
            ControlId::OpenTicket => Self::OpenTicket,
            ControlId::CloseTicket => Self::CloseTicket(channel_id),
        }
    }

    pub fn control(&self) -> ControlId {
        match self {
            Self::OpenTicket => ControlId::OpenTicket,
            Self::CloseTicket(_) => ControlId::CloseTicket,
        }
    }
}
