//! Settings for the ticket and onboarding flows.
//!
//! Ids of 0 mean "not configured". Every field has a default so partial
//! TOML tables deserialize.

use std::time::Duration;

use helpdesk_types::{ChannelId, RoleId};
use serde::{Deserialize, Serialize};

pub const DEFAULT_TICKET_OPEN_MESSAGE: &str =
    "Hey {user_mention}, thanks for reaching out. Someone from the team will be with you shortly.";
pub const DEFAULT_TICKET_CHANNEL_TOPIC: &str = "Support ticket for {user_name}";
pub const DEFAULT_TICKET_CLOSED_MESSAGE: &str =
    "This ticket is now closed. The channel will be archived in a few seconds.";
pub const DEFAULT_OPEN_BUTTON_LABEL: &str = "🎫 Open Ticket";
pub const DEFAULT_CLOSE_BUTTON_LABEL: &str = "🔒 Close Ticket";
pub const DEFAULT_PUBLIC_WELCOME: &str = "Welcome {user_mention} 👋";
pub const DEFAULT_PRIVATE_WELCOME: &str = "Hey {user_name},\n\nWelcome to the server 👋\n\n\
    If you have any question or feedback, just open a ticket on the server. We read everything.";
pub const DEFAULT_FOLLOW_UP_24H: &str = "Hey {user_name},\n\nJust checking in. \
    If anything feels confusing or missing, feel free to ping us or open a ticket.";
pub const DEFAULT_FOLLOW_UP_72H: &str = "Hey {user_name},\n\nSmall follow-up. \
    If something didn't click, we'd honestly love to know why.";

const DEFAULT_CLOSE_DELAY_SECS: u64 = 5;
const DEFAULT_DELAY_24H_SECS: u64 = 24 * 60 * 60;
const DEFAULT_DELAY_72H_SECS: u64 = 72 * 60 * 60;

/// Everything the core services need, assembled by the bot from its config.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HelpdeskSettings {
    /// Channel receiving audit entries
    #[serde(default)]
    pub log_channel_id: ChannelId,
    #[serde(default)]
    pub tickets: TicketSettings,
    #[serde(default)]
    pub onboarding: OnboardingSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TicketSettings {
    /// Category new ticket channels are created in
    #[serde(default)]
    pub ticket_category_id: ChannelId,
    /// Category closed tickets are moved to
    #[serde(default)]
    pub closed_category_id: ChannelId,
    #[serde(default)]
    pub support_role_id: RoleId,
    #[serde(default)]
    pub admin_role_id: RoleId,
    #[serde(default = "default_open_message")]
    pub open_message: String,
    #[serde(default = "default_topic")]
    pub channel_topic: String,
    #[serde(default = "default_closed_message")]
    pub closed_message: String,
    #[serde(default = "default_open_label")]
    pub open_button_label: String,
    #[serde(default = "default_close_label")]
    pub close_button_label: String,
    #[serde(default = "default_close_delay_secs")]
    pub close_delay_secs: u64,
}

impl TicketSettings {
    pub fn close_delay(&self) -> Duration {
        Duration::from_secs(self.close_delay_secs)
    }
}

impl Default for TicketSettings {
    fn default() -> Self {
        Self {
            ticket_category_id: 0,
            closed_category_id: 0,
            support_role_id: 0,
            admin_role_id: 0,
            open_message: default_open_message(),
            channel_topic: default_topic(),
            closed_message: default_closed_message(),
            open_button_label: default_open_label(),
            close_button_label: default_close_label(),
            close_delay_secs: DEFAULT_CLOSE_DELAY_SECS,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OnboardingSettings {
    /// Channel for the public welcome message
    #[serde(default)]
    pub welcome_channel_id: ChannelId,
    #[serde(default = "default_public_welcome")]
    pub public_welcome: String,
    #[serde(default = "default_private_welcome")]
    pub private_welcome: String,
    #[serde(default = "default_follow_up_24h")]
    pub follow_up_24h: String,
    #[serde(default = "default_follow_up_72h")]
    pub follow_up_72h: String,
    #[serde(default = "default_delay_24h_secs")]
    pub delay_24h_secs: u64,
    #[serde(default = "default_delay_72h_secs")]
    pub delay_72h_secs: u64,
}

/// One delayed DM sent after a member joins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FollowUp {
    pub label: &'static str,
    pub template: String,
    pub delay: Duration,
}

impl OnboardingSettings {
    pub fn follow_ups(&self) -> Vec<FollowUp> {
        vec![
            FollowUp {
                label: "24h",
                template: self.follow_up_24h.clone(),
                delay: Duration::from_secs(self.delay_24h_secs),
            },
            FollowUp {
                label: "72h",
                template: self.follow_up_72h.clone(),
                delay: Duration::from_secs(self.delay_72h_secs),
            },
        ]
    }
}

impl Default for OnboardingSettings {
    fn default() -> Self {
        Self {
            welcome_channel_id: 0,
            public_welcome: default_public_welcome(),
            private_welcome: default_private_welcome(),
            follow_up_24h: default_follow_up_24h(),
            follow_up_72h: default_follow_up_72h(),
            delay_24h_secs: DEFAULT_DELAY_24H_SECS,
            delay_72h_secs: DEFAULT_DELAY_72H_SECS,
        }
    }
}

fn default_open_message() -> String {
    DEFAULT_TICKET_OPEN_MESSAGE.to_string()
}
fn default_topic() -> String {
    DEFAULT_TICKET_CHANNEL_TOPIC.to_string()
}
fn default_closed_message() -> String {
    DEFAULT_TICKET_CLOSED_MESSAGE.to_string()
}
fn default_open_label() -> String {
    DEFAULT_OPEN_BUTTON_LABEL.to_string()
}
fn default_close_label() -> String {
    DEFAULT_CLOSE_BUTTON_LABEL.to_string()
}
fn default_close_delay_secs() -> u64 {
    DEFAULT_CLOSE_DELAY_SECS
}
fn default_public_welcome() -> String {
    DEFAULT_PUBLIC_WELCOME.to_string()
}
fn default_private_welcome() -> String {
    DEFAULT_PRIVATE_WELCOME.to_string()
}
fn default_follow_up_24h() -> String {
    DEFAULT_FOLLOW_UP_24H.to_string()
}
fn default_follow_up_72h() -> String {
    DEFAULT_FOLLOW_UP_72H.to_string()
}
fn default_delay_24h_secs() -> u64 {
    DEFAULT_DELAY_24H_SECS
}
fn default_delay_72h_secs() -> u64 {
    DEFAULT_DELAY_72H_SECS
}
