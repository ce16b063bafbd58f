//! Configuration management for helpdesk-bot

#[path = "config_tests.rs"]
mod config_tests;

use std::fs;

use anyhow::{Context, Result};
use helpdesk_core::config::{
    DEFAULT_CLOSE_BUTTON_LABEL, DEFAULT_FOLLOW_UP_24H, DEFAULT_FOLLOW_UP_72H,
    DEFAULT_OPEN_BUTTON_LABEL, DEFAULT_PRIVATE_WELCOME, DEFAULT_PUBLIC_WELCOME,
    DEFAULT_TICKET_CHANNEL_TOPIC, DEFAULT_TICKET_CLOSED_MESSAGE, DEFAULT_TICKET_OPEN_MESSAGE,
};
use helpdesk_core::{HelpdeskSettings, OnboardingSettings, TicketSettings};
use serde::{Deserialize, Serialize};

const DEFAULT_PREFIX: &str = "!";
const DEFAULT_ACTIVITY: &str = "the support queue";

/// Source of environment variables, swappable in tests.
pub trait ReadEnv {
    fn var(&self, key: &str) -> Option<String>;
}

pub struct SystemEnv;

impl ReadEnv for SystemEnv {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

/// Complete bot configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub discord: DiscordBotConfig,
    #[serde(default)]
    pub tickets: TicketSettings,
    #[serde(default)]
    pub onboarding: OnboardingSettings,
}

/// Discord connection and presentation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscordBotConfig {
    /// Bot token from the Discord developer portal
    #[serde(default)]
    pub bot_token: String,
    /// Prefix for text commands such as `!ticket`
    #[serde(default = "default_prefix")]
    pub command_prefix: String,
    /// Shown as "Watching <activity>"
    #[serde(default = "default_activity")]
    pub activity: String,
    /// Audit channel; 0 disables channel logging
    #[serde(default)]
    pub log_channel_id: u64,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file(path: &str) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path))?;

        Ok(config)
    }

    /// Load configuration from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_env_with(&SystemEnv)
    }

    pub fn from_env_with(env: &impl ReadEnv) -> Result<Self> {
        let bot_token = env
            .var("DISCORD_BOT_TOKEN")
            .filter(|t| !t.is_empty())
            .context("DISCORD_BOT_TOKEN not set")?;

        let text = |key: &str, default: &str| env.var(key).unwrap_or_else(|| default.to_string());
        let id = |key: &str| parse_id(env.var(key).as_deref());
        let secs = |key: &str, default: u64| {
            env.var(key)
                .and_then(|v| v.trim().parse::<u64>().ok())
                .unwrap_or(default)
        };

        let ticket_defaults = TicketSettings::default();
        let onboarding_defaults = OnboardingSettings::default();

        Ok(Config {
            discord: DiscordBotConfig {
                bot_token,
                command_prefix: text("BOT_PREFIX", DEFAULT_PREFIX),
                activity: text("BOT_ACTIVITY", DEFAULT_ACTIVITY),
                log_channel_id: id("LOG_CHANNEL_ID"),
            },
            tickets: TicketSettings {
                ticket_category_id: id("TICKET_CATEGORY_ID"),
                closed_category_id: id("CLOSED_TICKET_CATEGORY_ID"),
                support_role_id: id("SUPPORT_ROLE_ID"),
                admin_role_id: id("ADMIN_ROLE_ID"),
                open_message: text("TICKET_OPEN_MESSAGE", DEFAULT_TICKET_OPEN_MESSAGE),
                channel_topic: text("TICKET_CHANNEL_TOPIC", DEFAULT_TICKET_CHANNEL_TOPIC),
                closed_message: text("TICKET_CLOSED_MESSAGE", DEFAULT_TICKET_CLOSED_MESSAGE),
                open_button_label: text("TICKET_BUTTON_LABEL", DEFAULT_OPEN_BUTTON_LABEL),
                close_button_label: text("TICKET_CLOSE_BUTTON_LABEL", DEFAULT_CLOSE_BUTTON_LABEL),
                close_delay_secs: secs("TICKET_CLOSE_DELAY_SECS", ticket_defaults.close_delay_secs),
            },
            onboarding: OnboardingSettings {
                welcome_channel_id: id("WELCOME_CHANNEL_ID"),
                public_welcome: text("PUBLIC_WELCOME_MESSAGE", DEFAULT_PUBLIC_WELCOME),
                private_welcome: text("PRIVATE_WELCOME_MESSAGE", DEFAULT_PRIVATE_WELCOME),
                follow_up_24h: text("DELAYED_DM_24H", DEFAULT_FOLLOW_UP_24H),
                follow_up_72h: text("DELAYED_DM_72H", DEFAULT_FOLLOW_UP_72H),
                delay_24h_secs: secs("WELCOME_DELAY_24H_SECS", onboarding_defaults.delay_24h_secs),
                delay_72h_secs: secs("WELCOME_DELAY_72H_SECS", onboarding_defaults.delay_72h_secs),
            },
        })
    }

    /// Settings handed to the helpdesk services.
    pub fn helpdesk_settings(&self) -> HelpdeskSettings {
        HelpdeskSettings {
            log_channel_id: self.discord.log_channel_id,
            tickets: self.tickets.clone(),
            onboarding: self.onboarding.clone(),
        }
    }

    /// Settings that leave a feature switched off.
    pub fn warnings(&self) -> Vec<String> {
        let mut warnings = Vec::new();
        if self.discord.log_channel_id == 0 {
            warnings.push("log_channel_id is 0; audit entries go to the console only".into());
        }
        if self.tickets.ticket_category_id == 0 {
            warnings.push("ticket_category_id is 0; tickets cannot be opened".into());
        }
        if self.tickets.closed_category_id == 0 {
            warnings.push("closed_category_id is 0; closed tickets will be deleted".into());
        }
        if self.tickets.support_role_id == 0 {
            warnings.push("support_role_id is 0; no support role gets access to tickets".into());
        }
        if self.onboarding.welcome_channel_id == 0 {
            warnings.push("welcome_channel_id is 0; no public welcome is posted".into());
        }
        warnings
    }
}

fn default_prefix() -> String {
    DEFAULT_PREFIX.to_string()
}

fn default_activity() -> String {
    DEFAULT_ACTIVITY.to_string()
}

/// A Discord snowflake, or 0 (not configured) when missing or malformed.
fn parse_id(raw: Option<&str>) -> u64 {
    raw.and_then(|v| v.trim().parse::<u64>().ok()).unwrap_or(0)
}
