#[cfg(test)]
mod tests {
    use crate::config::{Config, ReadEnv};
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::NamedTempFile;

    struct InMemoryEnv(HashMap<&'static str, &'static str>);

    impl InMemoryEnv {
        fn new(pairs: &[(&'static str, &'static str)]) -> Self {
            Self(pairs.iter().cloned().collect())
        }
    }

    impl ReadEnv for InMemoryEnv {
        fn var(&self, key: &str) -> Option<String> {
            self.0.get(key).map(|v| v.to_string())
        }
    }

    fn write_toml(content: &str) -> NamedTempFile {
        let mut f = NamedTempFile::new().unwrap();
        f.write_all(content.as_bytes()).unwrap();
        f
    }

    // ── from_file ─────────────────────────────────────────────────────────────

    #[test]
    fn test_from_file_minimal() {
        let toml = r#"
[discord]
bot_token = "BOT-TOKEN-123"
"#;
        let f = write_toml(toml);
        let cfg = Config::from_file(f.path().to_str().unwrap()).unwrap();
        assert_eq!(cfg.discord.bot_token, "BOT-TOKEN-123");
        assert_eq!(cfg.discord.command_prefix, "!");
        assert_eq!(cfg.discord.log_channel_id, 0);
        assert_eq!(cfg.tickets.ticket_category_id, 0);
        assert_eq!(cfg.tickets.close_delay_secs, 5);
        assert_eq!(cfg.onboarding.delay_24h_secs, 86_400);
        assert_eq!(cfg.onboarding.delay_72h_secs, 259_200);
    }

    #[test]
    fn test_from_file_full() {
        let toml = r#"
[discord]
bot_token = "SECRET"
command_prefix = "?"
activity = "tickets"
log_channel_id = 900

[tickets]
ticket_category_id = 100
closed_category_id = 200
support_role_id = 300
admin_role_id = 400
close_delay_secs = 10
open_message = "Hi {user_mention}"

[onboarding]
welcome_channel_id = 10
delay_24h_secs = 60
"#;
        let f = write_toml(toml);
        let cfg = Config::from_file(f.path().to_str().unwrap()).unwrap();
        assert_eq!(cfg.discord.command_prefix, "?");
        assert_eq!(cfg.discord.activity, "tickets");
        assert_eq!(cfg.tickets.closed_category_id, 200);
        assert_eq!(cfg.tickets.open_message, "Hi {user_mention}");
        assert_eq!(cfg.tickets.close_button_label, "🔒 Close Ticket");
        assert_eq!(cfg.onboarding.welcome_channel_id, 10);
        assert_eq!(cfg.onboarding.delay_24h_secs, 60);
        assert_eq!(cfg.onboarding.delay_72h_secs, 259_200);

        let settings = cfg.helpdesk_settings();
        assert_eq!(settings.log_channel_id, 900);
        assert_eq!(settings.tickets.support_role_id, 300);
        assert_eq!(settings.tickets.close_delay().as_secs(), 10);
    }

    #[test]
    fn test_from_file_missing() {
        let err = Config::from_file("/nonexistent/helpdesk-bot.toml").unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }

    #[test]
    fn test_from_file_invalid_toml() {
        let f = write_toml("[discord\nbot_token = ");
        let err = Config::from_file(f.path().to_str().unwrap()).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }

    // ── from_env_with ─────────────────────────────────────────────────────────

    #[test]
    fn test_from_env_requires_token() {
        let env = InMemoryEnv::new(&[]);
        let err = Config::from_env_with(&env).unwrap_err();
        assert!(err.to_string().contains("DISCORD_BOT_TOKEN"));

        let env = InMemoryEnv::new(&[("DISCORD_BOT_TOKEN", "")]);
        assert!(Config::from_env_with(&env).is_err());
    }

    #[test]
    fn test_from_env_defaults() {
        let env = InMemoryEnv::new(&[("DISCORD_BOT_TOKEN", "TOK")]);
        let cfg = Config::from_env_with(&env).unwrap();
        assert_eq!(cfg.discord.bot_token, "TOK");
        assert_eq!(cfg.discord.command_prefix, "!");
        assert_eq!(cfg.tickets.ticket_category_id, 0);
        assert_eq!(cfg.tickets.open_button_label, "🎫 Open Ticket");
        assert_eq!(cfg.tickets.close_delay_secs, 5);
        assert_eq!(cfg.onboarding.delay_24h_secs, 86_400);
    }

    #[test]
    fn test_from_env_ids_and_templates() {
        let env = InMemoryEnv::new(&[
            ("DISCORD_BOT_TOKEN", "TOK"),
            ("TICKET_CATEGORY_ID", "1188874087901180012"),
            ("CLOSED_TICKET_CATEGORY_ID", " 1458624700321103995 "),
            ("SUPPORT_ROLE_ID", "42"),
            ("LOG_CHANNEL_ID", "77"),
            ("WELCOME_CHANNEL_ID", "10"),
            ("PUBLIC_WELCOME_MESSAGE", "Welcome {user_mention}!"),
            ("TICKET_CLOSE_DELAY_SECS", "30"),
            ("WELCOME_DELAY_72H_SECS", "120"),
            ("BOT_ACTIVITY", "support"),
            ("BOT_PREFIX", "$"),
        ]);
        let cfg = Config::from_env_with(&env).unwrap();
        assert_eq!(cfg.tickets.ticket_category_id, 1188874087901180012);
        assert_eq!(cfg.tickets.closed_category_id, 1458624700321103995);
        assert_eq!(cfg.tickets.support_role_id, 42);
        assert_eq!(cfg.discord.log_channel_id, 77);
        assert_eq!(cfg.onboarding.welcome_channel_id, 10);
        assert_eq!(cfg.onboarding.public_welcome, "Welcome {user_mention}!");
        assert_eq!(cfg.tickets.close_delay_secs, 30);
        assert_eq!(cfg.onboarding.delay_72h_secs, 120);
        assert_eq!(cfg.discord.activity, "support");
        assert_eq!(cfg.discord.command_prefix, "$");
    }

    #[test]
    fn test_from_env_malformed_values_fall_back() {
        let env = InMemoryEnv::new(&[
            ("DISCORD_BOT_TOKEN", "TOK"),
            ("TICKET_CATEGORY_ID", "not-a-number"),
            ("ADMIN_ROLE_ID", "-5"),
            ("TICKET_CLOSE_DELAY_SECS", "soon"),
        ]);
        let cfg = Config::from_env_with(&env).unwrap();
        assert_eq!(cfg.tickets.ticket_category_id, 0);
        assert_eq!(cfg.tickets.admin_role_id, 0);
        assert_eq!(cfg.tickets.close_delay_secs, 5);
    }

    // ── warnings ──────────────────────────────────────────────────────────────

    #[test]
    fn test_warnings_for_unconfigured_ids() {
        let env = InMemoryEnv::new(&[("DISCORD_BOT_TOKEN", "TOK")]);
        let cfg = Config::from_env_with(&env).unwrap();
        let warnings = cfg.warnings();
        assert_eq!(warnings.len(), 5);
        assert!(warnings.iter().any(|w| w.starts_with("closed_category_id")));
    }

    #[test]
    fn test_no_warnings_when_fully_configured() {
        let env = InMemoryEnv::new(&[
            ("DISCORD_BOT_TOKEN", "TOK"),
            ("LOG_CHANNEL_ID", "1"),
            ("TICKET_CATEGORY_ID", "2"),
            ("CLOSED_TICKET_CATEGORY_ID", "3"),
            ("SUPPORT_ROLE_ID", "4"),
            ("WELCOME_CHANNEL_ID", "5"),
        ]);
        let cfg = Config::from_env_with(&env).unwrap();
        assert!(cfg.warnings().is_empty());
    }

    #[test]
    fn test_missing_support_role_warning_does_not_block_tickets() {
        let env = InMemoryEnv::new(&[
            ("DISCORD_BOT_TOKEN", "TOK"),
            ("LOG_CHANNEL_ID", "1"),
            ("TICKET_CATEGORY_ID", "2"),
            ("CLOSED_TICKET_CATEGORY_ID", "3"),
            ("WELCOME_CHANNEL_ID", "5"),
        ]);
        let cfg = Config::from_env_with(&env).unwrap();
        assert_eq!(
            cfg.warnings(),
            vec!["support_role_id is 0; no support role gets access to tickets".to_string()]
        );
    }
}
