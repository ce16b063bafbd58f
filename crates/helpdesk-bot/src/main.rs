//! Helpdesk community bot
//!
//! Welcomes new members with public and private messages plus delayed
//! follow-up DMs, and runs button-driven support tickets with private
//! channels and a capacity-bounded archive category.

mod config;
mod errors;
mod gateway;
mod handlers;
mod health;
mod services;

use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context as _, Result};
use clap::Parser;
use helpdesk_core::{Helpdesk, TokioClock};
use serenity::model::gateway::GatewayIntents;
use serenity::prelude::*;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::gateway::SerenityGateway;
use crate::handlers::Handler;
use crate::health::AppState;
use crate::services::Services;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// TOML config; the environment is used when the file is absent
    #[arg(short, long, default_value = "config/helpdesk-bot.toml")]
    config: String,

    /// Discord bot token (overrides config file)
    #[arg(long, env = "DISCORD_BOT_TOKEN")]
    bot_token: Option<String>,

    #[arg(long, env = "HEALTH_CHECK_PORT", default_value = "3001")]
    health_port: u16,
}

fn load_config(args: &Args) -> Result<Config> {
    let mut config = if Path::new(&args.config).exists() {
        info!("Loading config from file: {}", args.config);
        Config::from_file(&args.config)?
    } else {
        info!("Config file not found, loading from environment");
        Config::from_env()?
    };
    if let Some(token) = &args.bot_token {
        config.discord.bot_token = token.clone();
    }
    if config.discord.bot_token.trim().is_empty() {
        bail!("no Discord bot token configured");
    }
    Ok(config)
}

/// Resolves on Ctrl+C, or SIGTERM on unix.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigterm = signal(SignalKind::terminate()).expect("SIGTERM handler");
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {}
            _ = sigterm.recv() => {}
        }
    }
    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await.ok();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "helpdesk_bot=debug,helpdesk_core=debug,info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    info!("Starting helpdesk bot");

    let config = load_config(&args)?;
    for w in config.warnings() {
        warn!("Config: {}", w);
    }

    // Member events need the privileged GUILD_MEMBERS intent, prefix
    // commands need MESSAGE_CONTENT.
    let intents = GatewayIntents::GUILDS
        | GatewayIntents::GUILD_MEMBERS
        | GatewayIntents::GUILD_MESSAGES
        | GatewayIntents::MESSAGE_CONTENT;

    let mut client = Client::builder(&config.discord.bot_token, intents)
        .event_handler(Handler)
        .await
        .context("Failed to create Discord client")?;

    let gateway = SerenityGateway::new(client.http.clone());
    let services = Arc::new(Services {
        helpdesk: Helpdesk::new(gateway.clone(), TokioClock, config.helpdesk_settings()),
        gateway,
        command_prefix: config.discord.command_prefix.clone(),
        activity: config.discord.activity.clone(),
    });
    let health_state = AppState::new(Arc::clone(&services));

    {
        let mut data = client.data.write().await;
        data.insert::<Services>(services);
        data.insert::<AppState>(health_state.clone());
    }

    let health_port = args.health_port;
    tokio::spawn(async move {
        if let Err(e) = health::serve(health_state, health_port).await {
            error!("Health server error: {}", e);
        }
    });

    let shard_manager = client.shard_manager.clone();
    tokio::spawn(async move {
        shutdown_signal().await;
        info!("Shutdown signal received, stopping Discord client...");
        shard_manager.shutdown_all().await;
    });

    // Blocks until every shard has stopped
    client.start().await.context("Discord client error")?;

    info!("Helpdesk bot stopped");
    Ok(())
}
