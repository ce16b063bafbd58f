//! Liveness and readiness over HTTP.
//!
//! `/live` answers as soon as the process runs. `/health` answers 503
//! until the gateway has reported `ready`, then 200 with the helpdesk
//! counters.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use serde::{Deserialize, Serialize};
use serenity::prelude::TypeMapKey;
use tokio::sync::RwLock;

use crate::services::Services;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthReport {
    /// `ok` once connected, `starting` before
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bot_username: Option<String>,
    pub uptime_secs: u64,
    pub active_tickets: usize,
    pub pending_notifications: usize,
}

#[derive(Clone)]
pub struct AppState {
    started: Instant,
    connected_as: Arc<RwLock<Option<String>>>,
    services: Arc<Services>,
}

impl AppState {
    pub fn new(services: Arc<Services>) -> Self {
        Self {
            started: Instant::now(),
            connected_as: Arc::new(RwLock::new(None)),
            services,
        }
    }

    /// Called from the `ready` event.
    pub async fn mark_ready(&self, bot_username: String) {
        *self.connected_as.write().await = Some(bot_username);
    }

    async fn report(&self) -> (StatusCode, HealthReport) {
        let bot_username = self.connected_as.read().await.clone();
        let counters = self.services.helpdesk.status();
        let (code, status) = match bot_username {
            Some(_) => (StatusCode::OK, "ok"),
            None => (StatusCode::SERVICE_UNAVAILABLE, "starting"),
        };
        let report = HealthReport {
            status: status.to_string(),
            bot_username,
            uptime_secs: self.started.elapsed().as_secs(),
            active_tickets: counters.active_tickets,
            pending_notifications: counters.pending_notifications,
        };
        (code, report)
    }
}

impl TypeMapKey for AppState {
    type Value = AppState;
}

async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthReport>) {
    let (code, report) = state.report().await;
    (code, Json(report))
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/live", get(|| async { StatusCode::OK }))
        .with_state(state)
}

pub async fn serve(state: AppState, port: u16) -> anyhow::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Health check server listening on {}", addr);
    axum::serve(listener, router(state)).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::SerenityGateway;
    use helpdesk_core::{Helpdesk, HelpdeskSettings, TokioClock};
    use serenity::http::Http;

    fn state() -> AppState {
        let gateway = SerenityGateway::new(Arc::new(Http::new("test-token")));
        let services = Services {
            helpdesk: Helpdesk::new(gateway.clone(), TokioClock, HelpdeskSettings::default()),
            gateway,
            command_prefix: "!".into(),
            activity: "tickets".into(),
        };
        AppState::new(Arc::new(services))
    }

    #[tokio::test]
    async fn test_unavailable_until_ready() {
        let (code, Json(report)) = health(State(state())).await;
        assert_eq!(code, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(report.status, "starting");
        assert!(report.bot_username.is_none());
    }

    #[tokio::test]
    async fn test_ready_reports_counters() {
        let state = state();
        state.mark_ready("helpdesk".to_string()).await;
        state
            .services
            .helpdesk
            .registry
            .adopt(5, 10, chrono::Utc::now());

        let (code, Json(report)) = health(State(state)).await;
        assert_eq!(code, StatusCode::OK);
        assert_eq!(report.status, "ok");
        assert_eq!(report.bot_username.as_deref(), Some("helpdesk"));
        assert_eq!(report.active_tickets, 1);
        assert_eq!(report.pending_notifications, 0);
    }

    #[test]
    fn test_report_omits_missing_username() {
        let report = HealthReport {
            status: "starting".to_string(),
            bot_username: None,
            uptime_secs: 3,
            active_tickets: 0,
            pending_notifications: 2,
        };
        let json = serde_json::to_value(&report).unwrap();
        assert!(json.get("bot_username").is_none());
        assert_eq!(json["pending_notifications"], 2);
    }
}
