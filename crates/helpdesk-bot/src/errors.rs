//! Discord-specific error handling for the bot.
//!
//! Converts serenity errors into the core's `GatewayError` so the ticket
//! and onboarding flows can tell a missing channel from a missing
//! permission without knowing about HTTP.

use helpdesk_core::GatewayError;
use helpdesk_types::errors::{ApiErrorCode, ErrorCategory};
use serenity::http::HttpError;
use tracing::{debug, error, warn};

/// Classify a serenity `Error`.
pub fn classify(err: &serenity::Error) -> GatewayError {
    match err {
        serenity::Error::Http(HttpError::UnsuccessfulRequest(resp)) => classify_response(
            resp.status_code.as_u16(),
            resp.error.code as u32,
            &resp.error.message,
        ),
        // Network / request-level failures (not Discord API errors)
        serenity::Error::Http(http_err) => {
            debug!("Network-level HTTP error: {}", http_err);
            GatewayError::new(ErrorCategory::Network, http_err.to_string())
        }
        _ => GatewayError::new(ErrorCategory::Unknown, err.to_string()),
    }
}

/// Classify an unsuccessful Discord API response.
pub fn classify_response(status: u16, raw_code: u32, message: &str) -> GatewayError {
    let message = format!("{} (HTTP {} / code {})", message, status, raw_code);

    // HTTP 429: rate limited
    if status == 429 {
        return GatewayError::new(ApiErrorCode::RateLimited.category(), message);
    }

    let kind = match ApiErrorCode::from_raw(raw_code).category() {
        ErrorCategory::Unknown => match status {
            403 => ErrorCategory::PermissionDenied,
            404 => ErrorCategory::NotFound,
            _ => ErrorCategory::Unknown,
        },
        category => category,
    };
    GatewayError::new(kind, message)
}

/// Log a gateway error at the level its category deserves.
///
/// - Missing permissions / unknown failures → `error!`
/// - Rate limits, rejected DMs, network → `warn!`
/// - Not found → `debug!` (usually a race with a deletion)
pub fn log_error(context: &str, err: &GatewayError) {
    match err.kind {
        ErrorCategory::PermissionDenied | ErrorCategory::Unknown => {
            error!("{} [{:?}]: {}", context, err.kind, err.message);
        }
        ErrorCategory::RateLimit | ErrorCategory::DeliveryRejected | ErrorCategory::Network => {
            warn!("{} [{:?}]: {}", context, err.kind, err.message);
        }
        ErrorCategory::NotFound => {
            debug!("{} [{:?}]: {}", context, err.kind, err.message);
        }
    }
}
