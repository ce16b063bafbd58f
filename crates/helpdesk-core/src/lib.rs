//! # helpdesk-core
//!
//! Ticket and onboarding logic for the helpdesk community bot, written
//! against the [`Gateway`] seam so it runs the same on a live connection
//! and on [`mocks::MockGateway`].
//!
//! - [`TicketRegistry`]: at most one active ticket per member.
//! - [`TicketLifecycle`]: Open → Closing → Archived/Deleted, with the
//!   capacity-bounded archive category.
//! - [`NotificationScheduler`]: cancellable one-shot delayed DMs.
//! - [`Onboarding`]: welcome messages and follow-ups on member join/leave.
//! - [`Recovery`]: re-binds ticket buttons from channel history after a
//!   restart and re-adopts open ticket channels into the registry.
//!
//! All state is in memory and starts empty on every process start.

pub mod archive;
pub mod audit;
pub mod bindings;
pub mod clock;
pub mod config;
pub mod error;
pub mod lifecycle;
pub mod onboarding;
pub mod recovery;
pub mod registry;
pub mod scheduler;
pub mod service;
pub mod traits;

#[cfg(any(test, feature = "test-support"))]
pub mod mocks;

pub use audit::AuditLog;
pub use bindings::ControlBindings;
pub use clock::{Clock, TokioClock};
pub use config::{HelpdeskSettings, OnboardingSettings, TicketSettings};
pub use error::{GatewayError, Result, TicketError};
pub use lifecycle::{CloseOutcome, OpenOutcome, TicketLifecycle};
pub use onboarding::Onboarding;
pub use recovery::{Recovery, RecoveryReport};
pub use registry::{Begin, CloseStart, TicketRegistry};
pub use scheduler::{Delivery, Notification, NotificationHandle, NotificationScheduler};
pub use service::{Helpdesk, HelpdeskStatus};
pub use traits::Gateway;
