//! Clock abstraction so delays can be skipped in tests.
//!
//! - `TokioClock`: real `tokio::time` (honours `tokio::time::pause`)
//! - `mocks::MockClock`: `sleep()` returns immediately

use std::future::Future;
use std::time::Duration;

pub trait Clock: Send + Sync + Clone + 'static {
    fn sleep(&self, duration: Duration) -> impl Future<Output = ()> + Send;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TokioClock;

impl Clock for TokioClock {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}
