//! One-shot delayed direct messages, cancellable per member.
//!
//! Each notification is its own tokio task that sleeps once and then
//! delivers. The task table maps member id to the abort handles of that
//! member's not-yet-fired tasks; a task removes its own entry when it wakes.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use helpdesk_types::{render, GuildId, OutgoingMessage, Placeholders, SubjectId, Target};
use tokio::task::{AbortHandle, JoinHandle};
use tracing::{debug, info, warn};

use crate::clock::Clock;
use crate::traits::Gateway;

type TaskTable = Arc<Mutex<HashMap<SubjectId, HashMap<u64, AbortHandle>>>>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub guild_id: GuildId,
    pub subject_id: SubjectId,
    /// Short name for logs, e.g. "24h"
    pub label: String,
    pub template: String,
    pub delay: Duration,
}

/// What happened when a notification fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Sent,
    /// The member was gone at fire time; nothing was sent.
    MemberLeft,
    /// The member refuses direct messages. Never retried.
    Rejected,
    /// The lookup or send failed for another reason. Logged, never retried.
    Failed,
}

#[derive(Debug)]
pub struct NotificationHandle {
    id: u64,
    subject_id: SubjectId,
    task: JoinHandle<Delivery>,
}

impl NotificationHandle {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn subject_id(&self) -> SubjectId {
        self.subject_id
    }

    /// Wait for the task. `None` if it was cancelled before delivering.
    pub async fn outcome(self) -> Option<Delivery> {
        self.task.await.ok()
    }
}

pub struct NotificationScheduler<G, C> {
    gateway: G,
    clock: C,
    tasks: TaskTable,
    next_id: AtomicU64,
}

fn lock(tasks: &TaskTable) -> MutexGuard<'_, HashMap<SubjectId, HashMap<u64, AbortHandle>>> {
    tasks.lock().unwrap_or_else(PoisonError::into_inner)
}

fn forget(tasks: &TaskTable, subject_id: SubjectId, id: u64) {
    let mut table = lock(tasks);
    if let Some(entries) = table.get_mut(&subject_id) {
        entries.remove(&id);
        if entries.is_empty() {
            table.remove(&subject_id);
        }
    }
}

impl<G: Gateway, C: Clock> NotificationScheduler<G, C> {
    pub fn new(gateway: G, clock: C) -> Self {
        Self {
            gateway,
            clock,
            tasks: Arc::new(Mutex::new(HashMap::new())),
            next_id: AtomicU64::new(1),
        }
    }

    /// Must be called from within a tokio runtime.
    pub fn schedule(&self, notification: Notification) -> NotificationHandle {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let subject_id = notification.subject_id;

        debug!(
            subject_id,
            label = %notification.label,
            delay_secs = notification.delay.as_secs(),
            "Scheduling notification"
        );

        // Hold the table while spawning so the task cannot forget itself
        // before it has been recorded.
        let mut table = lock(&self.tasks);
        let gateway = self.gateway.clone();
        let clock = self.clock.clone();
        let tasks = Arc::clone(&self.tasks);
        let task = tokio::spawn(async move {
            clock.sleep(notification.delay).await;
            forget(&tasks, notification.subject_id, id);
            deliver(&gateway, &notification).await
        });
        table
            .entry(subject_id)
            .or_default()
            .insert(id, task.abort_handle());
        drop(table);

        NotificationHandle {
            id,
            subject_id,
            task,
        }
    }

    /// Cancel every not-yet-fired notification of the member.
    ///
    /// Returns how many were cancelled. A task already past its sleep
    /// finishes regardless.
    pub fn cancel_all(&self, subject_id: SubjectId) -> usize {
        let Some(entries) = lock(&self.tasks).remove(&subject_id) else {
            return 0;
        };
        for handle in entries.values() {
            handle.abort();
        }
        entries.len()
    }

    pub fn pending_for(&self, subject_id: SubjectId) -> usize {
        lock(&self.tasks).get(&subject_id).map_or(0, HashMap::len)
    }

    pub fn pending_count(&self) -> usize {
        lock(&self.tasks).values().map(HashMap::len).sum()
    }
}

async fn deliver<G: Gateway>(gateway: &G, notification: &Notification) -> Delivery {
    let subject_id = notification.subject_id;
    let member = match gateway.member(notification.guild_id, subject_id).await {
        Ok(Some(member)) => member,
        Ok(None) => {
            debug!(subject_id, label = %notification.label, "Member left, dropping notification");
            return Delivery::MemberLeft;
        }
        Err(e) => {
            warn!(subject_id, label = %notification.label, "Could not resolve member: {}", e);
            return Delivery::Failed;
        }
    };

    let mention = member.mention();
    let content = render(
        &notification.template,
        &Placeholders {
            user_mention: &mention,
            user_name: &member.display_name,
        },
    );

    match gateway
        .send_message(Target::Subject(subject_id), OutgoingMessage::text(content))
        .await
    {
        Ok(_) => {
            info!(subject_id, label = %notification.label, "Sent {} DM to {}", notification.label, member.name);
            Delivery::Sent
        }
        Err(e) if e.is_delivery_failure() => {
            info!(subject_id, label = %notification.label, "{} does not accept DMs, dropping {} notification: {}", member.name, notification.label, e);
            Delivery::Rejected
        }
        Err(e) => {
            warn!(subject_id, label = %notification.label, "Could not send {} DM to {}: {}", notification.label, member.name, e);
            Delivery::Failed
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::TokioClock;
    use crate::mocks::{subject, MockClock, MockGateway};

    const GUILD: GuildId = 1;

    fn notification(subject_id: SubjectId, delay: Duration) -> Notification {
        Notification {
            guild_id: GUILD,
            subject_id,
            label: "24h".into(),
            template: "Hey {user_name}, checking in".into(),
            delay,
        }
    }

    #[tokio::test]
    async fn test_zero_delay_fires_once_with_display_name() {
        let gw = MockGateway::new(1);
        let mut alice = subject(5, "alice");
        alice.display_name = "Alice A.".into();
        gw.add_member(GUILD, alice);

        let scheduler = NotificationScheduler::new(gw.clone(), MockClock::new());
        let handle = scheduler.schedule(notification(5, Duration::ZERO));

        assert_eq!(handle.outcome().await, Some(Delivery::Sent));
        assert_eq!(gw.direct_messages(5), vec!["Hey Alice A., checking in"]);
        assert_eq!(scheduler.pending_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_all_before_delay_prevents_send() {
        let gw = MockGateway::new(1);
        gw.add_member(GUILD, subject(5, "alice"));
        let scheduler = NotificationScheduler::new(gw.clone(), TokioClock);

        let h1 = scheduler.schedule(notification(5, Duration::from_secs(24 * 3600)));
        let h2 = scheduler.schedule(notification(5, Duration::from_secs(72 * 3600)));
        assert_eq!(scheduler.pending_for(5), 2);

        assert_eq!(scheduler.cancel_all(5), 2);
        tokio::time::advance(Duration::from_secs(100 * 3600)).await;

        assert_eq!(h1.outcome().await, None);
        assert_eq!(h2.outcome().await, None);
        assert!(gw.direct_messages(5).is_empty());
        assert_eq!(scheduler.pending_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_is_per_member() {
        let gw = MockGateway::new(1);
        gw.add_member(GUILD, subject(5, "alice"));
        gw.add_member(GUILD, subject(6, "bob"));
        let scheduler = NotificationScheduler::new(gw.clone(), TokioClock);

        let _alice = scheduler.schedule(notification(5, Duration::from_secs(60)));
        let bob = scheduler.schedule(notification(6, Duration::from_secs(60)));
        scheduler.cancel_all(5);

        assert_eq!(bob.outcome().await, Some(Delivery::Sent));
        assert!(gw.direct_messages(5).is_empty());
        assert_eq!(gw.direct_messages(6).len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fires_only_after_delay() {
        let gw = MockGateway::new(1);
        gw.add_member(GUILD, subject(5, "alice"));
        let scheduler = NotificationScheduler::new(gw.clone(), TokioClock);

        let handle = scheduler.schedule(notification(5, Duration::from_secs(3600)));
        tokio::time::advance(Duration::from_secs(3599)).await;
        tokio::task::yield_now().await;
        assert!(gw.direct_messages(5).is_empty());
        assert_eq!(scheduler.pending_for(5), 1);

        assert_eq!(handle.outcome().await, Some(Delivery::Sent));
        assert_eq!(gw.direct_messages(5).len(), 1);
    }

    #[tokio::test]
    async fn test_member_gone_at_fire_time_is_discarded() {
        let gw = MockGateway::new(1);
        let scheduler = NotificationScheduler::new(gw.clone(), MockClock::new());

        let handle = scheduler.schedule(notification(5, Duration::ZERO));
        assert_eq!(handle.outcome().await, Some(Delivery::MemberLeft));
        assert!(gw.sent_messages().is_empty());
    }

    #[tokio::test]
    async fn test_blocked_dm_is_swallowed() {
        let gw = MockGateway::new(1);
        gw.add_member(GUILD, subject(5, "alice"));
        gw.block_dms(5);
        let scheduler = NotificationScheduler::new(gw.clone(), MockClock::new());

        let handle = scheduler.schedule(notification(5, Duration::ZERO));
        assert_eq!(handle.outcome().await, Some(Delivery::Rejected));
        assert!(gw.sent_messages().is_empty());
        assert_eq!(scheduler.pending_count(), 0);
    }

    #[tokio::test]
    async fn test_network_failure_is_not_a_rejection() {
        let gw = MockGateway::new(1);
        gw.add_member(GUILD, subject(5, "alice"));
        gw.break_dms(5);
        let scheduler = NotificationScheduler::new(gw.clone(), MockClock::new());

        let handle = scheduler.schedule(notification(5, Duration::ZERO));
        assert_eq!(handle.outcome().await, Some(Delivery::Failed));
        assert!(gw.sent_messages().is_empty());
        assert_eq!(scheduler.pending_count(), 0);
    }

    #[test]
    fn test_cancel_unknown_member_is_noop() {
        let scheduler = NotificationScheduler::new(MockGateway::new(1), MockClock::new());
        assert_eq!(scheduler.cancel_all(42), 0);
    }
}
