//! Active-ticket registry: which member owns which open ticket channel.
//!
//! Every operation takes the lock once and never awaits while holding it,
//! so each read-modify-write is atomic with respect to concurrent button
//! clicks. Creating a channel takes a network round-trip, so `try_begin`
//! reserves the member's slot first and `commit`/`abandon` settle it.

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use helpdesk_types::{ChannelId, SubjectId, Ticket, TicketState};

/// Result of [`TicketRegistry::try_begin`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Begin {
    /// The slot is reserved for the caller, who must `commit` or `abandon` it.
    Reserved,
    /// The member already has an active ticket.
    Existing(Ticket),
    /// Another request from the same member is creating a ticket right now.
    InProgress,
}

/// Result of [`TicketRegistry::begin_close`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseStart {
    Started,
    AlreadyClosing,
}

#[derive(Debug, Clone)]
enum Slot {
    Pending,
    Active(Ticket),
}

#[derive(Debug, Default)]
struct Inner {
    by_subject: HashMap<SubjectId, Slot>,
    /// Channels inside their closing grace period, tracked or not
    closing: HashSet<ChannelId>,
}

impl Inner {
    fn subject_for(&self, channel_id: ChannelId) -> Option<SubjectId> {
        self.by_subject.iter().find_map(|(subject, slot)| match slot {
            Slot::Active(t) if t.channel_id == channel_id => Some(*subject),
            _ => None,
        })
    }
}

#[derive(Debug, Default)]
pub struct TicketRegistry {
    inner: Mutex<Inner>,
}

impl TicketRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn try_begin(&self, subject_id: SubjectId) -> Begin {
        let mut inner = self.lock();
        let existing = inner.by_subject.get(&subject_id).cloned();
        match existing {
            Some(Slot::Active(ticket)) => Begin::Existing(ticket),
            Some(Slot::Pending) => Begin::InProgress,
            None => {
                inner.by_subject.insert(subject_id, Slot::Pending);
                Begin::Reserved
            }
        }
    }

    /// Turn a reservation into an Open ticket.
    pub fn commit(
        &self,
        subject_id: SubjectId,
        channel_id: ChannelId,
        created_at: DateTime<Utc>,
    ) -> Ticket {
        let ticket = Ticket::open(subject_id, channel_id, created_at);
        self.lock()
            .by_subject
            .insert(subject_id, Slot::Active(ticket.clone()));
        ticket
    }

    /// Drop a reservation whose channel could not be created.
    pub fn abandon(&self, subject_id: SubjectId) {
        let mut inner = self.lock();
        if matches!(inner.by_subject.get(&subject_id), Some(Slot::Pending)) {
            inner.by_subject.remove(&subject_id);
        }
    }

    /// Remove the member's entry if it still points at `channel_id`.
    ///
    /// Used when the backing channel turned out to be gone.
    pub fn discard_stale(&self, subject_id: SubjectId, channel_id: ChannelId) -> bool {
        let mut inner = self.lock();
        let stale = matches!(
            inner.by_subject.get(&subject_id),
            Some(Slot::Active(t)) if t.channel_id == channel_id
        );
        if stale {
            inner.by_subject.remove(&subject_id);
        }
        stale
    }

    pub fn end(&self, subject_id: SubjectId) -> Option<Ticket> {
        let mut inner = self.lock();
        if !matches!(inner.by_subject.get(&subject_id), Some(Slot::Active(_))) {
            return None;
        }
        match inner.by_subject.remove(&subject_id) {
            Some(Slot::Active(t)) => Some(t),
            _ => None,
        }
    }

    pub fn find_by_subject(&self, subject_id: SubjectId) -> Option<Ticket> {
        match self.lock().by_subject.get(&subject_id) {
            Some(Slot::Active(t)) => Some(t.clone()),
            _ => None,
        }
    }

    pub fn find_by_channel(&self, channel_id: ChannelId) -> Option<SubjectId> {
        self.lock().subject_for(channel_id)
    }

    /// Mark a channel as closing. A tracked ticket moves to `Closing`.
    pub fn begin_close(&self, channel_id: ChannelId) -> CloseStart {
        let mut inner = self.lock();
        if !inner.closing.insert(channel_id) {
            return CloseStart::AlreadyClosing;
        }
        if let Some(subject) = inner.subject_for(channel_id) {
            if let Some(Slot::Active(t)) = inner.by_subject.get_mut(&subject) {
                t.state = TicketState::Closing;
            }
        }
        CloseStart::Started
    }

    pub fn is_closing(&self, channel_id: ChannelId) -> bool {
        self.lock().closing.contains(&channel_id)
    }

    /// End of the grace period: clear the closing mark and purge the owner's entry.
    ///
    /// Returns the ticket as it leaves the registry, if it was tracked.
    pub fn finish_close(&self, channel_id: ChannelId) -> Option<Ticket> {
        let mut inner = self.lock();
        inner.closing.remove(&channel_id);
        let subject = inner.subject_for(channel_id)?;
        match inner.by_subject.remove(&subject) {
            Some(Slot::Active(mut t)) => {
                t.state = TicketState::Archived;
                Some(t)
            }
            _ => None,
        }
    }

    /// The channel was deleted outside the bot. No-op for unknown channels.
    pub fn purge_channel(&self, channel_id: ChannelId) -> Option<SubjectId> {
        let mut inner = self.lock();
        inner.closing.remove(&channel_id);
        let subject = inner.subject_for(channel_id)?;
        inner.by_subject.remove(&subject);
        Some(subject)
    }

    /// Track an existing channel as the member's Open ticket.
    ///
    /// Never replaces an existing entry or reservation.
    pub fn adopt(
        &self,
        subject_id: SubjectId,
        channel_id: ChannelId,
        created_at: DateTime<Utc>,
    ) -> bool {
        let mut inner = self.lock();
        if inner.by_subject.contains_key(&subject_id) || inner.subject_for(channel_id).is_some() {
            return false;
        }
        inner.by_subject.insert(
            subject_id,
            Slot::Active(Ticket::open(subject_id, channel_id, created_at)),
        );
        true
    }

    /// Number of Open or Closing tickets.
    pub fn active_count(&self) -> usize {
        self.lock()
            .by_subject
            .values()
            .filter(|slot| matches!(slot, Slot::Active(_)))
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts() -> DateTime<Utc> {
        DateTime::<Utc>::from_timestamp(1_700_000_000, 0).unwrap()
    }

    #[test]
    fn test_try_begin_reserves_then_reports_in_progress() {
        let reg = TicketRegistry::new();
        assert_eq!(reg.try_begin(1), Begin::Reserved);
        assert_eq!(reg.try_begin(1), Begin::InProgress);
        // Other members are independent
        assert_eq!(reg.try_begin(2), Begin::Reserved);
    }

    #[test]
    fn test_commit_then_existing() {
        let reg = TicketRegistry::new();
        reg.try_begin(1);
        let ticket = reg.commit(1, 100, ts());
        assert_eq!(ticket.state, TicketState::Open);
        assert_eq!(reg.try_begin(1), Begin::Existing(ticket.clone()));
        assert_eq!(reg.try_begin(1), Begin::Existing(ticket));
        assert_eq!(reg.find_by_channel(100), Some(1));
        assert_eq!(reg.active_count(), 1);
    }

    #[test]
    fn test_abandon_only_drops_reservations() {
        let reg = TicketRegistry::new();
        reg.try_begin(1);
        reg.abandon(1);
        assert_eq!(reg.try_begin(1), Begin::Reserved);
        reg.commit(1, 100, ts());
        reg.abandon(1);
        assert!(reg.find_by_subject(1).is_some());
    }

    #[test]
    fn test_discard_stale_requires_matching_channel() {
        let reg = TicketRegistry::new();
        reg.try_begin(1);
        reg.commit(1, 100, ts());
        assert!(!reg.discard_stale(1, 999));
        assert!(reg.discard_stale(1, 100));
        assert!(reg.find_by_subject(1).is_none());
    }

    #[test]
    fn test_begin_close_is_exclusive() {
        let reg = TicketRegistry::new();
        reg.try_begin(1);
        reg.commit(1, 100, ts());
        assert_eq!(reg.begin_close(100), CloseStart::Started);
        assert_eq!(reg.begin_close(100), CloseStart::AlreadyClosing);
        assert_eq!(reg.find_by_subject(1).unwrap().state, TicketState::Closing);
        // Still counts as active while closing
        assert!(matches!(reg.try_begin(1), Begin::Existing(_)));
    }

    #[test]
    fn test_begin_close_untracked_channel() {
        let reg = TicketRegistry::new();
        assert_eq!(reg.begin_close(555), CloseStart::Started);
        assert!(reg.is_closing(555));
        assert!(reg.finish_close(555).is_none());
        assert!(!reg.is_closing(555));
    }

    #[test]
    fn test_finish_close_purges_entry() {
        let reg = TicketRegistry::new();
        reg.try_begin(1);
        reg.commit(1, 100, ts());
        reg.begin_close(100);
        let t = reg.finish_close(100).unwrap();
        assert_eq!(t.state, TicketState::Archived);
        assert!(reg.find_by_subject(1).is_none());
        assert_eq!(reg.active_count(), 0);
    }

    #[test]
    fn test_purge_channel_idempotent() {
        let reg = TicketRegistry::new();
        reg.try_begin(1);
        reg.commit(1, 100, ts());
        assert_eq!(reg.purge_channel(100), Some(1));
        assert_eq!(reg.purge_channel(100), None);
        assert!(reg.find_by_subject(1).is_none());
    }

    #[test]
    fn test_end() {
        let reg = TicketRegistry::new();
        assert!(reg.end(1).is_none());
        reg.try_begin(1);
        assert!(reg.end(1).is_none(), "pending reservation is not a ticket");
        reg.commit(1, 100, ts());
        assert_eq!(reg.end(1).map(|t| t.channel_id), Some(100));
        assert!(reg.find_by_subject(1).is_none());
    }

    #[test]
    fn test_adopt_never_overwrites() {
        let reg = TicketRegistry::new();
        assert!(reg.adopt(1, 100, ts()));
        assert!(!reg.adopt(1, 200, ts()));
        assert!(!reg.adopt(2, 100, ts()));
        assert_eq!(reg.find_by_subject(1).unwrap().channel_id, 100);
    }
}
