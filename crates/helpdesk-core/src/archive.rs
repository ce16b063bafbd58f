//! Capacity-bounded archive category.

use helpdesk_types::{ChannelId, ChannelInfo};

/// Channels to delete, oldest first, so that one more channel fits into an
/// archive category currently holding `members`.
///
/// Every channel counts towards `capacity`, but only ticket channels are
/// eligible for eviction. Ties on creation time go to the lower id.
pub fn evictions(members: &[ChannelInfo], capacity: usize) -> Vec<ChannelInfo> {
    if members.len() < capacity {
        return Vec::new();
    }
    let excess = members.len() + 1 - capacity;

    let mut candidates: Vec<&ChannelInfo> = members.iter().filter(|c| c.is_ticket()).collect();
    candidates.sort_by_key(|c| (c.created_at, c.id));
    candidates.into_iter().take(excess).cloned().collect()
}

/// Members of the archive category, excluding `incoming` itself.
pub fn members_of(
    channels: Vec<ChannelInfo>,
    category_id: ChannelId,
    incoming: ChannelId,
) -> Vec<ChannelInfo> {
    channels
        .into_iter()
        .filter(|c| c.is_in(category_id) && c.id != incoming)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};
    use helpdesk_types::{ChannelKind, ARCHIVE_CAPACITY};

    fn chan(id: u64, name: &str, created_secs: i64) -> ChannelInfo {
        ChannelInfo {
            id,
            guild_id: 1,
            name: name.to_string(),
            kind: ChannelKind::Text,
            parent_id: Some(900),
            created_at: DateTime::<Utc>::from_timestamp(created_secs, 0).unwrap(),
            member_grants: vec![],
        }
    }

    fn full_archive(n: usize) -> Vec<ChannelInfo> {
        // Ids ascend while creation times descend, so id order != age order
        (0..n)
            .map(|i| chan(i as u64 + 1, &format!("ticket-{i}"), 10_000 - i as i64))
            .collect()
    }

    #[test]
    fn test_below_capacity_no_evictions() {
        assert!(evictions(&full_archive(ARCHIVE_CAPACITY - 1), ARCHIVE_CAPACITY).is_empty());
        assert!(evictions(&[], ARCHIVE_CAPACITY).is_empty());
    }

    #[test]
    fn test_at_capacity_evicts_exactly_oldest() {
        let members = full_archive(ARCHIVE_CAPACITY);
        let out = evictions(&members, ARCHIVE_CAPACITY);
        assert_eq!(out.len(), 1);
        // Oldest is the last one built (smallest created_secs)
        assert_eq!(out[0].id, ARCHIVE_CAPACITY as u64);
    }

    #[test]
    fn test_over_capacity_evicts_down_to_room_for_one() {
        let members = full_archive(ARCHIVE_CAPACITY + 2);
        let out = evictions(&members, ARCHIVE_CAPACITY);
        assert_eq!(out.len(), 3);
        assert!(out.windows(2).all(|w| w[0].created_at <= w[1].created_at));
    }

    #[test]
    fn test_non_ticket_channels_count_but_are_never_evicted() {
        let mut members = full_archive(ARCHIVE_CAPACITY - 1);
        members.push(chan(999, "rules", 1));
        let out = evictions(&members, ARCHIVE_CAPACITY);
        assert_eq!(out.len(), 1);
        assert_ne!(out[0].id, 999);
    }

    #[test]
    fn test_members_of_excludes_incoming_and_other_categories() {
        let mut other = chan(50, "ticket-x", 5);
        other.parent_id = Some(1);
        let channels = vec![chan(10, "ticket-a", 1), chan(11, "ticket-b", 2), other];
        let members = members_of(channels, 900, 11);
        assert_eq!(members.len(), 1);
        assert_eq!(members[0].id, 10);
    }
}
