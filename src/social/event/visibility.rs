//! Visible-events aggregation

use crate::social::event::models::{Event, VisibleEvents};
use std::collections::HashSet;

/// Split `events` into what `user_id` may see.
///
/// The user's own events are skipped. The public check runs first, so a
/// public event from a friend lands in `public` and never in `friends`.
/// Private events from non-friends are dropped. Input order is kept within
/// each bucket.
pub fn partition_visible_events(
    user_id: &str,
    events: Vec<Event>,
    friend_ids: &HashSet<String>,
) -> VisibleEvents {
    let mut visible = VisibleEvents::default();
    for event in events {
        if event.organiser_id == user_id {
            continue;
        }
        if event.is_public {
            visible.public.push(event);
        } else if friend_ids.contains(&event.organiser_id) {
            visible.friends.push(event);
        }
    }
    visible
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(id: &str, organiser: &str, is_public: bool, start: i64) -> Event {
        Event {
            id: id.into(),
            organiser_id: organiser.into(),
            title: format!("party {}", id),
            description: None,
            is_public,
            requires_approval: false,
            start_time: start,
            end_time: start + 1,
            capacity: None,
            location: None,
            created_at: 0,
            updated_at: 0,
        }
    }

    fn ids(events: &[Event]) -> Vec<&str> {
        events.iter().map(|e| e.id.as_str()).collect()
    }

    #[test]
    fn public_wins_over_friendship() {
        let friends = HashSet::from(["bob".to_string()]);
        let visible = partition_visible_events(
            "alice",
            vec![event("e1", "bob", true, 1), event("e2", "bob", false, 2)],
            &friends,
        );
        assert_eq!(ids(&visible.public), vec!["e1"]);
        assert_eq!(ids(&visible.friends), vec!["e2"]);
    }

    #[test]
    fn own_and_strangers_private_events_are_hidden() {
        let friends = HashSet::from(["bob".to_string()]);
        let visible = partition_visible_events(
            "alice",
            vec![
                event("own-public", "alice", true, 1),
                event("own-private", "alice", false, 2),
                event("stranger-private", "mallory", false, 3),
                event("stranger-public", "mallory", true, 4),
            ],
            &friends,
        );
        assert_eq!(ids(&visible.public), vec!["stranger-public"]);
        assert!(visible.friends.is_empty());
    }

    #[test]
    fn buckets_keep_input_order() {
        let friends = HashSet::from(["bob".to_string(), "carol".to_string()]);
        let visible = partition_visible_events(
            "alice",
            vec![
                event("a", "carol", false, 1),
                event("b", "dave", true, 2),
                event("c", "bob", false, 3),
                event("d", "bob", true, 4),
            ],
            &friends,
        );
        assert_eq!(ids(&visible.friends), vec!["a", "c"]);
        assert_eq!(ids(&visible.public), vec!["b", "d"]);
    }
}
