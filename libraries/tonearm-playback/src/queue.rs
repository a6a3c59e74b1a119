//! Queue model
//!
//! Invariant-preserving operations over the ordered list of `QueueItem`s.
//! Every function is total: out-of-range input is clamped or reported through
//! the return value, never a panic.
//!
//! ```text
//! Currently Playing: queue[current]
//! ─────────────────────────────
//! play next  -> insert at current + 1
//! play last  -> insert at len
//! ─────────────────────────────
//! pinned items (user queued) survive a selective clear
//! ```

use crate::types::QueueItem;
use tonearm_core::TrackId;

/// Splice `items` into `queue` at `position`
///
/// Positions past the end append. Returns the position actually used.
pub fn insert_at<I>(queue: &mut Vec<QueueItem>, items: I, position: usize) -> usize
where
    I: IntoIterator<Item = QueueItem>,
{
    let position = position.min(queue.len());
    queue.splice(position..position, items);
    position
}

/// Remove the item with `item_id`
///
/// Returns the removed item and the index it occupied, or `None` (queue
/// untouched) when no item matches.
pub fn remove_by_id(queue: &mut Vec<QueueItem>, item_id: &str) -> Option<(usize, QueueItem)> {
    let index = find_index_by_item_id(queue, item_id)?;
    Some((index, queue.remove(index)))
}

/// First item holding `track_id`
pub fn find_by_track_id<'a>(queue: &'a [QueueItem], track_id: &TrackId) -> Option<&'a QueueItem> {
    queue.iter().find(|item| &item.track.id == track_id)
}

/// Index of the first item holding `track_id`
pub fn find_index_by_track_id(queue: &[QueueItem], track_id: &TrackId) -> Option<usize> {
    queue.iter().position(|item| &item.track.id == track_id)
}

/// Index of the item with `item_id`
pub fn find_index_by_item_id(queue: &[QueueItem], item_id: &str) -> Option<usize> {
    queue.iter().position(|item| item.item_id == item_id)
}

/// Pinned items in original relative order
///
/// Exactly the set kept by a "clear but preserve user queue".
pub fn filter_pinned(queue: &[QueueItem]) -> Vec<QueueItem> {
    queue.iter().filter(|item| item.is_pinned).cloned().collect()
}

/// Index after `current`, without wraparound
pub fn next_index(current: usize, len: usize) -> Option<usize> {
    let next = current.checked_add(1)?;
    (next < len).then_some(next)
}

/// Index before `current`, without wraparound
pub fn previous_index(current: usize) -> Option<usize> {
    current.checked_sub(1)
}

/// `0 <= index < len`
pub fn is_valid_index(index: usize, len: usize) -> bool {
    index < len
}

/// Move the item at `from` so that it ends up at `to`
///
/// Returns `false` (queue untouched) if either index is out of range.
pub fn move_item(queue: &mut Vec<QueueItem>, from: usize, to: usize) -> bool {
    let len = queue.len();
    if !is_valid_index(from, len) || !is_valid_index(to, len) {
        return false;
    }
    if from != to {
        let item = queue.remove(from);
        queue.insert(to, item);
    }
    true
}

/// Where the item at `current` sits after `move_item(from, to)`
pub fn index_after_move(current: usize, from: usize, to: usize) -> usize {
    if current == from {
        to
    } else if from < current && to >= current {
        current - 1
    } else if from > current && to <= current {
        current + 1
    } else {
        current
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tonearm_core::Track;

    fn item(id: &str, pinned: bool) -> QueueItem {
        QueueItem::new(Track::new(id, format!("Track {}", id)), pinned)
    }

    fn ids(queue: &[QueueItem]) -> Vec<&str> {
        queue.iter().map(|i| i.track.id.as_str()).collect()
    }

    #[test]
    fn insert_play_next_and_play_last() {
        let mut queue = vec![item("a", false), item("b", false), item("c", false)];

        // play next with current = 0
        insert_at(&mut queue, vec![item("x", true)], 1);
        assert_eq!(ids(&queue), vec!["a", "x", "b", "c"]);

        // play last
        let len = queue.len();
        insert_at(&mut queue, vec![item("y", true), item("z", true)], len);
        assert_eq!(ids(&queue), vec!["a", "x", "b", "c", "y", "z"]);
    }

    #[test]
    fn insert_past_end_appends() {
        let mut queue = vec![item("a", false)];
        let used = insert_at(&mut queue, vec![item("b", true)], 99);
        assert_eq!(used, 1);
        assert_eq!(ids(&queue), vec!["a", "b"]);
    }

    #[test]
    fn remove_by_item_id_not_track_id() {
        let a1 = item("a", false);
        let a2 = item("a", true);
        let target = a2.item_id.clone();
        let mut queue = vec![a1.clone(), a2];

        let (index, removed) = remove_by_id(&mut queue, &target).unwrap();
        assert_eq!(index, 1);
        assert!(removed.is_pinned);
        assert_eq!(queue, vec![a1]);
    }

    #[test]
    fn remove_missing_is_noop() {
        let mut queue = vec![item("a", false)];
        let before = queue.clone();
        assert!(remove_by_id(&mut queue, "nope").is_none());
        assert_eq!(queue, before);
    }

    #[test]
    fn find_first_match_wins() {
        let queue = vec![item("a", false), item("b", false), item("b", true)];
        let id = TrackId::new("b");
        assert_eq!(find_index_by_track_id(&queue, &id), Some(1));
        assert!(!find_by_track_id(&queue, &id).unwrap().is_pinned);
        assert!(find_by_track_id(&queue, &TrackId::new("zz")).is_none());
    }

    #[test]
    fn filter_pinned_keeps_relative_order() {
        let queue = vec![
            item("a", false),
            item("p1", true),
            item("b", false),
            item("p2", true),
        ];
        assert_eq!(ids(&filter_pinned(&queue)), vec!["p1", "p2"]);
        assert!(filter_pinned(&[]).is_empty());
    }

    #[test]
    fn navigation_bounds() {
        assert_eq!(next_index(0, 3), Some(1));
        assert_eq!(next_index(1, 3), Some(2));
        assert_eq!(next_index(2, 3), None);
        assert_eq!(next_index(0, 0), None);
        assert_eq!(next_index(usize::MAX, usize::MAX), None);

        assert_eq!(previous_index(2), Some(1));
        assert_eq!(previous_index(0), None);

        assert!(is_valid_index(0, 1));
        assert!(!is_valid_index(1, 1));
        assert!(!is_valid_index(0, 0));
    }

    #[test]
    fn move_item_forward_and_back() {
        let mut queue = vec![item("a", false), item("b", false), item("c", false)];
        assert!(move_item(&mut queue, 0, 2));
        assert_eq!(ids(&queue), vec!["b", "c", "a"]);

        assert!(move_item(&mut queue, 2, 0));
        assert_eq!(ids(&queue), vec!["a", "b", "c"]);

        assert!(!move_item(&mut queue, 0, 3));
        assert_eq!(ids(&queue), vec!["a", "b", "c"]);
    }

    #[test]
    fn index_follows_item_across_moves() {
        // current item itself moves
        assert_eq!(index_after_move(1, 1, 3), 3);
        // item from before current moves past it
        assert_eq!(index_after_move(2, 0, 4), 1);
        // item from after current moves before it
        assert_eq!(index_after_move(2, 4, 0), 3);
        assert_eq!(index_after_move(2, 4, 2), 3);
        // move entirely on one side
        assert_eq!(index_after_move(2, 3, 4), 2);
        assert_eq!(index_after_move(2, 0, 1), 2);
    }

    #[test]
    fn index_after_move_matches_real_move() {
        for len in 1..6 {
            for current in 0..len {
                for from in 0..len {
                    for to in 0..len {
                        let mut queue: Vec<QueueItem> =
                            (0..len).map(|i| item(&i.to_string(), false)).collect();
                        let current_id = queue[current].item_id.clone();
                        assert!(move_item(&mut queue, from, to));
                        let expected = find_index_by_item_id(&queue, &current_id).unwrap();
                        assert_eq!(index_after_move(current, from, to), expected);
                    }
                }
            }
        }
    }
}
