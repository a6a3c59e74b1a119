//! Shuffle algorithm for queue randomization
//!
//! Randomizes the future of the queue while the current item stays put at the
//! head, so shuffling never interrupts the track that is sounding.

use crate::types::QueueItem;
use rand::Rng;

/// Shuffle `queue` keeping the item at `current` as the new head
///
/// Returns the new queue and the new current index: `Some(0)` when a valid
/// current item was pinned to the head, `None` otherwise. Queues of length 0 or
/// 1 are returned unchanged together with the original index.
pub fn shuffle_with_pinned_head<R>(
    queue: &[QueueItem],
    current: Option<usize>,
    rng: &mut R,
) -> (Vec<QueueItem>, Option<usize>)
where
    R: Rng + ?Sized,
{
    if queue.len() <= 1 {
        return (queue.to_vec(), current);
    }

    let head = current.filter(|&i| i < queue.len());

    let mut rest: Vec<QueueItem> = queue
        .iter()
        .enumerate()
        .filter(|(i, _)| Some(*i) != head)
        .map(|(_, item)| item.clone())
        .collect();
    fisher_yates(&mut rest, rng);

    match head {
        Some(index) => {
            let mut shuffled = Vec::with_capacity(queue.len());
            shuffled.push(queue[index].clone());
            shuffled.extend(rest);
            (shuffled, Some(0))
        }
        None => (rest, None),
    }
}

/// Shuffle with the thread-local RNG
pub fn shuffle(queue: &[QueueItem], current: Option<usize>) -> (Vec<QueueItem>, Option<usize>) {
    shuffle_with_pinned_head(queue, current, &mut rand::thread_rng())
}

/// Uniform in-place permutation (Fisher-Yates / Durstenfeld)
pub fn fisher_yates<T, R>(items: &mut [T], rng: &mut R)
where
    R: Rng + ?Sized,
{
    for i in (1..items.len()).rev() {
        let j = rng.gen_range(0..=i);
        items.swap(i, j);
    }
}
