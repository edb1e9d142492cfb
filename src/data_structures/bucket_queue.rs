use std::collections::VecDeque;
use std::fmt::Debug;

use crate::{Error, Result};

/// Array of FIFO queues indexed by tentative distance, as used by Dial's algorithm.
///
/// The queue is sized once, from the node count and the largest edge weight:
/// a simple path has at most `|V| - 1` edges, so every reachable tentative
/// distance fits in `|V| * max_weight + 1` buckets. With `max_weight == 0`
/// there is a single bucket.
///
/// Scanning is monotonic: [`BucketQueue::pop_next_ready`] never goes back to a
/// bucket it has already passed. This is only sound for non-negative weights,
/// where a relaxation from a node at distance `d` never inserts below `d`.
#[derive(Debug, Clone)]
pub struct BucketQueue<T>
where
    T: Clone + PartialEq + Debug,
{
    /// One FIFO queue per distance value
    buckets: Vec<VecDeque<T>>,

    /// Index of the bucket the next scan starts from
    cursor: usize,

    /// Number of queued entries across all buckets
    len: usize,
}

impl<T> BucketQueue<T>
where
    T: Clone + PartialEq + Debug,
{
    /// Creates a queue with exactly `capacity` buckets (at least one)
    pub fn with_capacity(capacity: usize) -> Self {
        BucketQueue {
            buckets: vec![VecDeque::new(); capacity.max(1)],
            cursor: 0,
            len: 0,
        }
    }

    /// Creates a queue able to hold every shortest-path distance of a graph
    /// with `node_count` nodes and maximum edge weight `max_weight`
    ///
    /// Fails with [`Error::CapacityOverflow`] if the bucket array cannot be allocated.
    pub fn for_graph(node_count: usize, max_weight: u64) -> Result<Self> {
        let capacity = Self::required_capacity(node_count, max_weight)?;
        let mut buckets = Vec::new();
        buckets
            .try_reserve_exact(capacity)
            .map_err(|_| Error::CapacityOverflow {
                nodes: node_count,
                max_weight,
            })?;
        buckets.resize_with(capacity, VecDeque::new);
        Ok(BucketQueue {
            buckets,
            cursor: 0,
            len: 0,
        })
    }

    /// Computes `node_count * max_weight + 1`, failing if it does not fit in memory indices
    pub fn required_capacity(node_count: usize, max_weight: u64) -> Result<usize> {
        let overflow = || Error::CapacityOverflow {
            nodes: node_count,
            max_weight,
        };
        let max_weight = usize::try_from(max_weight).map_err(|_| overflow())?;
        node_count
            .checked_mul(max_weight)
            .and_then(|c| c.checked_add(1))
            .ok_or_else(overflow)
    }

    /// Number of buckets
    pub fn capacity(&self) -> usize {
        self.buckets.len()
    }

    /// Index the next scan starts from
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Returns true if no entries are queued
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the number of queued entries
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns the queue at `index`, if in range
    pub fn bucket(&self, index: usize) -> Option<&VecDeque<T>> {
        self.buckets.get(index)
    }

    /// Appends `item` to the bucket for `distance`.
    ///
    /// A distance outside `[0, capacity)` means the sizing assumption was broken
    /// and is reported as [`Error::InvariantViolation`].
    pub fn insert(&mut self, item: T, distance: u64) -> Result<()> {
        let index = self.index_for(distance)?;
        self.buckets[index].push_back(item);
        self.len += 1;
        Ok(())
    }

    /// Removes the first occurrence of `item` from the bucket for `distance`.
    ///
    /// Returns whether an entry was removed.
    pub fn remove(&mut self, item: &T, distance: u64) -> bool {
        let Ok(index) = self.index_for(distance) else {
            return false;
        };
        let bucket = &mut self.buckets[index];
        match bucket.iter().position(|queued| queued == item) {
            Some(pos) => {
                bucket.remove(pos);
                self.len -= 1;
                true
            }
            None => false,
        }
    }

    /// Scans forward from the cursor to the first non-empty bucket and pops its front entry.
    ///
    /// Returns the entry with its bucket index, or `None` once every remaining
    /// bucket is empty. The cursor stays on the returned bucket so entries added
    /// to it afterwards (zero-weight edges) are still served.
    pub fn pop_next_ready(&mut self) -> Option<(T, usize)> {
        while self.cursor < self.buckets.len() {
            if let Some(item) = self.buckets[self.cursor].pop_front() {
                self.len -= 1;
                return Some((item, self.cursor));
            }
            self.cursor += 1;
        }
        None
    }

    /// Returns an owned copy of every bucket, empty ones included
    pub fn snapshot(&self) -> Vec<Vec<T>> {
        self.buckets
            .iter()
            .map(|bucket| bucket.iter().cloned().collect())
            .collect()
    }

    /// Returns a copy of the buckets with items mapped through `f`
    pub fn snapshot_with<U, F>(&self, mut f: F) -> Vec<Vec<U>>
    where
        F: FnMut(&T) -> U,
    {
        self.buckets
            .iter()
            .map(|bucket| bucket.iter().map(&mut f).collect())
            .collect()
    }

    fn index_for(&self, distance: u64) -> Result<usize> {
        let capacity = self.buckets.len();
        match usize::try_from(distance) {
            Ok(index) if index < capacity => Ok(index),
            _ => Err(Error::InvariantViolation {
                index: distance,
                capacity,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_capacity() {
        assert_eq!(BucketQueue::<usize>::required_capacity(4, 7).unwrap(), 29);
        assert_eq!(BucketQueue::<usize>::required_capacity(3, 0).unwrap(), 1);
        assert_eq!(BucketQueue::<usize>::required_capacity(0, 0).unwrap(), 1);
        assert!(matches!(
            BucketQueue::<usize>::required_capacity(usize::MAX, 2),
            Err(Error::CapacityOverflow { .. })
        ));
    }

    #[test]
    fn test_for_graph_reports_unallocatable_capacity() {
        // 2 * 2^62 + 1 buckets fits usize but not an allocation
        assert!(matches!(
            BucketQueue::<usize>::for_graph(2, 1 << 62),
            Err(Error::CapacityOverflow { nodes: 2, max_weight }) if max_weight == 1 << 62
        ));
        assert_eq!(BucketQueue::<usize>::for_graph(4, 7).unwrap().capacity(), 29);
    }

    #[test]
    fn test_fifo_within_bucket() {
        let mut queue = BucketQueue::with_capacity(4);
        queue.insert('b', 2).unwrap();
        queue.insert('a', 2).unwrap();
        queue.insert('c', 1).unwrap();

        assert_eq!(queue.len(), 3);
        assert_eq!(queue.pop_next_ready(), Some(('c', 1)));
        assert_eq!(queue.pop_next_ready(), Some(('b', 2)));
        assert_eq!(queue.pop_next_ready(), Some(('a', 2)));
        assert_eq!(queue.pop_next_ready(), None);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_insert_out_of_range_is_invariant_violation() {
        let mut queue = BucketQueue::with_capacity(3);
        let err = queue.insert(1usize, 3).unwrap_err();

        assert_eq!(err, Error::InvariantViolation { index: 3, capacity: 3 });
        assert!(queue.is_empty());
    }

    #[test]
    fn test_remove_first_occurrence_only() {
        let mut queue = BucketQueue::with_capacity(2);
        queue.insert(7usize, 1).unwrap();
        queue.insert(8, 1).unwrap();
        queue.insert(7, 1).unwrap();

        assert!(queue.remove(&7, 1));
        assert_eq!(queue.snapshot(), vec![vec![], vec![8, 7]]);
        assert!(!queue.remove(&9, 1));
        assert!(!queue.remove(&8, 0));
        assert!(!queue.remove(&8, 40));
        assert_eq!(queue.len(), 2);
    }

    #[test]
    fn test_cursor_is_monotonic() {
        let mut queue = BucketQueue::with_capacity(5);
        queue.insert(1usize, 3).unwrap();

        assert_eq!(queue.pop_next_ready(), Some((1, 3)));
        assert_eq!(queue.cursor(), 3);

        // An entry behind the cursor is never served again
        queue.insert(2, 1).unwrap();
        queue.insert(3, 3).unwrap();
        assert_eq!(queue.pop_next_ready(), Some((3, 3)));
        assert_eq!(queue.pop_next_ready(), None);
        assert_eq!(queue.cursor(), 5);
    }

    #[test]
    fn test_snapshot_with_maps_items() {
        let mut queue = BucketQueue::with_capacity(2);
        queue.insert(0usize, 0).unwrap();
        queue.insert(1usize, 1).unwrap();

        let names = ["A", "B"];
        assert_eq!(
            queue.snapshot_with(|&i| names[i].to_string()),
            vec![vec!["A".to_string()], vec!["B".to_string()]]
        );
    }
}
