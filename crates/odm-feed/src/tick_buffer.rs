//! Bounded, arrival-ordered tick storage.
//!
//! Keeps only the most recent `capacity` price points. Appending beyond
//! capacity evicts from the front, so the buffer always holds the last
//! `capacity` points in the order they arrived.
//!
//! Points are never re-sorted by timestamp: the source feed is expected to be
//! arrival-ordered, and a regressing timestamp is stored as-is (logged and
//! counted) so downstream numeric output matches the raw feed.

use odm_core::PricePoint;
use std::collections::VecDeque;
use tracing::warn;

/// Default maximum number of retained points.
pub const DEFAULT_CAPACITY: usize = 1000;

/// Bounded FIFO of ingested price points.
#[derive(Debug, Clone)]
pub struct TickBuffer {
    points: VecDeque<PricePoint>,
    capacity: usize,
    total_appended: u64,
    total_evicted: u64,
    out_of_order: u64,
}

impl Default for TickBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl TickBuffer {
    /// Create a buffer holding at most `capacity` points.
    ///
    /// A zero capacity is raised to 1 so the latest point is always available.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            points: VecDeque::with_capacity(capacity),
            capacity,
            total_appended: 0,
            total_evicted: 0,
            out_of_order: 0,
        }
    }

    /// Append a point, evicting the oldest points while over capacity.
    pub fn append(&mut self, point: PricePoint) {
        if let Some(last) = self.points.back() {
            if point.t < last.t {
                self.out_of_order += 1;
                warn!(
                    last_t = last.t,
                    new_t = point.t,
                    "Tick timestamp regressed, storing in arrival order"
                );
            }
        }

        self.points.push_back(point);
        self.total_appended += 1;

        while self.points.len() > self.capacity {
            self.points.pop_front();
            self.total_evicted += 1;
        }
    }

    /// Ordered copy of the buffer, oldest first.
    pub fn snapshot(&self) -> Vec<PricePoint> {
        self.points.iter().copied().collect()
    }

    /// Iterate oldest to newest without copying.
    pub fn iter(&self) -> impl Iterator<Item = &PricePoint> {
        self.points.iter()
    }

    /// Most recently appended point.
    pub fn latest(&self) -> Option<&PricePoint> {
        self.points.back()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Total points ever appended (including evicted ones).
    pub fn total_appended(&self) -> u64 {
        self.total_appended
    }

    /// Total points evicted by the capacity bound.
    pub fn total_evicted(&self) -> u64 {
        self.total_evicted
    }

    /// Number of appends whose timestamp was earlier than the previous point's.
    pub fn out_of_order_count(&self) -> u64 {
        self.out_of_order
    }

    /// Drop all points (e.g., on feed reset). Counters are preserved.
    pub fn clear(&mut self) {
        self.points.clear();
    }
}
