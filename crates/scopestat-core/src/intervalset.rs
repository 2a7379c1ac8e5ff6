//! Sorted, disjoint set of half-open spans.
//!
//! Used by the tag producer to mark byte ranges of a metric name for removal.
//! Invariant: spans are ordered by `left` and for any two neighbours `a`, `b`
//! we have `a.right < b.left` (touching spans are merged).

/// Half-open span `[left, right)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interval {
    pub left: usize,
    pub right: usize,
}

impl Interval {
    pub fn new(left: usize, right: usize) -> Self {
        Self { left, right }
    }
}

#[derive(Debug, Default, Clone)]
pub struct IntervalSet {
    spans: Vec<Interval>,
}

impl IntervalSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `[left, right)`, merging with every span it overlaps or touches.
    pub fn insert(&mut self, left: usize, right: usize) {
        let n = self.spans.len();
        // spans entirely to the left of the new one are kept as-is
        let first = self.spans.partition_point(|s| s.right < left);
        if first == n {
            self.spans.push(Interval::new(left, right));
            return;
        }

        let mut merged = Vec::with_capacity(n + 1);
        merged.extend_from_slice(&self.spans[..first]);

        let left = left.min(self.spans[first].left);
        let mut i = first;
        while i < n {
            let span = self.spans[i];
            if right < span.left {
                merged.push(Interval::new(left, right));
                merged.extend_from_slice(&self.spans[i..]);
                break;
            }
            if right <= span.right {
                merged.push(Interval::new(left, span.right));
                merged.extend_from_slice(&self.spans[i + 1..]);
                break;
            }
            // fully consumed by the growing span
            i += 1;
        }
        if i == n {
            merged.push(Interval::new(left, right));
        }
        self.spans = merged;
    }

    /// Copy of all spans, in order.
    pub fn all_intervals(&self) -> Vec<Interval> {
        self.spans.clone()
    }

    pub fn len(&self) -> usize {
        self.spans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }
}
