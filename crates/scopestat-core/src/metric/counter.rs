use std::sync::atomic::{AtomicU64, Ordering};

use crate::tag::Tag;

use super::{impl_metric, MetricMeta};

/// Monotonic counter with a per-interval delta.
///
/// Every increment goes to both the cumulative value and the pending delta;
/// [`Counter::latch`] moves the pending delta into the interval value.
#[derive(Debug, Default)]
pub struct Counter {
    meta: MetricMeta,
    value: AtomicU64,
    pending: AtomicU64,
    interval: AtomicU64,
}

impl_metric!(Counter);

impl Counter {
    pub fn new(name: impl Into<String>, tag_extracted_name: impl Into<String>, tags: Vec<Tag>) -> Self {
        Self {
            meta: MetricMeta::new(name.into(), tag_extracted_name.into(), tags),
            ..Default::default()
        }
    }

    /// Add `amount`. Wraps on overflow.
    pub fn add(&self, amount: u64) {
        self.value.fetch_add(amount, Ordering::Relaxed);
        self.pending.fetch_add(amount, Ordering::Relaxed);
        self.meta.mark_used();
    }

    pub fn inc(&self) {
        self.add(1);
    }

    /// Take the delta accumulated since the previous latch and reset it.
    pub fn latch(&self) -> u64 {
        let delta = self.pending.swap(0, Ordering::AcqRel);
        self.interval.store(delta, Ordering::Relaxed);
        delta
    }

    /// Delta captured by the last latch.
    pub fn interval_value(&self) -> u64 {
        self.interval.load(Ordering::Relaxed)
    }

    /// Cumulative value.
    pub fn value(&self) -> u64 {
        self.value.load(Ordering::Relaxed)
    }
}
