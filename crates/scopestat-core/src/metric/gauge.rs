use std::sync::atomic::{AtomicU64, Ordering};

use crate::tag::Tag;

use super::{impl_metric, MetricMeta};

/// Single value that can go up and down. Unsigned; sub/dec wrap on underflow.
#[derive(Debug, Default)]
pub struct Gauge {
    meta: MetricMeta,
    value: AtomicU64,
}

impl_metric!(Gauge);

impl Gauge {
    pub fn new(name: impl Into<String>, tag_extracted_name: impl Into<String>, tags: Vec<Tag>) -> Self {
        Self {
            meta: MetricMeta::new(name.into(), tag_extracted_name.into(), tags),
            value: AtomicU64::new(0),
        }
    }

    pub fn set(&self, value: u64) {
        self.value.store(value, Ordering::Relaxed);
        self.meta.mark_used();
    }

    pub fn add(&self, amount: u64) {
        self.value.fetch_add(amount, Ordering::Relaxed);
        self.meta.mark_used();
    }

    pub fn sub(&self, amount: u64) {
        self.value.fetch_sub(amount, Ordering::Relaxed);
        self.meta.mark_used();
    }

    pub fn inc(&self) {
        self.add(1);
    }

    pub fn dec(&self) {
        self.sub(1);
    }

    pub fn value(&self) -> u64 {
        self.value.load(Ordering::Relaxed)
    }
}
