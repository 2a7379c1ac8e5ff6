//! Metric value types.
//!
//! All mutation is lock-free on atomics, except histogram recording which
//! goes to one of `K` independently locked shards.

pub mod counter;
pub mod gauge;
pub mod histogram;

use std::sync::atomic::{AtomicBool, Ordering};

use crate::tag::Tag;

pub use counter::Counter;
pub use gauge::Gauge;
pub use histogram::{Histogram, HistogramStatistics, SUPPORTED_BUCKETS, SUPPORTED_QUANTILES};

/// Read-only view shared by every metric kind.
pub trait Metric {
    /// Fully-qualified name (scope prefix + local name).
    fn name(&self) -> &str;
    /// Name with every extracted tag substring removed.
    fn tag_extracted_name(&self) -> &str;
    /// Default tags first, then extracted tags in extraction order.
    fn tags(&self) -> &[Tag];
    /// Whether the metric has been written to at least once.
    fn is_used(&self) -> bool;
}

/// Identity and usage flag common to all metrics.
#[derive(Debug, Default)]
pub(crate) struct MetricMeta {
    name: String,
    tag_extracted_name: String,
    tags: Vec<Tag>,
    used: AtomicBool,
}

impl MetricMeta {
    pub(crate) fn new(name: String, tag_extracted_name: String, tags: Vec<Tag>) -> Self {
        Self {
            name,
            tag_extracted_name,
            tags,
            used: AtomicBool::new(false),
        }
    }

    pub(crate) fn mark_used(&self) {
        // plain load first keeps the hot path from dirtying the cache line
        if !self.used.load(Ordering::Relaxed) {
            self.used.store(true, Ordering::Relaxed);
        }
    }
}

macro_rules! impl_metric {
    ($ty:ty) => {
        impl $crate::metric::Metric for $ty {
            fn name(&self) -> &str {
                &self.meta.name
            }
            fn tag_extracted_name(&self) -> &str {
                &self.meta.tag_extracted_name
            }
            fn tags(&self) -> &[$crate::tag::Tag] {
                &self.meta.tags
            }
            fn is_used(&self) -> bool {
                self.meta.used.load(std::sync::atomic::Ordering::Relaxed)
            }
        }
    };
}

pub(crate) use impl_metric;
