//! Sharded histogram with interval and cumulative windows.
//!
//! Samples are column-striped over `K` shards picked round-robin by an atomic
//! sample counter, so concurrent recorders rarely meet on the same lock. The
//! flush path merges all shards into the interval window and folds the merge
//! into the cumulative window.
//!
//! Shards are merged and reset one at a time. A sample recorded while a
//! refresh is walking the shards lands either in this window or the next one;
//! the windows are not a single atomic cut.

use std::fmt::Write;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use arc_swap::ArcSwap;
use parking_lot::Mutex;

use crate::sink::SinkSet;
use crate::tag::Tag;

use super::{impl_metric, MetricMeta};

type RawHistogram = hdrhistogram::Histogram<u64>;

/// Quantile probabilities reported by every statistics object.
pub const SUPPORTED_QUANTILES: [f64; 7] = [0.0, 0.25, 0.5, 0.9, 0.95, 0.99, 1.0];

/// Ascending bucket upper bounds reported by every statistics object.
pub const SUPPORTED_BUCKETS: [f64; 19] = [
    0.5, 1.0, 5.0, 10.0, 25.0, 50.0, 100.0, 250.0, 500.0, 1000.0, 2500.0, 5000.0, 10000.0,
    30000.0, 60000.0, 300000.0, 600000.0, 1800000.0, 3600000.0,
];

const SIGNIFICANT_FIGURES: u8 = 2;

/// Preallocated range covers the whole bucket table; larger values resize.
const INITIAL_HIGHEST_VALUE: u64 = 3_600_000;

/// Marker rendered by [`Histogram::summary`] before any sample is folded in.
pub const NO_VALUES: &str = "No recorded values";

#[allow(clippy::expect_used)]
fn new_raw() -> RawHistogram {
    // constant bounds: low 1, high >= 2 * low, 2 significant figures
    let mut h = RawHistogram::new_with_bounds(1, INITIAL_HIGHEST_VALUE, SIGNIFICANT_FIGURES)
        .expect("valid histogram bounds");
    h.auto(true);
    h
}

fn record_into(raw: &mut RawHistogram, value: u64) {
    // resizes as needed; only fails when the value cannot be represented at all
    if let Err(e) = raw.record(value) {
        tracing::debug!(value, error = ?e, "histogram record failed; clamping");
        raw.saturating_record(value);
    }
}

fn merge_into(dst: &mut RawHistogram, src: &RawHistogram) {
    // auto-resize means adding can only fail on counter overflow
    if let Err(e) = dst.add(src) {
        tracing::warn!(error = %e, "histogram merge failed");
    }
}

/// A histogram metric.
pub struct Histogram {
    meta: MetricMeta,
    sinks: Option<Arc<SinkSet>>,

    sample_count: AtomicU64,
    shards: Box<[Mutex<RawHistogram>]>,

    interval: ArcSwap<RawHistogram>,
    cumulative: Mutex<RawHistogram>,
}

impl_metric!(Histogram);

impl std::fmt::Debug for Histogram {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Histogram")
            .field("meta", &self.meta)
            .field("shards", &self.shards.len())
            .finish()
    }
}

impl Histogram {
    /// Standalone histogram that does not forward samples to any sink.
    pub fn new(
        name: impl Into<String>,
        tag_extracted_name: impl Into<String>,
        tags: Vec<Tag>,
        shards: usize,
    ) -> Self {
        Self::with_sinks(None, name.into(), tag_extracted_name.into(), tags, shards)
    }

    pub(crate) fn with_sinks(
        sinks: Option<Arc<SinkSet>>,
        name: String,
        tag_extracted_name: String,
        tags: Vec<Tag>,
        shards: usize,
    ) -> Self {
        let shards = shards.max(1);
        Self {
            meta: MetricMeta::new(name, tag_extracted_name, tags),
            sinks,
            sample_count: AtomicU64::new(0),
            shards: (0..shards).map(|_| Mutex::new(new_raw())).collect(),
            interval: ArcSwap::from_pointee(new_raw()),
            cumulative: Mutex::new(new_raw()),
        }
    }

    pub fn shard_count(&self) -> usize {
        self.shards.len()
    }

    /// Record one sample and hand it to sinks that want raw samples.
    pub fn record(&self, value: u64) {
        let seq = self.sample_count.fetch_add(1, Ordering::Relaxed);
        let idx = (seq % self.shards.len() as u64) as usize;
        if let Some(shard) = self.shards.get(idx) {
            record_into(&mut shard.lock(), value);
        }
        if let Some(sinks) = &self.sinks {
            sinks.deliver_histogram_sample(self, value);
        }
        self.meta.mark_used();
    }

    /// Merge and reset every shard, replace the interval window with the
    /// merge, and fold the merge into the cumulative window.
    pub fn refresh_interval_statistics(&self) {
        let mut merged = new_raw();
        for shard in self.shards.iter() {
            let mut raw = shard.lock();
            merge_into(&mut merged, &raw);
            raw.reset();
        }
        merge_into(&mut self.cumulative.lock(), &merged);
        self.interval.store(Arc::new(merged));
    }

    /// Statistics over samples folded in by the last refresh.
    pub fn interval_statistics(&self) -> HistogramStatistics {
        HistogramStatistics::new(&self.interval.load())
    }

    /// Statistics over every sample ever folded in.
    pub fn cumulative_statistics(&self) -> HistogramStatistics {
        HistogramStatistics::new(&self.cumulative.lock())
    }

    /// `P<pct>(<interval>,<cumulative>)` for each supported quantile.
    pub fn summary(&self) -> String {
        let cumulative = self.cumulative_statistics();
        if cumulative.sample_count() == 0 {
            return NO_VALUES.to_string();
        }
        let interval = self.interval_statistics();

        let mut out = String::new();
        for (i, q) in SUPPORTED_QUANTILES.iter().enumerate() {
            if i > 0 {
                out.push(' ');
            }
            let _ = write!(
                out,
                "P{}({},{})",
                (q * 100.0).round() as u32,
                interval.computed_quantiles()[i] as u64,
                cumulative.computed_quantiles()[i] as u64,
            );
        }
        out
    }
}

/// Point-in-time statistics computed from one histogram window.
#[derive(Debug, Clone, PartialEq)]
pub struct HistogramStatistics {
    sample_count: u64,
    sample_sum: f64,
    quantiles: Vec<f64>,
    buckets: Vec<u64>,
}

impl HistogramStatistics {
    fn new(h: &RawHistogram) -> Self {
        let sample_count = h.len();
        if sample_count == 0 {
            return Self {
                sample_count,
                sample_sum: 0.0,
                quantiles: vec![0.0; SUPPORTED_QUANTILES.len()],
                buckets: vec![0; SUPPORTED_BUCKETS.len()],
            };
        }

        Self {
            sample_count,
            sample_sum: h.mean() * sample_count as f64,
            quantiles: SUPPORTED_QUANTILES
                .iter()
                .map(|&q| h.value_at_quantile(q) as f64)
                .collect(),
            buckets: SUPPORTED_BUCKETS
                .iter()
                .map(|&b| h.count_between(0, b.floor() as u64))
                .collect(),
        }
    }

    pub fn sample_count(&self) -> u64 {
        self.sample_count
    }

    /// Approximate sum of all samples.
    pub fn sample_sum(&self) -> f64 {
        self.sample_sum
    }

    pub fn supported_quantiles(&self) -> &'static [f64] {
        &SUPPORTED_QUANTILES
    }

    /// Approximate value at each of [`Self::supported_quantiles`].
    pub fn computed_quantiles(&self) -> &[f64] {
        &self.quantiles
    }

    pub fn supported_buckets(&self) -> &'static [f64] {
        &SUPPORTED_BUCKETS
    }

    /// Approximate number of samples at or below each bucket bound.
    pub fn computed_buckets(&self) -> &[u64] {
        &self.buckets
    }
}
