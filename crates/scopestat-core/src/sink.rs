//! Sink contract and the per-tick cached [`Source`] view.

use std::sync::Arc;

use arc_swap::ArcSwap;
use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::broadcast;

use crate::error::{Result, StatsError};
use crate::metric::{Counter, Gauge, Histogram, Metric};
use crate::store::Store;

/// Backend that receives metrics.
///
/// Errors are never fatal: the flush loop forwards them to the store's error
/// channel and moves on to the next sink.
#[async_trait]
pub trait Sink: Send + Sync {
    /// Short identifier used in logs and errors.
    fn name(&self) -> &str;

    /// Flush periodic metrics. Called once per tick, in registration order.
    async fn flush(&self, source: &Source) -> Result<()>;

    /// Observe one raw histogram sample, synchronously from
    /// [`Histogram::record`]. For backends without a native histogram type.
    /// Errors are logged at debug level and otherwise dropped.
    fn write_histogram_sample(&self, histogram: &Histogram, value: u64) -> Result<()>;
}

const ERROR_CHANNEL_CAPACITY: usize = 64;

/// Copy-on-write sink list plus the best-effort error channel.
///
/// Shared by the store and every histogram it creates.
pub(crate) struct SinkSet {
    sinks: ArcSwap<Vec<Arc<dyn Sink>>>,
    writer: Mutex<()>,
    errors: broadcast::Sender<StatsError>,
}

impl SinkSet {
    pub(crate) fn new(sinks: Vec<Arc<dyn Sink>>) -> Self {
        let (errors, _) = broadcast::channel(ERROR_CHANNEL_CAPACITY);
        Self {
            sinks: ArcSwap::from_pointee(sinks),
            writer: Mutex::new(()),
            errors,
        }
    }

    pub(crate) fn load(&self) -> Arc<Vec<Arc<dyn Sink>>> {
        self.sinks.load_full()
    }

    pub(crate) fn add(&self, sink: Arc<dyn Sink>) {
        let _writer = self.writer.lock();
        let current = self.sinks.load_full();
        let mut next = Vec::with_capacity(current.len() + 1);
        next.extend(current.iter().cloned());
        next.push(sink);
        self.sinks.store(Arc::new(next));
    }

    pub(crate) fn subscribe(&self) -> broadcast::Receiver<StatsError> {
        self.errors.subscribe()
    }

    /// Non-blocking; dropped when nobody is subscribed.
    pub(crate) fn send_error(&self, err: StatsError) {
        let _ = self.errors.send(err);
    }

    /// Per-sample failures are logged, never sent on the error channel.
    pub(crate) fn deliver_histogram_sample(&self, histogram: &Histogram, value: u64) {
        for sink in self.sinks.load().iter() {
            if let Err(e) = sink.write_histogram_sample(histogram, value) {
                tracing::debug!(sink = sink.name(), histogram = histogram.name(), error = %e, "histogram sample rejected");
            }
        }
    }
}

type Cached<T> = Mutex<Option<Arc<[Arc<T>]>>>;

/// Caching read view over a store's used metrics for one flush tick.
///
/// The first `cached_*` call of a tick captures the list; for counters it also
/// latches every counter, for histograms it refreshes every interval window.
/// Later calls return the same list until [`Source::clear_cache`], so every
/// sink of a tick sees the same snapshot and the side effects run once.
pub struct Source {
    store: Store,
    counters: Cached<Counter>,
    gauges: Cached<Gauge>,
    histograms: Cached<Histogram>,
}

impl Source {
    pub fn new(store: Store) -> Self {
        Self {
            store,
            counters: Mutex::new(None),
            gauges: Mutex::new(None),
            histograms: Mutex::new(None),
        }
    }

    pub fn cached_counters(&self) -> Arc<[Arc<Counter>]> {
        let mut cached = self.counters.lock();
        if let Some(list) = cached.as_ref() {
            return Arc::clone(list);
        }
        let list: Arc<[Arc<Counter>]> = self.store.counters().into();
        for counter in list.iter() {
            counter.latch();
        }
        *cached = Some(Arc::clone(&list));
        list
    }

    pub fn cached_gauges(&self) -> Arc<[Arc<Gauge>]> {
        let mut cached = self.gauges.lock();
        if let Some(list) = cached.as_ref() {
            return Arc::clone(list);
        }
        let list: Arc<[Arc<Gauge>]> = self.store.gauges().into();
        *cached = Some(Arc::clone(&list));
        list
    }

    pub fn cached_histograms(&self) -> Arc<[Arc<Histogram>]> {
        let mut cached = self.histograms.lock();
        if let Some(list) = cached.as_ref() {
            return Arc::clone(list);
        }
        let list: Arc<[Arc<Histogram>]> = self.store.histograms().into();
        for histogram in list.iter() {
            histogram.refresh_interval_statistics();
        }
        *cached = Some(Arc::clone(&list));
        list
    }

    /// Drop every cached list; the next `cached_*` call re-reads the store.
    pub fn clear_cache(&self) {
        *self.counters.lock() = None;
        *self.gauges.lock() = None;
        *self.histograms.lock() = None;
    }
}
