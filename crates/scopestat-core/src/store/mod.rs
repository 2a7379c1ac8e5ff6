//! Root registry: owns every scope, the active tag producer and the sinks,
//! and runs the periodic flush loop.

pub mod option;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwapOption;
use parking_lot::Mutex;
use tokio::sync::broadcast;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::error::{Result, StatsError};
use crate::metric::{Counter, Gauge, Histogram};
use crate::scope::Scope;
use crate::sink::{Sink, SinkSet, Source};
use crate::tag::{Tag, TagOption, TagProducer, SEPARATOR};

pub use option::{StoreOption, DEFAULT_FLUSH_INTERVAL};

/// Storage for all known counters, gauges and histograms.
///
/// Cheap to clone; every clone refers to the same registry.
#[derive(Clone)]
pub struct Store {
    inner: Arc<StoreInner>,
}

pub(crate) struct StoreInner {
    flush_interval: Duration,
    histogram_shards: usize,
    scopes: Mutex<HashMap<String, Arc<Scope>>>,
    tag_producer: ArcSwapOption<TagProducer>,
    sinks: Arc<SinkSet>,
}

impl Default for Store {
    fn default() -> Self {
        Self::new(StoreOption::default())
    }
}

impl Store {
    pub fn new(opt: StoreOption) -> Self {
        Self {
            inner: Arc::new(StoreInner {
                flush_interval: flush_period(opt.flush_interval),
                histogram_shards: opt.histogram_shards.max(1),
                scopes: Mutex::new(HashMap::new()),
                tag_producer: ArcSwapOption::empty(),
                sinks: Arc::new(SinkSet::new(opt.sinks)),
            }),
        }
    }

    pub(crate) fn from_inner(inner: Arc<StoreInner>) -> Self {
        Self { inner }
    }

    pub fn flush_interval(&self) -> Duration {
        self.inner.flush_interval
    }

    pub(crate) fn histogram_shards(&self) -> usize {
        self.inner.histogram_shards
    }

    pub(crate) fn sink_set(&self) -> Arc<SinkSet> {
        Arc::clone(&self.inner.sinks)
    }

    /// Subscribe to errors reported by sinks. Errors raised while nobody is
    /// subscribed are dropped.
    pub fn errors(&self) -> broadcast::Receiver<StatsError> {
        self.inner.sinks.subscribe()
    }

    pub fn add_sink(&self, sink: Arc<dyn Sink>) {
        self.inner.sinks.add(sink);
    }

    pub fn sinks(&self) -> Vec<Arc<dyn Sink>> {
        Vec::clone(&self.inner.sinks.load())
    }

    /// Replace the tag configuration used for metrics created from now on.
    ///
    /// All-or-nothing: if any strategy fails to compile, the active producer
    /// is left untouched. Existing metrics keep the tags they were built with.
    pub fn set_tag_option(&self, opt: &TagOption) -> Result<()> {
        let producer = opt.build_producer().map_err(|e| {
            tracing::warn!(error = %e, "tag option rejected");
            e
        })?;
        tracing::debug!(
            default_tags = opt.default_tags.len(),
            strategies = opt.strategies.len(),
            "tag option applied"
        );
        self.inner.tag_producer.store(producer.map(Arc::new));
        Ok(())
    }

    pub(crate) fn tags_for_name(&self, name: &str) -> (String, Vec<Tag>) {
        match self.inner.tag_producer.load_full() {
            Some(producer) => producer.produce(name),
            None => (name.to_string(), Vec::new()),
        }
    }

    /// Get or register the scope named `name` (normalized to end with the
    /// separator), bumping its reference count.
    pub fn create_scope(&self, name: &str) -> Arc<Scope> {
        let name = normalize(name);
        let mut scopes = self.inner.scopes.lock();
        let scope = scopes
            .entry(name)
            .or_insert_with_key(|name| {
                tracing::debug!(scope = %name, "scope created");
                Arc::new(Scope::new(name.clone(), Arc::downgrade(&self.inner)))
            })
            .clone();
        scope.ref_count.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
        scope
    }

    /// Release one reference to `scope` after recursively releasing its
    /// children. A scope leaves the registry when its count reaches zero.
    ///
    /// Lookup is by name: deleting a scope that was already removed (for
    /// example through a concurrent delete of an ancestor) is a no-op.
    pub fn delete_scope(&self, scope: &Scope) {
        let mut scopes = self.inner.scopes.lock();
        delete_with_children(&mut scopes, scope.name());
    }

    /// Every registered scope.
    pub fn scopes(&self) -> Vec<Arc<Scope>> {
        self.inner.scopes.lock().values().cloned().collect()
    }

    /// Used counters across all scopes.
    pub fn counters(&self) -> Vec<Arc<Counter>> {
        self.scopes().iter().flat_map(|s| s.counters()).collect()
    }

    /// Used gauges across all scopes.
    pub fn gauges(&self) -> Vec<Arc<Gauge>> {
        self.scopes().iter().flat_map(|s| s.gauges()).collect()
    }

    /// Used histograms across all scopes.
    pub fn histograms(&self) -> Vec<Arc<Histogram>> {
        self.scopes().iter().flat_map(|s| s.histograms()).collect()
    }

    /// Flush `source` to every sink in registration order, then clear its
    /// cache. Sink errors are forwarded to the error channel.
    pub async fn flush(&self, source: &Source) {
        let sinks = self.inner.sinks.load();
        for sink in sinks.iter() {
            if let Err(e) = sink.flush(source).await {
                tracing::warn!(sink = sink.name(), error = %e, "sink flush failed");
                self.inner.sinks.send_error(e);
            }
        }
        source.clear_cache();
    }

    /// Flush at every interval until `cancel` fires.
    ///
    /// Metrics are not sent anywhere unless this loop is running. A tick in
    /// progress always completes; a sink that never returns stalls the loop.
    pub async fn flushing_loop(&self, cancel: CancellationToken) {
        let period = self.inner.flush_interval;
        let source = Source::new(self.clone());
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tracing::info!(interval_ms = period.as_millis() as u64, "flush loop started");
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {}
            }
            self.flush(&source).await;
        }
        tracing::info!("flush loop stopped");
    }
}

/// A zero period cannot drive a ticker; fall back to the default.
fn flush_period(interval: Duration) -> Duration {
    if interval.is_zero() {
        tracing::warn!(default_ms = DEFAULT_FLUSH_INTERVAL.as_millis() as u64, "zero flush interval; using default");
        return DEFAULT_FLUSH_INTERVAL;
    }
    interval
}

/// Append the separator to non-empty names that lack it.
pub(crate) fn normalize(name: &str) -> String {
    let mut name = name.to_string();
    if !name.is_empty() && !name.ends_with(SEPARATOR) {
        name.push(SEPARATOR);
    }
    name
}

fn delete_with_children(scopes: &mut HashMap<String, Arc<Scope>>, name: &str) {
    let Some(scope) = scopes.get(name).cloned() else {
        return;
    };
    for child in scope.children() {
        // new_child("") indexes the scope under itself
        if child.name() == name {
            continue;
        }
        delete_with_children(scopes, child.name());
    }
    if scope.ref_count() <= 1 {
        scopes.remove(name);
        scope.ref_count.store(0, std::sync::atomic::Ordering::Relaxed);
        tracing::debug!(scope = %name, "scope removed");
        return;
    }
    scope.ref_count.fetch_sub(1, std::sync::atomic::Ordering::Relaxed);
}
