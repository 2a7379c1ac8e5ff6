//! Namespace node owning copy-on-write maps of metrics and child scopes.
//!
//! Scopes are owned by the [`Store`] registry only. A scope reaches back to
//! the store through a weak handle, and its children map holds weak
//! references into the same registry, so no ownership cycle exists.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Weak};

use crate::cow::CowMap;
use crate::metric::{Counter, Gauge, Histogram, Metric};
use crate::store::{Store, StoreInner};
use crate::tag::Tag;

/// A grouping of metrics under a shared name prefix.
pub struct Scope {
    prefix: String,
    store: Weak<StoreInner>,
    pub(crate) ref_count: AtomicUsize,

    children: CowMap<Weak<Scope>>,
    gauges: CowMap<Arc<Gauge>>,
    counters: CowMap<Arc<Counter>>,
    histograms: CowMap<Arc<Histogram>>,
}

impl std::fmt::Debug for Scope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scope")
            .field("prefix", &self.prefix)
            .field("ref_count", &self.ref_count())
            .finish()
    }
}

impl Scope {
    pub(crate) fn new(prefix: String, store: Weak<StoreInner>) -> Self {
        Self {
            prefix,
            store,
            ref_count: AtomicUsize::new(0),
            children: CowMap::default(),
            gauges: CowMap::default(),
            counters: CowMap::default(),
            histograms: CowMap::default(),
        }
    }

    /// Fully-qualified prefix, ending with the separator (or empty).
    pub fn name(&self) -> &str {
        &self.prefix
    }

    /// Number of logical owners sharing this namespace.
    pub fn ref_count(&self) -> usize {
        self.ref_count.load(Ordering::Relaxed)
    }

    fn store(&self) -> Option<Store> {
        self.store.upgrade().map(Store::from_inner)
    }

    fn resolve(&self, name: &str) -> (String, String, Vec<Tag>) {
        let full = format!("{}{}", self.prefix, name);
        let (extracted, tags) = match self.store() {
            Some(store) => store.tags_for_name(&full),
            None => (full.clone(), Vec::new()),
        };
        (full, extracted, tags)
    }

    /// Child scope named `prefix + name`, registered in the store.
    pub fn new_child(&self, name: &str) -> Arc<Scope> {
        self.children.get_or_insert_with(
            name,
            Weak::upgrade,
            || {
                let full = format!("{}{}", self.prefix, name);
                let child = match self.store() {
                    Some(store) => store.create_scope(&full),
                    None => {
                        tracing::warn!(scope = %self.prefix, child = %full, "store dropped; child scope is detached");
                        Arc::new(Scope::new(crate::store::normalize(&full), Weak::new()))
                    }
                };
                (Arc::downgrade(&child), child)
            },
        )
    }

    /// Live children currently indexed by this scope.
    pub fn children(&self) -> Vec<Arc<Scope>> {
        self.children
            .snapshot()
            .values()
            .filter_map(Weak::upgrade)
            .collect()
    }

    /// Gauge named `prefix + name`; created on first access.
    pub fn gauge(&self, name: &str) -> Arc<Gauge> {
        self.gauges.get_or_insert_with(
            name,
            |g| Some(Arc::clone(g)),
            || {
                let (full, extracted, tags) = self.resolve(name);
                let g = Arc::new(Gauge::new(full, extracted, tags));
                (Arc::clone(&g), g)
            },
        )
    }

    /// Counter named `prefix + name`; created on first access.
    pub fn counter(&self, name: &str) -> Arc<Counter> {
        self.counters.get_or_insert_with(
            name,
            |c| Some(Arc::clone(c)),
            || {
                let (full, extracted, tags) = self.resolve(name);
                let c = Arc::new(Counter::new(full, extracted, tags));
                (Arc::clone(&c), c)
            },
        )
    }

    /// Histogram named `prefix + name`; created on first access.
    pub fn histogram(&self, name: &str) -> Arc<Histogram> {
        self.histograms.get_or_insert_with(
            name,
            |h| Some(Arc::clone(h)),
            || {
                let (full, extracted, tags) = self.resolve(name);
                let (sinks, shards) = match self.store() {
                    Some(store) => (Some(store.sink_set()), store.histogram_shards()),
                    None => (None, 1),
                };
                let h = Arc::new(Histogram::with_sinks(sinks, full, extracted, tags, shards));
                (Arc::clone(&h), h)
            },
        )
    }

    /// Gauges that have been written at least once.
    pub fn gauges(&self) -> Vec<Arc<Gauge>> {
        used(&self.gauges)
    }

    /// Counters that have been written at least once.
    pub fn counters(&self) -> Vec<Arc<Counter>> {
        used(&self.counters)
    }

    /// Histograms that have recorded at least once.
    pub fn histograms(&self) -> Vec<Arc<Histogram>> {
        used(&self.histograms)
    }
}

fn used<M: Metric>(map: &CowMap<Arc<M>>) -> Vec<Arc<M>> {
    map.snapshot()
        .values()
        .filter(|m| m.is_used())
        .cloned()
        .collect()
}
