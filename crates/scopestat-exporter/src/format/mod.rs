//! Text renderings of a store's used metrics.
//!
//! - [`PlainFormatter`]: `name: value` lines, alphabetical.
//! - [`PrometheusFormatter`]: Prometheus text exposition format (0.0.4).

pub mod plain;
pub mod prometheus;

use std::sync::Arc;

use scopestat_core::{Counter, Gauge, Histogram, Store};

pub use plain::PlainFormatter;
pub use prometheus::PrometheusFormatter;

pub trait Formatter {
    /// Content-Type header value for the rendered body.
    fn content_type(&self) -> &'static str;

    fn format(
        &mut self,
        gauges: &[Arc<Gauge>],
        counters: &[Arc<Counter>],
        histograms: &[Arc<Histogram>],
    ) -> String;
}

/// Render every used metric of `store`.
pub fn format_store(formatter: &mut dyn Formatter, store: &Store) -> String {
    formatter.format(&store.gauges(), &store.counters(), &store.histograms())
}
