//! scopestat core: the in-process metric registry and tag-extraction engine.
//!
//! A [`Store`] owns every [`Scope`]; scopes lazily create counters, gauges and
//! histograms whose names are resolved through the store's active
//! [`TagProducer`]. A single flush loop periodically hands a cached
//! [`Source`] view to every registered [`Sink`].
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here. All fallible paths
//! surface as `StatsError`/`Result`; metric mutation itself is infallible.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod error;
pub mod intervalset;
pub mod metric;
pub mod scope;
pub mod sink;
pub mod store;
pub mod tag;

mod cow;

pub use error::{Result, StatsError};
pub use intervalset::{Interval, IntervalSet};
pub use metric::{Counter, Gauge, Histogram, HistogramStatistics, Metric};
pub use scope::Scope;
pub use sink::{Sink, Source};
pub use store::{Store, StoreOption};
pub use tag::{Tag, TagExtractStrategy, TagExtractor, TagOption, TagProducer};
