use std::sync::Arc;
use std::time::Duration;

use crate::sink::Sink;

/// Default interval between two flush ticks.
pub const DEFAULT_FLUSH_INTERVAL: Duration = Duration::from_secs(5);

/// Options of a [`Store`](super::Store): flush interval, sinks, histogram
/// shard count.
#[derive(Clone)]
pub struct StoreOption {
    pub flush_interval: Duration,
    pub sinks: Vec<Arc<dyn Sink>>,
    /// Shards per histogram. Defaults to the available parallelism.
    pub histogram_shards: usize,
}

impl Default for StoreOption {
    fn default() -> Self {
        Self {
            flush_interval: DEFAULT_FLUSH_INTERVAL,
            sinks: Vec::new(),
            histogram_shards: default_histogram_shards(),
        }
    }
}

impl StoreOption {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_flush_interval(mut self, interval: Duration) -> Self {
        self.flush_interval = interval;
        self
    }

    pub fn with_sinks(mut self, sinks: impl IntoIterator<Item = Arc<dyn Sink>>) -> Self {
        self.sinks = sinks.into_iter().collect();
        self
    }

    pub fn with_histogram_shards(mut self, shards: usize) -> Self {
        self.histogram_shards = shards.max(1);
        self
    }
}

fn default_histogram_shards() -> usize {
    std::thread::available_parallelism().map_or(1, |n| n.get())
}
