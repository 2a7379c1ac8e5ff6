//! Copy-on-write string-keyed map.
//!
//! Readers load the current immutable snapshot without locking. Writers
//! serialize on a private mutex, clone the snapshot, insert and publish.

use std::collections::HashMap;
use std::sync::Arc;

use arc_swap::ArcSwap;
use parking_lot::Mutex;

pub(crate) struct CowMap<V> {
    current: ArcSwap<HashMap<String, V>>,
    writer: Mutex<()>,
}

impl<V> Default for CowMap<V> {
    fn default() -> Self {
        Self {
            current: ArcSwap::from_pointee(HashMap::new()),
            writer: Mutex::new(()),
        }
    }
}

impl<V: Clone> CowMap<V> {
    /// Current snapshot.
    pub(crate) fn snapshot(&self) -> Arc<HashMap<String, V>> {
        self.current.load_full()
    }

    /// Double-checked lookup-or-create.
    ///
    /// `resolve` turns a stored value into the returned one (and may reject
    /// it, e.g. a dead weak reference); `create` builds the value to publish
    /// and the value to return. Only one `create` runs per key at a time.
    pub(crate) fn get_or_insert_with<R>(
        &self,
        key: &str,
        resolve: impl Fn(&V) -> Option<R>,
        create: impl FnOnce() -> (V, R),
    ) -> R {
        if let Some(found) = self.current.load().get(key).and_then(&resolve) {
            return found;
        }

        let _writer = self.writer.lock();
        let current = self.current.load_full();
        if let Some(found) = current.get(key).and_then(&resolve) {
            return found;
        }

        let (value, ret) = create();
        let mut next = HashMap::with_capacity(current.len() + 1);
        next.extend(current.iter().map(|(k, v)| (k.clone(), v.clone())));
        next.insert(key.to_string(), value);
        self.current.store(Arc::new(next));
        ret
    }
}
