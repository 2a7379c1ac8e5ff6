//! Exporter bootstrap: turn a validated [`ExporterConfig`] into a running
//! store with its flush loop, optional statsd sink, runtime sampler and HTTP
//! exposition.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use scopestat_core::error::StatsError;
use scopestat_core::Store;

use crate::config::ExporterConfig;
use crate::error::Result;
use crate::statsd::StatsdSink;
use crate::{http, runtime};

/// Handle over the background tasks started by [`Exporter::start`].
pub struct Exporter {
    store: Store,
    cancel: CancellationToken,
    http_addr: Option<SocketAddr>,
    tasks: Vec<JoinHandle<()>>,
}

impl Exporter {
    /// Build the store and spawn every configured task. Must be called from
    /// inside a tokio runtime.
    pub async fn start(cfg: &ExporterConfig) -> Result<Self> {
        let mut opt = cfg.store_option();
        if let Some(statsd) = &cfg.statsd {
            opt = opt.with_sinks([Arc::new(StatsdSink::new(
                statsd.address.as_str(),
                statsd.prefix.as_str(),
            )) as Arc<dyn scopestat_core::Sink>]);
        }

        let store = Store::new(opt);
        store.set_tag_option(&cfg.tag_option())?;

        let cancel = CancellationToken::new();
        let mut tasks = Vec::new();

        {
            let store = store.clone();
            let cancel = cancel.clone();
            tasks.push(tokio::spawn(async move { store.flushing_loop(cancel).await }));
        }

        if let Some(rt) = &cfg.runtime {
            let store = store.clone();
            let cancel = cancel.clone();
            let scope = rt.scope.clone();
            let every = Duration::from_millis(rt.interval_ms);
            tasks.push(tokio::spawn(async move {
                runtime::collect_runtime_metrics(store, &scope, every, cancel).await
            }));
        }

        let mut http_addr = None;
        if let Some(h) = &cfg.http {
            let listen: SocketAddr = h
                .listen
                .parse()
                .map_err(|e| StatsError::BadConfig(format!("http.listen: {e}")))?;
            let listener = TcpListener::bind(listen).await?;
            http_addr = Some(listener.local_addr()?);

            let store = store.clone();
            let cancel = cancel.clone();
            let namespace = h.namespace.clone();
            tasks.push(tokio::spawn(async move {
                if let Err(e) = http::serve(listener, store, namespace, cancel).await {
                    tracing::warn!(error = %e, "stats exposition stopped with error");
                }
            }));
        }

        tracing::info!(tasks = tasks.len(), "exporter started");
        Ok(Self {
            store,
            cancel,
            http_addr,
            tasks,
        })
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    /// Bound address of the exposition listener, if HTTP is configured.
    pub fn http_addr(&self) -> Option<SocketAddr> {
        self.http_addr
    }

    /// Cancel every task and wait for them to finish.
    pub async fn shutdown(self) {
        self.cancel.cancel();
        for task in self.tasks {
            if let Err(e) = task.await {
                tracing::warn!(error = %e, "exporter task failed");
            }
        }
        tracing::info!("exporter stopped");
    }
}
