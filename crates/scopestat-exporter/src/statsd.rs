//! Statsd push sink (UDP line protocol).
//!
//! Counters are pushed as their latched interval delta (`|c`), gauges as
//! their absolute value (`|g`). Histograms are not aggregated here: every raw
//! sample is pushed as a timing (`|ms`) the moment it is recorded.

use std::net::UdpSocket;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::{BufMut, BytesMut};
use parking_lot::Mutex;

use scopestat_core::error::{Result, StatsError};
use scopestat_core::{Histogram, Metric, Sink, Source};

/// Keeps a datagram inside a typical Ethernet MTU.
const MAX_DATAGRAM: usize = 1432;

pub struct StatsdSink {
    address: String,
    prefix: String,
    socket: Mutex<Option<Arc<UdpSocket>>>,
}

impl StatsdSink {
    pub fn new(address: impl Into<String>, prefix: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            prefix: prefix.into(),
            socket: Mutex::new(None),
        }
    }

    /// Created on first use; a failed attempt is retried on the next call.
    fn socket(&self) -> Result<Arc<UdpSocket>> {
        let mut slot = self.socket.lock();
        if let Some(sock) = slot.as_ref() {
            return Ok(Arc::clone(sock));
        }

        let sock = UdpSocket::bind("0.0.0.0:0")
            .and_then(|s| s.connect(&self.address).map(|_| s))
            .and_then(|s| s.set_nonblocking(true).map(|_| s))
            .map_err(|e| StatsError::sink(self.name(), format!("error creating statsd client: {e}")))?;
        tracing::debug!(address = %self.address, "statsd socket ready");

        let sock = Arc::new(sock);
        *slot = Some(Arc::clone(&sock));
        Ok(sock)
    }

    fn line(&self, buf: &mut BytesMut, name: &str, value: u64, kind: &str) {
        if !self.prefix.is_empty() {
            buf.put_slice(self.prefix.as_bytes());
            buf.put_u8(b'.');
        }
        buf.put_slice(name.as_bytes());
        buf.put_u8(b':');
        buf.put_slice(value.to_string().as_bytes());
        buf.put_u8(b'|');
        buf.put_slice(kind.as_bytes());
    }

    fn send(&self, sock: &UdpSocket, packet: &[u8]) -> Result<()> {
        sock.send(packet)
            .map(|_| ())
            .map_err(|e| StatsError::sink(self.name(), e))
    }
}

/// Appends lines to a datagram, sending whenever the next line would not fit.
struct Batch<'a> {
    sink: &'a StatsdSink,
    sock: &'a UdpSocket,
    packet: BytesMut,
    line: BytesMut,
    first_err: Option<StatsError>,
}

impl<'a> Batch<'a> {
    fn new(sink: &'a StatsdSink, sock: &'a UdpSocket) -> Self {
        Self {
            sink,
            sock,
            packet: BytesMut::with_capacity(MAX_DATAGRAM),
            line: BytesMut::new(),
            first_err: None,
        }
    }

    fn push(&mut self, name: &str, value: u64, kind: &str) {
        self.line.clear();
        self.sink.line(&mut self.line, name, value, kind);
        if !self.packet.is_empty() && self.packet.len() + 1 + self.line.len() > MAX_DATAGRAM {
            self.flush();
        }
        if !self.packet.is_empty() {
            self.packet.put_u8(b'\n');
        }
        self.packet.extend_from_slice(&self.line);
    }

    fn flush(&mut self) {
        if self.packet.is_empty() {
            return;
        }
        if let Err(e) = self.sink.send(self.sock, &self.packet) {
            self.first_err.get_or_insert(e);
        }
        self.packet.clear();
    }

    fn finish(mut self) -> Result<()> {
        self.flush();
        match self.first_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl Sink for StatsdSink {
    fn name(&self) -> &str {
        "statsd"
    }

    async fn flush(&self, source: &Source) -> Result<()> {
        let sock = self.socket()?;
        let mut batch = Batch::new(self, &sock);
        for c in source.cached_counters().iter() {
            batch.push(c.name(), c.interval_value(), "c");
        }
        for g in source.cached_gauges().iter() {
            batch.push(g.name(), g.value(), "g");
        }
        batch.finish()
    }

    fn write_histogram_sample(&self, histogram: &Histogram, value: u64) -> Result<()> {
        let sock = self.socket()?;
        let mut buf = BytesMut::new();
        self.line(&mut buf, histogram.name(), value, "ms");
        self.send(&sock, &buf)
    }
}
