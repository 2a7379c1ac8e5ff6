#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

use scopestat_exporter::{config, Exporter};

#[tokio::test]
async fn exporter_serves_configured_store() {
    let cfg = config::load_from_str(
        r#"
version: 1
store:
  flush_interval_ms: 100
tags:
  default:
    env: test
http:
  listen: "127.0.0.1:0"
  namespace: demo
"#,
    )
    .unwrap();

    let exporter = Exporter::start(&cfg).await.unwrap();
    exporter.store().create_scope("svc").counter("hits").add(2);
    let addr = exporter.http_addr().unwrap();

    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream
        .write_all(b"GET /stats/prometheus HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
        .await
        .unwrap();
    let mut resp = String::new();
    stream.read_to_string(&mut resp).await.unwrap();

    assert!(resp.starts_with("HTTP/1.1 200 OK"), "{resp}");
    assert!(resp.contains("demo_svc_hits{env=\"test\"} 2"), "{resp}");

    exporter.shutdown().await;
}

#[tokio::test]
async fn exporter_rejects_bad_extractor() {
    let cfg = config::load_from_str(
        r#"
version: 1
tags:
  extractors:
    - name: broken
      regex: '([a-z'
"#,
    )
    .unwrap();

    let err = Exporter::start(&cfg).await.err().unwrap();
    assert_eq!(err.code(), "INVALID_TAG_EXTRACTOR");
}
