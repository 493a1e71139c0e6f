//! Test doubles shared by the adapter, aggregator and scheduler tests.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use hud_platform::source::Source;
use hud_platform::Reading;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio::time::{self, Instant};

/// Loopback HTTP server answering every request with a canned response
/// after `delay`. Returns the base URL and the request heads it received.
pub(crate) async fn http_stub(
    status: u16,
    body: &'static str,
    delay: Duration,
) -> (String, mpsc::UnboundedReceiver<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (seen_tx, seen_rx) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let seen_tx = seen_tx.clone();
            tokio::spawn(async move {
                let mut buf = vec![0u8; 8192];
                let mut read = 0;
                while read < buf.len() {
                    let n = socket.read(&mut buf[read..]).await.unwrap_or(0);
                    if n == 0 {
                        break;
                    }
                    read += n;
                    if buf[..read].windows(4).any(|w| w == b"\r\n\r\n") {
                        break;
                    }
                }
                let _ = seen_tx.send(String::from_utf8_lossy(&buf[..read]).to_string());

                time::sleep(delay).await;
                let reason = if status == 200 { "OK" } else { "Error" };
                let response = format!(
                    "HTTP/1.1 {} {}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                    status,
                    reason,
                    body.len(),
                    body
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    (format!("http://{}/stats", addr), seen_rx)
}

/// A URL nothing listens on.
pub(crate) async fn dead_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}/stats", addr)
}

/// Start/finish instants of every fetch, shared across fakes.
pub(crate) type CallLog = Arc<Mutex<Vec<(&'static str, Instant, Instant)>>>;

/// Source returning a fixed reading after a fixed delay.
pub(crate) struct FakeSource<T> {
    name: &'static str,
    delay: Duration,
    reading: Reading<T>,
    log: CallLog,
}

impl<T> FakeSource<T> {
    pub(crate) fn new(name: &'static str, delay: Duration, reading: Reading<T>) -> Self {
        Self {
            name,
            delay,
            reading,
            log: CallLog::default(),
        }
    }

    pub(crate) fn with_log(mut self, log: CallLog) -> Self {
        self.log = log;
        self
    }
}

#[async_trait]
impl<T: Clone + Send + Sync + 'static> Source for FakeSource<T> {
    type Output = T;

    fn name(&self) -> &'static str {
        self.name
    }

    async fn fetch(&self) -> Reading<T> {
        let started = Instant::now();
        time::sleep(self.delay).await;
        self.log
            .lock()
            .unwrap()
            .push((self.name, started, Instant::now()));
        self.reading.clone()
    }
}

/// Source whose fetch panics.
pub(crate) struct PanicSource<T>(std::marker::PhantomData<fn() -> T>);

impl<T> PanicSource<T> {
    pub(crate) fn new() -> Self {
        Self(std::marker::PhantomData)
    }
}

#[async_trait]
impl<T: Send + 'static> Source for PanicSource<T> {
    type Output = T;

    fn name(&self) -> &'static str {
        "panicky"
    }

    async fn fetch(&self) -> Reading<T> {
        panic!("adapter bug");
    }
}
