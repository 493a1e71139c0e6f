use std::io;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::watch;
use tracing::warn;

use crate::display;
use crate::snapshot::Snapshot;

/// Consumer of one Snapshot per tick.
#[async_trait]
pub trait PresentationSink: Send {
    async fn present(&mut self, snapshot: Snapshot);
}

/// Writes the rendered HUD text to a terminal, pipe or any async writer.
pub struct ConsoleSink<W> {
    out: W,
}

impl ConsoleSink<tokio::io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(tokio::io::stdout())
    }
}

impl<W: AsyncWrite + Unpin + Send> ConsoleSink<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    async fn write(&mut self, snapshot: &Snapshot) -> io::Result<()> {
        let mut block = display::render_lines(snapshot).join("\n");
        block.push_str("\n\n");
        self.out.write_all(block.as_bytes()).await?;
        self.out.flush().await
    }
}

#[async_trait]
impl<W: AsyncWrite + Unpin + Send> PresentationSink for ConsoleSink<W> {
    async fn present(&mut self, snapshot: Snapshot) {
        if let Err(e) = self.write(&snapshot).await {
            warn!("failed to write display: {}", e);
        }
    }
}

/// Holds only the most recent Snapshot; each tick replaces it whole.
///
/// For embedding the HUD in another program: hand the slot to a
/// `Scheduler` and let the display side read `subscribe()`/`latest()`.
/// The `server-hud` binary uses it for `--once`.
pub struct SnapshotSlot {
    tx: watch::Sender<Option<Arc<Snapshot>>>,
}

impl SnapshotSlot {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(None);
        Self { tx }
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<Arc<Snapshot>>> {
        self.tx.subscribe()
    }

    pub fn latest(&self) -> Option<Arc<Snapshot>> {
        self.tx.borrow().clone()
    }
}

impl Default for SnapshotSlot {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PresentationSink for SnapshotSlot {
    async fn present(&mut self, snapshot: Snapshot) {
        self.tx.send_replace(Some(Arc::new(snapshot)));
    }
}
