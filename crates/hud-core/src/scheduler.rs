use std::time::Duration;

use tokio::sync::watch;
use tokio::time;
use tracing::{debug, info};

use crate::aggregator::Aggregator;
use crate::sink::PresentationSink;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    /// Waiting for the next tick
    Idle,
    /// An aggregation is in flight
    Running,
}

/// Runs one aggregation per tick and hands each Snapshot to the sink.
///
/// The next tick starts `interval` after the previous Snapshot was
/// presented, so ticks never overlap; a slow tick only delays the next one.
pub struct Scheduler<K> {
    aggregator: Aggregator,
    sink: K,
    interval: Duration,
    state: watch::Sender<SchedulerState>,
}

impl<K: PresentationSink> Scheduler<K> {
    pub fn new(aggregator: Aggregator, sink: K, interval: Duration) -> Self {
        let (state, _) = watch::channel(SchedulerState::Idle);
        Self {
            aggregator,
            sink,
            interval,
            state,
        }
    }

    pub fn subscribe_state(&self) -> watch::Receiver<SchedulerState> {
        self.state.subscribe()
    }

    /// Tick until `shutdown` turns true (or its sender is dropped). An
    /// in-flight tick always completes; no tick starts after shutdown.
    /// Returns the sink.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) -> K {
        info!("scheduler started, polling every {:?}", self.interval);
        let mut last_tick = None;

        loop {
            if *shutdown.borrow_and_update() {
                break;
            }

            self.state.send_replace(SchedulerState::Running);
            let snapshot = self.aggregator.aggregate().await;
            last_tick = Some(snapshot.tick);
            self.sink.present(snapshot).await;
            self.state.send_replace(SchedulerState::Idle);

            if !wait_for_next_tick(self.interval, &mut shutdown).await {
                break;
            }
        }

        match last_tick {
            Some(tick) => info!("scheduler stopped after tick {}", tick),
            None => info!("scheduler stopped before the first tick"),
        }
        self.sink
    }
}

/// Sleep out the interval. Returns false if shutdown was requested.
async fn wait_for_next_tick(interval: Duration, shutdown: &mut watch::Receiver<bool>) -> bool {
    let sleep = time::sleep(interval);
    tokio::pin!(sleep);

    loop {
        tokio::select! {
            _ = &mut sleep => return true,
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow_and_update() {
                    debug!("shutdown requested while idle");
                    return false;
                }
            }
        }
    }
}
