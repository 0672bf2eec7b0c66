//! Display-only elapsed time while recording.

use std::time::Duration;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::{CancellationToken, DropGuard};

use super::status::RecordingStatusHandle;

/// Publishes elapsed time to the status handle until dropped.
pub struct ElapsedTicker {
    started: Instant,
    _stop: DropGuard,
}

impl ElapsedTicker {
    /// Elapsed is always recomputed from `started`, so a late or skipped tick
    /// never accumulates drift.
    pub fn start(status: RecordingStatusHandle, every: Duration) -> Self {
        let started = Instant::now();
        let token = CancellationToken::new();
        let cancelled = token.clone();

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(every);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = cancelled.cancelled() => break,
                    _ = interval.tick() => {
                        status.set_elapsed(elapsed_ms(started)).await;
                    }
                }
            }
        });

        Self {
            started,
            _stop: token.drop_guard(),
        }
    }

    pub fn elapsed_ms(&self) -> u64 {
        elapsed_ms(self.started)
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}
