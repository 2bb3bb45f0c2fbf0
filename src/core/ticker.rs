//! Elapsed-seconds counter shown while a reply is pending.
//!
//! The ticker only increments a shared counter. Dropping it cancels the
//! background task, so no exit path can leak a timer.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

const TICK_PERIOD: Duration = Duration::from_secs(1);

#[derive(Debug)]
pub struct ThinkingTicker {
    elapsed: Arc<AtomicU64>,
    cancel_token: CancellationToken,
}

impl ThinkingTicker {
    /// Resets `elapsed` to zero and starts counting. Must be called inside a
    /// Tokio runtime.
    pub fn start(elapsed: Arc<AtomicU64>) -> Self {
        elapsed.store(0, Ordering::SeqCst);
        let cancel_token = CancellationToken::new();

        let counter = elapsed.clone();
        let token = cancel_token.clone();
        tokio::spawn(async move {
            let mut ticks = interval_at(Instant::now() + TICK_PERIOD, TICK_PERIOD);
            ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = ticks.tick() => {
                        counter.fetch_add(1, Ordering::SeqCst);
                    }
                }
            }
        });

        Self {
            elapsed,
            cancel_token,
        }
    }

    pub fn seconds(&self) -> u64 {
        self.elapsed.load(Ordering::SeqCst)
    }

    pub fn stop(&self) {
        self.cancel_token.cancel();
    }

    pub fn is_running(&self) -> bool {
        !self.cancel_token.is_cancelled()
    }
}

impl Drop for ThinkingTicker {
    fn drop(&mut self) {
        self.cancel_token.cancel();
    }
}
