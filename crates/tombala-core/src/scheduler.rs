// Periodic background draws.
//
// The scheduler owns no game state. Every period it asks a `DrawTick`
// implementation to perform one atomic draw step; the tick decides whether
// drawing continues. The sleep happens outside any lock. The loop holds the
// target weakly: the target usually owns the scheduler handle.

use std::sync::Weak;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::info;

/// Result of one draw step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Continue,
    Stop(StopReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// Every number has been drawn.
    Exhausted,
    /// The round ended elsewhere (full house or reset) or was replaced.
    Deactivated,
    /// [`DrawScheduler::stop`] was called, the handle was dropped, or the
    /// tick target is gone.
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    Running,
    Stopped,
}

/// One atomic draw step, run while holding the session lock.
#[async_trait]
pub trait DrawTick: Send + Sync + 'static {
    async fn tick(&self, round: u64) -> TickOutcome;
}

/// Handle to a running draw loop bound to one round.
#[derive(Debug)]
pub struct DrawScheduler {
    round: u64,
    stop_tx: watch::Sender<bool>,
    handle: JoinHandle<StopReason>,
}

impl DrawScheduler {
    /// Spawn the draw loop for `round` on the current tokio runtime.
    pub fn spawn<T: DrawTick>(target: Weak<T>, round: u64, interval: Duration) -> Self {
        let (stop_tx, stop_rx) = watch::channel(false);
        let handle = tokio::spawn(run_loop(target, round, interval, stop_rx));
        info!(round, interval_secs = interval.as_secs(), "Draw scheduler started");
        DrawScheduler {
            round,
            stop_tx,
            handle,
        }
    }

    /// Ask the loop to exit. Takes effect at the loop's next suspension
    /// point; a tick already holding the lock finishes first.
    pub fn stop(&self) {
        let _ = self.stop_tx.send(true);
    }

    pub fn round(&self) -> u64 {
        self.round
    }

    pub fn state(&self) -> SchedulerState {
        if self.handle.is_finished() {
            SchedulerState::Stopped
        } else {
            SchedulerState::Running
        }
    }

    /// Wait for the loop to exit. A panicked or aborted loop counts as
    /// cancelled.
    pub async fn join(self) -> StopReason {
        self.handle.await.unwrap_or(StopReason::Cancelled)
    }
}

async fn run_loop<T: DrawTick>(
    target: Weak<T>,
    round: u64,
    interval: Duration,
    mut stop_rx: watch::Receiver<bool>,
) -> StopReason {
    let reason = loop {
        tokio::select! {
            _ = tokio::time::sleep(interval) => {}
            // Err means the handle was dropped.
            _ = stop_rx.changed() => break StopReason::Cancelled,
        }
        if *stop_rx.borrow() {
            break StopReason::Cancelled;
        }

        let Some(live) = target.upgrade() else {
            break StopReason::Cancelled;
        };
        match live.tick(round).await {
            TickOutcome::Continue => continue,
            TickOutcome::Stop(reason) => break reason,
        }
    };
    info!(round, ?reason, "Draw scheduler stopped");
    reason
}
