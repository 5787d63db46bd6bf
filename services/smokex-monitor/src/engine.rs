//! Engine: drives the fetch → reduce → merge pipeline on a fixed interval

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::poller::{PollCycle, PollResult, Poller};
use crate::reducer::Reducer;
use crate::state::StateHandle;

/// Polls the receiver and commits each cycle to the shared state.
///
/// There is exactly one poll in flight at a time and the engine is the only
/// writer of the shared state.
pub struct Engine {
    poller: Poller,
    reducer: Reducer,
    state: StateHandle,
    interval: Duration,
    cancel: CancellationToken,
}

impl Engine {
    pub fn new(
        poller: Poller,
        reducer: Reducer,
        state: StateHandle,
        interval: Duration,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            poller,
            reducer,
            state,
            interval,
            cancel,
        }
    }

    /// Poll until the cancellation token is triggered
    pub async fn run(&self) {
        let mut ticker = tokio::time::interval(self.interval);
        // A slow poll pushes the next one back instead of stacking requests
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut next_id = 1u64;

        loop {
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break,
                _ = ticker.tick() => {}
            }

            let cycle = PollCycle {
                id: next_id,
                started_epoch_ms: current_epoch_ms(),
            };
            next_id += 1;

            if !self.run_cycle(cycle).await {
                break;
            }
        }

        tracing::debug!("Polling loop cancelled");
    }

    /// Fetch and commit one cycle. Returns false if cancelled mid-poll, in
    /// which case nothing is committed.
    pub async fn run_cycle(&self, cycle: PollCycle) -> bool {
        let result = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => {
                tracing::debug!("Abandoning outstanding poll (cycle {})", cycle.id);
                return false;
            }
            result = self.poller.poll() => result,
        };

        if self.cancel.is_cancelled() {
            tracing::debug!("Discarding result of cycle {} after shutdown", cycle.id);
            return false;
        }

        self.apply(cycle, result).await;
        true
    }

    async fn apply(&self, cycle: PollCycle, result: PollResult) {
        // Sole writer, so the map cannot change between this read and the commit
        let previous = self.state.read().await.probes.clone();
        let next = self.reducer.reduce(&previous, &result);

        let (changes, failures, threshold) = {
            let mut state = self.state.write().await;
            let changes = state.commit(cycle, &result, next);
            (
                changes,
                state.consecutive_failures,
                state.offline_after_failures,
            )
        };

        match &result {
            PollResult::Success { status, .. } => tracing::debug!(
                "Cycle {}: {} probe(s), wifi={}, paired={}",
                cycle.id,
                status.num_probes,
                status.wifi_connected,
                status.paired
            ),
            PollResult::Failure(failure) => {
                tracing::debug!("Cycle {} failed: {}", cycle.id, failure);
                if failures == threshold {
                    tracing::warn!("Receiver unreachable after {} consecutive polls", failures);
                }
            }
        }

        for change in changes {
            tracing::warn!(
                "{} alarm {} -> {} (temp {:?})",
                change.probe_id,
                change.previous,
                change.current,
                change.current_temp
            );
        }
    }
}

fn current_epoch_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
