use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use crate::engine::{LoadOutcome, PollOutcome, SyncEngine};
use crate::snapshot::SessionToken;

impl SyncEngine {
    /// Activates the engine and spawns its background task: one initial
    /// load, then an incremental poll every `poll_interval`.
    ///
    /// The task belongs to this engine instance and lives until the returned
    /// handle is stopped or dropped. Start at most one handle per engine.
    pub fn start(&self) -> SyncHandle {
        let session = self.activate();
        self.mark_loading();
        let (cancel_tx, cancel_rx) = oneshot::channel();
        let task = tokio::spawn(run_sync_loop(self.clone(), cancel_rx));
        tracing::info!(
            session = session.0,
            poll_interval_ms = self.poll_interval().as_millis() as u64,
            "sync engine started"
        );

        SyncHandle {
            engine: self.clone(),
            session,
            cancel_tx: Some(cancel_tx),
            task: Some(task),
        }
    }
}

/// Owns the running sync task. Dropping it tears the task down and
/// deactivates the engine so late responses are ignored.
pub struct SyncHandle {
    engine: SyncEngine,
    session: SessionToken,
    cancel_tx: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl SyncHandle {
    pub fn engine(&self) -> &SyncEngine {
        &self.engine
    }

    pub fn session(&self) -> SessionToken {
        self.session
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// Deactivates the engine and waits for the background task to exit.
    pub async fn stop(mut self) {
        self.shutdown();
        if let Some(task) = self.task.take()
            && let Err(error) = task.await
        {
            tracing::warn!(error = %error, "sync task ended abnormally");
        }
    }

    fn shutdown(&mut self) {
        if let Some(cancel_tx) = self.cancel_tx.take() {
            // Deactivate before signalling so a response racing the signal
            // already sees a rejected session.
            self.engine.deactivate();
            let _ = cancel_tx.send(());
        }
    }
}

impl Drop for SyncHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}

async fn run_sync_loop(engine: SyncEngine, mut cancel_rx: oneshot::Receiver<()>) {
    tokio::select! {
        _ = &mut cancel_rx => return,
        outcome = engine.initial_load() => {
            if let LoadOutcome::Failed(kind) = outcome {
                tracing::debug!(kind = ?kind, "initial load failed; polling stays idle until a cursor exists");
            }
        }
    }

    let period = engine.poll_interval();
    let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = &mut cancel_rx => break,
            _ = ticker.tick() => {}
        }

        tokio::select! {
            _ = &mut cancel_rx => break,
            outcome = engine.poll_incremental() => {
                if outcome == PollOutcome::Discarded {
                    break;
                }
            }
        }
    }

    tracing::debug!("sync loop exited");
}
