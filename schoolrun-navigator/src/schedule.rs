//! Cancellable fixed-interval tasks.
//!
//! A [`PeriodicTask`] owns a [`CancellationToken`]; the spawned loop exits as
//! soon as the token fires. Dropping the handle cancels the loop, so a task
//! never outlives whatever owns it. Ticks use Tokio's timer, which lets tests
//! drive the schedule with paused virtual time.

use std::time::Duration;

use log::{debug, warn};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

/// Handle to an action running on a fixed interval.
///
/// The first tick fires immediately. Ticks missed while the runtime was busy
/// are skipped rather than replayed in a burst.
#[derive(Debug)]
#[must_use = "dropping a PeriodicTask cancels it"]
pub struct PeriodicTask {
    token: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl PeriodicTask {
    /// Run `action` every `period` on the current Tokio runtime.
    ///
    /// Outside a runtime, or with a zero `period`, the returned task is
    /// already cancelled and `action` never runs.
    pub fn spawn<F>(period: Duration, mut action: F) -> Self
    where
        F: FnMut() + Send + 'static,
    {
        let token = CancellationToken::new();
        if period.is_zero() {
            warn!("refusing to schedule a periodic task with a zero interval");
            return Self::inert(token);
        }
        let Ok(runtime) = Handle::try_current() else {
            warn!("no Tokio runtime; periodic task not started");
            return Self::inert(token);
        };
        let cancelled = token.clone();
        let handle = runtime.spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    biased;
                    () = cancelled.cancelled() => break,
                    _ = ticker.tick() => action(),
                }
            }
            debug!("periodic task every {period:?} stopped");
        });
        Self {
            token,
            handle: Some(handle),
        }
    }

    fn inert(token: CancellationToken) -> Self {
        token.cancel();
        Self {
            token,
            handle: None,
        }
    }

    /// Stop scheduling further ticks. A tick already running completes.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Whether the task has been cancelled or never started.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Cancel and wait for the loop to exit.
    pub async fn stop(mut self) {
        self.token.cancel();
        if let Some(handle) = self.handle.take()
            && let Err(err) = handle.await
            && err.is_panic()
        {
            warn!("periodic task panicked: {err}");
        }
    }
}

impl Drop for PeriodicTask {
    fn drop(&mut self) {
        self.token.cancel();
    }
}
