//! Fixed-interval polling with explicit, cancellable handles.
//!
//! Each [`Poller`] owns one background ticker task. The ticker fires the
//! supplied fetch once immediately and then on every interval; each fetch is
//! spawned into a `JoinSet` so a slow round trip never delays the next tick.
//! Stopping the poller aborts the ticker, which drops the `JoinSet` and with
//! it every in-flight fetch, so after [`Poller::stop`] returns no further
//! store writes can happen.

use std::future::Future;
use std::time::Duration;

use log::warn;
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::MissedTickBehavior;

use crate::error::ApiError;

pub struct Poller {
    task: Option<JoinHandle<()>>,
}

impl Poller {
    /// Spawn a ticker that runs `fetch` now and then every `every`.
    ///
    /// A failed fetch is reported to the log and does not stop the schedule;
    /// the next tick proceeds normally.
    pub fn start<F, Fut>(mut fetch: F, every: Duration) -> Self
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), ApiError>> + Send + 'static,
    {
        let task = tokio::spawn(async move {
            let mut ticks = tokio::time::interval(every);
            ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);
            let mut inflight = JoinSet::new();
            loop {
                tokio::select! {
                    _ = ticks.tick() => {
                        inflight.spawn(report(fetch()));
                    }
                    Some(_) = inflight.join_next() => {}
                }
            }
        });
        Self { task: Some(task) }
    }

    /// Cancel the ticker and every in-flight fetch. Once this returns the
    /// poller is guaranteed to make no further invocations.
    pub async fn stop(mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            let _ = task.await;
        }
    }
}

impl Drop for Poller {
    // Backstop for handles dropped without an explicit stop().
    fn drop(&mut self) {
        if let Some(task) = &self.task {
            task.abort();
        }
    }
}

async fn report(fetch: impl Future<Output = Result<(), ApiError>>) {
    if let Err(err) = fetch.await {
        warn!("poll failed: {err}");
    }
}
