//! Page-change watcher for multi-step forms.
//!
//! Polls the page location on a fixed interval. When it changes, waits for the new step
//! to settle and re-runs autofill if a profile is still available. The returned
//! `WatchHandle` stops the task explicitly, and dropping it cancels the task too.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::autofill::orchestrator::Orchestrator;
use crate::dom::DocumentTree;
use crate::models::profile::Profile;

/// Profile source for the watcher. Sending `None` pauses re-runs without stopping the poll.
pub type ProfileFeed = watch::Receiver<Option<Arc<Profile>>>;

pub struct WatchHandle {
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl WatchHandle {
    /// Cancels the poll loop and waits for it to exit. A run already in progress finishes first.
    pub async fn stop(mut self) {
        self.cancel.cancel();
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }

    pub fn is_stopped(&self) -> bool {
        self.cancel.is_cancelled()
            || self.task.as_ref().map_or(true, JoinHandle::is_finished)
    }
}

impl Drop for WatchHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

#[derive(Debug, Clone, Copy)]
pub struct WatchTiming {
    pub interval: Duration,
    pub settle: Duration,
}

impl Orchestrator {
    /// Arms the watcher with the engine's configured interval and settle delay.
    pub fn watch<D>(self: &Arc<Self>, doc: Arc<D>, profiles: ProfileFeed) -> WatchHandle
    where
        D: DocumentTree + 'static,
    {
        let settings = self.engine().settings();
        let timing = WatchTiming {
            interval: settings.watch_interval(),
            settle: settings.watch_settle(),
        };
        watch_page(self.clone(), doc, profiles, timing)
    }
}

pub fn watch_page<D>(
    orchestrator: Arc<Orchestrator>,
    doc: Arc<D>,
    profiles: ProfileFeed,
    timing: WatchTiming,
) -> WatchHandle
where
    D: DocumentTree + 'static,
{
    let cancel = CancellationToken::new();
    let task_cancel = cancel.clone();

    let task = tokio::spawn(async move {
        let mut last = doc.location().await.ok();
        let mut interval = tokio::time::interval(timing.interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        interval.tick().await; // first tick fires immediately

        loop {
            tokio::select! {
                _ = task_cancel.cancelled() => break,
                _ = interval.tick() => {}
            }

            let current = match doc.location().await {
                Ok(url) => url,
                Err(e) => {
                    debug!("Page watcher could not read location: {e}");
                    continue;
                }
            };
            if last.as_deref() == Some(current.as_str()) {
                continue;
            }
            info!(from = ?last, to = %current, "Page location changed");
            last = Some(current);

            tokio::select! {
                _ = task_cancel.cancelled() => break,
                _ = tokio::time::sleep(timing.settle) => {}
            }

            let profile = profiles.borrow().clone();
            match profile {
                Some(profile) => {
                    let summary = orchestrator.run(doc.as_ref(), &profile).await;
                    info!(
                        filled = summary.filled_count,
                        busy_skipped = summary.busy_skipped,
                        "Autofill re-run after navigation"
                    );
                }
                None => debug!("No profile available; skipping re-run"),
            }
        }
        debug!("Page watcher stopped");
    });

    WatchHandle {
        cancel,
        task: Some(task),
    }
}
