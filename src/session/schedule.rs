//! Navigation and timer plumbing shared by the session flows. Every delayed
//! redirect runs inside a [`ScheduledTask`] owned by the component that started
//! it; dropping the owner aborts the task, so no redirect fires after teardown.

use std::{
    future::Future,
    sync::{Arc, Mutex},
    time::Duration,
};
use tokio::{
    sync::watch,
    task::JoinHandle,
    time::{Instant, MissedTickBehavior, interval_at},
};
use tracing::debug;

/// Moves the user to another location.
pub trait Navigator: Send + Sync {
    fn navigate(&self, target: &str);
}

/// Navigator that only records where it was sent.
#[derive(Clone, Debug, Default)]
pub struct RecordingNavigator {
    visited: Arc<Mutex<Vec<String>>>,
}

impl RecordingNavigator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn visited(&self) -> Vec<String> {
        self.visited
            .lock()
            .map(|visited| visited.clone())
            .unwrap_or_default()
    }
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, target: &str) {
        if let Ok(mut visited) = self.visited.lock() {
            visited.push(target.to_string());
        }
    }
}

/// Spawned task tied to the lifetime of its owner.
#[derive(Debug)]
pub struct ScheduledTask {
    handle: Option<JoinHandle<()>>,
}

impl ScheduledTask {
    pub fn spawn<F>(future: F) -> Self
    where
        F: Future<Output = ()> + Send + 'static,
    {
        Self {
            handle: Some(tokio::spawn(future)),
        }
    }

    /// A task that has nothing left to do.
    #[must_use]
    pub fn finished_task() -> Self {
        Self { handle: None }
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().is_none_or(JoinHandle::is_finished)
    }

    /// Waits for the task to run to completion. Safe to call repeatedly.
    pub async fn finished(&mut self) {
        if let Some(handle) = self.handle.as_mut() {
            let _ = handle.await;
            self.handle = None;
        }
    }

    /// Aborts the task now instead of at drop.
    pub fn cancel(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

impl Drop for ScheduledTask {
    fn drop(&mut self) {
        if let Some(handle) = &self.handle {
            if !handle.is_finished() {
                debug!("cancelling scheduled task");
            }
            handle.abort();
        }
    }
}

/// Publishes `from, from - 1, ..., 0` into `remaining`, one step per `tick`.
/// Returns once zero has been published.
pub async fn count_down(from: u32, tick: Duration, remaining: &watch::Sender<Option<u32>>) {
    remaining.send_if_modified(|current| {
        let changed = *current != Some(from);
        *current = Some(from);
        changed
    });

    let mut ticker = interval_at(Instant::now() + tick, tick);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    for value in (0..from).rev() {
        ticker.tick().await;
        remaining.send_replace(Some(value));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::sleep;

    #[tokio::test(start_paused = true)]
    async fn count_down_steps_once_per_tick() {
        let (tx, rx) = watch::channel(None);
        let task = ScheduledTask::spawn(async move {
            count_down(3, Duration::from_secs(1), &tx).await;
        });

        sleep(Duration::from_millis(500)).await;
        assert_eq!(*rx.borrow(), Some(3));
        sleep(Duration::from_secs(1)).await;
        assert_eq!(*rx.borrow(), Some(2));
        sleep(Duration::from_secs(1)).await;
        assert_eq!(*rx.borrow(), Some(1));
        sleep(Duration::from_secs(1)).await;
        assert_eq!(*rx.borrow(), Some(0));
        assert!(task.is_finished());
    }

    #[tokio::test(start_paused = true)]
    async fn count_down_from_zero_returns_immediately() {
        let (tx, rx) = watch::channel(None);
        count_down(0, Duration::from_secs(1), &tx).await;
        assert_eq!(*rx.borrow(), Some(0));
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_task_cancels_pending_navigation() {
        let navigator = RecordingNavigator::new();
        let recorder = navigator.clone();
        let task = ScheduledTask::spawn(async move {
            sleep(Duration::from_secs(3)).await;
            recorder.navigate("/login");
        });

        sleep(Duration::from_secs(1)).await;
        drop(task);
        sleep(Duration::from_secs(5)).await;

        assert!(navigator.visited().is_empty());
    }

    #[tokio::test]
    async fn finished_can_be_awaited_twice() {
        let mut task = ScheduledTask::spawn(async {});
        task.finished().await;
        task.finished().await;
        assert!(task.is_finished());
    }

    #[tokio::test]
    async fn cancel_aborts_immediately() {
        let navigator = RecordingNavigator::new();
        let recorder = navigator.clone();
        let mut task = ScheduledTask::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            recorder.navigate("/dashboard");
        });
        task.cancel();
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(task.is_finished());
        assert!(navigator.visited().is_empty());
    }
}
