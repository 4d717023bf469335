//! Deadline-bounded waits
//!
//! Browser and filesystem state change outside the harness, so every
//! asynchronous effect is turned into a blocking call that either observes
//! the condition or fails with [`E2eError::Timeout`] once the deadline passes.

use std::future::Future;
use std::path::Path;
use std::time::{Duration, Instant};

use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::error::{E2eError, E2eResult};

/// How long to wait and how often to re-check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitPolicy {
    pub timeout: Duration,
    pub poll_interval: Duration,
}

impl WaitPolicy {
    pub const fn new(timeout: Duration, poll_interval: Duration) -> Self {
        Self {
            timeout,
            poll_interval,
        }
    }

    pub const fn from_millis(timeout_ms: u64, poll_ms: u64) -> Self {
        Self::new(
            Duration::from_millis(timeout_ms),
            Duration::from_millis(poll_ms),
        )
    }
}

impl Default for WaitPolicy {
    fn default() -> Self {
        Self::from_millis(10_000, 100)
    }
}

/// Tracks elapsed time against a policy.
struct Deadline {
    start: Instant,
    policy: WaitPolicy,
}

impl Deadline {
    fn start(policy: WaitPolicy) -> Self {
        Self {
            start: Instant::now(),
            policy,
        }
    }

    /// Time to sleep before the next check, or `None` once the deadline passed.
    fn next_nap(&self) -> Option<Duration> {
        let elapsed = self.start.elapsed();
        if elapsed >= self.policy.timeout {
            None
        } else {
            Some(self.policy.poll_interval.min(self.policy.timeout - elapsed))
        }
    }

    fn expired(&self, condition: &str) -> E2eError {
        let elapsed = self.start.elapsed();
        warn!("Timed out after {:?} waiting for {}", elapsed, condition);
        E2eError::Timeout {
            condition: condition.to_string(),
            elapsed,
        }
    }
}

/// Re-evaluate `predicate` until it yields `true` or the policy's timeout elapses.
///
/// An error from the predicate aborts the wait immediately.
pub async fn await_condition<F, Fut>(
    condition: &str,
    policy: WaitPolicy,
    mut predicate: F,
) -> E2eResult<()>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = E2eResult<bool>>,
{
    let deadline = Deadline::start(policy);

    loop {
        if predicate().await? {
            debug!(
                "Condition met after {:?}: {}",
                deadline.start.elapsed(),
                condition
            );
            return Ok(());
        }

        match deadline.next_nap() {
            Some(nap) => tokio::time::sleep(nap).await,
            None => return Err(deadline.expired(condition)),
        }
    }
}

/// [`await_condition`] for infallible, synchronous predicates.
pub async fn await_predicate<F>(condition: &str, policy: WaitPolicy, mut predicate: F) -> E2eResult<()>
where
    F: FnMut() -> bool,
{
    await_condition(condition, policy, || std::future::ready(Ok(predicate()))).await
}

/// Wait until `path` exists.
///
/// Only existence is checked. A watcher on the parent directory wakes the
/// loop early; the poll interval still applies when no watcher is available.
pub async fn await_file(path: &Path, policy: WaitPolicy) -> E2eResult<()> {
    let condition = format!("{} to exist", path.display());
    let (tx, mut rx) = mpsc::unbounded_channel();
    let _watcher = path.parent().and_then(|dir| watch_dir(dir, tx.clone()));
    let deadline = Deadline::start(policy);

    loop {
        if path.exists() {
            debug!(
                "{} appeared after {:?}",
                path.display(),
                deadline.start.elapsed()
            );
            return Ok(());
        }

        match deadline.next_nap() {
            Some(nap) => {
                // Either a filesystem event or the poll interval ends the nap
                let _ = tokio::time::timeout(nap, rx.recv()).await;
            }
            None => return Err(deadline.expired(&condition)),
        }
    }
}

fn watch_dir(dir: &Path, tx: mpsc::UnboundedSender<()>) -> Option<RecommendedWatcher> {
    let mut watcher = notify::recommended_watcher(move |res: notify::Result<notify::Event>| {
        if res.is_ok() {
            let _ = tx.send(());
        }
    })
    .map_err(|e| debug!("File watcher unavailable, polling only: {}", e))
    .ok()?;

    watcher
        .watch(dir, RecursiveMode::NonRecursive)
        .map_err(|e| debug!("Cannot watch {}: {}", dir.display(), e))
        .ok()?;

    Some(watcher)
}
