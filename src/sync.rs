//! Run orchestration
//!
//! A [`Runner`] owns one profile, one filesystem and one reporter, and runs
//! exactly one mirroring pass over them:
//!
//! 1. **Idle**: created, nothing touched yet
//! 2. **Running**: the tree walker is mirroring the source
//! 3. **Completed**: the pass ended (cleanly, cancelled or aborted) and the
//!    [`RunReport`] has been produced
//!
//! A second call to [`Runner::run`] is rejected with
//! [`SyncError::AlreadyRun`].
//!
//! Faults never escape as errors. An internal error or a panic during the
//! walk becomes [`RunOutcome::Aborted`] with the statistics gathered so far.
//! [`RunHandle::wait`] still catches a panic outside the walk at the join
//! point, and only that case reports empty counters.
//!
//! # Usage
//!
//! ```rust,ignore
//! use multicopy::fs::LocalFs;
//! use multicopy::sync::Runner;
//!
//! let runner = Runner::new(profile, LocalFs::default(), ());
//! let report = runner.spawn().wait().await;
//! println!("copied {} files", report.stats.files_copied);
//! ```

use crate::config::Profile;
use crate::directory::TreeWalker;
use crate::error::{Result, SyncError};
use crate::event::Reporter;
use crate::fs::FileSystem;
use crate::stats::SyncStats;
use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn};

/// Lifecycle of a [`Runner`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Running,
    Completed,
}

/// How a pass ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// The whole tree was walked
    Completed,
    /// The cancel token fired before the walk finished
    Cancelled,
    /// An internal fault stopped the pass
    Aborted(String),
}

/// Everything the caller gets back from a pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    /// Name of the profile that was run
    pub profile: String,
    pub stats: SyncStats,
    pub outcome: RunOutcome,
}

impl RunReport {
    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.outcome == RunOutcome::Completed
    }
}

/// Shared flag that asks a running pass to stop
///
/// Checked before every directory entry, so a pass stops between files,
/// never in the middle of a copy.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// `Err(SyncError::Cancelled)` once [`cancel`](Self::cancel) was called
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Cancelled`] if the token has fired.
    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(SyncError::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// Runs one mirroring pass for one profile
pub struct Runner<F, R> {
    profile: Profile,
    fs: F,
    reporter: R,
    cancel: CancelToken,
    state: RunState,
}

impl<F: FileSystem, R: Reporter> Runner<F, R> {
    #[must_use]
    pub fn new(profile: Profile, fs: F, reporter: R) -> Self {
        Self {
            profile,
            fs,
            reporter,
            cancel: CancelToken::new(),
            state: RunState::Idle,
        }
    }

    /// Use `cancel` instead of the runner's own token
    #[must_use]
    pub fn with_cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Token that cancels this runner's pass
    #[must_use]
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    #[must_use]
    pub const fn state(&self) -> RunState {
        self.state
    }

    #[must_use]
    pub const fn profile(&self) -> &Profile {
        &self.profile
    }

    #[must_use]
    pub const fn fs(&self) -> &F {
        &self.fs
    }

    #[must_use]
    pub const fn reporter(&self) -> &R {
        &self.reporter
    }

    /// Mirror the profile's source to all of its destinations
    ///
    /// The returned report always carries the statistics, whether the pass
    /// completed, was cancelled or aborted. A panic raised while walking is
    /// caught here and reported as [`RunOutcome::Aborted`]. The reporter's
    /// [`finish`](Reporter::finish) is called with the same report.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::AlreadyRun`] if this runner already ran.
    pub async fn run(&mut self) -> Result<RunReport> {
        if self.state != RunState::Idle {
            return Err(SyncError::AlreadyRun);
        }
        self.state = RunState::Running;

        let start_time = Instant::now();
        let mut stats = SyncStats::new(self.profile.destinations.len());

        info!(
            "Starting {}: {} -> {} destination(s), replace {}",
            self.profile.name,
            self.profile.source.display(),
            self.profile.destinations.len(),
            self.profile.replace
        );

        let walker = TreeWalker::new(
            &self.fs,
            &self.profile.source,
            &self.profile.destinations,
            self.profile.replace,
            &self.cancel,
        );
        let walked = AssertUnwindSafe(walker.walk(&mut stats, &mut self.reporter))
            .catch_unwind()
            .await;
        let outcome = match walked {
            Ok(Ok(())) => RunOutcome::Completed,
            Ok(Err(SyncError::Cancelled)) => {
                warn!("{} cancelled", self.profile.name);
                RunOutcome::Cancelled
            }
            Ok(Err(e)) => {
                error!("{} aborted: {}", self.profile.name, e);
                RunOutcome::Aborted(e.to_string())
            }
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                error!("{} aborted by panic: {}", self.profile.name, message);
                RunOutcome::Aborted(format!("worker panicked: {message}"))
            }
        };

        stats.duration = start_time.elapsed();
        self.state = RunState::Completed;

        info!(
            "{} finished in {:?}: {} copied, {} skipped, {} failed",
            self.profile.name,
            stats.duration,
            stats.files_copied,
            stats.files_skipped,
            stats.files_failed
        );

        let report = RunReport {
            profile: self.profile.name.clone(),
            stats,
            outcome,
        };
        self.reporter.finish(&report);
        Ok(report)
    }
}

impl<F, R> Runner<F, R>
where
    F: FileSystem + 'static,
    R: Reporter + 'static,
{
    /// Start the pass as a task on the current runtime
    ///
    /// The runner is consumed; the returned handle resolves to the report.
    #[must_use]
    pub fn spawn(mut self) -> RunHandle {
        let profile = self.profile.name.clone();
        let destinations = self.profile.destinations.len();
        let task = compio::runtime::spawn(async move { self.run().await });
        RunHandle {
            profile,
            destinations,
            task,
        }
    }
}

/// Completion handle for a spawned pass
pub struct RunHandle {
    profile: String,
    destinations: usize,
    task: compio::runtime::JoinHandle<Result<RunReport>>,
}

impl RunHandle {
    /// Wait for the pass to end
    ///
    /// Panics during the walk already arrive as an `Aborted` report with
    /// partial statistics. Any other panic in the worker is turned into
    /// [`RunOutcome::Aborted`] with empty statistics.
    pub async fn wait(self) -> RunReport {
        let aborted = |reason: String| RunReport {
            profile: self.profile.clone(),
            stats: SyncStats::new(self.destinations),
            outcome: RunOutcome::Aborted(reason),
        };

        match self.task.await {
            Ok(Ok(report)) => report,
            Ok(Err(e)) => {
                error!("{} could not run: {}", self.profile, e);
                aborted(e.to_string())
            }
            Err(join_err) => {
                error!("{} worker panicked: {:?}", self.profile, join_err);
                aborted(format!("worker task panicked: {join_err:?}"))
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message
    } else {
        "unknown panic payload"
    }
}
