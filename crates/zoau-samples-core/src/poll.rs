//! Job status polling.
//!
//! [`watch`] samples a job's status at a fixed interval while it is active
//! and records a [`StatusSnapshot`] per sample. The wait between samples
//! goes through a [`Sleeper`], and every iteration checks the optional
//! deadline and [`CancellationToken`] before sleeping.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use miette::Diagnostic;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::service::{JobHandle, JobStatus, ServiceError};

/// Time between status samples.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(3);

/// How long `jsub` may take to hand back a job id.
pub const SUBMIT_TIMEOUT: Duration = Duration::from_secs(70);

/// One sample of a job's status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub struct StatusSnapshot {
    pub name: String,
    pub owner: String,
    pub status: JobStatus,
    pub rc: Option<i32>,
}

impl StatusSnapshot {
    pub fn of<H: JobHandle + ?Sized>(handle: &H) -> Self {
        Self {
            name: handle.name().to_string(),
            owner: handle.owner().to_string(),
            status: handle.status().clone(),
            rc: handle.rc(),
        }
    }
}

/// Everything sampled for one job, oldest first. The last snapshot is the
/// terminal one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StatusRecord {
    pub job_id: String,
    pub snapshots: Vec<StatusSnapshot>,
}

impl StatusRecord {
    pub fn last(&self) -> Option<&StatusSnapshot> {
        self.snapshots.last()
    }

    /// Write the record to `path` as pretty JSON, replacing any earlier log.
    pub fn write_log(&self, path: &Path) -> Result<(), PollError> {
        let json = serde_json::to_string_pretty(self).map_err(|e| PollError::Log {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        fs::write(path, json).map_err(|e| PollError::Log {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }
}

/// Errors from [`watch`].
#[derive(Debug, Error, Diagnostic)]
pub enum PollError {
    #[error("job {job} still active when the deadline passed")]
    #[diagnostic(code(poll::deadline_exceeded))]
    DeadlineExceeded { job: String, snapshots: Vec<StatusSnapshot> },

    #[error("polling job {job} cancelled")]
    #[diagnostic(code(poll::cancelled))]
    Cancelled { job: String, snapshots: Vec<StatusSnapshot> },

    #[error("failed to refresh job {job}")]
    #[diagnostic(code(poll::refresh))]
    Refresh {
        job: String,
        #[source]
        source: ServiceError,
    },

    #[error("failed to write status log {}: {message}", .path.display())]
    #[diagnostic(code(poll::log))]
    Log { path: PathBuf, message: String },
}

impl PollError {
    /// Snapshots taken before polling stopped early.
    pub fn snapshots(&self) -> &[StatusSnapshot] {
        match self {
            Self::DeadlineExceeded { snapshots, .. } | Self::Cancelled { snapshots, .. } => snapshots,
            _ => &[],
        }
    }
}

/// Blocks the poll loop between samples.
pub trait Sleeper {
    fn sleep(&self, duration: Duration);
}

/// Sleeps the calling thread.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) {
        thread::sleep(duration);
    }
}

/// Shared flag a caller sets to stop a running poll.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Poll loop settings.
#[derive(Debug, Clone)]
pub struct PollOptions {
    pub interval: Duration,
    pub deadline: Option<Instant>,
    pub cancel: Option<CancellationToken>,
}

impl Default for PollOptions {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            deadline: None,
            cancel: None,
        }
    }
}

impl PollOptions {
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Give up once `timeout` has passed from now.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.deadline = Some(Instant::now() + timeout);
        self
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn with_cancel(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }
}

/// Sample `handle` until its status is no longer `AC`.
///
/// Each snapshot is passed to `observer` as it is taken. The first snapshot
/// is taken before any check, so an expired deadline still yields one.
pub fn watch<H, S, F>(
    handle: &mut H,
    options: &PollOptions,
    sleeper: &S,
    mut observer: F,
) -> Result<StatusRecord, PollError>
where
    H: JobHandle + ?Sized,
    S: Sleeper + ?Sized,
    F: FnMut(&StatusSnapshot),
{
    let job = handle.id().to_string();
    let mut snapshots = Vec::new();

    loop {
        let snapshot = StatusSnapshot::of(handle);
        observer(&snapshot);
        let active = snapshot.status == JobStatus::Active;
        snapshots.push(snapshot);

        if !active {
            info!(%job, status = %handle.status(), polls = snapshots.len(), "Job left active state");
            return Ok(StatusRecord { job_id: job, snapshots });
        }

        if options.cancel.as_ref().is_some_and(CancellationToken::is_cancelled) {
            return Err(PollError::Cancelled { job, snapshots });
        }
        if options.deadline.is_some_and(|d| Instant::now() >= d) {
            return Err(PollError::DeadlineExceeded { job, snapshots });
        }

        debug!(%job, interval_secs = options.interval.as_secs(), "Job active, waiting");
        sleeper.sleep(options.interval);

        handle.refresh().map_err(|source| PollError::Refresh {
            job: job.clone(),
            source,
        })?;
    }
}

/// [`watch`] without an observer.
pub fn wait<H, S>(handle: &mut H, options: &PollOptions, sleeper: &S) -> Result<StatusRecord, PollError>
where
    H: JobHandle + ?Sized,
    S: Sleeper + ?Sized,
{
    watch(handle, options, sleeper, |_| {})
}
