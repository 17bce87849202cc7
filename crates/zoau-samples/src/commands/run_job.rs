//! Run-job command - submit a JCL data set and watch it.

use std::path::PathBuf;
use std::time::Duration;

use miette::Result;
use zoau_samples_core::jobs::submit_job;
use zoau_samples_core::poll::{self, DEFAULT_POLL_INTERVAL};
use zoau_samples_core::{Error, JobHandle, JobStatus, PollOptions, ThreadSleeper};

use crate::output::{compact_json, print_json};
use crate::Context;

/// Submit `dataset`, print each status sample and the final one.
pub fn run(
    ctx: &Context,
    dataset: String,
    interval: Option<u64>,
    timeout: Option<u64>,
    log: Option<PathBuf>,
) -> Result<()> {
    let mut handle = submit_job(&ctx.zoau, &ctx.zoau, &dataset)?;
    if !ctx.format.is_json() {
        println!("Job {} submitted", handle.name());
    }

    let mut options = PollOptions::default()
        .with_interval(interval.map(Duration::from_secs).unwrap_or(DEFAULT_POLL_INTERVAL));
    if let Some(secs) = timeout {
        options = options.with_timeout(Duration::from_secs(secs));
    }

    let json = ctx.format.is_json();
    let record = poll::watch(&mut handle, &options, &ThreadSleeper, |snapshot| {
        if !json && snapshot.status == JobStatus::Active {
            println!("{}", compact_json(snapshot));
        }
    })
    .map_err(Error::from)?;

    if let Some(path) = log {
        record.write_log(&path).map_err(Error::from)?;
        tracing::info!("Status record written to {}", path.display());
    }

    if json {
        print_json(&record);
    } else if let Some(last) = record.last() {
        println!("{}", compact_json(last));
    }
    Ok(())
}
