//! Batch job submission.

use miette::Diagnostic;
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::poll::{self, PollOptions, Sleeper, StatusRecord, SUBMIT_TIMEOUT};
use crate::service::{DatasetService, JobHandle, JobService, JobStatus};
use crate::Result;

/// BPXBATCH job that sleeps a second and prints `uptime`.
pub const SAMPLE_JCL: &str = "\
//******************************************************************************
//* Configure the job card as needed, most common keyword parameters often
//* needing editing are:
//* CLASS: Used to achieve a balance between different types of jobs and avoid
//*        contention between jobs that use the same resources.
//* MSGLEVEL: controls how the allocation messages and termination messages are
//*           printed in the job's output listing (SYSOUT).
//* MSGCLASS: assign an output class for your output listing (SYSOUT)
//******************************************************************************
//SAMPLE    JOB (T043JM,JM00,1,0,0,0),'SAMPLE - JRM',
//             MSGCLASS=X,MSGLEVEL=1,NOTIFY=&SYSUID
//*
//* SLEEP 1 SEC THEN PRINT USS COMMAND ON JOB OUTPUT
//*
//SAMPLE  EXEC PGM=BPXBATCH
//STDPARM DD *
SH sleep 1 && uptime
//STDIN  DD DUMMY
//STDOUT DD SYSOUT=*
//STDERR DD SYSOUT=*
//";

/// Step and DD read back from the sample job.
pub const SAMPLE_STEP: &str = "SAMPLE";
pub const SAMPLE_DD: &str = "STDOUT";

#[derive(Debug, Error, Diagnostic)]
pub enum JobError {
    #[error("Dataset not found, check that it exist")]
    #[diagnostic(code(jobs::dataset_not_found))]
    DatasetNotFound { dataset: String },
}

/// Identity and state of a job at one point in time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobDetails {
    pub id: String,
    pub name: String,
    pub owner: String,
    pub status: JobStatus,
    pub rc: Option<i32>,
}

impl JobDetails {
    pub fn of<H: JobHandle + ?Sized>(handle: &H) -> Self {
        Self {
            id: handle.id().to_string(),
            name: handle.name().to_string(),
            owner: handle.owner().to_string(),
            status: handle.status().clone(),
            rc: handle.rc(),
        }
    }
}

/// Submit the JCL in `dataset` after checking it exists.
pub fn submit_job<J, D>(jobs: &J, datasets: &D, dataset: &str) -> Result<J::Handle>
where
    J: JobService + ?Sized,
    D: DatasetService + ?Sized,
{
    if !datasets.exists(dataset)? {
        return Err(JobError::DatasetNotFound {
            dataset: dataset.to_string(),
        }
        .into());
    }
    let handle = jobs.submit(dataset, SUBMIT_TIMEOUT)?;
    info!(job = %handle.id(), name = %handle.name(), "Job submitted");
    Ok(handle)
}

/// Submit `dataset` and poll it until it leaves the active state.
pub fn run_job<J, D, S>(
    jobs: &J,
    datasets: &D,
    dataset: &str,
    options: &PollOptions,
    sleeper: &S,
) -> Result<StatusRecord>
where
    J: JobService + ?Sized,
    D: DatasetService + ?Sized,
    S: Sleeper + ?Sized,
{
    let mut handle = submit_job(jobs, datasets, dataset)?;
    Ok(poll::wait(&mut handle, options, sleeper)?)
}

/// What the sample job flow saw.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SampleReport {
    /// Data set the JCL was written to, deleted at the end.
    pub dataset: String,
    pub submitted: JobDetails,
    pub finished: JobDetails,
    pub stdout: String,
}

/// Write [`SAMPLE_JCL`] to `<HLQ>.SAMPLE.JCL(SAMPLE)`, run it, read its
/// STDOUT and purge it. The JCL data set is deleted afterwards even when
/// a step fails.
pub fn run_sample<J, D, S>(
    jobs: &J,
    datasets: &D,
    options: &PollOptions,
    sleeper: &S,
) -> Result<SampleReport>
where
    J: JobService + ?Sized,
    D: DatasetService + ?Sized,
    S: Sleeper + ?Sized,
{
    let dataset = format!("{}.SAMPLE.JCL", datasets.hlq()?);
    let result = sample_steps(jobs, datasets, &dataset, options, sleeper);
    if let Err(e) = datasets.delete(&dataset) {
        warn!(%dataset, error = %e, "Cannot delete sample JCL data set");
    }
    result
}

fn sample_steps<J, D, S>(
    jobs: &J,
    datasets: &D,
    dataset: &str,
    options: &PollOptions,
    sleeper: &S,
) -> Result<SampleReport>
where
    J: JobService + ?Sized,
    D: DatasetService + ?Sized,
    S: Sleeper + ?Sized,
{
    let member = format!("{dataset}({SAMPLE_STEP})");
    datasets.write(&member, SAMPLE_JCL)?;

    let mut job = jobs.submit(&member, SUBMIT_TIMEOUT)?;
    let submitted = JobDetails::of(&job);

    poll::wait(&mut job, options, sleeper)?;
    job.refresh()?;
    let finished = JobDetails::of(&job);

    let stdout = jobs.read_output(job.id(), SAMPLE_STEP, SAMPLE_DD)?;
    job.purge()?;

    Ok(SampleReport {
        dataset: dataset.to_string(),
        submitted,
        finished,
        stdout,
    })
}
