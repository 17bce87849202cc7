//! Interfaces to the external z/OS services.
//!
//! The tools never talk to JES, the catalog or the console directly. They go
//! through these traits; [`crate::zoau::ZoauCli`] implements them on top of
//! the ZOAU command-line utilities and the tests use in-memory fakes.

use std::fmt;
use std::time::Duration;

use miette::Diagnostic;
use serde::Serialize;
use thiserror::Error;

use crate::dd::DdStatement;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors raised by an external service.
#[derive(Debug, Error, Diagnostic)]
pub enum ServiceError {
    /// A ZOAU utility is not installed where it was expected.
    #[error("Not found: {path}")]
    #[diagnostic(code(service::tool_not_found), help("set --zoau-path to the ZOAU install directory"))]
    ToolNotFound { path: String },

    /// The utility could not be started.
    #[error("failed to run {tool}: {source}")]
    #[diagnostic(code(service::spawn))]
    Spawn {
        tool: String,
        #[source]
        source: std::io::Error,
    },

    /// The utility did not finish in time and was killed.
    #[error("{tool} timed out after {}s", .timeout.as_secs())]
    #[diagnostic(code(service::timeout))]
    Timeout { tool: String, timeout: Duration },

    /// The utility ran and reported failure.
    #[error("{tool} failed with rc={rc}: {output}")]
    #[diagnostic(code(service::command_failed))]
    CommandFailed { tool: String, rc: i32, output: String },

    /// The utility's output was not in the expected layout.
    #[error("unexpected output from {tool}: {output:?}")]
    #[diagnostic(code(service::unexpected_output))]
    UnexpectedOutput { tool: String, output: String },
}

/// Convenience result type for service calls.
pub type ServiceResult<T> = std::result::Result<T, ServiceError>;

// ---------------------------------------------------------------------------
// Program execution
// ---------------------------------------------------------------------------

/// Outcome of one MVS program run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExecutionOutput {
    /// Program return code.
    pub rc: i32,
    /// Text the program runner wrote to stdout.
    #[serde(rename = "stdout_response")]
    pub stdout: String,
    /// Text the program runner wrote to stderr (allocation failures land here).
    #[serde(rename = "stderr_response")]
    pub stderr: String,
}

/// Runs MVS programs with a list of DD statements.
pub trait ProgramRunner {
    /// Run a program from the link list, e.g. IEBCOPY.
    fn execute(
        &self,
        program: &str,
        args: Option<&str>,
        dds: &[DdStatement],
    ) -> ServiceResult<ExecutionOutput>;

    /// Run an APF-authorized program, e.g. IKJEFT01 or GIMSMP.
    fn execute_authorized(
        &self,
        program: &str,
        args: Option<&str>,
        dds: &[DdStatement],
    ) -> ServiceResult<ExecutionOutput>;
}

// ---------------------------------------------------------------------------
// Jobs
// ---------------------------------------------------------------------------

/// JES job status as reported by `jls`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum JobStatus {
    /// `AC`: executing.
    Active,
    /// `CC`: ended with a completion code.
    Completed,
    /// `ABEND`: ended abnormally.
    Abend,
    /// `JCLERR`: failed JCL conversion.
    JclError,
    /// `INPUT`: waiting on the input queue.
    Input,
    /// `SEC`: failed a security check.
    SecurityError,
    /// Any other status code, kept verbatim.
    Other(String),
}

impl JobStatus {
    /// Parse a status code. Unknown codes are kept as [`JobStatus::Other`].
    pub fn from_code(code: &str) -> Self {
        match code.trim().to_ascii_uppercase().as_str() {
            "AC" => Self::Active,
            "CC" => Self::Completed,
            "ABEND" | "AB" => Self::Abend,
            "JCLERR" | "JCL ERROR" => Self::JclError,
            "INPUT" | "IN" => Self::Input,
            "SEC" | "SEC ERROR" => Self::SecurityError,
            other => Self::Other(other.to_string()),
        }
    }

    /// The status code as `jls` prints it.
    pub fn code(&self) -> &str {
        match self {
            Self::Active => "AC",
            Self::Completed => "CC",
            Self::Abend => "ABEND",
            Self::JclError => "JCLERR",
            Self::Input => "INPUT",
            Self::SecurityError => "SEC",
            Self::Other(code) => code,
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl Serialize for JobStatus {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.code())
    }
}

/// A submitted job.
pub trait JobHandle {
    /// JES job id, e.g. `JOB00042`.
    fn id(&self) -> &str;
    /// Job name from the JOB card.
    fn name(&self) -> &str;
    /// Submitting user.
    fn owner(&self) -> &str;
    /// Status as of the last refresh.
    fn status(&self) -> &JobStatus;
    /// Return code, once the job has one.
    fn rc(&self) -> Option<i32>;
    /// Re-query JES for the current status.
    fn refresh(&mut self) -> ServiceResult<()>;
    /// Cancel the job and remove it and its output from JES.
    fn purge(&mut self) -> ServiceResult<()>;
}

/// Submits jobs and reads their spool output.
pub trait JobService {
    type Handle: JobHandle;

    /// Submit the JCL in `dataset` (may include a member). Submission gives
    /// up after `timeout`.
    fn submit(&self, dataset: &str, timeout: Duration) -> ServiceResult<Self::Handle>;

    /// Read one DD of one step from a job's spool output.
    fn read_output(&self, job_id: &str, step: &str, ddname: &str) -> ServiceResult<String>;
}

// ---------------------------------------------------------------------------
// Data sets
// ---------------------------------------------------------------------------

/// Data set organization for allocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DatasetType {
    #[default]
    Seq,
    Pds,
    Pdse,
}

impl DatasetType {
    /// The type keyword `dtouch` accepts.
    pub fn keyword(self) -> &'static str {
        match self {
            Self::Seq => "SEQ",
            Self::Pds => "PDS",
            Self::Pdse => "LIBRARY",
        }
    }
}

/// Allocation attributes for a new data set. Unset fields use the
/// system defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DatasetSpec {
    #[serde(rename = "type")]
    pub dataset_type: DatasetType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub primary_space: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secondary_space: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block_size: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record_format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record_length: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub volumes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub directory_blocks: Option<u32>,
}

impl DatasetSpec {
    /// A sequential data set with default attributes.
    pub fn seq() -> Self {
        Self::default()
    }

    /// A PDS with default attributes.
    pub fn pds() -> Self {
        Self {
            dataset_type: DatasetType::Pds,
            ..Self::default()
        }
    }

    pub fn space(mut self, primary: &str, secondary: &str) -> Self {
        self.primary_space = Some(primary.trim().to_string());
        self.secondary_space = Some(secondary.trim().to_string());
        self
    }

    pub fn volume(mut self, volume: &str) -> Self {
        self.volumes = Some(volume.trim().to_string());
        self
    }

    /// Fixed-block records of `lrecl` bytes in blocks of `blksize`.
    pub fn fixed_block(mut self, lrecl: u32, blksize: u32) -> Self {
        self.record_format = Some("FB".to_string());
        self.record_length = Some(lrecl);
        self.block_size = Some(blksize);
        self
    }

    pub fn directory_blocks(mut self, blocks: u32) -> Self {
        self.directory_blocks = Some(blocks);
        self
    }
}

/// A data set allocated through [`DatasetService::create`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreatedDataset {
    pub name: String,
    #[serde(flatten)]
    pub spec: DatasetSpec,
}

/// Catalog and data set operations.
pub trait DatasetService {
    /// The caller's high level qualifier.
    fn hlq(&self) -> ServiceResult<String>;
    /// Whether a data set (or member) exists.
    fn exists(&self, name: &str) -> ServiceResult<bool>;
    /// Generate a unique, unused data set name under `hlq`.
    fn tmp_name(&self, hlq: &str) -> ServiceResult<String>;
    /// Allocate a new data set.
    fn create(&self, name: &str, spec: &DatasetSpec) -> ServiceResult<CreatedDataset>;
    /// Delete a data set.
    fn delete(&self, name: &str) -> ServiceResult<()>;
    /// Replace the content of a data set or member, creating it if needed.
    fn write(&self, name: &str, content: &str) -> ServiceResult<()>;
}

// ---------------------------------------------------------------------------
// Operator console
// ---------------------------------------------------------------------------

/// Issues MVS operator commands.
pub trait OperatorConsole {
    /// Issue `command` and return the response text. Gives up after
    /// `timeout` with [`ServiceError::Timeout`].
    fn issue(&self, command: &str, timeout: Duration) -> ServiceResult<String>;
}
