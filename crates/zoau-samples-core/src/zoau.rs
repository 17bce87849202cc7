//! ZOAU command-line backend.
//!
//! Implements the service traits by running the ZOAU utilities
//! (`mvscmd`, `jsub`, `jls`, `dtouch`, `opercmd`, ...) as child processes.

use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::{debug, info};

use crate::dd::DdStatement;
use crate::process::{self, ProcessOutput};
use crate::resources::parse_userid;
use crate::service::{
    CreatedDataset, DatasetService, DatasetSpec, ExecutionOutput, JobHandle, JobService, JobStatus,
    OperatorConsole, ProgramRunner, ServiceError, ServiceResult,
};

/// Where ZOAU is installed by default.
pub const DEFAULT_BIN_DIR: &str = "/usr/lpp/IBM/zoautil/bin";

/// Time allowed for catalog and spool utilities.
const UTILITY_TIMEOUT: Duration = Duration::from_secs(60);

/// Runs ZOAU utilities from `bin_dir`, or from `PATH` when unset.
#[derive(Debug, Clone, Default)]
pub struct ZoauCli {
    bin_dir: Option<PathBuf>,
}

impl ZoauCli {
    pub fn new(bin_dir: Option<PathBuf>) -> Self {
        Self { bin_dir }
    }

    /// Use the default install directory when it exists, `PATH` otherwise.
    pub fn installed() -> Self {
        let default = Path::new(DEFAULT_BIN_DIR);
        Self::new(default.is_dir().then(|| default.to_path_buf()))
    }

    pub fn bin_dir(&self) -> Option<&Path> {
        self.bin_dir.as_deref()
    }

    /// Path of `tool`, checked for existence when a bin dir is set.
    pub fn require(&self, tool: &str) -> ServiceResult<PathBuf> {
        match &self.bin_dir {
            Some(dir) => {
                let path = dir.join(tool);
                if path.exists() {
                    Ok(path)
                } else {
                    Err(ServiceError::ToolNotFound {
                        path: path.display().to_string(),
                    })
                }
            }
            None => Ok(PathBuf::from(tool)),
        }
    }

    fn run(&self, tool: &str, args: &[String], timeout: Duration) -> ServiceResult<ProcessOutput> {
        let program = self.require(tool)?;
        process::run(&program, args, Some(timeout))
    }

    /// Run `tool`, failing on a nonzero exit.
    fn run_checked(&self, tool: &str, args: &[String], timeout: Duration) -> ServiceResult<String> {
        let out = self.run(tool, args, timeout)?;
        if out.success() {
            Ok(out.stdout)
        } else {
            let output = if out.stderr.trim().is_empty() {
                out.stdout
            } else {
                out.stderr
            };
            Err(ServiceError::CommandFailed {
                tool: tool.to_string(),
                rc: out.code,
                output: output.trim_end().to_string(),
            })
        }
    }

    /// The z/OS user id from `id`.
    pub fn userid(&self) -> ServiceResult<String> {
        let out = process::run(Path::new("id"), &[], Some(UTILITY_TIMEOUT))?;
        parse_userid(&out.stdout).ok_or(ServiceError::UnexpectedOutput {
            tool: "id".to_string(),
            output: out.stdout,
        })
    }

    fn mvscmd(
        &self,
        tool: &str,
        program: &str,
        args: Option<&str>,
        dds: &[DdStatement],
    ) -> ServiceResult<ExecutionOutput> {
        let mut argv = vec![format!("--pgm={program}")];
        if let Some(args) = args {
            argv.push(format!("--args={args}"));
        }
        argv.extend(dds.iter().map(DdStatement::mvscmd_arg));

        let program_path = self.require(tool)?;
        let out = process::run(&program_path, &argv, None)?;
        info!(program, rc = out.code, "Program ended");
        Ok(ExecutionOutput {
            rc: out.code,
            stdout: out.stdout,
            stderr: out.stderr,
        })
    }

    fn job_status(&self, job_id: &str) -> ServiceResult<JobLine> {
        let out = self.run_checked("jls", &[job_id.to_string()], UTILITY_TIMEOUT)?;
        let line = out.lines().rev().find_map(parse_jls_line);
        line.ok_or(ServiceError::UnexpectedOutput {
            tool: "jls".to_string(),
            output: out,
        })
    }
}

/// One `jls` row: `OWNER NAME JOBID STATUS RC`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobLine {
    pub owner: String,
    pub name: String,
    pub id: String,
    pub status: JobStatus,
    pub rc: Option<i32>,
}

/// Parse a `jls` row. The rc column is `?` while the job runs and may be
/// an abend code such as `S0C4`, which has no numeric rc.
pub fn parse_jls_line(line: &str) -> Option<JobLine> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    let [owner, name, id, status, rest @ ..] = fields.as_slice() else {
        return None;
    };
    Some(JobLine {
        owner: owner.to_string(),
        name: name.to_string(),
        id: id.to_string(),
        status: JobStatus::from_code(status),
        rc: rest.first().and_then(|rc| rc.parse().ok()),
    })
}

impl ProgramRunner for ZoauCli {
    fn execute(
        &self,
        program: &str,
        args: Option<&str>,
        dds: &[DdStatement],
    ) -> ServiceResult<ExecutionOutput> {
        self.mvscmd("mvscmd", program, args, dds)
    }

    fn execute_authorized(
        &self,
        program: &str,
        args: Option<&str>,
        dds: &[DdStatement],
    ) -> ServiceResult<ExecutionOutput> {
        self.mvscmd("mvscmdauth", program, args, dds)
    }
}

/// A job known to JES, refreshed through `jls`.
#[derive(Debug, Clone)]
pub struct ZoauJob {
    cli: ZoauCli,
    line: JobLine,
}

impl JobHandle for ZoauJob {
    fn id(&self) -> &str {
        &self.line.id
    }

    fn name(&self) -> &str {
        &self.line.name
    }

    fn owner(&self) -> &str {
        &self.line.owner
    }

    fn status(&self) -> &JobStatus {
        &self.line.status
    }

    fn rc(&self) -> Option<i32> {
        self.line.rc
    }

    fn refresh(&mut self) -> ServiceResult<()> {
        self.line = self.cli.job_status(&self.line.id)?;
        Ok(())
    }

    fn purge(&mut self) -> ServiceResult<()> {
        self.cli
            .run_checked("jcan", &["-P".to_string(), self.line.id.clone()], UTILITY_TIMEOUT)?;
        debug!(job = %self.line.id, "Purged");
        Ok(())
    }
}

impl JobService for ZoauCli {
    type Handle = ZoauJob;

    fn submit(&self, dataset: &str, timeout: Duration) -> ServiceResult<ZoauJob> {
        let out = self.run_checked("jsub", &[dataset.to_string()], timeout)?;
        let id = out
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .last()
            .ok_or(ServiceError::UnexpectedOutput {
                tool: "jsub".to_string(),
                output: out.clone(),
            })?
            .to_string();
        info!(%dataset, job = %id, "Submitted");
        let line = self.job_status(&id)?;
        Ok(ZoauJob {
            cli: self.clone(),
            line,
        })
    }

    fn read_output(&self, job_id: &str, step: &str, ddname: &str) -> ServiceResult<String> {
        self.run_checked(
            "pjdd",
            &[job_id.to_string(), step.to_string(), ddname.to_string()],
            UTILITY_TIMEOUT,
        )
    }
}

impl DatasetService for ZoauCli {
    fn hlq(&self) -> ServiceResult<String> {
        Ok(self.run_checked("hlq", &[], UTILITY_TIMEOUT)?.trim().to_string())
    }

    fn exists(&self, name: &str) -> ServiceResult<bool> {
        let out = self.run("dls", &[name.to_string()], UTILITY_TIMEOUT)?;
        Ok(out.success() && !out.stdout.trim().is_empty())
    }

    fn tmp_name(&self, hlq: &str) -> ServiceResult<String> {
        let out = self.run_checked("mvstmp", &[hlq.to_string()], UTILITY_TIMEOUT)?;
        Ok(out.trim().to_string())
    }

    fn create(&self, name: &str, spec: &DatasetSpec) -> ServiceResult<CreatedDataset> {
        let mut args = vec![format!("-t{}", spec.dataset_type.keyword())];
        if let Some(primary) = &spec.primary_space {
            args.push(format!("-s{primary}"));
        }
        if let Some(secondary) = &spec.secondary_space {
            args.push(format!("-e{secondary}"));
        }
        if let Some(recfm) = &spec.record_format {
            args.push(format!("-r{recfm}"));
        }
        if let Some(lrecl) = spec.record_length {
            args.push(format!("-l{lrecl}"));
        }
        if let Some(blksize) = spec.block_size {
            args.push(format!("-B{blksize}"));
        }
        if let Some(volume) = &spec.volumes {
            args.push(format!("-V{volume}"));
        }
        if let Some(blocks) = spec.directory_blocks {
            args.push(format!("-d{blocks}"));
        }
        args.push(name.to_string());

        self.run_checked("dtouch", &args, UTILITY_TIMEOUT)?;
        Ok(CreatedDataset {
            name: name.to_string(),
            spec: spec.clone(),
        })
    }

    fn delete(&self, name: &str) -> ServiceResult<()> {
        self.run_checked("drm", &[name.to_string()], UTILITY_TIMEOUT)?;
        Ok(())
    }

    fn write(&self, name: &str, content: &str) -> ServiceResult<()> {
        self.run_checked("decho", &[content.to_string(), name.to_string()], UTILITY_TIMEOUT)?;
        Ok(())
    }
}

impl OperatorConsole for ZoauCli {
    fn issue(&self, command: &str, timeout: Duration) -> ServiceResult<String> {
        self.run_checked("opercmd", &[command.to_string()], timeout)
    }
}
