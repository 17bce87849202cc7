//! REXX execs under the TSO terminal monitor program.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{info, warn};

use crate::classify::{classify_program, ClassifiedResult, ExecutionResult};
use crate::dd::DdStatement;
use crate::deck::write_deck;
use crate::service::{ExecutionOutput, ProgramRunner};
use crate::Result;

pub const PROGRAM: &str = "IKJEFT01";

/// Where the exec writes its own output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputTarget {
    File { ddname: String, path: PathBuf },
    Dataset { ddname: String, name: String },
}

impl OutputTarget {
    fn dd(&self) -> DdStatement {
        match self {
            Self::File { ddname, path } => DdStatement::file(ddname, path),
            Self::Dataset { ddname, name } => DdStatement::dataset(ddname, name),
        }
    }
}

/// A REXX exec to run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RexxRequest {
    /// Library holding the exec (SYSEXEC).
    pub library: String,
    pub exec: String,
    pub parms: String,
    /// SYSTSIN lines.
    pub input: Vec<String>,
    pub output: Option<OutputTarget>,
}

/// What [`run_rexx`] produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RexxReport {
    #[serde(rename = "returninfo")]
    pub output: ExecutionOutput,
    #[serde(rename = "systsprtfile")]
    pub systsprt: PathBuf,
    #[serde(rename = "sysprintfile")]
    pub sysprint: PathBuf,
}

impl RexxReport {
    pub fn classify(&self) -> ClassifiedResult {
        let result = ExecutionResult::new(
            self.output.rc,
            self.output.stderr.clone(),
            Some(self.systsprt.clone()),
        );
        classify_program(PROGRAM, &result, &self.systsprt.display().to_string())
    }
}

/// Run `request.exec` from `request.library` through IKJEFT01.
///
/// SYSTSIN, SYSPRINT and SYSTSPRT are files in `work_dir`. SYSTSIN is
/// removed after a zero return code; the listings are always kept.
pub fn run_rexx<R: ProgramRunner + ?Sized>(
    runner: &R,
    request: &RexxRequest,
    work_dir: &Path,
) -> Result<RexxReport> {
    let stamp = chrono::Utc::now().format("%s%.6f").to_string();
    let systsin = work_dir.join(format!("systsin.{stamp}"));
    let sysprint = work_dir.join(format!("sysout.{stamp}"));
    let systsprt = work_dir.join(format!("systsprt.{stamp}"));

    write_deck(&request.input, &systsin)?;

    let mut dds = vec![
        DdStatement::dataset("SYSEXEC", &request.library),
        DdStatement::file("SYSTSIN", &systsin),
    ];
    if let Some(target) = &request.output {
        dds.push(target.dd());
    }
    dds.push(DdStatement::file("SYSPRINT", &sysprint));
    dds.push(DdStatement::file("SYSTSPRT", &systsprt));

    let command = format!("{} {}", request.exec, request.parms);
    info!(library = %request.library, exec = %request.exec, "Running REXX exec");
    let output = runner.execute_authorized(PROGRAM, Some(command.trim_end()), &dds)?;

    if output.rc == 0 {
        if let Err(e) = fs::remove_file(&systsin) {
            warn!(path = %systsin.display(), error = %e, "Cannot remove SYSTSIN");
        }
    }

    Ok(RexxReport {
        output,
        systsprt,
        sysprint,
    })
}
