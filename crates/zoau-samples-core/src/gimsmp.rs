//! SMP/E LIST through GIMSMP.
//!
//! Replaces a job of the form
//!
//! ```text
//! //SMPLST   EXEC PGM=GIMSMP
//! //SMPCSI   DD  DSN=SMPE.GLOBAL.CSI,DISP=SHR
//! //SMPLOG   DD  DUMMY
//! //SMPLOGA  DD  DUMMY
//! //SMPWRK6  DD  DSN=&&TEMP,DCB=(DSORG=PO,RECFM=FB,LRECL=80,BLKSIZE=3200)
//! //SMPCNTL  DD  *
//!  SET BDY(GLOBAL).
//!  LIST.
//! ```

use std::fs;
use std::path::Path;

use serde::Serialize;
use tracing::{info, warn};

use crate::classify::{classify_program, ClassifiedResult, ExecutionResult};
use crate::config::SmpeDefaults;
use crate::dd::DdStatement;
use crate::deck::write_deck;
use crate::resources::ResourceTracker;
use crate::service::{DatasetService, DatasetSpec, ExecutionOutput, ProgramRunner};
use crate::Result;

pub const PROGRAM: &str = "GIMSMP";

/// SMPCNTL statements for a LIST of `zone`.
pub fn smpcntl_deck(zone: &str, options: Option<&str>) -> Vec<String> {
    let list = match options.map(str::trim).filter(|o| !o.is_empty()) {
        Some(options) => format!("LIST {options}."),
        None => "LIST.".to_string(),
    };
    vec![format!("SET     BDY({zone})."), list]
}

/// A LIST request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmpeListRequest {
    pub zone: String,
    pub options: Option<String>,
    /// Qualifier for the work and output data sets.
    pub hlq: String,
}

impl Default for SmpeListRequest {
    fn default() -> Self {
        Self {
            zone: "GLOBAL".to_string(),
            options: None,
            hlq: "SYS1".to_string(),
        }
    }
}

/// Result of a LIST run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SmpeReport {
    #[serde(flatten)]
    pub output: ExecutionOutput,
    /// Data set holding the SMPLIST output.
    pub listing: String,
}

impl SmpeReport {
    pub fn classify(&self) -> ClassifiedResult {
        let result = ExecutionResult::new(self.output.rc, self.output.stderr.clone(), None);
        classify_program(PROGRAM, &result, &self.listing)
    }
}

fn work_spec(base: DatasetSpec) -> DatasetSpec {
    base.fixed_block(80, 3200).directory_blocks(10)
}

/// Run LIST with allocations from `defaults`.
///
/// The SMPWRK6 data set and the SMPCNTL file are removed whether or not
/// GIMSMP runs; the SMPLIST data set is kept.
pub fn smpe_list<R, D>(
    runner: &R,
    datasets: &D,
    defaults: &SmpeDefaults,
    request: &SmpeListRequest,
) -> Result<SmpeReport>
where
    R: ProgramRunner + ?Sized,
    D: DatasetService + ?Sized,
{
    let mut work = None;
    let result = run_list(runner, datasets, defaults, request, &mut work);

    if let Some(name) = work {
        if let Err(e) = datasets.delete(&name) {
            warn!(dataset = %name, error = %e, "Cannot delete SMPWRK6 data set");
        }
    }
    if let Err(e) = fs::remove_file(&defaults.control_file) {
        if e.kind() != std::io::ErrorKind::NotFound {
            warn!(path = %defaults.control_file.display(), error = %e, "Cannot remove SMPCNTL file");
        }
    }
    result
}

fn run_list<R, D>(
    runner: &R,
    datasets: &D,
    defaults: &SmpeDefaults,
    request: &SmpeListRequest,
    work: &mut Option<String>,
) -> Result<SmpeReport>
where
    R: ProgramRunner + ?Sized,
    D: DatasetService + ?Sized,
{
    let mut dds = vec![
        DdStatement::dataset("SMPCSI", &defaults.csi),
        DdStatement::dummy("SMPLOG"),
        DdStatement::dummy("SMPLOGA"),
    ];

    let work_name = datasets.tmp_name(&request.hlq)?;
    datasets.create(&work_name, &work_spec(defaults.work.apply(DatasetSpec::pds())))?;
    *work = Some(work_name.clone());
    dds.push(DdStatement::dataset("SMPWRK6", &work_name));

    write_deck(
        &smpcntl_deck(&request.zone, request.options.as_deref()),
        &defaults.control_file,
    )?;
    dds.push(DdStatement::file("SMPCNTL", &defaults.control_file));

    let listing = datasets.tmp_name(&request.hlq)?;
    datasets.create(&listing, &defaults.output.apply(DatasetSpec::seq()))?;
    dds.push(DdStatement::dataset("SMPLIST", &listing));

    info!(zone = %request.zone, csi = %defaults.csi, "Running SMP/E LIST");
    let output = runner.execute_authorized(PROGRAM, None, &dds)?;
    Ok(SmpeReport { output, listing })
}

/// Allocations for [`smpe_global_list`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlobalListRequest {
    pub csi: String,
    pub volume: String,
    pub work_space: String,
    pub output_space: String,
}

impl GlobalListRequest {
    pub fn new(csi: &str, volume: &str) -> Self {
        Self {
            csi: csi.to_string(),
            volume: volume.to_string(),
            work_space: "1G".to_string(),
            output_space: "5M".to_string(),
        }
    }
}

/// LIST of the global zone with every temporary owned by `tracker`.
/// The output data set is created under the user id and survives cleanup.
pub fn smpe_global_list<R, D>(
    runner: &R,
    tracker: &mut ResourceTracker<'_, D>,
    request: &GlobalListRequest,
    work_dir: &Path,
) -> Result<SmpeReport>
where
    R: ProgramRunner + ?Sized,
    D: DatasetService + ?Sized,
{
    let mut dds = vec![tracker.create_input_dd(
        &[" SET BDY(GLOBAL).", " LIST."],
        "SMPCNTL",
        work_dir,
    )?];

    let work_spec = work_spec(
        DatasetSpec::pds()
            .space(&request.work_space, &request.work_space)
            .volume(&request.volume),
    );
    let work = tracker.create_temp_dataset(&work_spec)?;
    dds.push(DdStatement::dataset("SMPWRK6", &work.name));
    dds.push(DdStatement::dummy("SMPLOG"));
    dds.push(DdStatement::dummy("SMPLOGA"));
    dds.push(DdStatement::dataset("SMPCSI", &request.csi));

    let output_spec = DatasetSpec::seq()
        .space(&request.output_space, &request.output_space)
        .volume(&request.volume);
    let userid = tracker.userid().to_string();
    let listing = tracker.create_unique_dataset(&output_spec, &userid)?;
    dds.push(DdStatement::dataset("SMPLIST", &listing.name));

    let output = runner.execute_authorized(PROGRAM, None, &dds)?;
    Ok(SmpeReport {
        output,
        listing: listing.name,
    })
}
