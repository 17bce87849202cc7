//! SMP/E list commands.

use std::path::PathBuf;

use miette::Result;
use zoau_samples_core::gimsmp::{smpe_global_list, smpe_list, GlobalListRequest, SmpeListRequest};
use zoau_samples_core::{Error, ResourceTracker, SmpeDefaults};

use crate::output::{compact_json, print_json};
use crate::Context;

/// Defaults file looked up when `--defaults` is not given.
pub const DEFAULTS_FILE: &str = "./SMPElistDefaults.yaml";

/// LIST `zone` with allocations from the defaults file.
pub fn run(
    ctx: &Context,
    hlq: String,
    zone: String,
    options: Option<String>,
    defaults: Option<PathBuf>,
) -> Result<()> {
    let path = defaults.unwrap_or_else(|| PathBuf::from(DEFAULTS_FILE));
    let defaults = SmpeDefaults::load_from_file(&path).map_err(Error::from)?;
    let request = SmpeListRequest { zone, options, hlq };

    let report = smpe_list(&ctx.zoau, &ctx.zoau, &defaults, &request)?;

    if ctx.format.is_json() {
        print_json(&report);
        return Ok(());
    }

    println!("Output can be found in: {}\n", report.listing);
    if report.output.rc > 0 {
        eprintln!("Return Code: {}", report.output.rc);
        if !report.output.stderr.is_empty() {
            eprintln!("{}", report.output.stderr.trim_end());
        }
        eprintln!("Message from the system:\n{}", compact_json(&report));
    }
    Ok(())
}

/// LIST the global zone of `csi` with tracked temporaries.
pub fn run_global(ctx: &Context, csi: String, volume: String, keep: bool) -> Result<()> {
    let userid = ctx.zoau.userid().map_err(Error::from)?;
    let work_dir = ctx.work_dir()?;
    let mut tracker = ResourceTracker::new(&ctx.zoau, &userid).keep(keep);

    let result = smpe_global_list(
        &ctx.zoau,
        &mut tracker,
        &GlobalListRequest::new(&csi, &volume),
        &work_dir,
    );
    let cleanup = tracker.cleanup();
    for error in &cleanup.errors {
        eprintln!("{error}");
    }
    let report = result?;

    if ctx.format.is_json() {
        print_json(&report);
        return Ok(());
    }

    if report.output.rc > 0 {
        println!("Command failed with a return code of: {}", report.output.rc);
    } else {
        println!("Command succeeded. Output can be found in: {}", report.listing);
    }
    for name in &cleanup.kept {
        println!("Temporary resource: {name} has not been erased");
    }
    Ok(())
}
