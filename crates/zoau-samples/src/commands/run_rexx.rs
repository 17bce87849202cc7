//! Run-rexx command - run a REXX exec under IKJEFT01.

use std::path::PathBuf;

use miette::Result;
use zoau_samples_core::ikjeft01::{run_rexx, OutputTarget, RexxRequest};
use zoau_samples_core::Error;

use crate::output::print_json;
use crate::Context;

/// Arguments of `run-rexx`.
#[derive(Debug, Clone)]
pub struct RexxArgs {
    pub library: String,
    pub exec: String,
    pub parms: String,
    pub input: Vec<String>,
    pub output_dd: Option<String>,
    pub output_file: Option<PathBuf>,
    pub output_dataset: Option<String>,
}

impl RexxArgs {
    fn output_target(&self) -> Result<Option<OutputTarget>, Error> {
        let Some(ddname) = self.output_dd.clone() else {
            if self.output_file.is_some() || self.output_dataset.is_some() {
                return Err(Error::InvalidInput("--output-dd is required with an output file or data set".into()));
            }
            return Ok(None);
        };
        match (&self.output_file, &self.output_dataset) {
            (Some(path), None) => Ok(Some(OutputTarget::File {
                ddname,
                path: path.clone(),
            })),
            (None, Some(name)) => Ok(Some(OutputTarget::Dataset {
                ddname,
                name: name.clone(),
            })),
            _ => Err(Error::InvalidInput(format!(
                "output DD {ddname} needs exactly one of --output-file or --output-dataset"
            ))),
        }
    }
}

pub fn run(ctx: &Context, args: RexxArgs) -> Result<()> {
    let request = RexxRequest {
        output: args.output_target()?,
        library: args.library,
        exec: args.exec,
        parms: args.parms,
        input: args.input,
    };

    let work_dir = ctx.work_dir()?;
    let report = run_rexx(&ctx.zoau, &request, &work_dir)?;

    if ctx.format.is_json() {
        print_json(&report);
        return Ok(());
    }

    let classified = report.classify();
    println!("Return Code: {}", report.output.rc);
    println!("{}", classified.message);
    if !report.output.stdout.trim().is_empty() {
        println!("{}", report.output.stdout.trim_end());
    }
    println!("SYSTSPRT: {}", report.systsprt.display());
    println!("SYSPRINT: {}", report.sysprint.display());
    Ok(())
}
