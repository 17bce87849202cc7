//! Zcx-versions command - report zCX appliance versions.

use std::path::PathBuf;

use miette::Result;
use zoau_samples_core::scan::{candidate_instances, scan_instance};
use zoau_samples_core::Error;

use crate::output::{print_json, ScanOutput};
use crate::{show, Context};

pub fn run(ctx: &Context, registry: Option<PathBuf>, upgradeable_only: bool) -> Result<()> {
    let Some(registry) = registry else {
        return Err(Error::InvalidInput("No registry path specified.".into()).into());
    };
    let json = ctx.format.is_json();

    let opercmd = ctx.zoau.require("opercmd").map_err(Error::from)?;
    if !json {
        if ctx.zoau_home.is_some() {
            println!("Using opercmd at {}", opercmd.display());
        }
        println!("Looking for running zCX instances in directory {}", registry.display());
    }

    let instances = candidate_instances(&registry).map_err(Error::from)?;
    let mut entries = Vec::with_capacity(instances.len());
    for name in &instances {
        let entry = scan_instance(&ctx.zoau, name);
        if !json {
            if let Some(line) = entry.report_line(upgradeable_only) {
                println!("{line}");
            }
        }
        entries.push(entry);
    }

    if json {
        print_json(&ScanOutput {
            registry: show(&registry),
            instances: entries,
        });
    }
    Ok(())
}
