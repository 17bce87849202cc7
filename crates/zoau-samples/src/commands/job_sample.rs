//! Job-sample command - run the BPXBATCH sample job end to end.

use miette::Result;
use zoau_samples_core::jobs::{run_sample, JobDetails};
use zoau_samples_core::{PollOptions, ThreadSleeper};

use crate::output::print_json;
use crate::Context;

fn rc_text(details: &JobDetails) -> String {
    details
        .rc
        .map(|rc| rc.to_string())
        .unwrap_or_else(|| "None".to_string())
}

pub fn run(ctx: &Context) -> Result<()> {
    let report = run_sample(&ctx.zoau, &ctx.zoau, &PollOptions::default(), &ThreadSleeper)?;

    if ctx.format.is_json() {
        print_json(&report);
        return Ok(());
    }

    let job = &report.submitted;
    println!("Details - sample job");
    println!("id: {}", job.id);
    println!("name: {}", job.name);
    println!("owner: {}", job.owner);
    println!("status: {}", job.status);
    println!("rc: {}", rc_text(job));
    println!("Waiting for job completion, then refresh and print status, rc...");
    println!("status: {}", report.finished.status);
    println!("rc: {}", rc_text(&report.finished));
    println!("The contents of the STDOUT DD:");
    println!("{}", report.stdout);
    Ok(())
}
