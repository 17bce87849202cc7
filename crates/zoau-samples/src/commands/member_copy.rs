//! Member-copy command - copy PDS members with IEBCOPY.

use miette::Result;
use zoau_samples_core::iebcopy;
use zoau_samples_core::{CopyRequest, Error};

use crate::output::print_json;
use crate::Context;

/// Copy `members` from `source` to `destination`.
///
/// A classified failure is reported, not treated as an error: the
/// return code and message are printed and the command succeeds.
pub fn run(
    ctx: &Context,
    source: String,
    destination: String,
    members: Vec<String>,
    debug: bool,
) -> Result<()> {
    let request = CopyRequest::new(&source, &destination, members);
    if request.members.is_empty() {
        return Err(Error::InvalidInput("You must provide an input, output, and members".into()).into());
    }
    if debug {
        println!("Running the member_copy function");
    }

    let work_dir = ctx.work_dir()?;
    let report = iebcopy::member_copy(&ctx.zoau, &request, &work_dir, debug)?;

    if ctx.format.is_json() {
        print_json(&report);
        return Ok(());
    }

    if report.result.code != 0 {
        println!("Return Code:{}", report.result.code);
    }
    println!("{}", report.result.message);
    if let [input, output] = report.retained.as_slice() {
        println!(
            "Input file: {} and Output file: {} have been retained",
            input.display(),
            output.display()
        );
    }
    Ok(())
}
