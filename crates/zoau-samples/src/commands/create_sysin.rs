//! Create-sysin command - write card-image input for an MVS program.

use std::path::PathBuf;

use miette::Result;
use zoau_samples_core::{write_deck, Error};

use crate::output::{print_json, DeckOutput};
use crate::{show, Context};

/// Write `lines` to `file` in CP1047.
pub fn run(ctx: &Context, file: PathBuf, lines: Vec<String>) -> Result<()> {
    tracing::info!("Writing {} input lines to {}", lines.len(), file.display());
    let report = write_deck(&lines, &file).map_err(Error::from)?;

    if ctx.format.is_json() {
        print_json(&DeckOutput {
            file: show(&file),
            records: report.written,
        });
    } else {
        println!("Input written to: {}", file.display());
    }
    Ok(())
}
