//! zoau-samples library: subcommand implementations and output types shared
//! by the `zoau-samples` binary and its tests.

pub mod commands;
pub mod output;

use std::path::{Path, PathBuf};

use zoau_samples_core::{Error, ZoauCli};

use output::OutputFormat;

/// Settings every subcommand receives.
#[derive(Debug, Clone)]
pub struct Context {
    pub format: OutputFormat,
    pub zoau: ZoauCli,
    /// Install directory given with `--zoau-path`, if any.
    pub zoau_home: Option<PathBuf>,
}

impl Context {
    pub fn new(format: OutputFormat, zoau_home: Option<PathBuf>) -> Self {
        let zoau = match &zoau_home {
            Some(home) => ZoauCli::new(Some(home.join("bin"))),
            None => ZoauCli::installed(),
        };
        Self {
            format,
            zoau,
            zoau_home,
        }
    }

    /// Directory for work files; decks and listings must use full paths.
    pub fn work_dir(&self) -> Result<PathBuf, Error> {
        std::env::current_dir().map_err(|e| Error::InvalidInput(format!("cannot determine working directory: {e}")))
    }
}

/// Exit code for an error reported by a subcommand.
pub fn exit_code(report: &miette::Report) -> i32 {
    report
        .downcast_ref::<Error>()
        .map(Error::exit_code)
        .unwrap_or(1)
}

/// Display form of a path for messages.
pub fn show(path: &Path) -> String {
    path.display().to_string()
}
