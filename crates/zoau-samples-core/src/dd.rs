//! DD statements handed to `mvscmd`.
//!
//! A DD binds a DD name to the data the program reads or writes for one
//! run: a cataloged data set, a z/OS UNIX file, or DUMMY.

use std::path::{Path, PathBuf};

use serde::Serialize;

/// What a DD name points at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum DdDefinition {
    /// A cataloged data set, optionally with a member, e.g. `HLQ.SRC(A)`.
    /// Allocated `DISP=SHR`.
    Dataset { name: String },
    /// A z/OS UNIX file.
    File { path: PathBuf },
    /// `DD DUMMY`.
    Dummy,
}

/// A single DD statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DdStatement {
    /// DD name, upper-cased (SYSIN, SYSUT1, ...).
    pub name: String,
    pub definition: DdDefinition,
}

impl DdStatement {
    /// DD backed by a data set with `DISP=SHR`.
    pub fn dataset(ddname: &str, dsname: &str) -> Self {
        Self {
            name: ddname.to_uppercase(),
            definition: DdDefinition::Dataset {
                name: dsname.to_string(),
            },
        }
    }

    /// DD backed by a z/OS UNIX file.
    pub fn file(ddname: &str, path: impl AsRef<Path>) -> Self {
        Self {
            name: ddname.to_uppercase(),
            definition: DdDefinition::File {
                path: path.as_ref().to_path_buf(),
            },
        }
    }

    /// `DD DUMMY`.
    pub fn dummy(ddname: &str) -> Self {
        Self {
            name: ddname.to_uppercase(),
            definition: DdDefinition::Dummy,
        }
    }

    /// The file path, if this DD points at a z/OS UNIX file.
    pub fn file_path(&self) -> Option<&Path> {
        match &self.definition {
            DdDefinition::File { path } => Some(path),
            _ => None,
        }
    }

    /// Render the statement as an `mvscmd` option, e.g.
    /// `--sysut1=IBMUSER.SRC,shr`, `--sysin=/tmp/sysin.1`, `--smplog=dummy`.
    pub fn mvscmd_arg(&self) -> String {
        let dd = self.name.to_lowercase();
        match &self.definition {
            DdDefinition::Dataset { name } => format!("--{dd}={name},shr"),
            DdDefinition::File { path } => format!("--{dd}={}", path.display()),
            DdDefinition::Dummy => format!("--{dd}=dummy"),
        }
    }
}

/// Find a DD by name (case-insensitive).
pub fn find_dd<'a>(dds: &'a [DdStatement], ddname: &str) -> Option<&'a DdStatement> {
    dds.iter().find(|dd| dd.name.eq_ignore_ascii_case(ddname))
}
