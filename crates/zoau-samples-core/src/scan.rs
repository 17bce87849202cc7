//! zCX appliance version scan.
//!
//! Every zCX instance registered under the registry directory is queried
//! with `F <name>,DISPLAY,VERSION` and the current and available appliance
//! versions are read from the response.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use miette::Diagnostic;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::service::{OperatorConsole, ServiceError};

/// Longest MVS job name, which a zCX instance name must fit.
pub const MAX_INSTANCE_NAME_LEN: usize = 8;

/// Time allowed for one display command.
pub const QUERY_TIMEOUT: Duration = Duration::from_secs(5);

const ANCHOR: &str = "Current Appliance";
const INACTIVE_MARKER: &str = "NOT ACTIVE";
/// Line of the available version, counted from the anchor.
const AVAILABLE_OFFSET: usize = 4;

#[derive(Debug, Error, Diagnostic)]
pub enum ScanError {
    #[error("cannot read zCX registry {}", .path.display())]
    #[diagnostic(code(scan::registry), help("pass the zCX registry directory with -p"))]
    Registry {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Versions read from a display response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VersionInfo {
    pub current: String,
    pub available: String,
    /// Build identifier following the current version, when present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identifier: Option<String>,
}

impl VersionInfo {
    pub fn is_upgradeable(&self) -> bool {
        self.current != self.available
    }
}

/// Read versions from `F <name>,DISPLAY,VERSION` output.
///
/// Returns `None` when the anchor line is missing or the response ends
/// before the available version line.
pub fn parse_version_output(output: &str) -> Option<VersionInfo> {
    let lines: Vec<&str> = output.lines().collect();
    let anchor = lines.iter().position(|l| l.contains(ANCHOR))?;

    let mut current_line = lines.get(anchor + 1)?.split_whitespace();
    let current = current_line.next()?.to_string();
    let identifier = current_line.next().map(str::to_string);
    let available = lines
        .get(anchor + AVAILABLE_OFFSET)?
        .split_whitespace()
        .next()?
        .to_string();

    Some(VersionInfo {
        current,
        available,
        identifier,
    })
}

/// What scanning one instance found.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ScanOutcome {
    Current(VersionInfo),
    Upgradeable(VersionInfo),
    /// The instance is not started.
    Inactive,
    /// The response did not have the expected layout.
    Unparseable { output: String },
    /// The display command failed.
    QueryFailed { output: String },
    TimedOut,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScanEntry {
    pub instance: String,
    #[serde(flatten)]
    pub outcome: ScanOutcome,
}

impl ScanEntry {
    /// Console line for this entry, or `None` if nothing is printed.
    pub fn report_line(&self, upgradeable_only: bool) -> Option<String> {
        let name = &self.instance;
        match &self.outcome {
            ScanOutcome::Upgradeable(v) => Some(format!(
                "Instance {name:<8} is version {} and can be upgraded to {}",
                v.current, v.available
            )),
            ScanOutcome::Current(v) if !upgradeable_only => {
                Some(format!("Instance {name:<8} is version {}", v.current))
            }
            ScanOutcome::Current(_) | ScanOutcome::Inactive => None,
            ScanOutcome::Unparseable { .. } => Some(format!("Instance {name:<8} unable to parse")),
            ScanOutcome::QueryFailed { output } => Some(output.trim_end().to_string()),
            ScanOutcome::TimedOut => Some("Timeout expired".to_string()),
        }
    }
}

impl fmt::Display for ScanEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.report_line(false) {
            Some(line) => f.write_str(&line),
            None => write!(f, "Instance {:<8} is not active", self.instance),
        }
    }
}

/// Registry entries that can be instance names, sorted.
pub fn candidate_instances(registry: &Path) -> Result<Vec<String>, ScanError> {
    let entries = fs::read_dir(registry).map_err(|source| ScanError::Registry {
        path: registry.to_path_buf(),
        source,
    })?;

    let mut names: Vec<String> = entries
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.path().is_dir())
        .filter_map(|entry| entry.file_name().into_string().ok())
        .filter(|name| name.chars().count() <= MAX_INSTANCE_NAME_LEN)
        .collect();
    names.sort();
    Ok(names)
}

/// Query one instance.
pub fn scan_instance<C: OperatorConsole + ?Sized>(console: &C, instance: &str) -> ScanEntry {
    let command = format!("f {instance},display,version");
    let outcome = match console.issue(&command, QUERY_TIMEOUT) {
        Ok(output) if output.contains(INACTIVE_MARKER) => ScanOutcome::Inactive,
        Ok(output) => match parse_version_output(&output) {
            Some(v) if v.is_upgradeable() => ScanOutcome::Upgradeable(v),
            Some(v) => ScanOutcome::Current(v),
            None => {
                warn!(instance, "Display version response not recognised");
                ScanOutcome::Unparseable { output }
            }
        },
        Err(ServiceError::Timeout { .. }) => {
            warn!(instance, "Display version timed out");
            ScanOutcome::TimedOut
        }
        Err(ServiceError::CommandFailed { output, .. }) => ScanOutcome::QueryFailed { output },
        Err(e) => ScanOutcome::QueryFailed {
            output: e.to_string(),
        },
    };
    debug!(instance, ?outcome, "Scanned");
    ScanEntry {
        instance: instance.to_string(),
        outcome,
    }
}

/// Scan every instance under `registry`, one at a time.
pub fn scan_registry<C: OperatorConsole + ?Sized>(
    console: &C,
    registry: &Path,
) -> Result<Vec<ScanEntry>, ScanError> {
    let instances = candidate_instances(registry)?;
    info!(registry = %registry.display(), count = instances.len(), "Scanning zCX instances");
    Ok(instances.iter().map(|name| scan_instance(console, name)).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fakes::FakeConsole;

    const RESPONSE: &str = "\
GLZM001I zCX ZCX01 display version
Current Appliance Version
1.2.3 oa61392
Build date 2024-01-01
Available Appliance Version
1.2.4
";

    fn same_version() -> String {
        RESPONSE.replace("1.2.4", "1.2.3")
    }

    #[test]
    fn test_parse_version_output() {
        let info = parse_version_output(RESPONSE).unwrap();
        assert_eq!(info.current, "1.2.3");
        assert_eq!(info.available, "1.2.4");
        assert_eq!(info.identifier.as_deref(), Some("oa61392"));
        assert!(info.is_upgradeable());
    }

    #[test]
    fn test_missing_anchor_is_unparseable() {
        assert!(parse_version_output("GLZM002I nothing here\n").is_none());
        assert!(parse_version_output("Current Appliance\n1.0\n").is_none());
    }

    #[test]
    fn test_report_lines() {
        let up = ScanEntry {
            instance: "ZCX01".into(),
            outcome: ScanOutcome::Upgradeable(parse_version_output(RESPONSE).unwrap()),
        };
        assert_eq!(
            up.report_line(true).unwrap(),
            "Instance ZCX01    is version 1.2.3 and can be upgraded to 1.2.4"
        );

        let current = ScanEntry {
            instance: "ZCX02".into(),
            outcome: ScanOutcome::Current(parse_version_output(&same_version()).unwrap()),
        };
        assert_eq!(current.report_line(false).unwrap(), "Instance ZCX02    is version 1.2.3");
        assert!(current.report_line(true).is_none());
    }

    #[test]
    fn test_unparseable_is_always_reported() {
        let entry = ScanEntry {
            instance: "ZCX03".into(),
            outcome: ScanOutcome::Unparseable {
                output: "garbage".into(),
            },
        };
        assert!(entry.report_line(true).unwrap().contains("unable to parse"));
    }

    #[test]
    fn test_scan_registry_filters_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["ZCXB", "ZCXA", "TOOLONGNAME", "ZCXC"] {
            fs::create_dir(dir.path().join(name)).unwrap();
        }
        fs::write(dir.path().join("README"), "not an instance").unwrap();

        let console = FakeConsole::new()
            .respond("f ZCXA,display,version", Ok(RESPONSE.to_string()))
            .respond("f ZCXB,display,version", Ok("GLZM003I ZCXB NOT ACTIVE".to_string()))
            .respond("f ZCXC,display,version", Ok("unexpected".to_string()));

        let entries = scan_registry(&console, dir.path()).unwrap();
        let names: Vec<&str> = entries.iter().map(|e| e.instance.as_str()).collect();
        assert_eq!(names, vec!["ZCXA", "ZCXB", "ZCXC"]);
        assert!(matches!(entries[0].outcome, ScanOutcome::Upgradeable(_)));
        assert_eq!(entries[1].outcome, ScanOutcome::Inactive);
        assert!(matches!(entries[2].outcome, ScanOutcome::Unparseable { .. }));
        assert_eq!(console.commands(), vec![
            "f ZCXA,display,version",
            "f ZCXB,display,version",
            "f ZCXC,display,version",
        ]);
    }

    #[cfg(unix)]
    #[test]
    fn test_candidates_follow_symlinked_dirs() {
        let registry = tempfile::tempdir().unwrap();
        let elsewhere = tempfile::tempdir().unwrap();
        fs::create_dir(registry.path().join("ZCXA")).unwrap();
        std::os::unix::fs::symlink(elsewhere.path(), registry.path().join("ZCXL")).unwrap();
        std::os::unix::fs::symlink(registry.path().join("GONE"), registry.path().join("ZCXD")).unwrap();

        let names = candidate_instances(registry.path()).unwrap();
        assert_eq!(names, vec!["ZCXA", "ZCXL"]);
    }

    #[test]
    fn test_timeout_and_failure() {
        let console = FakeConsole::new()
            .respond(
                "f SLOW,display,version",
                Err(ServiceError::Timeout {
                    tool: "opercmd".into(),
                    timeout: QUERY_TIMEOUT,
                }),
            )
            .respond(
                "f BAD,display,version",
                Err(ServiceError::CommandFailed {
                    tool: "opercmd".into(),
                    rc: 1,
                    output: "IEE341I BAD NOT ACTIVE OR NOT FOUND".into(),
                }),
            );

        let slow = scan_instance(&console, "SLOW");
        assert_eq!(slow.report_line(false).unwrap(), "Timeout expired");

        let bad = scan_instance(&console, "BAD");
        assert_eq!(
            bad.report_line(false).unwrap(),
            "IEE341I BAD NOT ACTIVE OR NOT FOUND"
        );
    }

    #[test]
    fn test_missing_registry() {
        let err = scan_registry(&FakeConsole::new(), Path::new("/nonexistent/zcx")).unwrap_err();
        assert!(matches!(err, ScanError::Registry { .. }));
    }
}
