//! IEBCOPY member copy.
//!
//! Copies members between partitioned data sets with IEBCOPY, which keeps
//! member statistics, and explains the result through the classifier.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::classify::{classify_member_copy, ClassifiedResult, CopyRequest, ExecutionResult};
use crate::dd::DdStatement;
use crate::deck::write_deck;
use crate::resources::TEMP_QUALIFIER;
use crate::service::ProgramRunner;
use crate::Result;

pub const PROGRAM: &str = "IEBCOPY";

/// SYSIN statements selecting `members`.
pub fn sysin_deck(request: &CopyRequest) -> Vec<String> {
    vec![
        " COPY OUTDD=SYSUT2,INDD=SYSUT1".to_string(),
        format!(" SELECT MEMBER=({})", request.member_list().to_uppercase()),
    ]
}

/// Outcome of [`member_copy`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MemberCopyReport {
    #[serde(flatten)]
    pub result: ClassifiedResult,
    /// SYSIN and SYSPRINT files left on disk, if any.
    pub retained: Vec<PathBuf>,
}

/// Copy `request.members` from source to destination.
///
/// The SYSIN and SYSPRINT files live in `work_dir`. They are removed
/// unless the outcome needs them for diagnosis or `debug` is set.
pub fn member_copy<R: ProgramRunner + ?Sized>(
    runner: &R,
    request: &CopyRequest,
    work_dir: &Path,
    debug: bool,
) -> Result<MemberCopyReport> {
    let stamp = chrono::Utc::now().format("%s%.6f").to_string();
    let sysin = work_dir.join(format!("SYSIN.{TEMP_QUALIFIER}.{stamp}"));
    let sysprint = work_dir.join(format!("SYSPRINT.{TEMP_QUALIFIER}.{stamp}"));

    write_deck(&sysin_deck(request), &sysin)?;
    let dds = [
        DdStatement::file("SYSIN", &sysin),
        DdStatement::dataset("SYSUT1", &request.source.to_uppercase()),
        DdStatement::dataset("SYSUT2", &request.destination.to_uppercase()),
        DdStatement::file("SYSPRINT", &sysprint),
    ];

    info!(source = %request.source, destination = %request.destination, members = %request.member_list(), "Copying members");
    let output = match runner.execute(PROGRAM, None, &dds) {
        Ok(output) => output,
        Err(e) => {
            remove(&sysin);
            return Err(e.into());
        }
    };

    let execution = ExecutionResult::new(output.rc, output.stderr, Some(sysprint.clone()));
    let result = classify_member_copy(&execution, request);
    debug!(rc = result.code, kind = ?result.kind, "Classified");

    let retained = if result.retains_diagnostics() || debug {
        vec![sysin, sysprint]
    } else {
        remove(&sysin);
        remove(&sysprint);
        Vec::new()
    };

    Ok(MemberCopyReport { result, retained })
}

fn remove(path: &Path) {
    if let Err(e) = fs::remove_file(path) {
        if e.kind() != std::io::ErrorKind::NotFound {
            warn!(path = %path.display(), error = %e, "Cannot remove work file");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::OutcomeKind;
    use crate::dd::find_dd;
    use crate::fakes::FakeRunner;
    use crate::service::ExecutionOutput;
    use zoau_samples_encoding::CP1047;

    fn request() -> CopyRequest {
        CopyRequest::new("ibmuser.src", "ibmuser.dst", vec!["mema".into(), "memb".into()])
    }

    #[test]
    fn test_sysin_deck_uppercases_members() {
        assert_eq!(
            sysin_deck(&request()),
            vec![" COPY OUTDD=SYSUT2,INDD=SYSUT1", " SELECT MEMBER=(MEMA,MEMB)"]
        );
    }

    #[test]
    fn test_success_removes_work_files() {
        let dir = tempfile::tempdir().unwrap();
        let runner = FakeRunner::new(|program, dds| {
            assert_eq!(program, PROGRAM);
            let sysin = find_dd(dds, "SYSIN").and_then(|d| d.file_path()).unwrap();
            let deck = CP1047.decode_lines(&fs::read(sysin).unwrap());
            assert_eq!(deck[1], " SELECT MEMBER=(MEMA,MEMB)");
            assert_eq!(find_dd(dds, "SYSUT1").unwrap().mvscmd_arg(), "--sysut1=IBMUSER.SRC,shr");
            ExecutionOutput::default()
        });

        let report = member_copy(&runner, &request(), dir.path(), false).unwrap();
        assert_eq!(report.result.message, "Members: mema,memb have been copied.");
        assert!(report.retained.is_empty());
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
        assert_eq!(runner.calls(), 1);
    }

    #[test]
    fn test_system_error_keeps_work_files() {
        let dir = tempfile::tempdir().unwrap();
        let runner = FakeRunner::new(|_, _| ExecutionOutput {
            rc: 8,
            stdout: String::new(),
            stderr: "BGYSC0301E Program abended".into(),
        });

        let report = member_copy(&runner, &request(), dir.path(), false).unwrap();
        assert_eq!(report.result.kind, OutcomeKind::SystemError);
        assert_eq!(report.retained.len(), 2);
        assert!(report.retained[0].exists());
    }

    #[test]
    fn test_classified_failure_from_listing() {
        let dir = tempfile::tempdir().unwrap();
        let runner = FakeRunner::new(|_, dds| {
            FakeRunner::write_listing(
                dds,
                "SYSPRINT",
                &["IEB177I MEMB WAS NOT FOUND IN THE INPUT DATA SET"],
            );
            ExecutionOutput {
                rc: 4,
                ..ExecutionOutput::default()
            }
        });

        let report = member_copy(&runner, &request(), dir.path(), false).unwrap();
        assert_eq!(report.result.message, "Member: MEMB is not in dataset ibmuser.src.");
        assert!(report.retained.is_empty());
    }

    #[test]
    fn test_debug_keeps_files_on_success() {
        let dir = tempfile::tempdir().unwrap();
        let runner = FakeRunner::new(|_, _| ExecutionOutput::default());
        let report = member_copy(&runner, &request(), dir.path(), true).unwrap();
        assert_eq!(report.retained.len(), 2);
    }
}
