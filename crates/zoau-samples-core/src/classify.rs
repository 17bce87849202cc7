//! Outcome classification.
//!
//! Turns a raw program outcome (return code, captured stderr, and the
//! SYSPRINT listing the program wrote) into a [`ClassifiedResult`] with a
//! human-readable message. Listings are scanned for fixed-format IBM
//! message IDs and fields are taken from fixed word offsets; a listing
//! with a different column layout yields wrong fields, not an error.
//!
//! ## IEBCOPY return codes
//!
//! | RC | Meaning |
//! |----|---------|
//! | 0  | Members copied |
//! | 4  | Bad input parameters: some members not in the source |
//! | 8  | Cannot run: allocation failure or DCB mismatch |

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, warn};
use zoau_samples_encoding::CP1047;

/// Member not found in the input data set.
pub const MSG_MEMBER_NOT_FOUND: &str = "IEB177I";
/// DFSMSdfp record format conflict.
pub const MSG_PDSE_RECFM_CONFLICT: &str = "IGW01513T";
/// Record format conflict between SYSUT1 and SYSUT2.
pub const MSG_RECFM_CONFLICT: &str = "IEB127I";
/// Record length conflict between SYSUT1 and SYSUT2.
pub const MSG_LRECL_CONFLICT: &str = "IEB124I";
/// Abend 913 reason 38: RACF denied access.
pub const MSG_NOT_AUTHORIZED: &str = "913-00000038";

/// Marker `mvscmd` puts in stderr when a DD could not be allocated.
const ALLOCATION_MARKER: &str = "allocating";
/// DD name of the IEBCOPY input data set.
const SOURCE_DD: &str = "SYSUT1";

// ─────────────────────── Data Model ───────────────────────

/// Raw outcome of an external program run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionResult {
    /// Program return code.
    pub code: i32,
    /// Captured standard error text.
    pub stderr: String,
    /// Listing the program wrote, if any.
    pub diagnostic_file: Option<PathBuf>,
}

impl ExecutionResult {
    pub fn new(code: i32, stderr: impl Into<String>, diagnostic_file: Option<PathBuf>) -> Self {
        Self {
            code,
            stderr: stderr.into(),
            diagnostic_file,
        }
    }

    fn diagnostic_display(&self) -> String {
        self.diagnostic_file
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "<no diagnostic file>".to_string())
    }
}

/// Category of a classified outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeKind {
    Success,
    MembersNotFound,
    DatasetMissing,
    /// Error text from z/OS passed through verbatim.
    SystemError,
    RecordFormatMismatch,
    RecordLengthMismatch,
    NotAuthorized,
    /// Nothing recognised; the listing must be read by a person.
    Unchecked,
}

impl OutcomeKind {
    /// Whether the listing and input files should be kept for inspection.
    pub fn retains_diagnostics(self) -> bool {
        matches!(self, Self::SystemError | Self::Unchecked)
    }
}

/// The externally visible outcome: return code plus message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassifiedResult {
    #[serde(rename = "rc")]
    pub code: i32,
    pub message: String,
    pub kind: OutcomeKind,
}

impl ClassifiedResult {
    pub fn new(code: i32, kind: OutcomeKind, message: impl Into<String>) -> Self {
        let message = message.into();
        debug_assert!(!message.is_empty());
        Self {
            code,
            message,
            kind,
        }
    }

    /// Fallback when no rule explains a failure.
    pub fn unchecked(code: i32, diagnostic: &str) -> Self {
        Self::new(
            code,
            OutcomeKind::Unchecked,
            format!("z/OS Unchecked error please check out: {diagnostic}"),
        )
    }

    pub fn retains_diagnostics(&self) -> bool {
        self.kind.retains_diagnostics()
    }
}

impl fmt::Display for ClassifiedResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

// ─────────────────────── Rules ───────────────────────

/// Names substituted into a rule's message template.
#[derive(Debug, Clone, Copy)]
pub struct RuleContext<'a> {
    pub source: &'a str,
    pub destination: &'a str,
}

/// One marker rule applied to listing lines.
///
/// `extract` receives the whitespace-split words of a matching line and
/// returns the positional fields for the template, or `None` when the line
/// is too short for the expected layout. The template may reference
/// `{source}`, `{destination}`, and `{0}`, `{1}`, ... for extracted fields.
#[derive(Clone, Copy)]
pub struct ClassificationRule {
    pub marker: &'static str,
    pub kind: OutcomeKind,
    pub extract: fn(&[&str]) -> Option<Vec<String>>,
    pub template: &'static str,
}

impl fmt::Debug for ClassificationRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassificationRule")
            .field("marker", &self.marker)
            .field("kind", &self.kind)
            .field("template", &self.template)
            .finish()
    }
}

impl ClassificationRule {
    /// Render the message for a matching line; `None` if extraction fails.
    pub fn apply(&self, line: &str, ctx: &RuleContext<'_>) -> Option<String> {
        let words: Vec<&str> = line.split_whitespace().collect();
        let fields = (self.extract)(&words)?;
        let mut message = self
            .template
            .replace("{source}", ctx.source)
            .replace("{destination}", ctx.destination);
        for (i, field) in fields.iter().enumerate() {
            message = message.replace(&format!("{{{i}}}"), field);
        }
        Some(message)
    }
}

fn word<'a>(words: &[&'a str], index: usize) -> Option<&'a str> {
    words.get(index).copied()
}

/// Characters from position 6 on, e.g. `RECFM=FB` -> `FB`.
fn after_keyword(word: &str) -> String {
    word.chars().skip(6).collect()
}

fn extract_pdse_recfm(words: &[&str]) -> Option<Vec<String>> {
    Some(vec![word(words, 7)?.to_string(), word(words, 11)?.to_string()])
}

fn extract_recfm(words: &[&str]) -> Option<Vec<String>> {
    Some(vec![
        after_keyword(word(words, 5)?),
        after_keyword(word(words, 7)?),
    ])
}

fn extract_lrecl(words: &[&str]) -> Option<Vec<String>> {
    Some(vec![
        word(words, 5)?.trim_matches(['(', ')']).to_string(),
        word(words, 9)?.trim_matches(['(', ')', '.']).to_string(),
    ])
}

fn extract_nothing(_words: &[&str]) -> Option<Vec<String>> {
    Some(Vec::new())
}

/// Rules applied to an IEBCOPY SYSPRINT after a return code of 8 with
/// empty stderr. Within a line the first matching rule applies.
pub const IEBCOPY_RULES: &[ClassificationRule] = &[
    ClassificationRule {
        marker: MSG_PDSE_RECFM_CONFLICT,
        kind: OutcomeKind::RecordFormatMismatch,
        extract: extract_pdse_recfm,
        template: "Record Formats incompatible: {source} record format is {0}  {destination} record format is {1}",
    },
    ClassificationRule {
        marker: MSG_RECFM_CONFLICT,
        kind: OutcomeKind::RecordFormatMismatch,
        extract: extract_recfm,
        template: "Record Formats incompatible: {source} record format is {0} {destination} record format is {1}",
    },
    ClassificationRule {
        marker: MSG_LRECL_CONFLICT,
        kind: OutcomeKind::RecordLengthMismatch,
        extract: extract_lrecl,
        template: "Record length incompatible: {source} record length is {0} {destination} record length is {1}",
    },
    ClassificationRule {
        marker: MSG_NOT_AUTHORIZED,
        kind: OutcomeKind::NotAuthorized,
        extract: extract_nothing,
        template: "You are not authorized to {source}",
    },
];

/// Scan listing lines against `rules`.
///
/// Every matching line replaces the previous match, so the last matching
/// line in the listing decides the result.
pub fn scan_diagnostics<S: AsRef<str>>(
    lines: &[S],
    rules: &[ClassificationRule],
    ctx: &RuleContext<'_>,
) -> Option<(OutcomeKind, String)> {
    let mut found = None;
    for line in lines {
        let line = line.as_ref();
        let Some(rule) = rules.iter().find(|r| line.contains(r.marker)) else {
            continue;
        };
        match rule.apply(line, ctx) {
            Some(message) => {
                debug!(marker = rule.marker, "Diagnostic marker matched");
                found = Some((rule.kind, message));
            }
            None => warn!(marker = rule.marker, line, "Marker line too short for its layout"),
        }
    }
    found
}

/// Read a listing written in CP1047.
pub fn read_diagnostics(path: &Path) -> std::io::Result<Vec<String>> {
    let bytes = fs::read(path)?;
    Ok(CP1047.decode_lines(&bytes))
}

fn load_diagnostics(result: &ExecutionResult) -> Vec<String> {
    let Some(path) = result.diagnostic_file.as_deref() else {
        return Vec::new();
    };
    match read_diagnostics(path) {
        Ok(lines) => lines,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Cannot read diagnostic file");
            Vec::new()
        }
    }
}

// ─────────────────────── Member Copy ───────────────────────

/// What an IEBCOPY member copy was asked to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopyRequest {
    /// Source data set (SYSUT1).
    pub source: String,
    /// Destination data set (SYSUT2).
    pub destination: String,
    /// Members to copy, as given by the caller.
    pub members: Vec<String>,
}

impl CopyRequest {
    /// Comma-separated entries in `members` are split into single names.
    pub fn new(source: &str, destination: &str, members: Vec<String>) -> Self {
        let members = members
            .iter()
            .flat_map(|m| m.split(','))
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .map(str::to_string)
            .collect();
        Self {
            source: source.to_string(),
            destination: destination.to_string(),
            members,
        }
    }

    /// Members joined with commas, e.g. `A,B,C`.
    pub fn member_list(&self) -> String {
        self.members.join(",")
    }

    fn context(&self) -> RuleContext<'_> {
        RuleContext {
            source: &self.source,
            destination: &self.destination,
        }
    }
}

/// Classify the outcome of an IEBCOPY member copy.
pub fn classify_member_copy(result: &ExecutionResult, request: &CopyRequest) -> ClassifiedResult {
    let code = result.code;
    match code {
        0 => {
            let members = request.member_list();
            let message = if request.members.len() > 1 {
                format!("Members: {members} have been copied.")
            } else {
                format!("Member: {members} has been copied.")
            };
            ClassifiedResult::new(code, OutcomeKind::Success, message)
        }
        4 => {
            let missing = find_missing_members(result, request);
            let message = if missing.len() > 1 {
                format!(
                    "Members: {} are not in dataset {}.",
                    missing.join(","),
                    request.source
                )
            } else {
                format!(
                    "Member: {} is not in dataset {}.",
                    missing.join(","),
                    request.source
                )
            };
            ClassifiedResult::new(code, OutcomeKind::MembersNotFound, message)
        }
        8 => classify_cannot_run(result, request),
        _ => ClassifiedResult::unchecked(code, &result.diagnostic_display()),
    }
}

/// Members reported missing. A single requested member is reported as is;
/// otherwise the names come from IEB177I lines in the listing.
fn find_missing_members(result: &ExecutionResult, request: &CopyRequest) -> Vec<String> {
    if request.members.len() <= 1 {
        return request.members.clone();
    }

    let missing: Vec<String> = load_diagnostics(result)
        .iter()
        .filter(|line| line.contains(MSG_MEMBER_NOT_FOUND))
        .filter_map(|line| line.split_whitespace().nth(1).map(str::to_string))
        .collect();

    if missing.is_empty() {
        warn!("Return code 4 without {MSG_MEMBER_NOT_FOUND} in listing");
        request.members.clone()
    } else {
        missing
    }
}

fn classify_cannot_run(result: &ExecutionResult, request: &CopyRequest) -> ClassifiedResult {
    let code = result.code;
    let stderr = result.stderr.trim_end();

    if stderr.contains(ALLOCATION_MARKER) {
        // Heuristic: a SYSUT1 mention means the source failed to allocate,
        // anything else is blamed on the destination.
        let missing = if stderr.contains(SOURCE_DD) {
            &request.source
        } else {
            &request.destination
        };
        return ClassifiedResult::new(
            code,
            OutcomeKind::DatasetMissing,
            format!("Dataset: {missing} does not exist."),
        );
    }

    if !result.stderr.is_empty() {
        return ClassifiedResult::new(code, OutcomeKind::SystemError, format!("z/OS Error: {stderr}"));
    }

    let lines = load_diagnostics(result);
    match scan_diagnostics(&lines, IEBCOPY_RULES, &request.context()) {
        Some((kind, message)) => ClassifiedResult::new(code, kind, message),
        None => ClassifiedResult::unchecked(code, &result.diagnostic_display()),
    }
}

// ─────────────────────── Program Outcome ───────────────────────

/// Classify a general program run (REXX under IKJEFT01, GIMSMP).
///
/// `listing` names where the program's own output went, for the unchecked
/// fallback.
pub fn classify_program(program: &str, result: &ExecutionResult, listing: &str) -> ClassifiedResult {
    let code = result.code;
    let stderr = result.stderr.trim_end();
    if code == 0 {
        ClassifiedResult::new(code, OutcomeKind::Success, format!("{program} completed."))
    } else if !result.stderr.is_empty() {
        ClassifiedResult::new(code, OutcomeKind::SystemError, format!("z/OS Error: {stderr}"))
    } else {
        ClassifiedResult::unchecked(code, listing)
    }
}
