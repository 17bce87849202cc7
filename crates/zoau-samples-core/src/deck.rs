//! Input deck writer.
//!
//! MVS programs read their control statements (SYSIN, SYSTSIN, SMPCNTL)
//! as card images. Decks are written as z/OS UNIX files in an EBCDIC code
//! page, one record per line, each at most [`MAX_CARD_LEN`] characters.

use std::fs;
use std::path::{Path, PathBuf};

use miette::Diagnostic;
use thiserror::Error;
use tracing::{debug, warn};
use zoau_samples_encoding::{EncodingError, CP1047, EBCDIC_NEWLINE};

/// Longest card image accepted; columns 73-80 are the sequence field.
pub const MAX_CARD_LEN: usize = 72;

/// Errors raised while writing a deck.
#[derive(Debug, Error, Diagnostic)]
pub enum DeckError {
    /// A line does not fit on a card.
    #[error("Input lines must be 72 chars or fewer\n{line} length: {length}")]
    #[diagnostic(code(deck::line_too_long))]
    LineTooLong { line: String, length: usize },

    /// A line has characters the code page cannot represent.
    #[error("cannot encode input line {line:?}")]
    #[diagnostic(code(deck::encoding))]
    Encoding {
        line: String,
        #[source]
        source: EncodingError,
    },

    /// The deck file could not be written.
    #[error("failed to write {}: {source}", .path.display())]
    #[diagnostic(code(deck::io))]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// What to do with a line longer than [`MAX_CARD_LEN`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OversizePolicy {
    /// Fail the whole deck; nothing is written.
    #[default]
    Reject,
    /// Warn and leave the line out.
    Skip,
}

/// A line left out under [`OversizePolicy::Skip`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedLine {
    pub line: String,
    pub length: usize,
}

/// Result of a successful deck write.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeckReport {
    /// Records written to the file.
    pub written: usize,
    /// Oversized lines dropped.
    pub skipped: Vec<SkippedLine>,
}

/// Writes card-image decks.
#[derive(Debug, Clone, Copy)]
pub struct DeckWriter {
    policy: OversizePolicy,
}

impl Default for DeckWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl DeckWriter {
    /// CP1047, rejecting oversized lines.
    pub fn new() -> Self {
        Self {
            policy: OversizePolicy::Reject,
        }
    }

    pub fn with_policy(mut self, policy: OversizePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Encode `lines` into the bytes of a deck file.
    ///
    /// An empty deck becomes a single blank so the DD is never empty.
    pub fn render<S: AsRef<str>>(&self, lines: &[S]) -> Result<(Vec<u8>, DeckReport), DeckError> {
        let mut bytes = Vec::new();
        let mut report = DeckReport::default();

        if lines.is_empty() {
            bytes.extend(self.encode_line(" ")?);
            return Ok((bytes, report));
        }

        for line in lines {
            let line = line.as_ref();
            let length = line.chars().count();
            if length > MAX_CARD_LEN {
                match self.policy {
                    OversizePolicy::Reject => {
                        return Err(DeckError::LineTooLong {
                            line: line.to_string(),
                            length,
                        })
                    }
                    OversizePolicy::Skip => {
                        warn!(length, line, "Input line longer than {MAX_CARD_LEN} chars ignored");
                        report.skipped.push(SkippedLine {
                            line: line.to_string(),
                            length,
                        });
                        continue;
                    }
                }
            }
            bytes.extend(self.encode_line(line)?);
            bytes.push(EBCDIC_NEWLINE);
            report.written += 1;
        }

        Ok((bytes, report))
    }

    /// Write `lines` to `path`.
    ///
    /// Every line is validated and encoded before the file is opened, so a
    /// rejected deck leaves no file (or an existing file untouched).
    pub fn write<S: AsRef<str>>(&self, lines: &[S], path: &Path) -> Result<DeckReport, DeckError> {
        let (bytes, report) = self.render(lines)?;
        fs::write(path, bytes).map_err(|source| DeckError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), records = report.written, "Deck written");
        Ok(report)
    }

    fn encode_line(&self, line: &str) -> Result<Vec<u8>, DeckError> {
        CP1047.encode(line).map_err(|source| DeckError::Encoding {
            line: line.to_string(),
            source,
        })
    }
}

/// Write a deck with the defaults: CP1047, oversized lines rejected.
pub fn write_deck<S: AsRef<str>>(lines: &[S], path: &Path) -> Result<DeckReport, DeckError> {
    DeckWriter::new().write(lines, path)
}
