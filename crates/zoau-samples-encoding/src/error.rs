//! Encoding error types.

use miette::Diagnostic;
use thiserror::Error;

/// Errors produced while converting to or from EBCDIC.
#[derive(Debug, Error, Diagnostic)]
pub enum EncodingError {
    /// A character has no position in the target code page.
    #[error("character '{ch}' (U+{code:04X}) cannot be encoded in {code_page}")]
    #[diagnostic(code(encoding::unmappable_char))]
    Unmappable {
        ch: char,
        code: u32,
        code_page: &'static str,
    },
}
