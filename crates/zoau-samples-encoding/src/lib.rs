//! EBCDIC encoding for the ZOAU sample tools.
//!
//! Input decks handed to MVS programs (SYSIN, SYSTSIN, SMPCNTL) and the
//! listings those programs write back (SYSPRINT, SYSTSPRT) live in USS
//! files tagged IBM-1047. This crate converts between that code page and
//! UTF-8.
//!
//! # Example
//!
//! ```rust
//! use zoau_samples_encoding::CP1047;
//!
//! let ebcdic = CP1047.encode("HELLO").unwrap();
//! assert_eq!(ebcdic, vec![0xC8, 0xC5, 0xD3, 0xD3, 0xD6]);
//! assert_eq!(CP1047.decode(&ebcdic), "HELLO");
//! ```

pub mod ebcdic;
pub mod error;

pub use ebcdic::{CodePage, CP037, CP1047, EBCDIC_NEWLINE};
pub use error::EncodingError;

/// Result type for encoding operations.
pub type Result<T> = std::result::Result<T, EncodingError>;
