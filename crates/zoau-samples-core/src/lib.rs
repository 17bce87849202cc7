//! # ZOAU sample tools
//!
//! Job-management building blocks for z/OS on top of the Z Open Automation
//! Utilities.
//!
//! ## Features
//!
//! - **Service traits** for programs, jobs, data sets and the operator console,
//!   with a [`ZoauCli`] backend that runs the ZOAU utilities
//! - **Input decks** in CP1047 with the 72 column card limit
//! - **Outcome classification** of IEBCOPY, IKJEFT01 and GIMSMP runs from
//!   their return codes and listings
//! - **Job polling** with a deadline and cancellation
//! - **zCX version scan** over a registry directory
//! - **Resource tracking** of temporary files and data sets
//!
//! ## Example
//!
//! ```rust
//! use zoau_samples_core::classify::{classify_member_copy, CopyRequest, ExecutionResult};
//!
//! let request = CopyRequest::new("IBMUSER.SRC", "IBMUSER.DST", vec!["A".into(), "B".into()]);
//! let result = classify_member_copy(&ExecutionResult::new(0, "", None), &request);
//! assert_eq!(result.message, "Members: A,B have been copied.");
//! ```

pub mod classify;
pub mod config;
pub mod dd;
pub mod deck;
pub mod error;
pub mod gimsmp;
pub mod iebcopy;
pub mod ikjeft01;
pub mod jobs;
pub mod poll;
pub mod process;
pub mod resources;
pub mod scan;
pub mod service;
pub mod zoau;

#[cfg(test)]
pub(crate) mod fakes;

pub use classify::{ClassifiedResult, CopyRequest, ExecutionResult, OutcomeKind};
pub use config::SmpeDefaults;
pub use dd::{DdDefinition, DdStatement};
pub use deck::{write_deck, DeckError, DeckWriter, OversizePolicy, MAX_CARD_LEN};
pub use error::Error;
pub use poll::{CancellationToken, PollOptions, Sleeper, StatusRecord, StatusSnapshot, ThreadSleeper};
pub use resources::ResourceTracker;
pub use service::{
    DatasetService, DatasetSpec, ExecutionOutput, JobHandle, JobService, JobStatus, OperatorConsole,
    ProgramRunner, ServiceError,
};
pub use zoau::ZoauCli;

/// Convenience result type for the tools.
pub type Result<T> = std::result::Result<T, Error>;
