//! Crate-wide error type.

use miette::Diagnostic;
use thiserror::Error;

use crate::config::ConfigError;
use crate::deck::DeckError;
use crate::jobs::JobError;
use crate::poll::PollError;
use crate::scan::ScanError;
use crate::service::ServiceError;

/// Errors returned by the tools.
#[derive(Debug, Error, Diagnostic)]
pub enum Error {
    /// Arguments the tools cannot work with.
    #[error("{0}")]
    #[diagnostic(code(zoau::invalid_input))]
    InvalidInput(String),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Deck(#[from] DeckError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Service(#[from] ServiceError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Poll(#[from] PollError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Scan(#[from] ScanError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Job(#[from] JobError),
}

impl Error {
    /// Process exit code for this error.
    ///
    /// | Code | Meaning |
    /// |------|---------|
    /// | 1 | invalid input |
    /// | 2 | configuration |
    /// | 3 | missing external resource |
    /// | 4 | execution failure or timeout |
    /// | 5 | cancelled |
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::InvalidInput(_) | Self::Deck(DeckError::LineTooLong { .. } | DeckError::Encoding { .. }) => 1,
            Self::Config(_) => 2,
            Self::Deck(DeckError::Io { .. })
            | Self::Scan(_)
            | Self::Job(JobError::DatasetNotFound { .. })
            | Self::Service(ServiceError::ToolNotFound { .. }) => 3,
            Self::Poll(PollError::Cancelled { .. }) => 5,
            Self::Service(_) | Self::Poll(_) => 4,
        }
    }
}
