//! Error types for the streaming ledger.

use thiserror::Error;

/// Result type alias for ledger operations
pub type Result<T> = std::result::Result<T, StreamError>;

/// Errors that can occur during ledger operation.
///
/// Every public operation validates its preconditions and fails with one of
/// these before mutating any state; single-item operations never leave a
/// partial write behind on failure.
#[derive(Error, Debug)]
pub enum StreamError {
    /// No stream exists with the given ID
    #[error("stream {0} not found")]
    StreamNotFound(u64),

    /// Recipient (or sender) is the zero principal
    #[error("invalid principal address")]
    InvalidAddress,

    /// Stream total amount is zero
    #[error("stream amount must be greater than zero")]
    ZeroAmount,

    /// Streaming rate is zero
    #[error("rate per second must be greater than zero")]
    InvalidRate,

    /// Stream duration is zero
    #[error("stream duration must be greater than zero")]
    InvalidDuration,

    /// Rate × duration is implausibly large relative to the locked amount
    #[error("rate x duration exceeds {ratio}x the stream amount")]
    InvalidParameters { ratio: u32 },

    /// Caller is not permitted to perform this operation
    #[error("caller {caller} is not authorized to {action} stream {id}")]
    UnauthorizedAccess {
        caller: String,
        action: &'static str,
        id: u64,
    },

    /// Stream has been cancelled or completed
    #[error("stream {0} is not active")]
    StreamNotActive(u64),

    /// Pause requested on an already-paused stream
    #[error("stream {0} is already paused")]
    StreamAlreadyPaused(u64),

    /// Resume requested on a stream that is not paused
    #[error("stream {0} is not paused")]
    StreamNotPaused(u64),

    /// Automatic payment requested on a paused stream
    #[error("stream {0} is paused")]
    StreamPaused(u64),

    /// Nothing is currently claimable from the stream
    #[error("no funds available in stream {0}")]
    NoFundsAvailable(u64),

    /// Failed to open or read the input file
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV parsing error
    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    /// Missing input file argument
    #[error("Missing input file argument. Usage: stream-ledger <operations.csv>")]
    MissingArgument,
}
