use std::process::ExitStatus;
use std::time::Duration;

use thiserror::Error;

/// Failure to turn a `HOST:PORT` token into a socket address.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AddressParseError {
    #[error("missing port in address {0:?}")]
    MissingPort(String),
    #[error("{0:?} is not IP:port (invalid IP literal)")]
    InvalidIp(String),
    #[error("invalid port in address {0:?}")]
    InvalidPort(String),
}

impl AddressParseError {
    /// The offending token as it appeared in the listing.
    pub fn token(&self) -> &str {
        match self {
            AddressParseError::MissingPort(t)
            | AddressParseError::InvalidIp(t)
            | AddressParseError::InvalidPort(t) => t,
        }
    }
}

/// Why a single row of the listing could not become a record.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RowError {
    #[error("expected at least 6 fields, found {found}")]
    Malformed { found: usize },
    #[error("bad local address: {0}")]
    LocalAddress(AddressParseError),
    #[error("bad foreign address: {0}")]
    ForeignAddress(AddressParseError),
}

#[derive(Error, Debug)]
pub enum SnapError {
    #[error("connection listing produced no usable output")]
    EmptyInput,
    #[error("line {line}: {source}")]
    Address {
        line: usize,
        #[source]
        source: AddressParseError,
    },
    #[error("failed to start `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("`{program}` exited abnormally: {status}")]
    Subprocess { program: String, status: ExitStatus },
    #[error("timed out after {0:?}")]
    TimedOut(Duration),
    #[error("line reader failed: {0}")]
    Reader(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, SnapError>;
