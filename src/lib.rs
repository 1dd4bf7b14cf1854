//! Structured snapshots of the host's TCP connections, parsed from the
//! output of `netstat -antp`.

pub mod cli;
pub mod collector;
pub mod error;
pub mod filter;
pub mod model;
pub mod output;
pub mod parser;
pub mod privilege;

pub use collector::{Collector, CollectorConfig, Interruption, Snapshot, SnapshotStatus};
pub use error::{AddressParseError, Result, RowError, SnapError};
pub use model::{ConnectionRecord, ConnectionState, Owner};
pub use parser::{parse_address, parse_lines, parse_output, ParseOptions, ParseReport};
