//! Turns the tabular text of `netstat -antp` into [`ConnectionRecord`]s.
//!
//! The listing starts with a title line and a column header, followed by one
//! whitespace-separated row per socket:
//!
//! ```text
//! Active Internet connections (servers and established)
//! Proto Recv-Q Send-Q Local Address           Foreign Address         State       PID/Program name
//! tcp        0      0 0.0.0.0:22              0.0.0.0:*               LISTEN      812/sshd
//! tcp6       0      0 ::1:631                 :::*                    LISTEN      -
//! ```

pub mod address;

pub use address::parse_address;

use tracing::warn;

use crate::error::{Result, RowError, SnapError};
use crate::model::{ConnectionRecord, OWNER_SENTINEL};

/// Title and column-header lines preceding the rows.
pub const HEADER_LINES: usize = 2;

/// Minimum number of fields a row needs: Proto through State.
const MIN_FIELDS: usize = 6;

/// What to do with a row whose address columns cannot be parsed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AddressPolicy {
    /// Record a diagnostic, skip the row and keep going.
    #[default]
    Report,
    /// Stop the batch with [`SnapError::Address`].
    Abort,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ParseOptions {
    /// The observer runs as root, so a `-` owner means the kernel could not
    /// attribute the socket rather than that it was hidden from us.
    pub privileged_observer: bool,
    pub address_policy: AddressPolicy,
}

/// A row that did not produce a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowDiagnostic {
    /// 1-based line number in the full output, header lines included.
    pub line: usize,
    pub text: String,
    pub error: RowError,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParseReport {
    pub records: Vec<ConnectionRecord>,
    pub diagnostics: Vec<RowDiagnostic>,
}

// ---------------------------------------------------------------------------
// Row parsing
// ---------------------------------------------------------------------------

/// Parse a single body row of the listing.
pub fn parse_row(
    line: &str,
    privileged_observer: bool,
) -> std::result::Result<ConnectionRecord, RowError> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.len() < MIN_FIELDS {
        return Err(RowError::Malformed {
            found: fields.len(),
        });
    }

    let local_address = parse_address(fields[3]).map_err(RowError::LocalAddress)?;
    let foreign_address = parse_address(fields[4]).map_err(RowError::ForeignAddress)?;

    let mut owner_pid = String::new();
    let mut owner_program_name = String::new();
    let mut is_owner_unbound = false;

    if let Some(&owner) = fields.get(6) {
        if owner == OWNER_SENTINEL {
            owner_pid = OWNER_SENTINEL.to_string();
            owner_program_name = OWNER_SENTINEL.to_string();
            is_owner_unbound = privileged_observer;
        } else if let Some((pid, program)) = owner.split_once('/') {
            owner_pid = pid.to_string();
            owner_program_name = program.to_string();
        }
        // Anything else leaves the owner unset.
    }

    Ok(ConnectionRecord {
        protocol: fields[0].to_string(),
        recv_queue: fields[1].to_string(),
        send_queue: fields[2].to_string(),
        local_address,
        foreign_address,
        state: fields[5].to_string(),
        owner_pid,
        owner_program_name,
        is_owner_unbound,
    })
}

// ---------------------------------------------------------------------------
// Streaming parser
// ---------------------------------------------------------------------------

/// Incremental parser fed one line at a time, header lines included.
///
/// Rows only come out of [`StreamParser::finish`]:
///
/// ```compile_fail
/// use tcpsnap::parser::{ParseOptions, StreamParser};
///
/// let parser = StreamParser::new(ParseOptions::default());
/// let _ = parser.records();
/// ```
#[derive(Debug)]
pub struct StreamParser {
    options: ParseOptions,
    lines_seen: usize,
    report: ParseReport,
}

impl StreamParser {
    pub fn new(options: ParseOptions) -> Self {
        Self {
            options,
            lines_seen: 0,
            report: ParseReport::default(),
        }
    }

    /// Feed the next line of output.
    ///
    /// Only fails under [`AddressPolicy::Abort`]; the parser should not be fed
    /// further lines after an error.
    pub fn push_line(&mut self, line: &str) -> Result<()> {
        self.lines_seen += 1;
        if self.lines_seen <= HEADER_LINES {
            return Ok(());
        }

        let line_no = self.lines_seen;
        match parse_row(line, self.options.privileged_observer) {
            Ok(record) => self.report.records.push(record),
            Err(RowError::LocalAddress(source) | RowError::ForeignAddress(source))
                if self.options.address_policy == AddressPolicy::Abort =>
            {
                return Err(SnapError::Address {
                    line: line_no,
                    source,
                });
            }
            Err(error) => {
                warn!(line = line_no, %error, text = line, "skipping connection row");
                self.report.diagnostics.push(RowDiagnostic {
                    line: line_no,
                    text: line.to_string(),
                    error,
                });
            }
        }
        Ok(())
    }

    /// Whether both header lines have been consumed.
    pub fn has_header(&self) -> bool {
        self.lines_seen >= HEADER_LINES
    }

    pub fn finish(self) -> Result<ParseReport> {
        if !self.has_header() {
            return Err(SnapError::EmptyInput);
        }
        Ok(self.report)
    }
}

// ---------------------------------------------------------------------------
// Batch entry points
// ---------------------------------------------------------------------------

/// Parse complete listing output given as individual lines.
pub fn parse_lines<I, S>(lines: I, options: &ParseOptions) -> Result<ParseReport>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut parser = StreamParser::new(*options);
    for line in lines {
        parser.push_line(line.as_ref())?;
    }
    parser.finish()
}

/// Parse complete listing output given as one block of text.
pub fn parse_output(text: &str, options: &ParseOptions) -> Result<ParseReport> {
    parse_lines(text.lines(), options)
}
