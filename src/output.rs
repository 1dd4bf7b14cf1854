use std::net::SocketAddr;

use crate::collector::{Interruption, Snapshot, SnapshotStatus};
use crate::model::{ConnectionRecord, Owner};

const ADDR_WIDTH: usize = 23;

/// Column header matching the netstat table.
pub fn format_header() -> String {
    format!(
        "{:<5} {:>6} {:>6} {:<aw$} {:<aw$} {:<11} {}",
        "Proto",
        "Recv-Q",
        "Send-Q",
        "Local Address",
        "Foreign Address",
        "State",
        "PID/Program name",
        aw = ADDR_WIDTH,
    )
}

/// Render one record as a table line.
pub fn format_record(record: &ConnectionRecord) -> String {
    let owner = match record.owner() {
        Owner::Unset => String::new(),
        Owner::Unknown { unbound: false } => "-".to_string(),
        Owner::Unknown { unbound: true } => "- (unbound)".to_string(),
        Owner::Process { pid, program } => format!("{}/{}", pid, program),
    };
    format!(
        "{:<5} {:>6} {:>6} {:<aw$} {:<aw$} {:<11} {}",
        record.protocol,
        record.recv_queue,
        record.send_queue,
        format_endpoint(&record.local_address),
        format_endpoint(&record.foreign_address),
        record.state,
        owner,
        aw = ADDR_WIDTH,
    )
    .trim_end()
    .to_string()
}

/// `ip:port` in netstat notation: unbracketed IPv6 and `*` for port 0.
pub fn format_endpoint(addr: &SocketAddr) -> String {
    if addr.port() == 0 {
        format!("{}:*", addr.ip())
    } else {
        format!("{}:{}", addr.ip(), addr.port())
    }
}

/// Human-readable reason for a partial snapshot.
pub fn describe_interruption(reason: &Interruption) -> String {
    match reason {
        Interruption::TimedOut(limit) => format!("timed out after {:?}", limit),
        Interruption::Cancelled => "cancelled".to_string(),
        Interruption::Exited(status) => format!("listing program failed: {}", status),
        Interruption::WaitFailed(kind) => format!("waiting on listing program failed: {}", kind),
        Interruption::ReadFailed(kind) => format!("reading listing output failed: {}", kind),
        Interruption::StreamHeldOpen => "output stream held open after exit".to_string(),
    }
}

/// Print the parsed table to stdout.
///
/// Skipped rows were already logged by the parser as they streamed in.
pub fn print_snapshot(snapshot: &Snapshot) {
    println!("{}", format_header());
    for record in &snapshot.report.records {
        println!("{}", format_record(record));
    }
    if let SnapshotStatus::Partial(reason) = &snapshot.status {
        eprintln!(
            "partial snapshot ({}), {} rows",
            describe_interruption(reason),
            snapshot.report.records.len()
        );
    }
}
