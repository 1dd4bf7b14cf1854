use std::time::Duration;

use clap::Parser;

use crate::collector::{CollectorConfig, DEFAULT_ARGS, DEFAULT_PROGRAM};
use crate::parser::AddressPolicy;

#[derive(Parser, Debug)]
#[command(
    name = "tcpsnap",
    version,
    about = "Snapshot active TCP connections from netstat output"
)]
pub struct CliArgs {
    /// Connection-listing program to run
    #[arg(long, value_name = "PATH", default_value = DEFAULT_PROGRAM)]
    pub program: String,

    /// Argument passed to the program (repeatable, default -antp)
    #[arg(long = "program-arg", value_name = "ARG", allow_hyphen_values = true)]
    pub program_args: Vec<String>,

    /// Give up on the program after this many seconds (0 waits forever)
    #[arg(long, value_name = "SECONDS", default_value_t = 10)]
    pub timeout: u64,

    /// Fail the whole snapshot on the first unparsable address
    #[arg(long)]
    pub abort_on_bad_address: bool,

    /// Treat the observer as root regardless of the effective uid
    #[arg(long, conflicts_with = "unprivileged")]
    pub privileged: bool,

    /// Treat the observer as unprivileged regardless of the effective uid
    #[arg(long)]
    pub unprivileged: bool,

    /// Keep raw lines containing this text (repeatable, all must match)
    #[arg(long, value_name = "TEXT")]
    pub contain: Vec<String>,

    /// Drop raw lines containing this text (repeatable)
    #[arg(long, value_name = "TEXT")]
    pub exclude: Vec<String>,

    /// Print the number of raw lines instead of the lines
    #[arg(long)]
    pub count: bool,

    /// Print raw program output instead of the parsed table
    #[arg(long)]
    pub raw: bool,
}

impl CliArgs {
    /// Whether the raw-text path (filters, count, raw) was requested.
    pub fn wants_raw_text(&self) -> bool {
        self.raw || self.count || !self.contain.is_empty() || !self.exclude.is_empty()
    }

    pub fn collector_config(&self) -> CollectorConfig {
        let args = if self.program_args.is_empty() {
            DEFAULT_ARGS.iter().map(|a| a.to_string()).collect()
        } else {
            self.program_args.clone()
        };
        let privileged_observer = if self.privileged {
            Some(true)
        } else if self.unprivileged {
            Some(false)
        } else {
            None
        };
        let address_policy = if self.abort_on_bad_address {
            AddressPolicy::Abort
        } else {
            AddressPolicy::Report
        };

        CollectorConfig {
            program: self.program.clone(),
            args,
            timeout: (self.timeout > 0).then(|| Duration::from_secs(self.timeout)),
            privileged_observer,
            address_policy,
        }
    }
}
