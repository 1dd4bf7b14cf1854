//! Runs the connection-listing utility and parses its output as it streams.
//!
//! The rows are parsed on a reader task while the caller waits for the child
//! process. The report is handed over through a one-shot channel that fires
//! only once the reader has stopped consuming the stream, so a [`Snapshot`]
//! is never built from a collection that is still being written.

use std::future::Future;
use std::io;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

use crate::error::{Result, SnapError};
use crate::parser::{AddressPolicy, ParseOptions, ParseReport, StreamParser};
use crate::privilege;

pub const DEFAULT_PROGRAM: &str = "netstat";
/// Numeric, all sockets, TCP only, with PID/Program name.
pub const DEFAULT_ARGS: &[&str] = &["-antp"];
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// How long the reader may keep draining stdout once the child is gone.
const STREAM_GRACE: Duration = Duration::from_millis(250);

#[derive(Debug, Clone)]
pub struct CollectorConfig {
    pub program: String,
    pub args: Vec<String>,
    /// Deadline for the child process. `None` waits forever.
    pub timeout: Option<Duration>,
    /// Overrides the effective-uid check when set.
    pub privileged_observer: Option<bool>,
    pub address_policy: AddressPolicy,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            program: DEFAULT_PROGRAM.to_string(),
            args: DEFAULT_ARGS.iter().map(|a| a.to_string()).collect(),
            timeout: Some(DEFAULT_TIMEOUT),
            privileged_observer: None,
            address_policy: AddressPolicy::default(),
        }
    }
}

/// Why a snapshot holds fewer rows than the utility would have printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interruption {
    TimedOut(Duration),
    Cancelled,
    /// The child exited with a failure status.
    Exited(ExitStatus),
    /// Waiting on the child failed; it was killed.
    WaitFailed(io::ErrorKind),
    /// Reading stdout failed part way through.
    ReadFailed(io::ErrorKind),
    /// The child finished but something else kept its stdout open.
    StreamHeldOpen,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotStatus {
    Complete,
    Partial(Interruption),
}

#[derive(Debug, Clone)]
pub struct Snapshot {
    pub report: ParseReport,
    pub status: SnapshotStatus,
}

impl Snapshot {
    pub fn is_complete(&self) -> bool {
        self.status == SnapshotStatus::Complete
    }
}

enum Stop {
    Exited(io::Result<ExitStatus>),
    Deadline(Duration),
    Cancelled,
}

impl Stop {
    /// `None` only for a successful exit; every other stop leaves the rows
    /// read so far as a partial snapshot.
    fn interruption(self) -> Option<Interruption> {
        match self {
            Stop::Exited(Ok(status)) if status.success() => None,
            Stop::Exited(Ok(status)) => Some(Interruption::Exited(status)),
            Stop::Exited(Err(e)) => {
                warn!(error = %e, "waiting on listing utility failed");
                Some(Interruption::WaitFailed(e.kind()))
            }
            Stop::Deadline(limit) => Some(Interruption::TimedOut(limit)),
            Stop::Cancelled => Some(Interruption::Cancelled),
        }
    }

    fn needs_kill(&self) -> bool {
        !matches!(self, Stop::Exited(Ok(_)))
    }
}

pub struct Collector {
    config: CollectorConfig,
}

impl Collector {
    pub fn new(config: CollectorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CollectorConfig {
        &self.config
    }

    /// Take a snapshot, waiting for the utility to finish or the deadline.
    pub async fn snapshot(&self) -> Result<Snapshot> {
        self.snapshot_until(std::future::pending()).await
    }

    /// Take a snapshot that stops early when `cancel` resolves.
    ///
    /// On cancellation or deadline the child is killed and the rows parsed up
    /// to that point are returned as a partial snapshot.
    pub async fn snapshot_until<F>(&self, cancel: F) -> Result<Snapshot>
    where
        F: Future<Output = ()>,
    {
        let options = ParseOptions {
            privileged_observer: self
                .config
                .privileged_observer
                .unwrap_or_else(privilege::is_privileged_observer),
            address_policy: self.config.address_policy,
        };

        let mut child = self.spawn()?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| SnapError::Io(io::Error::other("child stdout was not captured")))?;
        let reader = spawn_reader(stdout, options);

        let interruption = self.wait_child(&mut child, cancel).await;
        let outcome = reader.finish(STREAM_GRACE).await?;
        let interruption = interruption.or(match outcome.end {
            StreamEnd::Eof => None,
            StreamEnd::Stopped => Some(Interruption::StreamHeldOpen),
            StreamEnd::Failed(kind) => Some(Interruption::ReadFailed(kind)),
        });

        self.settle(outcome.parsed, interruption)
    }

    /// Combine the parse result with whatever cut the run short.
    fn settle(
        &self,
        parsed: Result<ParseReport>,
        interruption: Option<Interruption>,
    ) -> Result<Snapshot> {
        let report = match (parsed, interruption) {
            (Ok(report), _) => report,
            (Err(SnapError::EmptyInput), Some(Interruption::Exited(status))) => {
                return Err(SnapError::Subprocess {
                    program: self.config.program.clone(),
                    status,
                });
            }
            (Err(SnapError::EmptyInput), Some(_)) => ParseReport::default(),
            (Err(e), _) => return Err(e),
        };

        let status = match interruption {
            None => SnapshotStatus::Complete,
            Some(reason) => {
                warn!(
                    program = %self.config.program,
                    rows = report.records.len(),
                    ?reason,
                    "connection snapshot is partial"
                );
                SnapshotStatus::Partial(reason)
            }
        };
        info!(
            rows = report.records.len(),
            skipped = report.diagnostics.len(),
            "connection snapshot collected"
        );

        Ok(Snapshot { report, status })
    }

    /// Run the utility to completion and return its stdout lines joined by `\n`.
    pub async fn capture_text(&self) -> Result<String> {
        let mut command = self.command();
        command.stdout(Stdio::piped()).stderr(Stdio::null());

        let output = match self.config.timeout {
            Some(limit) => tokio::time::timeout(limit, command.output())
                .await
                .map_err(|_| SnapError::TimedOut(limit))?,
            None => command.output().await,
        }
        .map_err(|source| self.spawn_error(source))?;

        if !output.status.success() {
            return Err(SnapError::Subprocess {
                program: self.config.program.clone(),
                status: output.status,
            });
        }

        let text = String::from_utf8_lossy(&output.stdout);
        Ok(text.lines().collect::<Vec<_>>().join("\n"))
    }

    // -- private helpers --

    fn command(&self) -> Command {
        let mut command = Command::new(&self.config.program);
        command
            .args(&self.config.args)
            .stdin(Stdio::null())
            .kill_on_drop(true);
        command
    }

    fn spawn(&self) -> Result<Child> {
        debug!(program = %self.config.program, args = ?self.config.args, "spawning listing utility");
        self.command()
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|source| self.spawn_error(source))
    }

    fn spawn_error(&self, source: io::Error) -> SnapError {
        SnapError::Spawn {
            program: self.config.program.clone(),
            source,
        }
    }

    /// Wait for the child, the deadline or cancellation, whichever comes first.
    ///
    /// Anything but a successful exit leaves the child killed and reaped.
    async fn wait_child<F>(&self, child: &mut Child, cancel: F) -> Option<Interruption>
    where
        F: Future<Output = ()>,
    {
        let timeout = self.config.timeout;
        let deadline = async move {
            match timeout {
                Some(limit) => {
                    tokio::time::sleep(limit).await;
                    limit
                }
                None => std::future::pending().await,
            }
        };

        let stop = tokio::select! {
            status = child.wait() => Stop::Exited(status),
            limit = deadline => Stop::Deadline(limit),
            () = cancel => Stop::Cancelled,
        };

        if stop.needs_kill() {
            if let Err(e) = child.start_kill() {
                debug!(error = %e, "listing utility already gone");
            }
            if let Err(e) = child.wait().await {
                debug!(error = %e, "could not reap listing utility");
            }
        }
        stop.interruption()
    }
}

// ---------------------------------------------------------------------------
// Reader task
// ---------------------------------------------------------------------------

/// How the reader task stopped consuming stdout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StreamEnd {
    Eof,
    /// Asked to stop while the stream was still open.
    Stopped,
    Failed(io::ErrorKind),
}

struct ReaderOutcome {
    parsed: Result<ParseReport>,
    end: StreamEnd,
}

/// Handle on a running reader task.
struct Reader {
    gate: oneshot::Receiver<ReaderOutcome>,
    stop: Option<oneshot::Sender<()>>,
}

impl Reader {
    /// Wait for the report, stopping the reader if the stream is still open
    /// after `grace`.
    async fn finish(mut self, grace: Duration) -> Result<ReaderOutcome> {
        let outcome = match tokio::time::timeout(grace, &mut self.gate).await {
            Ok(outcome) => outcome,
            Err(_) => {
                debug!("stdout still open after the child finished, stopping reader");
                if let Some(stop) = self.stop.take() {
                    let _ = stop.send(());
                }
                self.gate.await
            }
        };
        outcome.map_err(|_| SnapError::Reader("reader task ended before completion".to_string()))
    }
}

/// Parse lines from `reader` on a separate task.
///
/// The gate resolves once the stream has ended, reading failed, parsing hit a
/// fatal error, or the reader was told to stop. It is the only way to reach
/// the report. Lines are decoded lossily: a program name that is not UTF-8
/// must not cost the rest of the listing.
fn spawn_reader<R>(reader: R, options: ParseOptions) -> Reader
where
    R: AsyncRead + Unpin + Send + 'static,
{
    let (done, gate) = oneshot::channel();
    let (stop, mut stopped) = oneshot::channel::<()>();
    tokio::spawn(async move {
        let mut reader = BufReader::new(reader);
        let mut parser = StreamParser::new(options);
        let mut buf = Vec::new();
        let mut fatal = None;

        let end = loop {
            // A dropped sender counts as a stop request too.
            let read = tokio::select! {
                biased;
                _ = &mut stopped => None,
                read = reader.read_until(b'\n', &mut buf) => Some(read),
            };
            let Some(read) = read else {
                break StreamEnd::Stopped;
            };
            match read {
                Ok(0) => break StreamEnd::Eof,
                Ok(_) => {
                    let line = String::from_utf8_lossy(trim_line_ending(&buf));
                    if let Err(e) = parser.push_line(&line) {
                        fatal = Some(e);
                        break StreamEnd::Stopped;
                    }
                    buf.clear();
                }
                Err(e) => {
                    warn!(error = %e, "reading listing output failed");
                    break StreamEnd::Failed(e.kind());
                }
            }
        };
        // Dropping the read half here makes a still-running child fail its
        // next write instead of blocking on a full pipe.
        drop(reader);

        let parsed = match fatal {
            Some(e) => Err(e),
            None => parser.finish(),
        };
        if done.send(ReaderOutcome { parsed, end }).is_err() {
            debug!("snapshot caller went away before the report was ready");
        }
    });
    Reader {
        gate,
        stop: Some(stop),
    }
}

fn trim_line_ending(line: &[u8]) -> &[u8] {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    line.strip_suffix(b"\r").unwrap_or(line)
}
