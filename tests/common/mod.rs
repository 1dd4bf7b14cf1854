#![allow(dead_code)]

use std::fs;
use std::path::PathBuf;

use tempfile::TempDir;

/// Output of `netstat -antp` as an unprivileged user on a small host.
pub const NETSTAT_OUTPUT: &str = "\
Active Internet connections (servers and established)
Proto Recv-Q Send-Q Local Address           Foreign Address         State       PID/Program name
tcp        0      0 127.0.0.53:53           0.0.0.0:*               LISTEN      -
tcp        0      0 0.0.0.0:22              0.0.0.0:*               LISTEN      812/sshd
tcp        0     36 10.0.0.5:22             10.0.0.9:51514          ESTABLISHED 1234/sshd
tcp        0      0 10.0.0.5:43210          93.184.216.34:443       TIME_WAIT   -
tcp6       0      0 :::80                   :::*                    LISTEN      900/nginx
tcp6       0      0 ::1:631                 :::*                    LISTEN      -
";

/// A shell script standing in for the listing program.
///
/// It is run through `sh` rather than executed directly so freshly written
/// scripts never hit ETXTBSY under parallel tests.
pub struct FakeListing {
    _dir: TempDir,
    pub script: PathBuf,
}

impl FakeListing {
    pub fn new(body: &str) -> Self {
        let dir = tempfile::tempdir().expect("create temp dir");
        let script = dir.path().join("netstat.sh");
        fs::write(&script, body).expect("write fake listing script");
        FakeListing { _dir: dir, script }
    }

    /// Script that prints `text` verbatim, then runs `tail` (e.g. `exit 3`).
    pub fn printing(text: &str, tail: &str) -> Self {
        Self::new(&format!("cat <<'EOF'\n{}EOF\n{}\n", text, tail))
    }

    pub fn script_arg(&self) -> String {
        self.script.to_string_lossy().to_string()
    }
}
