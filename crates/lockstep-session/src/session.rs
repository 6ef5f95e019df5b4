use std::io::Write;
use std::process::{Child, ChildStdin, Command, Stdio};
use std::time::{Duration, Instant};

use regex::Regex;

use crate::capture::{OutputCapture, WaitOutcome};
use crate::error::{Result, SessionError};

/// One interactively-debuggable child process and its line protocol.
///
/// The session owns the child exclusively: commands go in through
/// [`Session::send_line`], responses come back through
/// [`Session::await_pattern`], and the child is killed and reaped on drop so
/// teardown happens on every exit path. On unix the child additionally
/// carries a parent-death signal, so it cannot outlive a harness that dies
/// without unwinding.
pub struct Session {
    name: String,
    child: Child,
    stdin: ChildStdin,
    capture: OutputCapture,
    /// Byte offset of the first output not yet consumed by an await.
    cursor: usize,
}

impl Session {
    /// Spawn `command` with piped stdin/stdout. The child's stderr stays
    /// attached to the harness's stderr so its own diagnostics remain
    /// visible alongside ours.
    pub fn spawn(mut command: Command, name: impl Into<String>) -> Result<Session> {
        let name = name.into();
        command
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit());

        #[cfg(target_os = "linux")]
        {
            use std::os::unix::process::CommandExt;
            // Kill the child if the harness dies without running Drop.
            unsafe {
                command.pre_exec(|| {
                    libc::prctl(libc::PR_SET_PDEATHSIG, libc::SIGKILL);
                    Ok(())
                });
            }
        }

        let mut child = command.spawn().map_err(|source| SessionError::Spawn {
            name: name.clone(),
            source,
        })?;
        tracing::debug!(session = %name, pid = child.id(), "spawned");

        let stdin = child
            .stdin
            .take()
            .expect("stdin was configured as piped above");
        let stdout = child
            .stdout
            .take()
            .expect("stdout was configured as piped above");

        Ok(Session {
            name,
            child,
            stdin,
            capture: OutputCapture::start(stdout),
            cursor: 0,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn id(&self) -> u32 {
        self.child.id()
    }

    /// Write one command line to the child and flush it.
    pub fn send_line(&mut self, line: &str) -> Result<()> {
        tracing::trace!(session = %self.name, line, "send");
        self.stdin
            .write_all(line.as_bytes())
            .and_then(|()| self.stdin.write_all(b"\n"))
            .and_then(|()| self.stdin.flush())
            .map_err(|source| SessionError::Io {
                name: self.name.clone(),
                source,
            })
    }

    /// Block until `pattern` matches output produced since the previous
    /// await consumed its match, or `timeout` elapses.
    ///
    /// Returns everything captured from the previous consume point through
    /// the end of the match. A timeout or an already-exited child is a
    /// fatal protocol failure carrying the partial capture.
    pub fn await_pattern(&mut self, pattern: &Regex, timeout: Duration) -> Result<String> {
        let deadline = Instant::now() + timeout;
        match self.capture.wait_for_match(pattern, self.cursor, deadline) {
            WaitOutcome::Matched { end, captured } => {
                self.cursor = end;
                Ok(captured)
            }
            WaitOutcome::Eof { partial } => Err(SessionError::ProcessExit {
                name: self.name.clone(),
                status: self.exit_status_label(),
                partial,
            }),
            WaitOutcome::TimedOut { partial } => Err(SessionError::ProtocolTimeout {
                name: self.name.clone(),
                pattern: pattern.as_str().to_string(),
                timeout,
                partial,
            }),
        }
    }

    /// Everything this child has written so far, for abort diagnostics.
    pub fn buffer_snapshot(&self) -> String {
        self.capture.snapshot()
    }

    fn exit_status_label(&mut self) -> String {
        match self.child.try_wait() {
            Ok(Some(status)) => status.to_string(),
            // Stream closed but the process is still up (or unreachable);
            // either way the protocol is dead.
            Ok(None) => "stdout closed".to_string(),
            Err(err) => format!("unknown: {err}"),
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        // Best-effort kill + reap on every exit path (normal divergence,
        // abort, panic). Errors mean the child is already gone.
        let _ = self.child.kill();
        let _ = self.child.wait();
        tracing::debug!(session = %self.name, "terminated");
    }
}
