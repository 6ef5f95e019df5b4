use std::time::Duration;

use regex::Regex;

use lockstep_session::{Result, Session};

/// The capability set the comparator needs from a debugger connection.
///
/// Production ports are [`Session`]s over real child processes; tests use
/// scripted in-memory ports. Keeping the loop generic here is what lets a
/// new tool family plug in as dialect configuration alone.
pub trait DebugPort {
    fn send_line(&mut self, line: &str) -> Result<()>;
    fn await_pattern(&mut self, pattern: &Regex, timeout: Duration) -> Result<String>;
    /// Everything the connection has produced so far, for abort diagnostics.
    fn buffer_snapshot(&self) -> String;
}

impl DebugPort for Session {
    fn send_line(&mut self, line: &str) -> Result<()> {
        Session::send_line(self, line)
    }

    fn await_pattern(&mut self, pattern: &Regex, timeout: Duration) -> Result<String> {
        Session::await_pattern(self, pattern, timeout)
    }

    fn buffer_snapshot(&self) -> String {
        Session::buffer_snapshot(self)
    }
}
