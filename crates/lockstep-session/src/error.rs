use std::io;
use std::time::Duration;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, SessionError>;

/// Failures on one session's interactive protocol.
///
/// Every variant is fatal to the run: the exchanges are deterministic given
/// a correct grammar and a live process, so nothing here is retried. Timeout
/// and exit variants carry the partial captured output so protocol drift can
/// be diagnosed without rerunning.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("failed to spawn {name}: {source}")]
    Spawn {
        name: String,
        #[source]
        source: io::Error,
    },

    #[error("i/o error talking to {name}: {source}")]
    Io {
        name: String,
        #[source]
        source: io::Error,
    },

    #[error(
        "timed out after {timeout:?} waiting for {pattern:?} from {name}\n\
         partial output since last exchange:\n{partial}"
    )]
    ProtocolTimeout {
        name: String,
        pattern: String,
        timeout: Duration,
        partial: String,
    },

    #[error(
        "{name} exited unexpectedly ({status})\n\
         partial output since last exchange:\n{partial}"
    )]
    ProcessExit {
        name: String,
        status: String,
        partial: String,
    },
}
