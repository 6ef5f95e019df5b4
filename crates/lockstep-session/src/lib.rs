//! Interactive child-process sessions for the lockstep trace verifier.
//!
//! A [`Session`] owns one debugger child process and its line-oriented
//! protocol: send a command, then block until a grammar pattern appears in
//! the output or a timeout expires. Output is drained continuously by a
//! background reader thread into a shared buffer; the protocol itself stays
//! strictly synchronous, one outstanding exchange at a time.
//!
//! The session guarantees child teardown on every exit path: `Drop` kills
//! and reaps the process, and on unix a parent-death signal covers the case
//! where the harness is torn down without unwinding.

mod capture;
mod error;
mod session;

pub use error::{Result, SessionError};
pub use session::Session;
