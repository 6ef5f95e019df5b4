//! Differential execution-trace verification.
//!
//! The harness brings a candidate emulator and a trusted reference emulator
//! to a common execution point through their debugger REPLs, then steps both
//! one instruction at a time, comparing full register state after every
//! step. The first mismatch is the tool's finding; there is no other
//! successful terminus, so a run ends in exactly one of:
//!
//! - a reported [`Divergence`] (exit nonzero, the point of the exercise),
//! - a clean external interruption (the only exit-zero path), or
//! - a fatal protocol abort (timeout, parse drift, child exit).
//!
//! The compare loop is polymorphic over [`DebugPort`], the capability set
//! {send, await} it needs from a connection, so tests drive it with
//! scripted in-memory ports while production uses `lockstep_session`.

mod compare;
mod config;
mod driver;
mod error;
pub mod interrupt;
mod port;
mod report;

pub use compare::{run, Outcome};
pub use config::HarnessConfig;
pub use driver::ReplDriver;
pub use error::{HarnessError, Result};
pub use port::DebugPort;
pub use report::Divergence;
