//! Textual debugger protocols for the lockstep trace verifier.
//!
//! Each emulator under comparison exposes a line-oriented debugger REPL with
//! its own command syntax and output formats. This crate models one tool
//! family as a [`ToolDialect`]: the commands the harness sends plus a
//! [`DumpGrammar`] describing the patterns its output is parsed with. The
//! parsers here are pure text-to-value functions; process I/O lives in
//! `lockstep-session` and the compare loop in `lockstep-harness`.
//!
//! Two dialects are built in:
//! - [`ToolDialect::gameboy_emu`]: the candidate emulator's `(gameboy) ` REPL
//! - [`ToolDialect::gddb`]: the reference emulator's `gddb> ` REPL
//!
//! Grammars are plain configuration; a new tool family needs only a new
//! dialect value, never a change to the comparator.

mod dialect;
mod error;
mod parse;
mod state;

pub use dialect::{DumpGrammar, RunMode, ToolDialect};
pub use error::{ParseError, Result};
pub use parse::{parse_echo, parse_hex16, parse_registers};
pub use state::{decode_flags, Origin, RegisterState, StepRecord, REGISTER_NAMES};
