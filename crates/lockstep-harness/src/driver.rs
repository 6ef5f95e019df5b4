use std::collections::VecDeque;
use std::time::Duration;

use lockstep_protocol::{parse_echo, parse_registers, Origin, RegisterState, StepRecord, ToolDialect};

use crate::error::{HarnessError, Result};
use crate::port::DebugPort;

/// Recent steps kept per side for the divergence report.
const HISTORY_LEN: usize = 16;

/// One side of the comparison: a debugger connection plus the dialect that
/// shapes its commands and parses its output.
///
/// Every exchange here is fully resolved (send, then await) before the
/// caller issues anything else; the protocol never has two outstanding
/// requests, on this session or across sessions.
pub struct ReplDriver<P> {
    port: P,
    dialect: ToolDialect,
    origin: Origin,
    timeout: Duration,
    history: VecDeque<StepRecord>,
}

impl<P: DebugPort> ReplDriver<P> {
    pub fn new(port: P, dialect: ToolDialect, origin: Origin, timeout: Duration) -> Self {
        Self {
            port,
            dialect,
            origin,
            timeout,
            history: VecDeque::with_capacity(HISTORY_LEN),
        }
    }

    pub fn origin(&self) -> Origin {
        self.origin
    }

    pub fn history(&self) -> impl Iterator<Item = &StepRecord> {
        self.history.iter()
    }

    /// Raw connection output so far, surfaced on aborts.
    pub fn buffer_snapshot(&self) -> String {
        self.port.buffer_snapshot()
    }

    /// Bring this session to `start_addr`: set a breakpoint, run, and wait
    /// for the stop. Returns the first [`StepRecord`], the instruction the
    /// session is paused at.
    pub fn align(&mut self, start_addr: u16) -> Result<StepRecord> {
        tracing::debug!(origin = %self.origin, "aligning at {start_addr:#06x}");

        // Consume the startup banner and first idle prompt so every later
        // exchange captures exactly one response.
        self.await_prompt()?;

        let breakpoint = self.dialect.break_command(start_addr);
        self.send(&breakpoint)?;
        self.await_prompt()?;

        self.send(self.dialect.continue_command())?;
        let (pc, instruction) = self.await_echo(true)?;

        if pc != start_addr {
            return Err(HarnessError::Alignment {
                origin: self.origin,
                reported: pc,
                requested: start_addr,
            });
        }

        Ok(self.record(pc, instruction))
    }

    /// Dump and parse the full register state.
    pub fn registers(&mut self) -> Result<RegisterState> {
        self.send(self.dialect.dump_command())?;
        let dump = self.await_prompt()?;
        parse_registers(&dump, &self.dialect.grammar).map_err(|source| HarnessError::Parse {
            origin: self.origin,
            source,
        })
    }

    /// Execute one instruction; returns where the session stopped.
    pub fn step(&mut self) -> Result<StepRecord> {
        self.send(self.dialect.step_command())?;
        let (pc, instruction) = self.await_echo(false)?;
        Ok(self.record(pc, instruction))
    }

    /// Overwrite the session's AF register (the reconciliation mutation).
    pub fn write_af(&mut self, af: u16) -> Result<()> {
        let command = self.dialect.write_af_command(af);
        self.send(&command)?;
        self.await_prompt()?;
        Ok(())
    }

    fn send(&mut self, line: &str) -> Result<()> {
        self.port
            .send_line(line)
            .map_err(|source| HarnessError::Session {
                origin: self.origin,
                source,
            })
    }

    fn await_prompt(&mut self) -> Result<String> {
        let pattern = &self.dialect.grammar.prompt;
        self.port
            .await_pattern(pattern, self.timeout)
            .map_err(|source| HarnessError::Session {
                origin: self.origin,
                source,
            })
    }

    /// Wait for the echo pattern, then the idle prompt, and parse the stop
    /// record from the combined capture.
    ///
    /// A continue can scroll any number of echo-shaped lines before the
    /// actual stop (gddb's bulk step does), so the record is taken from the
    /// last match across everything captured up to the prompt, not from the
    /// first line that happened to satisfy the pattern.
    fn await_echo(&mut self, breakpoint: bool) -> Result<(u16, String)> {
        // Cheap clone (the compiled program is shared) so the borrow does
        // not pin `self` across the prompt await below.
        let pattern = if breakpoint {
            self.dialect.grammar.breakpoint_hit.clone()
        } else {
            self.dialect.grammar.step_echo.clone()
        };
        let hit = self
            .port
            .await_pattern(&pattern, self.timeout)
            .map_err(|source| HarnessError::Session {
                origin: self.origin,
                source,
            })?;
        let rest = self.await_prompt()?;

        let combined = format!("{hit}{rest}");
        parse_echo(&combined, &pattern).map_err(|source| HarnessError::Parse {
            origin: self.origin,
            source,
        })
    }

    #[cfg(test)]
    pub(crate) fn port_for_test(&self) -> &P {
        &self.port
    }

    fn record(&mut self, pc: u16, instruction: String) -> StepRecord {
        let record = StepRecord {
            pc,
            instruction,
            origin: self.origin,
        };
        if self.history.len() == HISTORY_LEN {
            self.history.pop_front();
        }
        self.history.push_back(record.clone());
        record
    }
}
