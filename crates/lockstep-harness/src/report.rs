use std::fmt::Write as _;

use lockstep_protocol::{decode_flags, RegisterState, StepRecord};

/// The first mismatch: both full states, the program counter the run was at,
/// and the recent step history of each side.
///
/// `got` is always the candidate, `expect` the reference. When the PC
/// register itself diverges, `pc` carries the reference side's value; both
/// values still appear in the table.
#[derive(Clone, Debug)]
pub struct Divergence {
    pub pc: u16,
    pub got: RegisterState,
    pub expect: RegisterState,
    pub candidate_history: Vec<StepRecord>,
    pub reference_history: Vec<StepRecord>,
}

impl Divergence {
    /// Render the report. Infallible by construction: string building only,
    /// so reporting a finding can never raise a further error.
    pub fn render(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(&mut out, "divergence at {:#06x}", self.pc);

        for ((name, got), (_, expect)) in self.got.fields().iter().zip(self.expect.fields().iter())
        {
            let marker = if got == expect { "" } else { "   <--" };
            let _ = writeln!(
                &mut out,
                "{name}: Got: {got:#06x}, Expect: {expect:#06x}{marker}"
            );
        }
        let _ = writeln!(
            &mut out,
            "Flags: Got: {}, Expect: {}",
            decode_flags(self.got.af),
            decode_flags(self.expect.af)
        );

        if !self.candidate_history.is_empty() {
            let _ = writeln!(&mut out, "recent steps (candidate):");
            for record in &self.candidate_history {
                let _ = writeln!(&mut out, "  {:#06x}: {}", record.pc, record.instruction);
            }
        }
        if !self.reference_history.is_empty() {
            let _ = writeln!(&mut out, "recent steps (reference):");
            for record in &self.reference_history {
                let _ = writeln!(&mut out, "  {:#06x}: {}", record.pc, record.instruction);
            }
        }

        out
    }
}
