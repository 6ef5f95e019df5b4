use std::collections::BTreeSet;
use std::time::Duration;

/// Run parameters for one comparison.
///
/// Start addresses are per-side: the two tools may need different values for
/// the same logical point (different run modes, different reporting
/// offsets), and both are normalized to canonical integers before the loop
/// begins. `reconcile_af` is the explicit, externally supplied set of
/// known-divergent addresses where the candidate's AF is forced to the
/// reference's before comparison; it is empty unless configured.
#[derive(Clone, Debug)]
pub struct HarnessConfig {
    pub candidate_start: u16,
    pub reference_start: u16,
    pub reconcile_af: BTreeSet<u16>,
    pub timeout: Duration,
}

impl HarnessConfig {
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

    /// Both sides aligned at the same address, no reconciliation.
    pub fn at(start: u16) -> Self {
        Self {
            candidate_start: start,
            reference_start: start,
            reconcile_af: BTreeSet::new(),
            timeout: Self::DEFAULT_TIMEOUT,
        }
    }
}
