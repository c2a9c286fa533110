//! Report envelopes produced by batch operations.

use serde::{Deserialize, Serialize};

use crate::error::QuarryError;
use crate::fundamentals::Resolution;

/// Outcome for one symbol of a batch request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolOutcome {
    /// Symbol exactly as the caller supplied it.
    pub input: String,
    /// Resolution, or the structural error that aborted it.
    pub result: Result<Resolution, QuarryError>,
}

/// Per-symbol outcomes of a batch resolution, in input order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct BatchReport {
    /// One outcome per requested symbol.
    pub outcomes: Vec<SymbolOutcome>,
}

impl BatchReport {
    /// Outcomes that produced a canonical record.
    pub fn resolved(&self) -> impl Iterator<Item = &SymbolOutcome> {
        self.outcomes
            .iter()
            .filter(|o| matches!(&o.result, Ok(r) if r.is_resolved()))
    }

    /// Outcomes that failed structurally.
    pub fn errors(&self) -> impl Iterator<Item = (&str, &QuarryError)> {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().err().map(|e| (o.input.as_str(), e)))
    }
}
