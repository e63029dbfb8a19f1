//! Trial records — one per shared entangled pair.
//!
//! A trial is self-contained: the two chosen angle indices plus the two
//! measured bits. The generator appends records in round order; everything
//! downstream only reads them, so a seeded run replays bit for bit.

use serde::{Deserialize, Serialize};

/// One measured outcome pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outcome {
    /// Alice's measured bit (0 or 1).
    pub alice: u8,
    /// Bob's measured bit (0 or 1).
    pub bob: u8,
}

impl Outcome {
    /// Build an outcome pair. Inputs are masked to single bits.
    pub fn new(alice: u8, bob: u8) -> Self {
        Self {
            alice: alice & 1,
            bob: bob & 1,
        }
    }

    /// True when both parties measured the same bit.
    pub fn agree(&self) -> bool {
        self.alice == self.bob
    }

    /// Correlation contribution: +1 for agreement, −1 for disagreement.
    pub fn correlation(&self) -> f64 {
        if self.agree() { 1.0 } else { -1.0 }
    }

    /// Raw key-bit mapping: (0,0) → 0, every other outcome → 1.
    ///
    /// This reproduces the unfiltered extraction rule of the reference
    /// pipeline; see [`crate::metrics::final_key`] for the caveat.
    pub fn key_bit(&self) -> u8 {
        if self.alice == 0 && self.bob == 0 { 0 } else { 1 }
    }
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", self.alice, self.bob)
    }
}

/// One protocol round: which bases were chosen, what was measured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrialRecord {
    /// Index into Alice's angle set.
    pub alice_angle_idx: usize,
    /// Index into Bob's angle set.
    pub bob_angle_idx: usize,
    /// The measured bit pair.
    pub outcome: Outcome,
}

/// Ordered, append-only sequence of trials.
///
/// Built once by the generator; consumers only read. Length is fixed at
/// generation time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrialSequence {
    trials: Vec<TrialRecord>,
}

impl TrialSequence {
    /// Empty sequence with room for `rounds` trials.
    pub fn with_capacity(rounds: usize) -> Self {
        Self {
            trials: Vec::with_capacity(rounds),
        }
    }

    /// Append a whole generated chunk, preserving its order.
    pub(crate) fn extend(&mut self, records: Vec<TrialRecord>) {
        self.trials.extend(records);
    }

    /// Number of recorded trials.
    pub fn len(&self) -> usize {
        self.trials.len()
    }

    /// True when no trials were recorded.
    pub fn is_empty(&self) -> bool {
        self.trials.is_empty()
    }

    /// Read-only view of the trials in round order.
    pub fn as_slice(&self) -> &[TrialRecord] {
        &self.trials
    }

    /// Iterate trials in round order.
    pub fn iter(&self) -> std::slice::Iter<'_, TrialRecord> {
        self.trials.iter()
    }
}

impl<'a> IntoIterator for &'a TrialSequence {
    type Item = &'a TrialRecord;
    type IntoIter = std::slice::Iter<'a, TrialRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.trials.iter()
    }
}

impl FromIterator<TrialRecord> for TrialSequence {
    fn from_iter<I: IntoIterator<Item = TrialRecord>>(iter: I) -> Self {
        Self {
            trials: iter.into_iter().collect(),
        }
    }
}
