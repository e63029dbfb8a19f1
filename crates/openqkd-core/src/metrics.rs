//! Protocol statistics over a completed trial sequence.
//!
//! Every function here is a pure, stateless pass over the trials: call it
//! twice, get the same answer twice. Aggregation cells with no matching
//! trials are defined as 0 — an empty cell is an expected edge case of a
//! short run, never an error.
//!
//! Two key-extraction functions exist on purpose. [`final_key`] maps every
//! trial to a bit, whether or not the bases matched; [`sifted_key`] is the
//! basis-filtered variant under the same outcome mapping. E91 proper keys
//! only from basis-matching trials, so the unfiltered bits leak
//! uncorrelated material into the key. Both are kept, distinctly named and
//! tested, and [`MetricsResult`] carries both.
//!
//! TODO: settle whether unfiltered extraction should survive at all, or
//! whether `final_key` collapses into `sifted_key`.

use serde::{Deserialize, Serialize};

use crate::angles::AngleSet;
use crate::trial::{TrialRecord, TrialSequence};

/// Angle-index-pair cells the CHSH estimator reads.
const CHSH_CELLS: [(usize, usize); 4] = [(0, 0), (0, 1), (1, 0), (1, 1)];

/// Tolerance for the perfect-correlation sifting rule.
const CORRELATION_ATOL: f64 = 1e-8;

/// How a trial qualifies as basis-matching for sifting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SiftingRule {
    /// Same angle index on both sides, the conventional basis-comparison
    /// announcement. Counts a cell as matching even where the indexed angles
    /// differ.
    #[default]
    IndexMatch,
    /// The chosen angles are perfectly (anti)correlated: |cos(θa − θb)| ≈ 1.
    /// This is the rule the walkthrough (`openqkd demo`) uses.
    PerfectCorrelation,
}

impl std::fmt::Display for SiftingRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::IndexMatch => write!(f, "index"),
            Self::PerfectCorrelation => write!(f, "correlation"),
        }
    }
}

impl SiftingRule {
    /// Whether `record` counts as basis-matching under this rule.
    pub fn sifts(&self, record: &TrialRecord, alice: &AngleSet, bob: &AngleSet) -> bool {
        match self {
            Self::IndexMatch => record.alice_angle_idx == record.bob_angle_idx,
            Self::PerfectCorrelation => {
                let delta = alice.get(record.alice_angle_idx) - bob.get(record.bob_angle_idx);
                (delta.cos().abs() - 1.0).abs() <= CORRELATION_ATOL
            }
        }
    }
}

/// CHSH S-value over the four canonical angle-index cells.
///
/// E(cell) is the mean ±1 agreement contribution of the cell's trials (0 for
/// an empty cell); `S = |E00 − E01 + E10 + E11|`. Classical models are
/// bounded at 2, quantum correlations reach 2√2 ≈ 2.828. No bound is
/// enforced here; judging S belongs to the report layer.
pub fn chsh(seq: &TrialSequence) -> f64 {
    let mut sums = [0.0f64; 4];
    let mut counts = [0usize; 4];

    for trial in seq {
        let cell = (trial.alice_angle_idx, trial.bob_angle_idx);
        if let Some(slot) = CHSH_CELLS.iter().position(|c| *c == cell) {
            sums[slot] += trial.outcome.correlation();
            counts[slot] += 1;
        }
    }

    let e = |slot: usize| {
        if counts[slot] == 0 {
            0.0
        } else {
            sums[slot] / counts[slot] as f64
        }
    };
    (e(0) - e(1) + e(2) + e(3)).abs()
}

/// Quantum bit error rate over basis-matching trials.
///
/// `mismatch / total` over the trials the sifting rule keeps; defined as 0
/// when nothing sifts.
pub fn qber(seq: &TrialSequence, alice: &AngleSet, bob: &AngleSet, rule: SiftingRule) -> f64 {
    let mut mismatch = 0usize;
    let mut total = 0usize;
    for trial in seq {
        if rule.sifts(trial, alice, bob) {
            total += 1;
            if !trial.outcome.agree() {
                mismatch += 1;
            }
        }
    }
    if total == 0 {
        0.0
    } else {
        mismatch as f64 / total as f64
    }
}

/// Number of trials the sifting rule keeps.
pub fn matched_count(
    seq: &TrialSequence,
    alice: &AngleSet,
    bob: &AngleSet,
    rule: SiftingRule,
) -> usize {
    seq.iter().filter(|t| rule.sifts(t, alice, bob)).count()
}

/// Usable secret-key rate estimate.
///
/// `R0 = matched / rounds` is the sifting efficiency; the linear
/// `(1 − 2·qber)` penalty models information leaked in proportion to the
/// observed error rate. A standard QKD estimate, not a security bound; goes
/// negative past qber = 0.5, signaling a compromised channel.
pub fn key_rate(matched: usize, rounds: usize, qber: f64) -> f64 {
    if rounds == 0 {
        return 0.0;
    }
    let r0 = matched as f64 / rounds as f64;
    r0 * (1.0 - 2.0 * qber)
}

/// Lazy, restartable key-bit view over a trial sequence.
///
/// Yields exactly `seq.len()` bits; `Clone` restarts it from the top.
#[derive(Debug, Clone)]
pub struct KeyBits<'a> {
    inner: std::slice::Iter<'a, TrialRecord>,
}

impl KeyBits<'_> {
    /// Render the remaining bits as a '0'/'1' string.
    pub fn into_bit_string(self) -> String {
        self.map(|b| if b == 0 { '0' } else { '1' }).collect()
    }
}

impl Iterator for KeyBits<'_> {
    type Item = u8;

    fn next(&mut self) -> Option<u8> {
        self.inner.next().map(|t| t.outcome.key_bit())
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl ExactSizeIterator for KeyBits<'_> {}

/// Raw key bits from *every* trial, basis-matching or not.
///
/// Mapping: outcome (0,0) → 0, anything else → 1. Deliberately unfiltered;
/// see the module docs for the caveat. For protocol-faithful key material
/// use [`sifted_key`].
pub fn final_key(seq: &TrialSequence) -> KeyBits<'_> {
    KeyBits {
        inner: seq.as_slice().iter(),
    }
}

/// Key bits from basis-matching trials only, same outcome mapping as
/// [`final_key`].
pub fn sifted_key(
    seq: &TrialSequence,
    alice: &AngleSet,
    bob: &AngleSet,
    rule: SiftingRule,
) -> Vec<u8> {
    seq.iter()
        .filter(|t| rule.sifts(t, alice, bob))
        .map(|t| t.outcome.key_bit())
        .collect()
}

/// Bundle of every protocol metric, derived on demand from one sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsResult {
    /// CHSH S-value (classical bound 2.0, quantum maximum 2√2).
    pub chsh_s: f64,
    /// Quantum bit error rate over sifted trials, in [0, 1].
    pub qber: f64,
    /// Usable key rate; negative past qber = 0.5.
    pub key_rate: f64,
    /// Trials kept by the sifting rule.
    pub matched: usize,
    /// Total trials analyzed.
    pub rounds: usize,
    /// Sifting rule the QBER/key figures used.
    pub sifting: SiftingRule,
    /// Basis-filtered key bits as a '0'/'1' string.
    pub sifted_key: String,
    /// Unfiltered key bits, one per trial (see the module docs).
    pub raw_key: String,
}

impl MetricsResult {
    /// Compute every metric over `seq` in independent passes.
    pub fn compute(
        seq: &TrialSequence,
        alice: &AngleSet,
        bob: &AngleSet,
        rule: SiftingRule,
    ) -> Self {
        let qber = qber(seq, alice, bob, rule);
        let matched = matched_count(seq, alice, bob, rule);
        let sifted: String = sifted_key(seq, alice, bob, rule)
            .into_iter()
            .map(|b| if b == 0 { '0' } else { '1' })
            .collect();
        Self {
            chsh_s: chsh(seq),
            qber,
            key_rate: key_rate(matched, seq.len(), qber),
            matched,
            rounds: seq.len(),
            sifting: rule,
            sifted_key: sifted,
            raw_key: final_key(seq).into_bit_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trial::Outcome;

    fn record(a_idx: usize, b_idx: usize, alice: u8, bob: u8) -> TrialRecord {
        TrialRecord {
            alice_angle_idx: a_idx,
            bob_angle_idx: b_idx,
            outcome: Outcome::new(alice, bob),
        }
    }

    /// The fixed scenario from the protocol contract: four trials, outcomes
    /// 00/11/01/00 at cells (0,0)/(0,1)/(1,0)/(0,0).
    fn fixed_scenario() -> TrialSequence {
        [
            record(0, 0, 0, 0),
            record(0, 1, 1, 1),
            record(1, 0, 0, 1),
            record(0, 0, 0, 0),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn fixed_scenario_cell_expectation_and_key() {
        let seq = fixed_scenario();
        // E(0,0) = mean(+1, +1) = 1, E(0,1) = +1, E(1,0) = −1, E(1,1) empty = 0.
        // S = |1 − 1 + (−1) + 0| = 1.
        assert!((chsh(&seq) - 1.0).abs() < 1e-12);
        assert_eq!(final_key(&seq).into_bit_string(), "0011");
    }

    #[test]
    fn fixed_scenario_qber() {
        let seq = fixed_scenario();
        let alice = AngleSet::canonical_alice();
        let bob = AngleSet::canonical_bob();
        // Index-matching trials: #1 (00, agree), #4 (00, agree). No mismatch.
        assert_eq!(qber(&seq, &alice, &bob, SiftingRule::IndexMatch), 0.0);
        assert_eq!(matched_count(&seq, &alice, &bob, SiftingRule::IndexMatch), 2);
    }

    #[test]
    fn qber_counts_mismatches() {
        let seq: TrialSequence = [
            record(2, 2, 0, 0),
            record(2, 2, 0, 1),
            record(2, 2, 1, 1),
            record(2, 2, 1, 0),
            record(0, 1, 1, 0), // not sifted
        ]
        .into_iter()
        .collect();
        let alice = AngleSet::canonical_alice();
        let bob = AngleSet::canonical_bob();
        let q = qber(&seq, &alice, &bob, SiftingRule::IndexMatch);
        assert!((q - 0.5).abs() < 1e-12);
        assert!((0.0..=1.0).contains(&q));
    }

    #[test]
    fn empty_cells_and_empty_sequences_are_defined() {
        let empty = TrialSequence::default();
        let alice = AngleSet::canonical_alice();
        let bob = AngleSet::canonical_bob();
        assert_eq!(chsh(&empty), 0.0);
        assert_eq!(qber(&empty, &alice, &bob, SiftingRule::IndexMatch), 0.0);
        assert_eq!(final_key(&empty).count(), 0);
        assert_eq!(key_rate(0, 0, 0.0), 0.0);
    }

    #[test]
    fn perfect_correlation_rule_sifts_by_angle_not_index() {
        let alice = AngleSet::canonical_alice(); // [0, π/2, π/4]
        let bob = AngleSet::canonical_bob(); // [π/4, 3π/4, π/4]
        let rule = SiftingRule::PerfectCorrelation;

        // (2,2): π/4 vs π/4 — perfectly correlated.
        assert!(rule.sifts(&record(2, 2, 0, 0), &alice, &bob));
        // (2,0): π/4 vs π/4 — same angle under different indices still sifts.
        assert!(rule.sifts(&record(2, 0, 0, 0), &alice, &bob));
        // (0,0): 0 vs π/4 — correlated but not perfectly; index rule keeps it,
        // the correlation rule drops it.
        assert!(!rule.sifts(&record(0, 0, 0, 0), &alice, &bob));
        assert!(SiftingRule::IndexMatch.sifts(&record(0, 0, 0, 0), &alice, &bob));
    }

    #[test]
    fn key_rate_monotone_in_qber() {
        let mut last = f64::INFINITY;
        for q in [0.0, 0.1, 0.25, 0.5, 0.75, 1.0] {
            let rate = key_rate(300, 1000, q);
            assert!(rate < last);
            last = rate;
        }
        // qber = 0 ⇒ rate is exactly the sifting efficiency.
        assert!((key_rate(300, 1000, 0.0) - 0.3).abs() < 1e-12);
        // qber > 0.5 ⇒ negative rate flags a compromised channel.
        assert!(key_rate(300, 1000, 0.75) < 0.0);
    }

    #[test]
    fn key_bits_iterator_is_lazy_and_restartable() {
        let seq = fixed_scenario();
        let bits = final_key(&seq);
        assert_eq!(bits.len(), 4);

        let first_pass: Vec<u8> = bits.clone().collect();
        let second_pass: Vec<u8> = bits.collect();
        assert_eq!(first_pass, second_pass);
        assert_eq!(first_pass, vec![0, 0, 1, 1]);
    }

    #[test]
    fn sifted_key_is_a_subset_of_final_key() {
        let seq = fixed_scenario();
        let alice = AngleSet::canonical_alice();
        let bob = AngleSet::canonical_bob();
        let sifted = sifted_key(&seq, &alice, &bob, SiftingRule::IndexMatch);
        // Trials 1 and 4 sift; both are (0,0) outcomes.
        assert_eq!(sifted, vec![0, 0]);
        assert!(sifted.len() <= final_key(&seq).len());
    }

    #[test]
    fn metrics_are_idempotent() {
        let seq = fixed_scenario();
        let alice = AngleSet::canonical_alice();
        let bob = AngleSet::canonical_bob();
        let a = MetricsResult::compute(&seq, &alice, &bob, SiftingRule::IndexMatch);
        let b = MetricsResult::compute(&seq, &alice, &bob, SiftingRule::IndexMatch);
        assert_eq!(a, b);
    }
}
