//! Statistical verification battery for simulated E91 trial data.
//!
//! Statistical tests cannot certify that bits are "quantum" — but they can
//! certify that a trial sequence is consistent with the quantum correlation
//! contract: uniform marginals, cos²(Δ/2) agreement per angle cell, a CHSH
//! value significantly past the classical bound, and a QBER that matches the
//! sifted cells' geometry. Each test returns a [`TestResult`] with a p-value
//! (where applicable), a pass/fail determination, and a letter grade.

use openqkd_core::{AngleSet, SiftingRule, TrialSequence};
use statrs::distribution::{ChiSquared, ContinuousCDF, Normal};

/// Minimum per-cell trials before a cell's agreement rate is scored.
const MIN_CELL_TRIALS: usize = 30;

/// CHSH classical bound.
const CLASSICAL_BOUND: f64 = 2.0;

// ═══════════════════════════════════════════════════════════════════════════════
// Core types
// ═══════════════════════════════════════════════════════════════════════════════

/// Result of a single verification test.
#[derive(Debug, Clone)]
pub struct TestResult {
    pub name: String,
    pub passed: bool,
    pub p_value: Option<f64>,
    pub statistic: f64,
    pub details: String,
    pub grade: char,
}

impl TestResult {
    /// Assign a letter grade based on p-value.
    ///
    /// - A: p >= 0.1
    /// - B: p >= 0.01
    /// - C: p >= 0.001
    /// - D: p >= 0.0001
    /// - F: otherwise or None
    pub fn grade_from_p(p: Option<f64>) -> char {
        match p {
            Some(p) if p >= 0.1 => 'A',
            Some(p) if p >= 0.01 => 'B',
            Some(p) if p >= 0.001 => 'C',
            Some(p) if p >= 0.0001 => 'D',
            _ => 'F',
        }
    }

    /// Determine pass/fail from p-value against a threshold (default 0.01).
    pub fn pass_from_p(p: Option<f64>, threshold: f64) -> bool {
        match p {
            Some(p) => p >= threshold,
            None => false,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Helpers
// ═══════════════════════════════════════════════════════════════════════════════

/// Return a failing `TestResult` when the sequence is too short.
fn insufficient(name: &str, needed: usize, got: usize) -> TestResult {
    TestResult {
        name: name.to_string(),
        passed: false,
        p_value: None,
        statistic: 0.0,
        details: format!("Insufficient trials: need {needed}, got {got}"),
        grade: 'F',
    }
}

/// Two-sided p-value for a standard-normal z statistic.
fn two_sided_p(z: f64) -> f64 {
    let normal = Normal::new(0.0, 1.0).expect("unit normal");
    (2.0 * (1.0 - normal.cdf(z.abs()))).clamp(0.0, 1.0)
}

/// Survival function of a chi-squared distribution.
fn chi_squared_p(statistic: f64, df: f64) -> f64 {
    let dist = ChiSquared::new(df).expect("chi-squared df");
    (1.0 - dist.cdf(statistic)).clamp(0.0, 1.0)
}

// ═══════════════════════════════════════════════════════════════════════════════
// 1. MARGINAL TESTS
// ═══════════════════════════════════════════════════════════════════════════════

/// Test 1: Marginal uniformity -- each party's bit should be a fair coin.
/// Chi-squared with 2 degrees of freedom (one per party).
pub fn marginal_uniformity(seq: &TrialSequence) -> TestResult {
    let name = "Marginal Uniformity";
    let n = seq.len();
    if n < 100 {
        return insufficient(name, 100, n);
    }

    let alice_ones = seq.iter().filter(|t| t.outcome.alice == 1).count() as f64;
    let bob_ones = seq.iter().filter(|t| t.outcome.bob == 1).count() as f64;
    let expected = n as f64 / 2.0;

    let chi2 = (alice_ones - expected).powi(2) / expected * 2.0
        + (bob_ones - expected).powi(2) / expected * 2.0;
    let p = chi_squared_p(chi2, 2.0);

    TestResult {
        name: name.to_string(),
        passed: TestResult::pass_from_p(Some(p), 0.01),
        p_value: Some(p),
        statistic: chi2,
        details: format!(
            "alice P(1)={:.4}, bob P(1)={:.4}, n={n}",
            alice_ones / n as f64,
            bob_ones / n as f64
        ),
        grade: TestResult::grade_from_p(Some(p)),
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// 2. CORRELATION TESTS
// ═══════════════════════════════════════════════════════════════════════════════

/// Test 2: Correlation law -- every populated angle cell's agreement rate
/// should match cos²((θa−θb)/2). Worst cell governs, Bonferroni-corrected
/// across the cells actually scored.
pub fn correlation_law(seq: &TrialSequence, alice: &AngleSet, bob: &AngleSet) -> TestResult {
    let name = "Correlation Law";
    if seq.len() < 100 {
        return insufficient(name, 100, seq.len());
    }

    // Tally agreement per cell.
    let mut counts = vec![vec![0usize; bob.len()]; alice.len()];
    let mut agrees = vec![vec![0usize; bob.len()]; alice.len()];
    for t in seq {
        counts[t.alice_angle_idx][t.bob_angle_idx] += 1;
        if t.outcome.agree() {
            agrees[t.alice_angle_idx][t.bob_angle_idx] += 1;
        }
    }

    let mut scored = 0usize;
    let mut worst_p = 1.0f64;
    let mut worst_z = 0.0f64;
    let mut worst_cell = (0usize, 0usize);

    for i in 0..alice.len() {
        for j in 0..bob.len() {
            let n = counts[i][j];
            if n < MIN_CELL_TRIALS {
                continue;
            }
            let expected = ((alice.get(i) - bob.get(j)) / 2.0).cos().powi(2);
            let observed = agrees[i][j] as f64;

            // Degenerate cells (expected 0 or 1) admit no deviation at all.
            let p = if expected * (1.0 - expected) < 1e-12 {
                let exact = (expected * n as f64).round();
                if (observed - exact).abs() < 0.5 { 1.0 } else { 0.0 }
            } else {
                let z = (observed - n as f64 * expected)
                    / (n as f64 * expected * (1.0 - expected)).sqrt();
                if z.abs() > worst_z.abs() {
                    worst_z = z;
                }
                two_sided_p(z)
            };

            scored += 1;
            if p < worst_p {
                worst_p = p;
                worst_cell = (i, j);
            }
        }
    }

    if scored == 0 {
        return insufficient(name, MIN_CELL_TRIALS, 0);
    }

    // Bonferroni over the scored cells.
    let p = (worst_p * scored as f64).min(1.0);

    TestResult {
        name: name.to_string(),
        passed: TestResult::pass_from_p(Some(p), 0.01),
        p_value: Some(p),
        statistic: worst_z,
        details: format!(
            "{scored} cells scored, worst cell ({},{}) z={worst_z:.2}",
            worst_cell.0, worst_cell.1
        ),
        grade: TestResult::grade_from_p(Some(p)),
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// 3. BELL TEST
// ═══════════════════════════════════════════════════════════════════════════════

/// Test 3: Bell violation -- the CHSH S estimate should exceed the classical
/// bound 2.0 with statistical significance. One-sided z-test using the
/// standard error of the four cell means. A local hidden-variable source
/// cannot pass this test.
pub fn bell_violation(seq: &TrialSequence) -> TestResult {
    let name = "Bell Violation";
    if seq.len() < 400 {
        return insufficient(name, 400, seq.len());
    }

    let cells = [(0usize, 0usize), (0, 1), (1, 0), (1, 1)];
    let mut sums = [0.0f64; 4];
    let mut counts = [0usize; 4];
    for t in seq {
        if let Some(slot) = cells
            .iter()
            .position(|c| *c == (t.alice_angle_idx, t.bob_angle_idx))
        {
            sums[slot] += t.outcome.correlation();
            counts[slot] += 1;
        }
    }

    if counts.iter().any(|&c| c < MIN_CELL_TRIALS) {
        return insufficient(name, MIN_CELL_TRIALS, *counts.iter().min().unwrap_or(&0));
    }

    let mut s = 0.0f64;
    let mut variance = 0.0f64;
    for (slot, &n) in counts.iter().enumerate() {
        let e = sums[slot] / n as f64;
        s += if slot == 1 { -e } else { e };
        // Var of a ±1 mean: (1 − E²)/n.
        variance += (1.0 - e * e) / n as f64;
    }
    let s = s.abs();
    let se = variance.sqrt();

    let z = (s - CLASSICAL_BOUND) / se;
    let normal = Normal::new(0.0, 1.0).expect("unit normal");
    // One-sided: evidence that S exceeds the bound.
    let p = (1.0 - normal.cdf(z)).clamp(0.0, 1.0);

    TestResult {
        name: name.to_string(),
        passed: p < 0.001,
        p_value: Some(p),
        statistic: s,
        details: format!("S={s:.3} ± {se:.3}, z={z:.2} vs classical bound {CLASSICAL_BOUND:.1}"),
        grade: if p < 1e-6 {
            'A'
        } else if p < 1e-3 {
            'B'
        } else if p < 0.05 {
            'C'
        } else {
            'F'
        },
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// 4. QBER TEST
// ═══════════════════════════════════════════════════════════════════════════════

/// Test 4: QBER consistency -- the observed error count over index-sifted
/// trials should match the expectation implied by the sifted cells' angles.
/// Two-sided z-test on the aggregate mismatch count.
pub fn qber_consistency(seq: &TrialSequence, alice: &AngleSet, bob: &AngleSet) -> TestResult {
    let name = "QBER Consistency";
    if seq.len() < 100 {
        return insufficient(name, 100, seq.len());
    }

    let rule = SiftingRule::IndexMatch;
    let mut observed = 0.0f64;
    let mut expected = 0.0f64;
    let mut variance = 0.0f64;
    let mut total = 0usize;

    for t in seq {
        if !rule.sifts(t, alice, bob) {
            continue;
        }
        total += 1;
        if !t.outcome.agree() {
            observed += 1.0;
        }
        let p_diff = ((alice.get(t.alice_angle_idx) - bob.get(t.bob_angle_idx)) / 2.0)
            .sin()
            .powi(2);
        expected += p_diff;
        variance += p_diff * (1.0 - p_diff);
    }

    if total < MIN_CELL_TRIALS {
        return insufficient(name, MIN_CELL_TRIALS, total);
    }

    let p = if variance < 1e-12 {
        // All sifted cells are exact: any mismatch is a contract violation.
        if observed == 0.0 { 1.0 } else { 0.0 }
    } else {
        two_sided_p((observed - expected) / variance.sqrt())
    };

    let qber = observed / total as f64;
    TestResult {
        name: name.to_string(),
        passed: TestResult::pass_from_p(Some(p), 0.01),
        p_value: Some(p),
        statistic: qber,
        details: format!(
            "QBER {:.2}% observed vs {:.2}% expected over {total} sifted trials",
            qber * 100.0,
            expected / total as f64 * 100.0
        ),
        grade: TestResult::grade_from_p(Some(p)),
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Battery
// ═══════════════════════════════════════════════════════════════════════════════

/// Run the full battery over one trial sequence.
pub fn run_all_tests(seq: &TrialSequence, alice: &AngleSet, bob: &AngleSet) -> Vec<TestResult> {
    vec![
        marginal_uniformity(seq),
        correlation_law(seq, alice, bob),
        bell_violation(seq),
        qber_consistency(seq, alice, bob),
    ]
}

/// Overall quality score (0–100) from the letter grades.
pub fn calculate_quality_score(results: &[TestResult]) -> f64 {
    if results.is_empty() {
        return 0.0;
    }
    let total: f64 = results
        .iter()
        .map(|r| match r.grade {
            'A' => 100.0,
            'B' => 75.0,
            'C' => 50.0,
            'D' => 25.0,
            _ => 0.0,
        })
        .sum();
    total / results.len() as f64
}

#[cfg(test)]
mod tests {
    use openqkd_core::oracles::{NoisyChannel, oracle_by_name};
    use openqkd_core::{generate, run_rng};

    use super::*;

    fn quantum_run(rounds: usize, seed: &[u8]) -> (TrialSequence, AngleSet, AngleSet) {
        let alice = AngleSet::canonical_alice();
        let bob = AngleSet::canonical_bob();
        let oracle = oracle_by_name("born_rule").unwrap();
        let mut rng = run_rng(Some(seed));
        let seq = generate(rounds, &alice, &bob, oracle.as_ref(), &mut rng).unwrap();
        (seq, alice, bob)
    }

    #[test]
    fn quantum_run_passes_battery() {
        let (seq, alice, bob) = quantum_run(60_000, b"battery");
        let results = run_all_tests(&seq, &alice, &bob);
        assert_eq!(results.len(), 4);
        // The Bell test is dozens of sigma past the bound at this size; the
        // consistency tests get a generous band so no seed is unlucky.
        for r in &results {
            if r.name == "Bell Violation" {
                assert!(r.passed, "{} failed: {}", r.name, r.details);
            } else {
                assert!(
                    r.p_value.unwrap_or(0.0) >= 1e-4,
                    "{} implausibly extreme: {}",
                    r.name,
                    r.details
                );
            }
        }
        assert!(calculate_quality_score(&results) > 50.0);
    }

    #[test]
    fn classical_run_fails_bell_only() {
        let alice = AngleSet::canonical_alice();
        let bob = AngleSet::canonical_bob();
        let oracle = oracle_by_name("local_hidden_variable").unwrap();
        let mut rng = run_rng(Some(b"lhv"));
        let seq = generate(60_000, &alice, &bob, oracle.as_ref(), &mut rng).unwrap();

        let bell = bell_violation(&seq);
        assert!(!bell.passed, "classical model must not certify a violation");
        // Marginals stay fair even classically.
        assert!(marginal_uniformity(&seq).p_value.unwrap_or(0.0) >= 1e-4);
    }

    #[test]
    fn noisy_run_breaks_the_correlation_law() {
        let alice = AngleSet::canonical_alice();
        let bob = AngleSet::canonical_bob();
        let oracle = NoisyChannel::new(oracle_by_name("born_rule").unwrap(), 0.25).unwrap();
        let mut rng = run_rng(Some(b"noisy-battery"));
        let seq = generate(60_000, &alice, &bob, &oracle, &mut rng).unwrap();

        assert!(!correlation_law(&seq, &alice, &bob).passed);
        assert!(!qber_consistency(&seq, &alice, &bob).passed);
        assert!(!bell_violation(&seq).passed);
    }

    #[test]
    fn short_sequences_are_reported_insufficient() {
        let (seq, alice, bob) = quantum_run(10, b"short");
        for r in run_all_tests(&seq, &alice, &bob) {
            assert!(!r.passed);
            assert_eq!(r.grade, 'F');
            assert!(r.details.contains("Insufficient"));
        }
    }

    #[test]
    fn grades_follow_p_values() {
        assert_eq!(TestResult::grade_from_p(Some(0.5)), 'A');
        assert_eq!(TestResult::grade_from_p(Some(0.05)), 'B');
        assert_eq!(TestResult::grade_from_p(Some(0.005)), 'C');
        assert_eq!(TestResult::grade_from_p(Some(0.0005)), 'D');
        assert_eq!(TestResult::grade_from_p(Some(1e-9)), 'F');
        assert_eq!(TestResult::grade_from_p(None), 'F');
    }

    #[test]
    fn score_averages_grades() {
        let mk = |grade| TestResult {
            name: "t".into(),
            passed: true,
            p_value: None,
            statistic: 0.0,
            details: String::new(),
            grade,
        };
        let score = calculate_quality_score(&[mk('A'), mk('F')]);
        assert!((score - 50.0).abs() < 0.01);
        assert_eq!(calculate_quality_score(&[]), 0.0);
    }
}
