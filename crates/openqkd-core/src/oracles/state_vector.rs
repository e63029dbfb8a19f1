//! State-vector oracle — an actual simulated measurement circuit.
//!
//! Per call this prepares the Bell state |Φ+⟩ = (|00⟩ + |11⟩)/√2 with an
//! explicit Hadamard + CNOT, rotates each qubit into its party's measurement
//! basis with Ry(−θ), and samples both bits from the Born-rule joint
//! distribution of the final four amplitudes.
//!
//! Measuring along the direction at angle θ in the x–z plane is the Ry(−θ)
//! rotation followed by a computational-basis readout. For |Φ+⟩ that yields
//! E(θa, θb) = cos(θa − θb), i.e. P(same) = cos²((θa − θb)/2), with uniform
//! marginals — the exact correlation law the closed-form sampler draws from
//! directly. All gates involved are real-valued, so the two amplitudes per
//! basis state never pick up a phase and f64 amplitudes suffice.

use rand::{Rng, RngCore};

use crate::error::Result;
use crate::oracle::{MeasurementOracle, OracleInfo};
use crate::trial::Outcome;

static STATE_VECTOR_INFO: OracleInfo = OracleInfo {
    name: "state_vector",
    description: "Entangle-then-rotate-then-measure two-qubit circuit",
    physics: "Prepares |Φ+⟩ = (|00⟩+|11⟩)/√2 via H and CNOT, applies Ry(−θ) to \
              each qubit to align its measurement basis, and samples the joint \
              outcome from the squared final amplitudes (Born rule). Projective \
              measurement of a maximally entangled pair at angles θa, θb gives \
              P(same) = cos²((θa−θb)/2); equal angles are perfectly correlated.",
    quantum: true,
};

const INV_SQRT_2: f64 = std::f64::consts::FRAC_1_SQRT_2;

/// Two-qubit state-vector measurement backend.
///
/// Stateless between calls: every measurement rebuilds the circuit from
/// scratch, so pairs are independent and identically distributed.
#[derive(Debug, Default)]
pub struct StateVectorOracle;

impl StateVectorOracle {
    /// Create a new state-vector oracle.
    pub fn new() -> Self {
        Self
    }
}

/// Amplitudes indexed as |ab⟩ → (a << 1) | b, qubit a = Alice, b = Bob.
type State = [f64; 4];

/// Apply a real 2×2 gate to one qubit of the pair.
fn apply_single_qubit(state: &mut State, gate: [[f64; 2]; 2], qubit: usize) {
    let mask = 1usize << qubit;
    for base in 0..4usize {
        if base & mask != 0 {
            continue;
        }
        let lo = state[base];
        let hi = state[base | mask];
        state[base] = gate[0][0] * lo + gate[0][1] * hi;
        state[base | mask] = gate[1][0] * lo + gate[1][1] * hi;
    }
}

/// Ry(φ) rotation matrix.
fn ry(phi: f64) -> [[f64; 2]; 2] {
    let (s, c) = (phi / 2.0).sin_cos();
    [[c, -s], [s, c]]
}

/// Build the Bell pair |Φ+⟩ from |00⟩: H on Alice's qubit, then CNOT.
fn bell_pair() -> State {
    let mut state: State = [1.0, 0.0, 0.0, 0.0];
    let h = [[INV_SQRT_2, INV_SQRT_2], [INV_SQRT_2, -INV_SQRT_2]];
    apply_single_qubit(&mut state, h, 1);
    // CNOT, control Alice (bit 1), target Bob (bit 0): swap |10⟩ ↔ |11⟩.
    state.swap(0b10, 0b11);
    state
}

impl MeasurementOracle for StateVectorOracle {
    fn info(&self) -> &OracleInfo {
        &STATE_VECTOR_INFO
    }

    fn measure(&self, theta_a: f64, theta_b: f64, rng: &mut dyn RngCore) -> Result<Outcome> {
        let mut state = bell_pair();
        apply_single_qubit(&mut state, ry(-theta_a), 1);
        apply_single_qubit(&mut state, ry(-theta_b), 0);

        // Born rule: sample the basis state from the squared amplitudes.
        let probabilities: Vec<f64> = state.iter().map(|amp| amp * amp).collect();
        let draw: f64 = rng.random();
        let mut cumulative = 0.0;
        let mut index = probabilities.len() - 1;
        for (i, p) in probabilities.iter().enumerate() {
            cumulative += p;
            if draw <= cumulative {
                index = i;
                break;
            }
        }

        Ok(Outcome::new(((index >> 1) & 1) as u8, (index & 1) as u8))
    }
}

#[cfg(test)]
mod tests {
    use std::f64::consts::{FRAC_PI_2, FRAC_PI_4, PI};

    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    #[test]
    fn bell_pair_amplitudes() {
        let state = bell_pair();
        assert!((state[0b00] - INV_SQRT_2).abs() < 1e-12);
        assert!((state[0b11] - INV_SQRT_2).abs() < 1e-12);
        assert!(state[0b01].abs() < 1e-12);
        assert!(state[0b10].abs() < 1e-12);
    }

    #[test]
    fn equal_angles_always_agree() {
        let oracle = StateVectorOracle::new();
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..2000 {
            let outcome = oracle.measure(FRAC_PI_4, FRAC_PI_4, &mut rng).unwrap();
            assert!(outcome.agree(), "equal angles must be perfectly correlated");
        }
    }

    #[test]
    fn orthogonal_correlation_angles_always_disagree() {
        // Δ = π means P(same) = cos²(π/2) = 0.
        let oracle = StateVectorOracle::new();
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..2000 {
            let outcome = oracle.measure(0.0, PI, &mut rng).unwrap();
            assert!(!outcome.agree());
        }
    }

    #[test]
    fn agreement_rate_follows_born_rule() {
        let oracle = StateVectorOracle::new();
        let mut rng = StdRng::seed_from_u64(13);
        let n = 40_000;
        let mut same = 0usize;
        for _ in 0..n {
            if oracle.measure(0.0, FRAC_PI_2, &mut rng).unwrap().agree() {
                same += 1;
            }
        }
        // Expected 0.5 at Δ = π/2; ~4σ band for n = 40k is ±0.01.
        let rate = same as f64 / n as f64;
        assert!((rate - 0.5).abs() < 0.015, "agreement rate {rate}");
    }

    #[test]
    fn marginals_are_uniform() {
        let oracle = StateVectorOracle::new();
        let mut rng = StdRng::seed_from_u64(17);
        let n = 40_000;
        let mut alice_ones = 0usize;
        for _ in 0..n {
            alice_ones += oracle.measure(0.0, FRAC_PI_4, &mut rng).unwrap().alice as usize;
        }
        let rate = alice_ones as f64 / n as f64;
        assert!((rate - 0.5).abs() < 0.015, "alice marginal {rate}");
    }
}
