//! Classical reference oracle — a local hidden-variable model.
//!
//! Every pair carries one shared hidden angle λ, drawn uniformly from
//! [0, 2π). Each party's outcome is then fully determined by its own angle
//! and λ: bit 0 when cos(θ − λ) ≥ 0, bit 1 otherwise. Local, deterministic
//! given λ, and therefore bounded by the classical CHSH limit: the model's
//! correlation is the sawtooth E(Δ) = 1 − 2|Δ|/π (for |Δ| ≤ π), which caps
//! S at exactly 2 on the canonical angle cells.
//!
//! Equal angles still agree every time and marginals are still uniform, so
//! QBER and key extraction behave normally — only the Bell statistic
//! separates this model from the quantum backends. That separation is what
//! the `bell_violation` battery test and the CHSH property tests lean on.

use std::f64::consts::TAU;

use rand::{Rng, RngCore};

use crate::error::Result;
use crate::oracle::{MeasurementOracle, OracleInfo};
use crate::trial::Outcome;

static LOCAL_HIDDEN_VARIABLE_INFO: OracleInfo = OracleInfo {
    name: "local_hidden_variable",
    description: "Deterministic shared-randomness model, classically bounded (S ≤ 2)",
    physics: "A single hidden angle λ is shared by the pair at creation; each \
              party outputs sign(cos(θ − λ)) locally with no access to the \
              other's setting. Bell's theorem bounds every such model at \
              S ≤ 2, so runs driven by this oracle calibrate what a \
              non-quantum channel looks like to the statistics engine.",
    quantum: false,
};

/// Local hidden-variable pair source.
#[derive(Debug, Default)]
pub struct LocalHiddenVariableOracle;

impl LocalHiddenVariableOracle {
    /// Create a new classical reference oracle.
    pub fn new() -> Self {
        Self
    }
}

fn sign_bit(angle: f64, lambda: f64) -> u8 {
    if (angle - lambda).cos() >= 0.0 { 0 } else { 1 }
}

impl MeasurementOracle for LocalHiddenVariableOracle {
    fn info(&self) -> &OracleInfo {
        &LOCAL_HIDDEN_VARIABLE_INFO
    }

    fn measure(&self, theta_a: f64, theta_b: f64, rng: &mut dyn RngCore) -> Result<Outcome> {
        let lambda = rng.random_range(0.0..TAU);
        Ok(Outcome::new(sign_bit(theta_a, lambda), sign_bit(theta_b, lambda)))
    }
}

#[cfg(test)]
mod tests {
    use std::f64::consts::FRAC_PI_2;

    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    #[test]
    fn equal_angles_always_agree() {
        let oracle = LocalHiddenVariableOracle::new();
        let mut rng = StdRng::seed_from_u64(5);
        for _ in 0..2000 {
            assert!(oracle.measure(1.1, 1.1, &mut rng).unwrap().agree());
        }
    }

    #[test]
    fn sawtooth_correlation_at_right_angle() {
        // E(π/2) = 1 − 2·(π/2)/π = 0 ⇒ agreement rate 0.5.
        let oracle = LocalHiddenVariableOracle::new();
        let mut rng = StdRng::seed_from_u64(6);
        let n = 40_000;
        let mut same = 0usize;
        for _ in 0..n {
            if oracle.measure(FRAC_PI_2, 0.0, &mut rng).unwrap().agree() {
                same += 1;
            }
        }
        let rate = same as f64 / n as f64;
        assert!((rate - 0.5).abs() < 0.015, "rate {rate}");
    }

    #[test]
    fn marginals_are_uniform() {
        let oracle = LocalHiddenVariableOracle::new();
        let mut rng = StdRng::seed_from_u64(8);
        let n = 40_000;
        let mut ones = 0usize;
        for _ in 0..n {
            ones += oracle.measure(0.3, 2.0, &mut rng).unwrap().alice as usize;
        }
        let rate = ones as f64 / n as f64;
        assert!((rate - 0.5).abs() < 0.015, "alice marginal {rate}");
    }
}
