//! Symmetric bit-flip noise over any oracle backend.
//!
//! Models channel noise or an intercept-resend eavesdropper as independent
//! flips of each measured bit with probability p. Wrapping the ideal quantum
//! backends drives QBER above zero and degrades the CHSH statistic, which is
//! exactly what the key-rate penalty and the verification battery need to be
//! exercised against.

use rand::{Rng, RngCore};

use crate::error::{Error, Result};
use crate::oracle::{MeasurementOracle, OracleInfo};
use crate::trial::Outcome;

static NOISY_CHANNEL_INFO: OracleInfo = OracleInfo {
    name: "noisy_channel",
    description: "Independent symmetric bit-flip noise over an inner backend",
    physics: "Each party's measured bit is flipped independently with \
              probability p after the inner oracle produces the pair. p = 0 is \
              the identity; p = 0.5 erases all correlation, pushing QBER to 50% \
              and the usable key rate to zero or below.",
    quantum: false,
};

/// Bit-flip noise decorator.
pub struct NoisyChannel {
    inner: Box<dyn MeasurementOracle>,
    flip_probability: f64,
}

impl NoisyChannel {
    /// Wrap `inner`, flipping each output bit with probability `flip_probability`.
    ///
    /// Rejects probabilities outside [0, 1].
    pub fn new(inner: Box<dyn MeasurementOracle>, flip_probability: f64) -> Result<Self> {
        if !(0.0..=1.0).contains(&flip_probability) {
            return Err(Error::InvalidConfiguration(format!(
                "flip probability must be in [0, 1], got {flip_probability}"
            )));
        }
        Ok(Self {
            inner,
            flip_probability,
        })
    }

    /// The configured flip probability.
    pub fn flip_probability(&self) -> f64 {
        self.flip_probability
    }

    /// Name of the wrapped backend.
    pub fn inner_name(&self) -> &'static str {
        self.inner.name()
    }
}

impl MeasurementOracle for NoisyChannel {
    fn info(&self) -> &OracleInfo {
        &NOISY_CHANNEL_INFO
    }

    fn measure(&self, theta_a: f64, theta_b: f64, rng: &mut dyn RngCore) -> Result<Outcome> {
        let clean = self.inner.measure(theta_a, theta_b, rng)?;
        let alice = clean.alice ^ u8::from(rng.random_bool(self.flip_probability));
        let bob = clean.bob ^ u8::from(rng.random_bool(self.flip_probability));
        Ok(Outcome::new(alice, bob))
    }
}

#[cfg(test)]
mod tests {
    use std::f64::consts::FRAC_PI_4;

    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::super::BornRuleOracle;
    use super::*;

    #[test]
    fn rejects_out_of_range_probability() {
        assert!(NoisyChannel::new(Box::new(BornRuleOracle::new()), -0.1).is_err());
        assert!(NoisyChannel::new(Box::new(BornRuleOracle::new()), 1.5).is_err());
    }

    #[test]
    fn zero_noise_is_identity_on_matched_bases() {
        let channel = NoisyChannel::new(Box::new(BornRuleOracle::new()), 0.0).unwrap();
        let mut rng = StdRng::seed_from_u64(21);
        for _ in 0..2000 {
            assert!(channel.measure(FRAC_PI_4, FRAC_PI_4, &mut rng).unwrap().agree());
        }
    }

    #[test]
    fn full_flip_preserves_agreement_statistics() {
        // p = 1 flips both bits deterministically; agreement is unchanged.
        let channel = NoisyChannel::new(Box::new(BornRuleOracle::new()), 1.0).unwrap();
        let mut rng = StdRng::seed_from_u64(22);
        for _ in 0..2000 {
            assert!(channel.measure(0.7, 0.7, &mut rng).unwrap().agree());
        }
    }

    #[test]
    fn half_noise_decorrelates_matched_bases() {
        let channel = NoisyChannel::new(Box::new(BornRuleOracle::new()), 0.5).unwrap();
        let mut rng = StdRng::seed_from_u64(23);
        let n = 40_000;
        let mut same = 0usize;
        for _ in 0..n {
            if channel.measure(FRAC_PI_4, FRAC_PI_4, &mut rng).unwrap().agree() {
                same += 1;
            }
        }
        let rate = same as f64 / n as f64;
        assert!((rate - 0.5).abs() < 0.015, "rate {rate}");
    }
}
