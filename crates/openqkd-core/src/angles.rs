//! Measurement angle sets.
//!
//! Each party owns a fixed, ordered list of measurement angles (radians),
//! chosen at startup and immutable for the rest of the run. Trials refer to
//! angles by index, so ordering is part of the contract: the CHSH estimator
//! reads the first two indices of each party's set as its four cells.

use std::f64::consts::{FRAC_PI_2, FRAC_PI_4};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Ordered measurement angles (radians) available to one party.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AngleSet {
    angles: Vec<f64>,
}

impl AngleSet {
    /// Build an angle set. Rejects an empty list: a party with no basis
    /// cannot take part in the protocol.
    pub fn new(angles: Vec<f64>) -> Result<Self> {
        if angles.is_empty() {
            return Err(Error::InvalidConfiguration(
                "angle set must contain at least one angle".into(),
            ));
        }
        Ok(Self { angles })
    }

    /// Alice's canonical set: CHSH bases at indices 0 and 1, key basis at 2.
    ///
    /// Under the E(θa, θb) = cos(θa − θb) correlation law, the cells
    /// (0,0) (0,1) (1,0) (1,1) against [`AngleSet::canonical_bob`] all sit at
    /// |Δ| of π/4 or 3π/4, the spacing that drives S to 2√2.
    pub fn canonical_alice() -> Self {
        Self {
            angles: vec![0.0, FRAC_PI_2, FRAC_PI_4],
        }
    }

    /// Bob's canonical set. Index 2 shares θ = π/4 with Alice's index 2, so
    /// the (2,2) index pair is the perfectly correlated key-material cell.
    pub fn canonical_bob() -> Self {
        Self {
            angles: vec![FRAC_PI_4, 3.0 * FRAC_PI_4, FRAC_PI_4],
        }
    }

    /// Angle at `idx`, in radians.
    pub fn get(&self, idx: usize) -> f64 {
        self.angles[idx]
    }

    /// Number of bases in the set.
    pub fn len(&self) -> usize {
        self.angles.len()
    }

    /// Always false for a constructed set; kept for the conventional pair.
    pub fn is_empty(&self) -> bool {
        self.angles.is_empty()
    }

    /// All angles in order.
    pub fn as_slice(&self) -> &[f64] {
        &self.angles
    }
}

impl std::fmt::Display for AngleSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let degrees: Vec<String> = self
            .angles
            .iter()
            .map(|a| format!("{:.1}°", a.to_degrees()))
            .collect();
        write!(f, "[{}]", degrees.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty() {
        assert!(AngleSet::new(vec![]).is_err());
    }

    #[test]
    fn canonical_sets_have_three_bases() {
        let alice = AngleSet::canonical_alice();
        let bob = AngleSet::canonical_bob();
        assert_eq!(alice.len(), 3);
        assert_eq!(bob.len(), 3);
    }

    #[test]
    fn canonical_key_cell_shares_angle() {
        let alice = AngleSet::canonical_alice();
        let bob = AngleSet::canonical_bob();
        assert_eq!(alice.get(2), bob.get(2));
    }

    #[test]
    fn canonical_chsh_cells_maximize_violation() {
        // |cos Δ| = √2/2 on every CHSH cell, with the (0,1) cell carrying the
        // opposite sign — the arrangement that sums to 2√2.
        let alice = AngleSet::canonical_alice();
        let bob = AngleSet::canonical_bob();
        let e = |a: usize, b: usize| (alice.get(a) - bob.get(b)).cos();
        let s = (e(0, 0) - e(0, 1) + e(1, 0) + e(1, 1)).abs();
        assert!((s - 2.0 * 2.0f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn display_in_degrees() {
        let set = AngleSet::new(vec![0.0, FRAC_PI_4]).unwrap();
        assert_eq!(set.to_string(), "[0.0°, 45.0°]");
    }
}
