//! Abstract measurement oracle trait.
//!
//! The oracle is the boundary between the protocol and whatever produces
//! correlated outcome pairs — a state-vector circuit, a closed-form sampler,
//! or a classical reference model. Each backend implements
//! [`MeasurementOracle`], which provides metadata via [`OracleInfo`] and a
//! single measurement operation.
//!
//! Backends hold no global state and own no randomness: every call receives
//! the run's RNG explicitly, so a seeded run is reproducible and parallel
//! chunks stay isolated.

use rand::RngCore;

use crate::error::Result;
use crate::trial::Outcome;

/// Metadata about an oracle backend.
#[derive(Debug, Clone)]
pub struct OracleInfo {
    /// Unique identifier (e.g. `"state_vector"`).
    pub name: &'static str,
    /// One-line human-readable description.
    pub description: &'static str,
    /// Physics explanation of the correlation model.
    pub physics: &'static str,
    /// Whether outcomes obey the quantum correlation law
    /// P(same) = cos²((θa − θb)/2). False for classical reference models.
    pub quantum: bool,
}

/// Trait every measurement backend must implement.
///
/// Contract for quantum backends: given measurement angles θa and θb, the
/// returned bits are marginally uniform with P(same) = cos²((θa − θb)/2);
/// equal angles always yield equal bits.
pub trait MeasurementOracle: Send + Sync {
    /// Oracle metadata.
    fn info(&self) -> &OracleInfo;

    /// Measure one shared entangled pair at the given angles (radians).
    fn measure(&self, theta_a: f64, theta_b: f64, rng: &mut dyn RngCore) -> Result<Outcome>;

    /// Convenience: name from info.
    fn name(&self) -> &'static str {
        self.info().name
    }
}
