//! # openqkd-core
//!
//! **Bell tests, QBER, and sifted keys — the E91 protocol on your laptop.**
//!
//! `openqkd-core` simulates the E91 entanglement-based quantum key
//! distribution protocol: two parties repeatedly measure one shared entangled
//! pair at independently chosen bases, and the resulting trial data is
//! reduced to the three statistics that define the protocol — a CHSH
//! Bell-inequality value, a quantum bit error rate, and a usable key rate —
//! plus the sifted key bits themselves.
//!
//! ## Quick Start
//!
//! ```
//! use openqkd_core::{AngleSet, MetricsResult, SiftingRule, generate, run_rng};
//! use openqkd_core::oracles::StateVectorOracle;
//!
//! let alice = AngleSet::canonical_alice();
//! let bob = AngleSet::canonical_bob();
//! let oracle = StateVectorOracle::new();
//! let mut rng = run_rng(Some(b"example"));
//!
//! let trials = generate(2000, &alice, &bob, &oracle, &mut rng).unwrap();
//! let metrics = MetricsResult::compute(&trials, &alice, &bob, SiftingRule::IndexMatch);
//!
//! assert!(metrics.chsh_s > 2.0, "quantum correlations violate the Bell bound");
//! assert!((0.0..=1.0).contains(&metrics.qber));
//! ```
//!
//! ## Architecture
//!
//! Oracle (correlated pairs) → Generator (N i.i.d. trials) → Metrics
//!
//! The measurement oracle is a trait boundary: the [`oracles`] catalog ships
//! a state-vector circuit, a closed-form Born-rule sampler (interchangeable
//! with it), a classical local-hidden-variable reference bounded at S ≤ 2,
//! and a bit-flip noise decorator. Every oracle call receives the run's RNG
//! explicitly — there is no global simulator instance and no ambient
//! randomness, so seeded runs replay bit for bit.

pub mod angles;
pub mod error;
pub mod generator;
pub mod metrics;
pub mod oracle;
pub mod oracles;
pub mod trial;

pub use angles::AngleSet;
pub use error::{Error, Result};
pub use generator::{MAX_ORACLE_ATTEMPTS, generate, generate_parallel, run_rng};
pub use metrics::{
    KeyBits, MetricsResult, SiftingRule, chsh, final_key, key_rate, matched_count, qber,
    sifted_key,
};
pub use oracle::{MeasurementOracle, OracleInfo};
pub use trial::{Outcome, TrialRecord, TrialSequence};

/// Library version (from Cargo.toml).
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
