//! Trial generation — N independent protocol rounds.
//!
//! Architecture:
//! 1. Derive an explicitly owned RNG (seeded or from OS entropy)
//! 2. Per round, draw one basis index per party, uniformly and independently
//! 3. Ask the oracle for the correlated outcome pair at the chosen angles
//! 4. Append the record; rounds share no state, so chunks parallelize freely
//!
//! A failing oracle call is retried a bounded number of times; exhausting the
//! retries aborts the run, because a trial sequence with holes has no defined
//! meaning for any of the downstream statistics.

use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};
use sha2::{Digest, Sha256};

use crate::angles::AngleSet;
use crate::error::{Error, Result};
use crate::oracle::MeasurementOracle;
use crate::trial::{Outcome, TrialRecord, TrialSequence};

/// Per-trial oracle attempts before the run is abandoned.
pub const MAX_ORACLE_ATTEMPTS: u32 = 3;

/// Build the run RNG from optional seed material.
///
/// The 32-byte `StdRng` seed is SHA-256 of the given bytes; with no seed, OS
/// entropy is hashed instead, so unseeded runs differ while seeded runs
/// replay exactly.
pub fn run_rng(seed: Option<&[u8]>) -> StdRng {
    let digest: [u8; 32] = {
        let mut h = Sha256::new();
        if let Some(s) = seed {
            h.update(s);
        } else {
            let mut os_random = [0u8; 32];
            getrandom(&mut os_random);
            h.update(os_random);
        }
        h.finalize().into()
    };
    StdRng::from_seed(digest)
}

/// Fill buffer with OS random bytes via the `getrandom` crate.
fn getrandom(buf: &mut [u8]) {
    getrandom::fill(buf).expect("OS CSPRNG failed");
}

/// Run `rounds` protocol rounds serially and collect the trial records.
///
/// Rounds are i.i.d.: each draws `a_idx` uniformly over Alice's set and
/// `b_idx` uniformly over Bob's, then measures one shared pair at
/// `(alice[a_idx], bob[b_idx])`.
pub fn generate(
    rounds: usize,
    alice: &AngleSet,
    bob: &AngleSet,
    oracle: &dyn MeasurementOracle,
    rng: &mut StdRng,
) -> Result<TrialSequence> {
    validate(rounds, alice, bob)?;
    log::debug!("generating {rounds} trials with oracle '{}'", oracle.name());

    let mut seq = TrialSequence::with_capacity(rounds);
    seq.extend(generate_chunk(rounds, alice, bob, oracle, rng)?);
    Ok(seq)
}

/// Run `rounds` protocol rounds across `threads` worker threads.
///
/// Each chunk owns an isolated `StdRng` seeded from the master RNG, and the
/// chunks are concatenated in chunk order, so a seeded parallel run is as
/// reproducible as a serial one (though not bit-identical to it, since the
/// round-to-chunk assignment differs). Per-trial statistics are unaffected
/// either way: every metric is an order-independent aggregation.
pub fn generate_parallel(
    rounds: usize,
    alice: &AngleSet,
    bob: &AngleSet,
    oracle: &dyn MeasurementOracle,
    rng: &mut StdRng,
    threads: usize,
) -> Result<TrialSequence> {
    validate(rounds, alice, bob)?;

    let threads = threads.clamp(1, rounds);
    if threads == 1 {
        return generate(rounds, alice, bob, oracle, rng);
    }
    log::debug!(
        "generating {rounds} trials on {threads} threads with oracle '{}'",
        oracle.name()
    );

    // Chunk seeds come from the master RNG up front, so the split is part of
    // the reproducible stream.
    let base = rounds / threads;
    let remainder = rounds % threads;
    let chunks: Vec<(usize, [u8; 32])> = (0..threads)
        .map(|i| {
            let len = base + usize::from(i < remainder);
            let mut seed = [0u8; 32];
            rng.fill_bytes(&mut seed);
            (len, seed)
        })
        .collect();

    let results: Vec<Result<Vec<TrialRecord>>> = std::thread::scope(|s| {
        let handles: Vec<_> = chunks
            .into_iter()
            .map(|(len, seed)| {
                s.spawn(move || {
                    let mut chunk_rng = StdRng::from_seed(seed);
                    generate_chunk(len, alice, bob, oracle, &mut chunk_rng)
                })
            })
            .collect();
        handles
            .into_iter()
            .map(|h| h.join().expect("generator worker panicked"))
            .collect()
    });

    let mut seq = TrialSequence::with_capacity(rounds);
    for chunk in results {
        seq.extend(chunk?);
    }
    Ok(seq)
}

fn validate(rounds: usize, alice: &AngleSet, bob: &AngleSet) -> Result<()> {
    if rounds == 0 {
        return Err(Error::InvalidConfiguration(
            "round count must be positive".into(),
        ));
    }
    if alice.is_empty() || bob.is_empty() {
        return Err(Error::InvalidConfiguration(
            "both parties need a non-empty angle set".into(),
        ));
    }
    Ok(())
}

fn generate_chunk(
    rounds: usize,
    alice: &AngleSet,
    bob: &AngleSet,
    oracle: &dyn MeasurementOracle,
    rng: &mut StdRng,
) -> Result<Vec<TrialRecord>> {
    let mut records = Vec::with_capacity(rounds);
    for _ in 0..rounds {
        let a_idx = rng.random_range(0..alice.len());
        let b_idx = rng.random_range(0..bob.len());
        let outcome = measure_with_retry(oracle, alice.get(a_idx), bob.get(b_idx), rng)?;
        records.push(TrialRecord {
            alice_angle_idx: a_idx,
            bob_angle_idx: b_idx,
            outcome,
        });
    }
    Ok(records)
}

/// Call the oracle, retrying transient failures up to [`MAX_ORACLE_ATTEMPTS`].
fn measure_with_retry(
    oracle: &dyn MeasurementOracle,
    theta_a: f64,
    theta_b: f64,
    rng: &mut StdRng,
) -> Result<Outcome> {
    let mut last_reason = String::new();
    for attempt in 1..=MAX_ORACLE_ATTEMPTS {
        match oracle.measure(theta_a, theta_b, rng) {
            Ok(outcome) => return Ok(outcome),
            Err(Error::OracleFailure { reason, .. }) => {
                log::warn!(
                    "oracle '{}' failed (attempt {attempt}/{MAX_ORACLE_ATTEMPTS}): {reason}",
                    oracle.name()
                );
                last_reason = reason;
            }
            Err(other) => return Err(other),
        }
    }
    Err(Error::OracleFailure {
        oracle: oracle.name().to_string(),
        attempts: MAX_ORACLE_ATTEMPTS,
        reason: last_reason,
    })
}
