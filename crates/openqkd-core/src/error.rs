//! Error types for openqkd.

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// openqkd error types
#[derive(Error, Debug)]
pub enum Error {
    /// Rejected run parameters. Fatal, surfaced immediately, never retried.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// The measurement oracle could not produce an outcome pair after the
    /// bounded per-trial retries. A partial trial sequence has no defined
    /// meaning, so this aborts the whole run.
    #[error("oracle '{oracle}' failed after {attempts} attempt(s): {reason}")]
    OracleFailure {
        /// Name of the oracle backend that failed
        oracle: String,
        /// Attempts made before giving up
        attempts: u32,
        /// Backend-provided failure detail
        reason: String,
    },

    /// No rendering backend is available. Fully recoverable: the run
    /// completes with textual results and a one-line skip notice.
    #[error("rendering unavailable: {0}")]
    RenderingUnavailable(String),

    /// IO error (report writing)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_formats() {
        let e = Error::InvalidConfiguration("rounds must be > 0".into());
        assert_eq!(e.to_string(), "invalid configuration: rounds must be > 0");

        let e = Error::OracleFailure {
            oracle: "state_vector".into(),
            attempts: 3,
            reason: "backend unavailable".into(),
        };
        assert!(e.to_string().contains("state_vector"));
        assert!(e.to_string().contains("3 attempt(s)"));
    }
}
