pub mod demo;
pub mod oracles;
pub mod run;
pub mod verify;

use openqkd_core::oracles::{NoisyChannel, oracle_by_name};
use openqkd_core::{Error, MeasurementOracle, Result, SiftingRule};

/// Build the measurement oracle, wrapped in a bit-flip channel when noise > 0.
pub fn make_oracle(name: &str, noise: f64) -> Result<Box<dyn MeasurementOracle>> {
    let inner = oracle_by_name(name).ok_or_else(|| {
        Error::InvalidConfiguration(format!("unknown oracle backend '{name}'"))
    })?;
    if noise == 0.0 {
        Ok(inner)
    } else {
        Ok(Box::new(NoisyChannel::new(inner, noise)?))
    }
}

/// Parse a sifting rule string into the enum.
pub fn parse_sifting(s: &str) -> SiftingRule {
    match s {
        "index" | "idx" => SiftingRule::IndexMatch,
        "correlation" | "corr" => SiftingRule::PerfectCorrelation,
        _ => {
            eprintln!("Unknown sifting rule '{s}', using index");
            SiftingRule::IndexMatch
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // -----------------------------------------------------------------------
    // parse_sifting tests
    // -----------------------------------------------------------------------

    #[test]
    fn test_parse_index_variants() {
        assert_eq!(parse_sifting("index"), SiftingRule::IndexMatch);
        assert_eq!(parse_sifting("idx"), SiftingRule::IndexMatch);
    }

    #[test]
    fn test_parse_correlation_variants() {
        assert_eq!(parse_sifting("correlation"), SiftingRule::PerfectCorrelation);
        assert_eq!(parse_sifting("corr"), SiftingRule::PerfectCorrelation);
    }

    #[test]
    fn test_parse_unknown_defaults_index() {
        assert_eq!(parse_sifting("unknown"), SiftingRule::IndexMatch);
        assert_eq!(parse_sifting(""), SiftingRule::IndexMatch);
        assert_eq!(parse_sifting("INDEX"), SiftingRule::IndexMatch); // case-sensitive
    }

    // -----------------------------------------------------------------------
    // make_oracle tests
    // -----------------------------------------------------------------------

    #[test]
    fn test_make_oracle_by_name() {
        let oracle = make_oracle("born_rule", 0.0).unwrap();
        assert_eq!(oracle.name(), "born_rule");
    }

    #[test]
    fn test_make_oracle_unknown_name() {
        assert!(make_oracle("aer_simulator", 0.0).is_err());
    }

    #[test]
    fn test_make_oracle_wraps_noise() {
        let oracle = make_oracle("state_vector", 0.1).unwrap();
        assert_eq!(oracle.name(), "noisy_channel");
    }

    #[test]
    fn test_make_oracle_rejects_bad_noise() {
        assert!(make_oracle("state_vector", 1.5).is_err());
        assert!(make_oracle("state_vector", -0.2).is_err());
    }
}
