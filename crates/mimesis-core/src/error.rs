//! Error Types
//!
//! The only user-visible failure of the engine is rejecting a configuration
//! before the first step runs. Everything that can go wrong numerically
//! during a run has a defined policy instead of an error.

/// Errors raised while loading or validating a run configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The configuration file is not valid TOML for [`SimConfig`](crate::SimConfig).
    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    /// A parameter is outside its admissible range.
    #[error("invalid {field} = {value}: expected {expected}")]
    OutOfRange {
        /// Name of the offending parameter
        field: &'static str,
        /// The rejected value, rendered for display
        value: String,
        /// Human-readable description of the admissible range
        expected: &'static str,
    },

    /// The supplied network does not match the configured population.
    #[error("network has {actual} nodes but the configuration asks for {expected} agents")]
    NetworkSizeMismatch {
        /// Configured `n_agents`
        expected: usize,
        /// Node count of the supplied network
        actual: usize,
    },
}

impl ConfigError {
    pub(crate) fn out_of_range(
        field: &'static str,
        value: impl std::fmt::Display,
        expected: &'static str,
    ) -> Self {
        ConfigError::OutOfRange {
            field,
            value: value.to_string(),
            expected,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_out_of_range_message() {
        let err = ConfigError::out_of_range("alpha", 1.5, "a value in [0, 1]");
        assert_eq!(err.to_string(), "invalid alpha = 1.5: expected a value in [0, 1]");
    }

    #[test]
    fn test_size_mismatch_message() {
        let err = ConfigError::NetworkSizeMismatch {
            expected: 50,
            actual: 3,
        };
        assert!(err.to_string().contains("3 nodes"));
    }
}
