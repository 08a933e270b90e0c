//! Configuration System
//!
//! Run parameters, mechanism selection, and TOML loading. A configuration is
//! validated once before a run is constructed and never changes afterwards.

use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use crate::error::ConfigError;
use crate::setup::TopologyConfig;

/// Default configuration file path
pub const DEFAULT_CONFIG_PATH: &str = "scapegoat.toml";

/// How rivalry turns into fresh aggression each step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceMode {
    /// Shared desire for rivalrous objects
    Object,
    /// Proximity in status, biased toward higher-status neighbors
    Status,
}

/// How perceived neighborhood hostility is absorbed into an agent's aggression
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SpreadMode {
    /// Imitate perceived hostility in direct proportion
    Linear,
    /// Sharpen by the salience exponent, then rescale to conserve throughput
    Convex,
    /// Sharpen without rescaling (ablation only)
    RawPower,
    /// Sharpen and multiply by a fixed constant (ablation only)
    FixedScale { scale: f64 },
}

impl SpreadMode {
    /// True for every mode that applies the salience exponent
    pub fn is_convex_family(&self) -> bool {
        !matches!(self, SpreadMode::Linear)
    }
}

/// The four production mechanisms: source axis x spread axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Variant {
    /// Object rivalry, linear spread
    LM,
    /// Object rivalry, convex redistribution
    AC,
    /// Status rivalry, linear spread
    RL,
    /// Status rivalry, convex redistribution
    RA,
}

impl Variant {
    pub const ALL: [Variant; 4] = [Variant::LM, Variant::AC, Variant::RL, Variant::RA];

    pub fn source(&self) -> SourceMode {
        match self {
            Variant::LM | Variant::AC => SourceMode::Object,
            Variant::RL | Variant::RA => SourceMode::Status,
        }
    }

    pub fn spread(&self) -> SpreadMode {
        match self {
            Variant::LM | Variant::RL => SpreadMode::Linear,
            Variant::AC | Variant::RA => SpreadMode::Convex,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Variant::LM => "LM",
            Variant::AC => "AC",
            Variant::RL => "RL",
            Variant::RA => "RA",
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Variant {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "lm" | "object-linear" => Ok(Variant::LM),
            "ac" | "object-convex" => Ok(Variant::AC),
            "rl" | "status-linear" => Ok(Variant::RL),
            "ra" | "status-convex" => Ok(Variant::RA),
            other => Err(format!(
                "unknown variant '{}', expected one of LM, AC, RL, RA",
                other
            )),
        }
    }
}

/// Stop once modal agreement has been held for a number of steps
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EarlyStopConfig {
    pub modal_threshold: f64,
    pub consecutive_steps: usize,
}

impl Default for EarlyStopConfig {
    fn default() -> Self {
        Self {
            modal_threshold: mimesis_events::DEFAULT_CONVERGENCE_THRESHOLD,
            consecutive_steps: mimesis_events::DEFAULT_CONSECUTIVE_STEPS,
        }
    }
}

/// Complete parameter set for one run
#[derive(Resource, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    // Network
    pub n_agents: usize,
    pub topology: TopologyConfig,

    // Objects and desire
    pub n_objects: usize,
    /// The first `n_rivalrous` objects are rivalrous
    pub n_rivalrous: usize,
    pub desire_init_max: f64,
    pub desire_noise: f64,

    // Core dynamics
    /// Retention weight, shared by the desire and spread updates
    pub alpha: f64,
    pub rivalry_to_aggression: f64,
    pub aggression_decay: f64,
    /// `None` disables expulsion
    pub expulsion_threshold: Option<f64>,

    // Convex spread
    pub salience_exponent: f64,

    // Status rivalry
    pub rivalry_intensity: f64,
    pub sigma_status: f64,
    pub beta_up: f64,
    pub c_status: f64,
    pub status_init_low: f64,
    pub status_init_high: f64,
    pub status_loss_rate: f64,
    pub status_floor: f64,

    // Mechanism
    pub source: SourceMode,
    pub spread: SpreadMode,

    // Run control
    pub n_steps: u64,
    pub record_history: bool,
    pub early_stop: Option<EarlyStopConfig>,
    pub seed: u64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            n_agents: 50,
            topology: TopologyConfig::default(),
            n_objects: 8,
            n_rivalrous: 5,
            desire_init_max: 0.3,
            desire_noise: 0.02,
            alpha: 0.15,
            rivalry_to_aggression: 0.2,
            aggression_decay: 0.03,
            expulsion_threshold: Some(8.0),
            salience_exponent: 2.0,
            rivalry_intensity: 0.15,
            sigma_status: 0.10,
            beta_up: 1.0,
            c_status: 0.5,
            status_init_low: 0.4,
            status_init_high: 0.6,
            status_loss_rate: 0.005,
            status_floor: 1e-12,
            source: SourceMode::Object,
            spread: SpreadMode::Convex,
            n_steps: 600,
            record_history: true,
            early_stop: None,
            seed: 42,
        }
    }
}

impl SimConfig {
    /// Default parameters with the mechanism of a canonical variant
    pub fn for_variant(variant: Variant) -> Self {
        Self::default().with_variant(variant)
    }

    pub fn with_variant(mut self, variant: Variant) -> Self {
        self.source = variant.source();
        self.spread = variant.spread();
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// The canonical variant, if the mechanism pair is one of the four
    pub fn variant(&self) -> Option<Variant> {
        Variant::ALL
            .into_iter()
            .find(|v| v.source() == self.source && v.spread() == self.spread)
    }

    pub fn uses_status(&self) -> bool {
        self.source == SourceMode::Status
    }

    /// Load configuration from a TOML file and validate it
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string and validate it
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: SimConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject any parameter combination the engine cannot run.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.n_agents < 2 {
            return Err(ConfigError::out_of_range("n_agents", self.n_agents, "at least 2"));
        }
        if self.n_objects == 0 {
            return Err(ConfigError::out_of_range("n_objects", self.n_objects, "at least 1"));
        }
        if self.n_rivalrous > self.n_objects {
            return Err(ConfigError::out_of_range(
                "n_rivalrous",
                self.n_rivalrous,
                "no more than n_objects",
            ));
        }

        unit_interval("alpha", self.alpha)?;
        unit_interval("aggression_decay", self.aggression_decay)?;
        positive("salience_exponent", self.salience_exponent)?;
        positive("sigma_status", self.sigma_status)?;
        positive("status_floor", self.status_floor)?;

        non_negative("desire_init_max", self.desire_init_max)?;
        non_negative("desire_noise", self.desire_noise)?;
        non_negative("rivalry_to_aggression", self.rivalry_to_aggression)?;
        non_negative("rivalry_intensity", self.rivalry_intensity)?;
        non_negative("beta_up", self.beta_up)?;
        non_negative("c_status", self.c_status)?;
        non_negative("status_loss_rate", self.status_loss_rate)?;

        unit_interval("status_init_low", self.status_init_low)?;
        unit_interval("status_init_high", self.status_init_high)?;
        if self.status_init_low > self.status_init_high {
            return Err(ConfigError::out_of_range(
                "status_init_low",
                self.status_init_low,
                "no greater than status_init_high",
            ));
        }

        if let Some(threshold) = self.expulsion_threshold {
            positive("expulsion_threshold", threshold)?;
        }

        if let SpreadMode::FixedScale { scale } = self.spread {
            positive("spread.scale", scale)?;
        }

        if let Some(early_stop) = self.early_stop {
            if !(early_stop.modal_threshold > 0.0 && early_stop.modal_threshold <= 1.0) {
                return Err(ConfigError::out_of_range(
                    "early_stop.modal_threshold",
                    early_stop.modal_threshold,
                    "a value in (0, 1]",
                ));
            }
            if early_stop.consecutive_steps == 0 {
                return Err(ConfigError::out_of_range(
                    "early_stop.consecutive_steps",
                    early_stop.consecutive_steps,
                    "at least 1",
                ));
            }
        }

        self.topology.validate(self.n_agents)
    }
}

fn unit_interval(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::out_of_range(field, value, "a value in [0, 1]"))
    }
}

fn positive(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::out_of_range(field, value, "a finite value > 0"))
    }
}

fn non_negative(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::out_of_range(field, value, "a finite value >= 0"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config_is_valid() {
        let config = SimConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.n_agents, 50);
        assert_eq!(config.variant(), Some(Variant::AC));
    }

    #[test]
    fn test_variant_axes() {
        assert_eq!(Variant::LM.source(), SourceMode::Object);
        assert_eq!(Variant::LM.spread(), SpreadMode::Linear);
        assert_eq!(Variant::RA.source(), SourceMode::Status);
        assert_eq!(Variant::RA.spread(), SpreadMode::Convex);

        for variant in Variant::ALL {
            let config = SimConfig::for_variant(variant);
            assert_eq!(config.variant(), Some(variant));
        }
    }

    #[test]
    fn test_variant_parsing() {
        assert_eq!("AC".parse::<Variant>().unwrap(), Variant::AC);
        assert_eq!("rl".parse::<Variant>().unwrap(), Variant::RL);
        assert_eq!("status-convex".parse::<Variant>().unwrap(), Variant::RA);
        assert!("XX".parse::<Variant>().is_err());
    }

    #[test]
    fn test_ablation_modes_have_no_variant() {
        let mut config = SimConfig::default();
        config.spread = SpreadMode::RawPower;
        assert_eq!(config.variant(), None);
        assert!(config.validate().is_ok());
        assert!(config.spread.is_convex_family());
        assert!(SpreadMode::FixedScale { scale: 2.0 }.is_convex_family());
        assert!(!SpreadMode::Linear.is_convex_family());
    }

    #[test]
    fn test_rejects_bad_parameters() {
        let cases: Vec<(&str, Box<dyn Fn(&mut SimConfig)>)> = vec![
            ("alpha", Box::new(|c: &mut SimConfig| c.alpha = 1.2)),
            ("alpha", Box::new(|c: &mut SimConfig| c.alpha = -0.1)),
            ("salience_exponent", Box::new(|c: &mut SimConfig| c.salience_exponent = 0.0)),
            ("n_agents", Box::new(|c: &mut SimConfig| c.n_agents = 1)),
            ("rivalry_to_aggression", Box::new(|c: &mut SimConfig| c.rivalry_to_aggression = -1.0)),
            ("aggression_decay", Box::new(|c: &mut SimConfig| c.aggression_decay = -0.01)),
            ("status_loss_rate", Box::new(|c: &mut SimConfig| c.status_loss_rate = -0.5)),
            ("desire_noise", Box::new(|c: &mut SimConfig| c.desire_noise = f64::NAN)),
            ("n_rivalrous", Box::new(|c: &mut SimConfig| c.n_rivalrous = 9)),
            ("expulsion_threshold", Box::new(|c: &mut SimConfig| c.expulsion_threshold = Some(0.0))),
            ("spread.scale", Box::new(|c: &mut SimConfig| c.spread = SpreadMode::FixedScale { scale: -2.0 })),
            ("status_init_low", Box::new(|c: &mut SimConfig| {
                c.status_init_low = 0.7;
                c.status_init_high = 0.6;
            })),
        ];

        for (field, mutate) in cases {
            let mut config = SimConfig::default();
            mutate(&mut config);
            match config.validate() {
                Err(ConfigError::OutOfRange { field: f, .. }) => assert_eq!(f, field),
                other => panic!("expected {} to be rejected, got {:?}", field, other),
            }
        }
    }

    #[test]
    fn test_rejects_bad_early_stop() {
        let mut config = SimConfig::default();
        config.early_stop = Some(EarlyStopConfig {
            modal_threshold: 0.9,
            consecutive_steps: 0,
        });
        assert!(config.validate().is_err());

        config.early_stop = Some(EarlyStopConfig {
            modal_threshold: 1.5,
            consecutive_steps: 5,
        });
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_parse_toml() {
        let toml = r#"
            n_agents = 20
            alpha = 0.3
            source = "status"
            expulsion_threshold = 12.5

            [spread]
            kind = "fixed_scale"
            scale = 1.5

            [topology]
            kind = "erdos_renyi"
            edge_probability = 0.2
        "#;

        let config = SimConfig::from_toml_str(toml).unwrap();
        assert_eq!(config.n_agents, 20);
        assert_eq!(config.source, SourceMode::Status);
        assert_eq!(config.spread, SpreadMode::FixedScale { scale: 1.5 });
        assert_eq!(config.expulsion_threshold, Some(12.5));
        // Unspecified fields keep their defaults
        assert_eq!(config.n_objects, 8);
    }

    #[test]
    fn test_parse_toml_rejects_invalid_values() {
        let result = SimConfig::from_toml_str("alpha = 2.0");
        assert!(matches!(result, Err(ConfigError::OutOfRange { field: "alpha", .. })));

        let result = SimConfig::from_toml_str("alpha = \"high\"");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_load_config_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "n_steps = 25").unwrap();
        writeln!(file, "seed = 7").unwrap();

        let config = SimConfig::load(file.path()).unwrap();
        assert_eq!(config.n_steps, 25);
        assert_eq!(config.seed, 7);
    }

    #[test]
    fn test_load_missing_file() {
        let result = SimConfig::load("/nonexistent/scapegoat.toml");
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }
}
