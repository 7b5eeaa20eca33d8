//! Session configuration
//!
//! Loads an optional TOML file; every field has a default so an absent
//! file yields the built-in scenario (budget 500, reservation 350, 100 units).

use crate::error::{NegotiationError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Root configuration structure
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Protocol constants
    #[serde(default)]
    pub protocol: NegotiationConfig,

    /// Concession behaviour of the built-in strategies
    #[serde(default)]
    pub strategy: StrategyConfig,

    /// Party constraints and traded quantity
    #[serde(default)]
    pub scenario: ScenarioConfig,
}

/// Protocol constants, fixed for the lifetime of one session
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NegotiationConfig {
    /// Hard limit on negotiation rounds (mediator rounds included)
    #[serde(default = "default_max_rounds")]
    pub max_rounds: u32,

    /// Rounds of negligible movement before a stalemate is declared
    #[serde(default = "default_stalemate_round_threshold")]
    pub stalemate_round_threshold: u32,

    /// Relative price change under which a party counts as stalled
    #[serde(default = "default_stalemate_price_epsilon")]
    pub stalemate_price_epsilon: f64,
}

fn default_max_rounds() -> u32 {
    10
}

fn default_stalemate_round_threshold() -> u32 {
    5
}

fn default_stalemate_price_epsilon() -> f64 {
    0.02
}

impl Default for NegotiationConfig {
    fn default() -> Self {
        Self {
            max_rounds: default_max_rounds(),
            stalemate_round_threshold: default_stalemate_round_threshold(),
            stalemate_price_epsilon: default_stalemate_price_epsilon(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StrategyConfig {
    /// Fraction of the remaining gap conceded each round
    #[serde(default = "default_concession_rate")]
    pub concession_rate: f64,

    /// Buyer opens at `max_budget * (1 - discount)`
    #[serde(default = "default_buyer_opening_discount")]
    pub buyer_opening_discount: f64,

    /// Seller opens at `reservation_price * (1 + markup)`
    #[serde(default = "default_seller_opening_markup")]
    pub seller_opening_markup: f64,

    /// Relative distance to the counterpart at which an offer turns final
    #[serde(default = "default_convergence_tolerance")]
    pub convergence_tolerance: f64,
}

fn default_concession_rate() -> f64 {
    0.25
}

fn default_buyer_opening_discount() -> f64 {
    0.26
}

fn default_seller_opening_markup() -> f64 {
    0.40
}

fn default_convergence_tolerance() -> f64 {
    0.01
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            concession_rate: default_concession_rate(),
            buyer_opening_discount: default_buyer_opening_discount(),
            seller_opening_markup: default_seller_opening_markup(),
            convergence_tolerance: default_convergence_tolerance(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScenarioConfig {
    /// Highest unit price the buyer will pay
    #[serde(default = "default_max_budget")]
    pub max_budget: f64,

    /// Lowest unit price the seller will accept
    #[serde(default = "default_reservation_price")]
    pub reservation_price: f64,

    /// Resource units under negotiation
    #[serde(default = "default_quantity")]
    pub quantity: u32,
}

fn default_max_budget() -> f64 {
    500.0
}

fn default_reservation_price() -> f64 {
    350.0
}

fn default_quantity() -> u32 {
    100
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            max_budget: default_max_budget(),
            reservation_price: default_reservation_price(),
            quantity: default_quantity(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file and validate it
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            NegotiationError::Configuration(format!("cannot read {}: {}", path.display(), e))
        })?;
        let config: Self = toml::from_str(&content)?;
        config.validate()?;

        tracing::debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Reject values the protocol cannot run with.
    ///
    /// `reservation_price > max_budget` passes: an infeasible zone is a
    /// reportable session outcome, not a configuration fault.
    pub fn validate(&self) -> Result<()> {
        let protocol = &self.protocol;
        if protocol.max_rounds == 0 {
            return Err(NegotiationError::InvalidConfig(
                "protocol.max_rounds must be at least 1".to_string(),
            ));
        }
        if protocol.stalemate_round_threshold < 2 {
            return Err(NegotiationError::InvalidConfig(
                "protocol.stalemate_round_threshold must be at least 2".to_string(),
            ));
        }
        check_fraction("protocol.stalemate_price_epsilon", protocol.stalemate_price_epsilon)?;

        let strategy = &self.strategy;
        check_fraction("strategy.concession_rate", strategy.concession_rate)?;
        check_fraction("strategy.buyer_opening_discount", strategy.buyer_opening_discount)?;
        check_fraction("strategy.convergence_tolerance", strategy.convergence_tolerance)?;
        if !(strategy.seller_opening_markup.is_finite() && strategy.seller_opening_markup > 0.0) {
            return Err(NegotiationError::InvalidConfig(
                "strategy.seller_opening_markup must be positive".to_string(),
            ));
        }

        let scenario = &self.scenario;
        if !(scenario.max_budget.is_finite() && scenario.max_budget > 0.0) {
            return Err(NegotiationError::InvalidConfig(
                "scenario.max_budget must be positive".to_string(),
            ));
        }
        if !(scenario.reservation_price.is_finite() && scenario.reservation_price > 0.0) {
            return Err(NegotiationError::InvalidConfig(
                "scenario.reservation_price must be positive".to_string(),
            ));
        }
        if scenario.quantity == 0 {
            return Err(NegotiationError::InvalidConfig(
                "scenario.quantity must be at least 1".to_string(),
            ));
        }

        Ok(())
    }

    /// Render the default configuration as TOML
    pub fn default_toml() -> Result<String> {
        toml::to_string_pretty(&Self::default())
            .map_err(|e| NegotiationError::Internal(format!("cannot render config: {}", e)))
    }
}

fn check_fraction(name: &str, value: f64) -> Result<()> {
    if value > 0.0 && value < 1.0 {
        Ok(())
    } else {
        Err(NegotiationError::InvalidConfig(format!(
            "{} must lie strictly between 0 and 1, got {}",
            name, value
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.protocol.max_rounds, 10);
        assert_eq!(config.protocol.stalemate_round_threshold, 5);
        assert_eq!(config.protocol.stalemate_price_epsilon, 0.02);
        assert_eq!(config.scenario.max_budget, 500.0);
        assert_eq!(config.scenario.reservation_price, 350.0);
        assert_eq!(config.scenario.quantity, 100);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_default_toml_roundtrip() {
        let toml_str = AppConfig::default_toml().unwrap();
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed, AppConfig::default());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let toml_str = r#"
[scenario]
max_budget = 600.0

[protocol]
max_rounds = 12
"#;
        let config: AppConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.scenario.max_budget, 600.0);
        assert_eq!(config.scenario.reservation_price, 350.0);
        assert_eq!(config.protocol.max_rounds, 12);
        assert_eq!(config.protocol.stalemate_round_threshold, 5);
        assert_eq!(config.strategy, StrategyConfig::default());
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let mut config = AppConfig::default();
        config.protocol.max_rounds = 0;
        assert!(matches!(
            config.validate(),
            Err(NegotiationError::InvalidConfig(_))
        ));

        let mut config = AppConfig::default();
        config.strategy.concession_rate = 1.5;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.scenario.quantity = 0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.scenario.max_budget = -1.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_infeasible_zone_is_valid_config() {
        let mut config = AppConfig::default();
        config.scenario.reservation_price = 500.0;
        config.scenario.max_budget = 350.0;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[scenario]\nquantity = 250").unwrap();

        let config = AppConfig::load_from(file.path()).unwrap();
        assert_eq!(config.scenario.quantity, 250);
    }

    #[test]
    fn test_load_from_missing_file() {
        let result = AppConfig::load_from(Path::new("/nonexistent/accord.toml"));
        assert!(matches!(result, Err(NegotiationError::Configuration(_))));
    }

    #[test]
    fn test_load_from_malformed_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[scenario\nquantity = ").unwrap();

        let result = AppConfig::load_from(file.path());
        assert!(matches!(result, Err(NegotiationError::Toml(_))));
    }
}
