//! Strategy configuration
//!
//! A single [`StrategyConfig`] object carries every tunable of the decision
//! engine. All options have defaults, so `StrategyConfig::default()` is a
//! complete, valid configuration. Partial YAML documents only override the
//! keys they mention.
//!
//! ```rust
//! use pitwall_strategy::StrategyConfig;
//!
//! let config = StrategyConfig::from_yaml_str("rolling_window_laps: 8\ncaution_max_position_loss: 3\n").unwrap();
//! assert_eq!(config.rolling_window_laps, 8);
//! assert_eq!(config.urgency_weights.fuel, 0.5);
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{Result, StrategyError};

/// Weights of the urgency sub-scores (w1, w2, w3).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
#[serde(default)]
pub struct UrgencyWeights {
    pub fuel: f64,
    pub tire: f64,
    pub position: f64,
}

impl Default for UrgencyWeights {
    fn default() -> Self {
        Self { fuel: 0.5, tire: 0.3, position: 0.2 }
    }
}

/// Lower bounds of the MONITOR, PIT_WINDOW_OPENING and PIT_NOW bands.
///
/// Urgency below `stay_out` recommends staying out; at or above `pit_opening`
/// the recommendation is to pit immediately.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
#[serde(default)]
pub struct UrgencyThresholds {
    pub stay_out: f64,
    pub monitor: f64,
    pub pit_opening: f64,
}

impl Default for UrgencyThresholds {
    fn default() -> Self {
        Self { stay_out: 0.3, monitor: 0.6, pit_opening: 0.85 }
    }
}

/// Configuration for the whole decision engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
#[serde(default)]
pub struct StrategyConfig {
    /// Laps in the rolling pace window
    pub rolling_window_laps: usize,
    /// Laps of fuel below which the fuel sub-score starts rising
    pub fuel_safety_margin_laps: f64,
    pub urgency_weights: UrgencyWeights,
    pub urgency_thresholds: UrgencyThresholds,
    /// Fraction of the pit-stop time cost removed while a caution is out
    pub caution_pit_discount: f64,
    /// Maximum places a caution stop may cost before PIT_NOW is withheld
    pub caution_max_position_loss: u32,
    /// Predictions below this confidence are reported but not scored
    pub min_prediction_confidence: f64,

    /// Fuel burn used when no stint data exists; `None` makes empty history an error
    pub default_fuel_pct_per_lap: Option<f64>,
    /// Per-vehicle fuel burn overriding `default_fuel_pct_per_lap`
    pub vehicle_fuel_pct_per_lap: BTreeMap<String, f64>,
    /// Tire wear per lap used to project tire state
    pub default_tire_deg_pct_per_lap: f64,
    pub race_length_laps: u32,
    /// Cars classified in the race, used for position percentile
    pub field_size: u32,
    /// Green-flag time lost to a pit stop
    pub pit_loss_seconds: f64,
    /// Fewer laps of fuel than this forces PIT_NOW
    pub critical_fuel_laps: f64,
    /// Fuel/tire sub-score gap that marks the factors as disagreeing
    pub factor_disagreement: f64,
    /// Degradation slope (ms per lap) that doubles tire risk
    pub reference_deg_slope_ms: f64,
    /// Scale of the prediction blend weight at confidence 1.0
    pub prediction_blend_weight: f64,
    pub pit_window_lookahead_laps: u32,
    pub min_training_samples: usize,
    pub min_stint_laps_for_slope: usize,
    /// Laps of delay assessed by the pit-window-risk model
    pub pit_risk_delay_laps: u32,
    pub caution_free_stop_fuel_pct: f64,
    pub caution_free_stop_tire_pct: f64,
    pub caution_recovery_position: u32,
    pub caution_recovery_gap_seconds: f64,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            rolling_window_laps: 5,
            fuel_safety_margin_laps: 5.0,
            urgency_weights: UrgencyWeights::default(),
            urgency_thresholds: UrgencyThresholds::default(),
            caution_pit_discount: 0.6,
            caution_max_position_loss: 2,
            min_prediction_confidence: 0.5,
            default_fuel_pct_per_lap: Some(5.0),
            vehicle_fuel_pct_per_lap: BTreeMap::new(),
            default_tire_deg_pct_per_lap: 4.0,
            race_length_laps: 20,
            field_size: 31,
            pit_loss_seconds: 30.0,
            critical_fuel_laps: 1.0,
            factor_disagreement: 0.4,
            reference_deg_slope_ms: 500.0,
            prediction_blend_weight: 0.5,
            pit_window_lookahead_laps: 5,
            min_training_samples: 10,
            min_stint_laps_for_slope: 3,
            pit_risk_delay_laps: 3,
            caution_free_stop_fuel_pct: 40.0,
            caution_free_stop_tire_pct: 70.0,
            caution_recovery_position: 10,
            caution_recovery_gap_seconds: 30.0,
        }
    }
}

impl StrategyConfig {
    /// Parse and validate a YAML document.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: StrategyConfig = serde_yaml_ng::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a YAML file.
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        debug!(path = %path.display(), "Loading strategy configuration");
        let yaml = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&yaml)
    }

    /// Fuel burn assumed for `vehicle_id` when its stint gives no measurement.
    pub fn default_fuel_rate_for(&self, vehicle_id: &str) -> Option<f64> {
        self.vehicle_fuel_pct_per_lap.get(vehicle_id).copied().or(self.default_fuel_pct_per_lap)
    }

    /// Reject inconsistent option combinations.
    pub fn validate(&self) -> Result<()> {
        let t = &self.urgency_thresholds;
        if !(0.0 < t.stay_out && t.stay_out < t.monitor && t.monitor < t.pit_opening && t.pit_opening <= 1.0)
        {
            return Err(StrategyError::config(format!(
                "urgency thresholds must satisfy 0 < stay_out < monitor < pit_opening <= 1, got ({}, {}, {})",
                t.stay_out, t.monitor, t.pit_opening
            )));
        }

        let w = &self.urgency_weights;
        if [w.fuel, w.tire, w.position].iter().any(|v| !v.is_finite() || *v < 0.0) {
            return Err(StrategyError::config("urgency weights must be finite and non-negative"));
        }
        if w.fuel + w.tire + w.position <= 0.0 {
            return Err(StrategyError::config("urgency weights must not all be zero"));
        }

        if !(0.0..=1.0).contains(&self.min_prediction_confidence) {
            return Err(StrategyError::config("min_prediction_confidence must be within [0, 1]"));
        }
        if !(0.0..1.0).contains(&self.caution_pit_discount) {
            return Err(StrategyError::config("caution_pit_discount must be within [0, 1)"));
        }
        if self.rolling_window_laps == 0 {
            return Err(StrategyError::config("rolling_window_laps must be at least 1"));
        }
        if self.fuel_safety_margin_laps <= 0.0 {
            return Err(StrategyError::config("fuel_safety_margin_laps must be positive"));
        }
        if let Some(rate) = self.default_fuel_pct_per_lap {
            if !rate.is_finite() || rate <= 0.0 {
                return Err(StrategyError::config("default_fuel_pct_per_lap must be positive"));
            }
        }
        if let Some((vehicle_id, _)) =
            self.vehicle_fuel_pct_per_lap.iter().find(|(_, rate)| !rate.is_finite() || **rate <= 0.0)
        {
            return Err(StrategyError::config(format!(
                "vehicle_fuel_pct_per_lap for '{vehicle_id}' must be positive"
            )));
        }
        if self.race_length_laps == 0 || self.field_size == 0 {
            return Err(StrategyError::config("race_length_laps and field_size must be positive"));
        }
        if self.reference_deg_slope_ms <= 0.0 {
            return Err(StrategyError::config("reference_deg_slope_ms must be positive"));
        }
        if self.min_stint_laps_for_slope < 2 {
            return Err(StrategyError::config("min_stint_laps_for_slope must be at least 2"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = StrategyConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.urgency_weights, UrgencyWeights { fuel: 0.5, tire: 0.3, position: 0.2 });
        assert_eq!(config.urgency_thresholds.monitor, 0.6);
        assert_eq!(config.min_prediction_confidence, 0.5);
    }

    #[test]
    fn empty_yaml_yields_defaults() {
        assert_eq!(StrategyConfig::from_yaml_str("  \n").unwrap(), StrategyConfig::default());
    }

    #[test]
    fn partial_yaml_overrides_only_named_keys() {
        let yaml = "urgency_weights:\n  fuel: 0.6\nurgency_thresholds:\n  pit_opening: 0.9\ndefault_fuel_pct_per_lap: null\n";
        let config = StrategyConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(config.urgency_weights.fuel, 0.6);
        assert_eq!(config.urgency_weights.tire, 0.3);
        assert_eq!(config.urgency_thresholds.pit_opening, 0.9);
        assert_eq!(config.urgency_thresholds.stay_out, 0.3);
        assert_eq!(config.default_fuel_pct_per_lap, None);
    }

    #[test]
    fn out_of_order_thresholds_rejected() {
        let yaml = "urgency_thresholds:\n  stay_out: 0.7\n  monitor: 0.6\n  pit_opening: 0.85\n";
        let err = StrategyConfig::from_yaml_str(yaml).unwrap_err();
        assert!(matches!(err, StrategyError::Config { .. }));
    }

    #[test]
    fn malformed_yaml_is_config_error() {
        let err = StrategyConfig::from_yaml_str("rolling_window_laps: [").unwrap_err();
        assert!(matches!(err, StrategyError::Config { source: Some(_), .. }));
    }

    #[test]
    fn invalid_ranges_rejected() {
        let config = StrategyConfig { caution_pit_discount: 1.0, ..Default::default() };
        assert!(config.validate().is_err());

        let config = StrategyConfig { min_prediction_confidence: 1.5, ..Default::default() };
        assert!(config.validate().is_err());

        let config = StrategyConfig { rolling_window_laps: 0, ..Default::default() };
        assert!(config.validate().is_err());

        let config = StrategyConfig { default_fuel_pct_per_lap: Some(0.0), ..Default::default() };
        assert!(config.validate().is_err());
    }

    #[test]
    fn per_vehicle_fuel_rate_overrides_the_default() {
        let yaml = "default_fuel_pct_per_lap: 5.0\nvehicle_fuel_pct_per_lap:\n  car-7: 3.2\n";
        let config = StrategyConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(config.default_fuel_rate_for("car-7"), Some(3.2));
        assert_eq!(config.default_fuel_rate_for("car-8"), Some(5.0));

        let mut config = StrategyConfig { default_fuel_pct_per_lap: None, ..Default::default() };
        assert_eq!(config.default_fuel_rate_for("car-7"), None);
        config.vehicle_fuel_pct_per_lap.insert("car-7".to_string(), -1.0);
        assert!(matches!(config.validate(), Err(StrategyError::Config { .. })));
    }

    #[test]
    fn missing_file_is_config_error() {
        let err = StrategyConfig::from_yaml_file("/nonexistent/strategy.yaml").unwrap_err();
        assert!(matches!(err, StrategyError::Config { .. }));
    }
}
