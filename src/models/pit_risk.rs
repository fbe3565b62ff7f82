//! Risk of delaying a pit stop by K laps

use tracing::debug;

use super::{PredictiveModel, check_vehicle};
use crate::config::StrategyConfig;
use crate::features::FeatureVector;
use crate::types::{ModelKind, Prediction, PredictionFlag};
use crate::{Result, StrategyError};

/// Spread of the fuel-out logistic, in laps of fuel
const FUEL_SPREAD_LAPS: f64 = 0.5;
/// Spread of the tire-failure logistic, in percentage points of wear
const TIRE_SPREAD_PCT: f64 = 5.0;
/// Slope standard error (ms/lap) at which confidence halves
const SLOPE_NOISE_MS: f64 = 100.0;

/// Probability that staying out `delay_laps` more laps ends in a fuel-out or
/// tire failure.
#[derive(Debug, Clone)]
pub struct PitWindowRiskModel {
    delay_laps: u32,
    tire_deg_pct_per_lap: f64,
    reference_slope_ms: f64,
    min_stint_laps: usize,
}

impl PitWindowRiskModel {
    pub fn new(delay_laps: u32, config: &StrategyConfig) -> Self {
        Self {
            delay_laps,
            tire_deg_pct_per_lap: config.default_tire_deg_pct_per_lap,
            reference_slope_ms: config.reference_deg_slope_ms,
            min_stint_laps: config.min_stint_laps_for_slope,
        }
    }

    /// Model assessing the configured `pit_risk_delay_laps`.
    pub fn from_config(config: &StrategyConfig) -> Self {
        Self::new(config.pit_risk_delay_laps, config)
    }

    pub fn delay_laps(&self) -> u32 {
        self.delay_laps
    }

    fn fuel_out_probability(&self, fuel_pct: f64, rate: f64) -> f64 {
        let margin_pct = fuel_pct - rate * self.delay_laps as f64;
        let spread = (rate * FUEL_SPREAD_LAPS).max(f64::EPSILON);
        logistic(-margin_pct / spread)
    }

    fn tire_failure_probability(&self, features: &FeatureVector) -> f64 {
        let slope = features.tire_deg_slope_ms.unwrap_or(0.0).max(0.0);
        let wear_per_lap = self.tire_deg_pct_per_lap
            * features.degradation_factor
            * (1.0 + slope / self.reference_slope_ms);
        let projected = features.tire_deg_pct + wear_per_lap * self.delay_laps as f64;
        logistic((projected - 100.0) / TIRE_SPREAD_PCT)
    }
}

impl PredictiveModel for PitWindowRiskModel {
    fn kind(&self) -> ModelKind {
        ModelKind::PitWindowRisk
    }

    fn predict(&self, features: &FeatureVector, vehicle_id: &str) -> Result<Prediction> {
        check_vehicle(self.kind(), features, vehicle_id)?;
        let Some(rate) = features.fuel_pct_per_lap else {
            return Err(StrategyError::insufficient_data(
                vehicle_id,
                "pit-window risk needs a fuel burn estimate",
            ));
        };

        let p_fuel = self.fuel_out_probability(features.fuel_pct, rate);
        let p_tire = self.tire_failure_probability(features);
        let risk = (1.0 - (1.0 - p_fuel) * (1.0 - p_tire)).clamp(0.0, 1.0);

        let stable_slope = features
            .tire_deg_slope_stderr_ms
            .filter(|stderr| stderr.is_finite() && features.stint_laps >= self.min_stint_laps);
        let prediction = match stable_slope {
            Some(stderr) => Prediction::new(risk, 1.0 / (1.0 + stderr / SLOPE_NOISE_MS)),
            None => Prediction::unreliable(risk, PredictionFlag::LowSample),
        };

        debug!(
            vehicle_id,
            delay_laps = self.delay_laps,
            p_fuel,
            p_tire,
            confidence = prediction.confidence,
            "Pit-window risk prediction"
        );
        Ok(prediction)
    }
}

fn logistic(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}
