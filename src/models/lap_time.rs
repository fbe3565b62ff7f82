//! Lap-time regression on fuel load, tire wear and rolling pace

use tracing::debug;

use super::regression::LinearFit;
use super::{PredictiveModel, TrainingSet, check_vehicle, clamp_prediction};
use crate::config::StrategyConfig;
use crate::features::FeatureVector;
use crate::types::{ModelKind, Prediction, PredictionFlag};
use crate::{Result, StrategyError};

/// Predicted lap time never drops below this fraction of rolling pace.
const MIN_PACE_FRACTION: f64 = 0.95;

/// Predicts the next lap time in milliseconds.
#[derive(Debug, Clone, Default)]
pub struct LapTimeModel {
    fit: Option<LinearFit>,
}

impl LapTimeModel {
    /// A cold-start model; every prediction carries confidence 0.
    pub fn untrained() -> Self {
        Self { fit: None }
    }

    /// Fit on the lap-time samples of `set`.
    pub fn train(set: &TrainingSet, config: &StrategyConfig) -> Result<Self> {
        let rows: Vec<Vec<f64>> = set.lap_time.iter().map(|s| s.inputs()).collect();
        let targets: Vec<f64> = set.lap_time.iter().map(|s| s.lap_time_ms).collect();
        let fit = LinearFit::train(ModelKind::LapTime, &rows, &targets, config.min_training_samples)?;
        Ok(Self { fit: Some(fit) })
    }

    pub fn is_trained(&self) -> bool {
        self.fit.is_some()
    }
}

impl PredictiveModel for LapTimeModel {
    fn kind(&self) -> ModelKind {
        ModelKind::LapTime
    }

    fn predict(&self, features: &FeatureVector, vehicle_id: &str) -> Result<Prediction> {
        check_vehicle(self.kind(), features, vehicle_id)?;
        let Some(rolling_mean) = features.rolling_mean_lap_ms else {
            return Err(StrategyError::insufficient_data(
                vehicle_id,
                "lap-time prediction needs at least one valid lap",
            ));
        };

        let Some(fit) = &self.fit else {
            return Ok(Prediction::unreliable(rolling_mean, PredictionFlag::ColdStart));
        };

        let inputs = [features.fuel_pct, features.tire_deg_pct, rolling_mean];
        let raw = fit.predict(&inputs);
        let confidence = fit.confidence(&inputs);
        debug!(vehicle_id, raw, confidence, rmse = fit.rmse, "Lap-time prediction");

        let prediction = clamp_prediction(
            Prediction::new(raw, confidence),
            rolling_mean * MIN_PACE_FRACTION,
            f64::INFINITY,
        );
        Ok(prediction)
    }
}
