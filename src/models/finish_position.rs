//! Finish-position regression on position, gap, laps remaining and pace trend

use tracing::debug;

use super::regression::LinearFit;
use super::{PredictiveModel, TrainingSet, check_vehicle, clamp_prediction};
use crate::config::StrategyConfig;
use crate::features::FeatureVector;
use crate::types::{ModelKind, Prediction, PredictionFlag};
use crate::{Result, StrategyError};

/// Confidence lost at the very start of the race relative to the final lap.
const HORIZON_DISCOUNT: f64 = 0.3;

/// Predicts the final classified position.
#[derive(Debug, Clone)]
pub struct FinishPositionModel {
    fit: Option<LinearFit>,
    race_length_laps: u32,
    field_size: u32,
}

impl FinishPositionModel {
    pub fn untrained(config: &StrategyConfig) -> Self {
        Self { fit: None, race_length_laps: config.race_length_laps, field_size: config.field_size }
    }

    pub fn train(set: &TrainingSet, config: &StrategyConfig) -> Result<Self> {
        let rows: Vec<Vec<f64>> = set.finish.iter().map(|s| s.inputs()).collect();
        let targets: Vec<f64> = set.finish.iter().map(|s| s.final_position).collect();
        let fit =
            LinearFit::train(ModelKind::FinishPosition, &rows, &targets, config.min_training_samples)?;
        Ok(Self { fit: Some(fit), ..Self::untrained(config) })
    }

    pub fn is_trained(&self) -> bool {
        self.fit.is_some()
    }

    fn laps_remaining(&self, features: &FeatureVector) -> Result<u32> {
        if features.lap_number > self.race_length_laps {
            return Err(StrategyError::invalid_state(
                "finish-position prediction",
                format!(
                    "lap {} is beyond the race length of {} laps",
                    features.lap_number, self.race_length_laps
                ),
            ));
        }
        let remaining = self.race_length_laps - features.lap_number;
        if remaining == 0 {
            return Err(StrategyError::invalid_state(
                "finish-position prediction",
                "no laps remaining",
            ));
        }
        Ok(remaining)
    }
}

impl PredictiveModel for FinishPositionModel {
    fn kind(&self) -> ModelKind {
        ModelKind::FinishPosition
    }

    fn predict(&self, features: &FeatureVector, vehicle_id: &str) -> Result<Prediction> {
        check_vehicle(self.kind(), features, vehicle_id)?;
        let remaining = self.laps_remaining(features)?;

        let Some(fit) = &self.fit else {
            return Ok(Prediction::unreliable(features.position as f64, PredictionFlag::ColdStart));
        };

        let inputs = [
            features.position as f64,
            features.gap_to_leader_seconds,
            remaining as f64,
            features.pace_trend_ms.unwrap_or(0.0),
        ];
        let raw = fit.predict(&inputs);
        let horizon = 1.0 - HORIZON_DISCOUNT * remaining as f64 / self.race_length_laps as f64;
        let confidence = fit.confidence(&inputs) * horizon;
        debug!(
            vehicle_id,
            raw,
            confidence,
            remaining,
            samples = fit.sample_count(),
            "Finish-position prediction"
        );

        let mut prediction = clamp_prediction(
            Prediction::new(raw, confidence),
            1.0,
            self.field_size.max(features.position) as f64,
        );
        if features.pace_trend_ms.is_none() {
            prediction = prediction.with_flag(PredictionFlag::LowSample);
        }
        Ok(prediction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::FeatureBuilder;
    use crate::test_utils::{degrading_history, finish_training_set, state_at};
    use crate::types::VehicleState;

    fn features(state: &VehicleState) -> FeatureVector {
        let history = degrading_history(&state.vehicle_id, 8, 150_000, 0);
        FeatureBuilder::new(&StrategyConfig::default()).build(state, &history, None).unwrap()
    }

    #[test]
    fn lap_beyond_race_length_is_invalid_state() {
        let model = FinishPositionModel::untrained(&StrategyConfig::default());
        let state = state_at("car", 25, 40.0, 30.0);
        let err = model.predict(&features(&state), "car").unwrap_err();
        assert!(matches!(err, StrategyError::InvalidState { .. }));
    }

    #[test]
    fn final_lap_has_no_prediction() {
        let model = FinishPositionModel::untrained(&StrategyConfig::default());
        let state = state_at("car", 20, 40.0, 30.0);
        assert!(model.predict(&features(&state), "car").is_err());
    }

    #[test]
    fn cold_start_echoes_position_with_zero_confidence() {
        let model = FinishPositionModel::untrained(&StrategyConfig::default());
        let state = state_at("car", 9, 60.0, 30.0);
        let prediction = model.predict(&features(&state), "car").unwrap();
        assert_eq!(prediction.value, 5.0);
        assert_eq!(prediction.confidence, 0.0);
        assert!(prediction.has_flag(PredictionFlag::ColdStart));
    }

    #[test]
    fn trained_model_tracks_current_position() {
        let config = StrategyConfig::default();
        let model = FinishPositionModel::train(&finish_training_set(200), &config).unwrap();
        assert!(model.is_trained());
        let state = VehicleState::new("car", 10, 60.0, 30.0, 15, 30.0);
        let prediction = model.predict(&features(&state), "car").unwrap();
        assert!(prediction.value >= 1.0 && prediction.value <= config.field_size as f64);
        assert!(prediction.confidence > 0.0 && prediction.confidence <= 1.0);
    }
}
