//! Predictive models
//!
//! Three independent regressors share one capability interface,
//! [`PredictiveModel`]: given a feature vector, return a [`Prediction`] with a
//! self-reported confidence. Models are read-only once built and safe to call
//! from many threads at once.
//!
//! | Model | Value | Confidence |
//! |-------|-------|------------|
//! | [`LapTimeModel`] | next lap time (ms) | local training density x R² |
//! | [`FinishPositionModel`] | final classified position | density x R² x horizon |
//! | [`PitWindowRiskModel`] | P(fuel-out or tire failure) in [0,1] | degradation slope stability |
//!
//! Untrained models never fabricate confidence: they answer with confidence 0
//! and a [`PredictionFlag::ColdStart`] flag.

mod finish_position;
mod lap_time;
mod pit_risk;
mod regression;
mod training;

pub use finish_position::FinishPositionModel;
pub use lap_time::LapTimeModel;
pub use pit_risk::PitWindowRiskModel;
pub use training::{FinishSample, LapTimeSample, TrainingSet};

use crate::features::FeatureVector;
use crate::types::{ModelKind, Prediction, PredictionFlag};
use crate::{Result, StrategyError};

/// Point-in-time prediction capability.
pub trait PredictiveModel: Send + Sync {
    /// Which quantity this model predicts.
    fn kind(&self) -> ModelKind;

    /// Predict for `vehicle_id` from its current features.
    ///
    /// Errors are recoverable at the optimizer boundary; a low-confidence
    /// answer is returned as a flagged [`Prediction`], not an error.
    fn predict(&self, features: &FeatureVector, vehicle_id: &str) -> Result<Prediction>;
}

/// Guard against feeding one vehicle's features to another's prediction.
fn check_vehicle(kind: ModelKind, features: &FeatureVector, vehicle_id: &str) -> Result<()> {
    if features.vehicle_id != vehicle_id {
        return Err(StrategyError::invalid_state(
            format!("{} prediction", kind),
            format!("features belong to {}, not {}", features.vehicle_id, vehicle_id),
        ));
    }
    Ok(())
}

/// Clamp `value` into `[lo, hi]`, flagging the prediction when it moved.
fn clamp_prediction(prediction: Prediction, lo: f64, hi: f64) -> Prediction {
    if prediction.value < lo || prediction.value > hi {
        Prediction { value: prediction.value.clamp(lo, hi), ..prediction }
            .with_flag(PredictionFlag::Clamped)
    } else {
        prediction
    }
}
