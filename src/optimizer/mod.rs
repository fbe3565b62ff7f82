//! Strategy Optimizer
//!
//! End-to-end orchestration for one vehicle:
//!
//! ```text
//! StrategyRequest ─▶ FeatureBuilder ─▶ PredictiveModel* ─▶ StrategyScorer ─▶ CautionPolicy? ─▶ StrategyOutcome
//! ```
//!
//! Feature and model failures degrade the recommendation and are recorded in
//! the [`DecisionTrace`]; only a malformed [`VehicleState`] aborts the call.
//!
//! ```rust
//! use pitwall_strategy::{Action, StrategyOptimizer, StrategyRequest, VehicleState};
//!
//! let optimizer = StrategyOptimizer::default();
//! let state = VehicleState::new("car-7", 12, 90.0, 10.0, 1, 0.0);
//! let outcome = optimizer.recommend(&StrategyRequest::new(state)).unwrap();
//! assert_eq!(outcome.recommendation.action, Action::StayOut);
//! ```

mod field;
mod trace;

pub use trace::{DecisionTrace, InputStatus, TraceEntry, TraceInput};

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::Result;
use crate::caution::CautionPolicy;
use crate::config::StrategyConfig;
use crate::features::FeatureBuilder;
use crate::models::{FinishPositionModel, LapTimeModel, PitWindowRiskModel, PredictiveModel};
use crate::scorer::{ScoringInputs, StrategyScorer};
use crate::types::{Action, LapRecord, ModelOutput, Recommendation, SessionConditions, VehicleState};

/// Inputs for one recommendation. Owned so requests can cross thread boundaries.
#[derive(Debug, Clone, PartialEq)]
pub struct StrategyRequest {
    pub state: VehicleState,
    pub history: Vec<LapRecord>,
    pub conditions: Option<SessionConditions>,
    /// Field snapshot when a caution is out; `None` under green
    pub caution_field: Option<Vec<VehicleState>>,
}

impl StrategyRequest {
    pub fn new(state: VehicleState) -> Self {
        Self { state, history: Vec::new(), conditions: None, caution_field: None }
    }

    pub fn with_history(mut self, history: Vec<LapRecord>) -> Self {
        self.history = history;
        self
    }

    pub fn with_conditions(mut self, conditions: SessionConditions) -> Self {
        self.conditions = Some(conditions);
        self
    }

    /// Mark a caution as active, with the rest of the field for context.
    pub fn under_caution(mut self, field: Vec<VehicleState>) -> Self {
        self.caution_field = Some(field);
        self
    }

    pub fn caution_active(&self) -> bool {
        self.caution_field.is_some()
    }
}

/// Final recommendation plus how it was reached.
#[derive(Debug, Clone, PartialEq)]
pub struct StrategyOutcome {
    pub recommendation: Recommendation,
    pub trace: DecisionTrace,
}

/// Orchestrates features, models, scoring and the caution policy.
#[derive(Clone)]
pub struct StrategyOptimizer {
    config: StrategyConfig,
    features: FeatureBuilder,
    scorer: StrategyScorer,
    caution: CautionPolicy,
    models: Vec<Arc<dyn PredictiveModel>>,
}

impl std::fmt::Debug for StrategyOptimizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StrategyOptimizer")
            .field("config", &self.config)
            .field("models", &self.models.iter().map(|m| m.kind()).collect::<Vec<_>>())
            .finish()
    }
}

impl Default for StrategyOptimizer {
    fn default() -> Self {
        Self::build(StrategyConfig::default())
    }
}

impl StrategyOptimizer {
    /// Optimizer with no models attached. Fails if `config` is inconsistent.
    pub fn new(config: StrategyConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: StrategyConfig) -> Self {
        Self {
            features: FeatureBuilder::new(&config),
            scorer: StrategyScorer::new(&config),
            caution: CautionPolicy::new(&config),
            models: Vec::new(),
            config,
        }
    }

    pub fn with_model(mut self, model: Arc<dyn PredictiveModel>) -> Self {
        self.models.push(model);
        self
    }

    /// Attach cold-start lap-time and finish-position models and the pit-window-risk model.
    pub fn with_default_models(self) -> Self {
        let finish = FinishPositionModel::untrained(&self.config);
        let risk = PitWindowRiskModel::from_config(&self.config);
        self.with_model(Arc::new(LapTimeModel::untrained()))
            .with_model(Arc::new(finish))
            .with_model(Arc::new(risk))
    }

    pub fn config(&self) -> &StrategyConfig {
        &self.config
    }

    /// Produce a recommendation for one vehicle.
    pub fn recommend(&self, request: &StrategyRequest) -> Result<StrategyOutcome> {
        let state = &request.state;
        state.validate()?;

        let mut trace = DecisionTrace::new();
        let mut inputs = ScoringInputs::default();

        match self.features.build(state, &request.history, request.conditions.as_ref()) {
            Ok(features) => {
                let status = if features.flags.is_empty() { InputStatus::Used } else { InputStatus::Degraded };
                trace.record(
                    TraceInput::Features,
                    status,
                    format!("{} laps in window, flags {:?}", features.window_laps, features.flags),
                );
                inputs.features = Some(features);
            }
            Err(err) if err.is_degradable() => {
                warn!(vehicle_id = %state.vehicle_id, error = %err, "Scoring without features");
                trace.record(TraceInput::Features, InputStatus::Failed, err.to_string());
                inputs.degraded = Some(format!("no features: {err}"));
            }
            Err(err) => return Err(err),
        }

        for model in &self.models {
            let kind = model.kind();
            let input = TraceInput::Model(kind);
            let Some(features) = inputs.features.as_ref() else {
                trace.record(input, InputStatus::Ignored, "no feature vector");
                inputs.unavailable.push((kind, format!("{kind} skipped: no feature vector")));
                continue;
            };
            match model.predict(features, &state.vehicle_id) {
                Ok(prediction) => {
                    let status = if prediction.is_low_confidence(self.config.min_prediction_confidence) {
                        InputStatus::Ignored
                    } else {
                        InputStatus::Used
                    };
                    trace.record(
                        input,
                        status,
                        format!("value {:.3}, confidence {:.2}", prediction.value, prediction.confidence),
                    );
                    inputs.predictions.push(ModelOutput::new(kind, prediction));
                }
                Err(err) => {
                    warn!(vehicle_id = %state.vehicle_id, model = %kind, error = %err, "Model unavailable");
                    trace.record(input, InputStatus::Failed, err.to_string());
                    inputs.unavailable.push((kind, format!("{kind} unavailable: {err}")));
                }
            }
        }

        let baseline = self.scorer.score(state, &inputs)?;

        let recommendation = match &request.caution_field {
            Some(field) => {
                let upgraded = self.caution.evaluate(state, field, &baseline)?;
                trace.record(
                    TraceInput::Caution,
                    InputStatus::Used,
                    format!("{:?} -> {:?}", baseline.action, upgraded.action),
                );
                upgraded
            }
            None => baseline,
        };

        if recommendation.action == Action::PitNow {
            info!(
                vehicle_id = %state.vehicle_id,
                lap = state.current_lap,
                urgency = recommendation.urgency_score,
                "PIT_NOW recommended"
            );
        }
        debug!(
            vehicle_id = %state.vehicle_id,
            action = ?recommendation.action,
            degraded = trace.is_degraded(),
            "Recommendation ready"
        );

        Ok(StrategyOutcome { recommendation, trace })
    }

    /// Recommend for every request in order. One failing vehicle does not affect the others.
    pub fn recommend_field(&self, requests: &[StrategyRequest]) -> Vec<Result<StrategyOutcome>> {
        requests.iter().map(|request| self.recommend(request)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::StrategyError;
    use crate::features::FeatureVector;
    use crate::test_utils::{degrading_history, lap_time_training_set, spaced_field, state_at};
    use crate::types::{ModelKind, Prediction, RationaleFactor};

    /// Model that always errors.
    struct Broken;

    impl PredictiveModel for Broken {
        fn kind(&self) -> ModelKind {
            ModelKind::FinishPosition
        }

        fn predict(&self, _features: &FeatureVector, vehicle_id: &str) -> Result<Prediction> {
            Err(StrategyError::insufficient_data(vehicle_id, "no finish data"))
        }
    }

    #[test]
    fn full_pipeline_uses_features_and_models() {
        let config = StrategyConfig::default();
        let lap_time = LapTimeModel::train(&lap_time_training_set(200), &config).unwrap();
        let optimizer = StrategyOptimizer::new(config.clone())
            .unwrap()
            .with_model(Arc::new(lap_time))
            .with_model(Arc::new(PitWindowRiskModel::from_config(&config)));

        let request = StrategyRequest::new(state_at("car", 7, 50.0, 50.0))
            .with_history(degrading_history("car", 6, 150_600, 0));
        let outcome = optimizer.recommend(&request).unwrap();

        assert_eq!(outcome.trace.status_of(TraceInput::Features), Some(InputStatus::Used));
        assert_eq!(outcome.trace.status_of(TraceInput::Model(ModelKind::LapTime)), Some(InputStatus::Used));
        assert!(outcome.recommendation.mentions(RationaleFactor::PredictionBlended(ModelKind::LapTime)));
        assert_eq!(outcome.trace.status_of(TraceInput::Caution), None);
    }

    #[test]
    fn failing_model_degrades_instead_of_aborting() {
        let optimizer = StrategyOptimizer::default().with_model(Arc::new(Broken));
        let request = StrategyRequest::new(state_at("car", 7, 50.0, 50.0))
            .with_history(degrading_history("car", 6, 150_000, 100));
        let outcome = optimizer.recommend(&request).unwrap();

        let kind = TraceInput::Model(ModelKind::FinishPosition);
        assert_eq!(outcome.trace.status_of(kind), Some(InputStatus::Failed));
        assert!(outcome.recommendation.mentions(RationaleFactor::ModelUnavailable(ModelKind::FinishPosition)));
    }

    #[test]
    fn missing_history_without_default_still_recommends() {
        let config = StrategyConfig { default_fuel_pct_per_lap: None, ..Default::default() };
        let optimizer = StrategyOptimizer::new(config).unwrap().with_default_models();
        let outcome = optimizer.recommend(&StrategyRequest::new(state_at("car", 5, 80.0, 20.0))).unwrap();

        assert_eq!(outcome.trace.status_of(TraceInput::Features), Some(InputStatus::Failed));
        assert!(outcome.recommendation.mentions(RationaleFactor::FeaturesDegraded));
        for kind in [ModelKind::LapTime, ModelKind::FinishPosition, ModelKind::PitWindowRisk] {
            assert_eq!(outcome.trace.status_of(TraceInput::Model(kind)), Some(InputStatus::Ignored));
        }
    }

    #[test]
    fn malformed_state_is_fatal() {
        let optimizer = StrategyOptimizer::default();
        let request = StrategyRequest::new(state_at("car", 5, -1.0, 20.0));
        assert!(matches!(optimizer.recommend(&request), Err(StrategyError::InvalidInput { .. })));
    }

    #[test]
    fn caution_is_piped_through_when_active() {
        let optimizer = StrategyOptimizer::default();
        let state = VehicleState::new("car-4", 10, 15.0, 65.0, 4, 30.0);
        let green = optimizer.recommend(&StrategyRequest::new(state.clone())).unwrap();
        let yellow =
            optimizer.recommend(&StrategyRequest::new(state).under_caution(spaced_field(10, 10.0))).unwrap();

        assert_eq!(green.recommendation.action, Action::PitWindowOpening);
        assert_eq!(yellow.recommendation.action, Action::PitNow);
        assert_eq!(yellow.trace.status_of(TraceInput::Caution), Some(InputStatus::Used));
    }

    #[test]
    fn cold_start_models_are_reported_as_ignored() {
        let optimizer = StrategyOptimizer::default().with_default_models();
        let request = StrategyRequest::new(state_at("car", 7, 50.0, 50.0))
            .with_history(degrading_history("car", 6, 150_000, 100));
        let outcome = optimizer.recommend(&request).unwrap();
        let rec = &outcome.recommendation;
        assert!(rec.mentions(RationaleFactor::PredictionIgnored(ModelKind::LapTime)));
        assert!(rec.mentions(RationaleFactor::PredictionIgnored(ModelKind::FinishPosition)));
    }

    #[test]
    fn field_pass_keeps_order_and_isolates_failures() {
        let optimizer = StrategyOptimizer::default();
        let requests = vec![
            StrategyRequest::new(state_at("a", 5, 80.0, 20.0)),
            StrategyRequest::new(state_at("b", 5, 180.0, 20.0)),
            StrategyRequest::new(state_at("c", 5, 10.0, 90.0)),
        ];
        let results = optimizer.recommend_field(&requests);
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].as_ref().unwrap().recommendation.vehicle_id, "a");
        assert!(results[1].is_err());
        assert_eq!(results[2].as_ref().unwrap().recommendation.action, Action::PitNow);
    }

    #[test]
    fn inconsistent_config_is_rejected() {
        let mut config = StrategyConfig::default();
        config.urgency_thresholds.monitor = 0.1;
        assert!(matches!(StrategyOptimizer::new(config), Err(StrategyError::Config { .. })));
    }
}
