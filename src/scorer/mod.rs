//! Strategy Scorer
//!
//! Turns a vehicle's state, its feature vector and any model predictions into
//! a single urgency score and the [`Action`] it maps to.
//!
//! Sub-scores, each in [0, 1]:
//! - fuel: `1 - laps_of_fuel / fuel_safety_margin_laps`, floored at 0
//! - tire: wear fraction scaled up by the degradation slope
//! - position: `1 - percentile`, so the leader scores 0
//!
//! The weighted sum is blended with the risk implied by each confident
//! prediction, then floored at the larger of the fuel and tire sub-scores so
//! a single critical resource is never averaged away. Fewer laps of fuel than
//! `critical_fuel_laps` forces PIT_NOW.
//!
//! Scoring is a pure function of its inputs.

pub mod pit_window;

use std::collections::BTreeMap;

use tracing::{debug, trace};

use crate::Result;
use crate::config::StrategyConfig;
use crate::features::{FeatureFlag, FeatureVector};
use crate::types::{
    Action, ModelKind, ModelOutput, PitRiskLevel, Prediction, RationaleEntry, RationaleFactor,
    Recommendation, TireCondition, TrackPositionBand, VehicleState,
};

/// Relative lap-time loss that maps to full risk.
const LAP_TIME_LOSS_SCALE: f64 = 0.05;
/// Places lost over the rest of the race that map to full risk.
const POSITION_LOSS_SCALE: f64 = 5.0;
/// Planned stops gaining more than this are named in the rationale.
const PLANNED_STOP_MIN_GAIN_SECONDS: f64 = 5.0;

/// Everything the scorer consumes besides the vehicle state.
///
/// All parts are optional: missing features or predictions degrade the
/// recommendation and are named in its rationale.
#[derive(Debug, Clone, Default)]
pub struct ScoringInputs {
    pub features: Option<FeatureVector>,
    pub predictions: Vec<ModelOutput>,
    /// Models that produced no prediction, with the reason
    pub unavailable: Vec<(ModelKind, String)>,
    /// Why the feature vector could not be built
    pub degraded: Option<String>,
}

impl ScoringInputs {
    pub fn with_features(features: FeatureVector) -> Self {
        Self { features: Some(features), ..Self::default() }
    }

    pub fn prediction(mut self, model: ModelKind, prediction: Prediction) -> Self {
        self.predictions.push(ModelOutput::new(model, prediction));
        self
    }
}

/// Deterministic urgency scorer.
#[derive(Debug, Clone)]
pub struct StrategyScorer {
    config: StrategyConfig,
}

struct SubScore {
    factor: RationaleFactor,
    score: f64,
    detail: String,
}

impl StrategyScorer {
    pub fn new(config: &StrategyConfig) -> Self {
        Self { config: config.clone() }
    }

    pub fn config(&self) -> &StrategyConfig {
        &self.config
    }

    /// Score a state with no features or predictions.
    pub fn score_state(&self, state: &VehicleState) -> Result<Recommendation> {
        self.score(state, &ScoringInputs::default())
    }

    /// Produce a recommendation for `state`.
    ///
    /// Fails only with `InvalidInput` when the state is out of range.
    pub fn score(&self, state: &VehicleState, inputs: &ScoringInputs) -> Result<Recommendation> {
        state.validate()?;
        let config = &self.config;
        let features = inputs.features.as_ref();
        let mut numeric_scores = BTreeMap::new();

        // fuel
        let fuel_rate =
            features.map_or_else(|| config.default_fuel_rate_for(&state.vehicle_id), |f| f.fuel_pct_per_lap);
        let laps_of_fuel = fuel_rate.filter(|rate| *rate > 0.0).map(|rate| state.fuel_pct / rate);
        let fuel_score = match laps_of_fuel {
            Some(laps) => (1.0 - laps / config.fuel_safety_margin_laps).clamp(0.0, 1.0),
            None => 1.0 - state.fuel_pct / 100.0,
        };
        let fuel_critical = match laps_of_fuel {
            Some(laps) => laps < config.critical_fuel_laps,
            None => state.fuel_pct <= 0.0,
        };
        let fuel_detail = match (laps_of_fuel, fuel_rate) {
            (Some(laps), Some(rate)) => {
                format!("{laps:.1} laps of fuel at {rate:.2}%/lap, {:.0}% in tank", state.fuel_pct)
            }
            _ => format!("fuel burn unknown, {:.0}% in tank", state.fuel_pct),
        };

        // tire
        let slope = features.and_then(|f| f.tire_deg_slope_ms);
        let slope_factor = 1.0 + (slope.unwrap_or(0.0).max(0.0) / config.reference_deg_slope_ms).min(1.0);
        let tire_score = (state.tire_deg_pct / 100.0 * slope_factor).min(1.0);
        let tire_detail = match slope {
            Some(slope) => format!("tires {:.0}% worn, degrading {slope:+.0} ms/lap", state.tire_deg_pct),
            None => format!("tires {:.0}% worn", state.tire_deg_pct),
        };

        // position
        let field = config.field_size.max(state.position);
        let percentile = if field <= 1 {
            1.0
        } else {
            1.0 - (state.position - 1) as f64 / (field - 1) as f64
        };
        let position_score = 1.0 - percentile;

        let weights = &config.urgency_weights;
        let weighted =
            weights.fuel * fuel_score + weights.tire * tire_score + weights.position * position_score;

        let mut primary = vec![
            SubScore { factor: RationaleFactor::FuelRange, score: fuel_score, detail: fuel_detail },
            SubScore { factor: RationaleFactor::TireWear, score: tire_score, detail: tire_detail },
        ];
        if position_score > 0.0 {
            primary.push(SubScore {
                factor: RationaleFactor::TrackPosition,
                score: position_score,
                detail: format!("P{} of {field}", state.position),
            });
        }
        primary.sort_by(|a, b| b.score.total_cmp(&a.score));

        let mut rationale = Vec::new();
        if fuel_critical {
            rationale.push(RationaleEntry::new(
                RationaleFactor::FuelCritical,
                format!(
                    "less than {:.1} laps of fuel remaining, pit immediately",
                    config.critical_fuel_laps
                ),
            ));
        }
        rationale.extend(primary.into_iter().map(|sub| {
            RationaleEntry::new(sub.factor, format!("{} (score {:.2})", sub.detail, sub.score))
        }));

        if (fuel_score - tire_score).abs() > config.factor_disagreement {
            rationale.push(RationaleEntry::new(
                RationaleFactor::FactorDisagreement,
                format!(
                    "fuel ({fuel_score:.2}) and tire ({tire_score:.2}) disagree; the higher of the two sets the floor"
                ),
            ));
        }

        // predictions
        let mut blend_sum = weighted;
        let mut blend_weight = 1.0;
        for output in &inputs.predictions {
            let kind = output.model;
            let prediction = &output.prediction;
            numeric_scores.insert(format!("prediction.{kind}.value"), prediction.value);
            numeric_scores.insert(format!("prediction.{kind}.confidence"), prediction.confidence);

            if prediction.is_low_confidence(config.min_prediction_confidence) {
                rationale.push(RationaleEntry::new(
                    RationaleFactor::PredictionIgnored(kind),
                    format!(
                        "{kind} {:.2} at confidence {:.2} {:?}: low confidence, ignored",
                        prediction.value, prediction.confidence, prediction.flags
                    ),
                ));
                continue;
            }
            let Some(risk) = prediction_risk(output, state, features) else {
                rationale.push(RationaleEntry::new(
                    RationaleFactor::PredictionIgnored(kind),
                    format!("{kind} has no baseline to compare against, ignored"),
                ));
                continue;
            };

            let alpha = prediction.confidence * config.prediction_blend_weight;
            blend_sum += alpha * risk;
            blend_weight += alpha;
            numeric_scores.insert(format!("prediction.{kind}.risk"), risk);
            rationale.push(RationaleEntry::new(
                RationaleFactor::PredictionBlended(kind),
                format!(
                    "{kind} {:.2} at confidence {:.2} implies risk {risk:.2}",
                    prediction.value, prediction.confidence
                ),
            ));
        }
        let blended = blend_sum / blend_weight;

        for (kind, reason) in &inputs.unavailable {
            rationale.push(RationaleEntry::new(RationaleFactor::ModelUnavailable(*kind), reason.clone()));
        }
        if let Some(reason) = &inputs.degraded {
            rationale.push(RationaleEntry::new(RationaleFactor::FeaturesDegraded, reason.clone()));
        }
        if let Some(features) = features {
            if let Some(note) = degraded_feature_note(features) {
                rationale.push(RationaleEntry::new(RationaleFactor::FeaturesDegraded, note));
            }
            if features.has_flag(FeatureFlag::Rain) {
                rationale.push(RationaleEntry::new(
                    RationaleFactor::WeatherRain,
                    format!("wet track, degradation x{:.2}", features.degradation_factor),
                ));
            }
        } else {
            let note = match fuel_rate {
                Some(rate) => format!("no feature vector: default fuel burn {rate:.2}%/lap, no degradation slope"),
                None => "no feature vector: fuel burn unknown, fuel score taken from tank level".to_string(),
            };
            rationale.push(RationaleEntry::new(RationaleFactor::FeaturesDegraded, note));
        }

        let planned_window = pit_window::plan(state, features, config);
        if let Some(window) = planned_window
            .as_ref()
            .filter(|w| w.risk != PitRiskLevel::Critical && w.net_benefit_seconds > PLANNED_STOP_MIN_GAIN_SECONDS)
        {
            rationale.push(RationaleEntry::new(
                RationaleFactor::PitWindowPlanned,
                format!("pit on lap {} for {:.1}s gain", window.pit_lap, window.net_benefit_seconds),
            ));
        }

        let terminal = fuel_score.max(tire_score);
        let urgency_score = if fuel_critical { 1.0 } else { blended.max(terminal).clamp(0.0, 1.0) };
        let action = Action::from_urgency(urgency_score, &config.urgency_thresholds);

        numeric_scores.insert("fuel".to_string(), fuel_score);
        numeric_scores.insert("tire".to_string(), tire_score);
        numeric_scores.insert("position".to_string(), position_score);
        numeric_scores.insert("weighted".to_string(), weighted);
        numeric_scores.insert("blended".to_string(), blended);
        numeric_scores.insert("urgency".to_string(), urgency_score);
        if let Some(laps) = laps_of_fuel {
            numeric_scores.insert("laps_of_fuel".to_string(), laps);
        }

        trace!(vehicle_id = %state.vehicle_id, fuel_score, tire_score, position_score, weighted, blended);
        debug!(
            vehicle_id = %state.vehicle_id,
            lap = state.current_lap,
            urgency = urgency_score,
            action = ?action,
            "Scored vehicle state"
        );

        Ok(Recommendation {
            vehicle_id: state.vehicle_id.clone(),
            lap: state.current_lap,
            action,
            urgency: action.urgency(),
            urgency_score,
            rationale,
            numeric_scores,
            pit_window: planned_window,
            tire_condition: TireCondition::classify(state.tire_deg_pct),
            track_position: TrackPositionBand::classify(state.position),
        })
    }
}

/// Risk in [0, 1] implied by a prediction, if it has a baseline to compare with.
fn prediction_risk(
    output: &ModelOutput,
    state: &VehicleState,
    features: Option<&FeatureVector>,
) -> Option<f64> {
    let value = output.prediction.value;
    match output.model {
        ModelKind::PitWindowRisk => Some(value.clamp(0.0, 1.0)),
        ModelKind::LapTime => {
            let rolling = features?.rolling_mean_lap_ms.filter(|ms| *ms > 0.0)?;
            Some(((value - rolling) / rolling / LAP_TIME_LOSS_SCALE).clamp(0.0, 1.0))
        }
        ModelKind::FinishPosition => {
            Some(((value - state.position as f64) / POSITION_LOSS_SCALE).clamp(0.0, 1.0))
        }
    }
}

fn degraded_feature_note(features: &FeatureVector) -> Option<String> {
    let degraded: Vec<&str> = features
        .flags
        .iter()
        .filter_map(|flag| match flag {
            FeatureFlag::NoLapHistory => Some("no lap history"),
            FeatureFlag::LowSample => Some("short rolling window"),
            FeatureFlag::DefaultFuelRate => Some("default fuel burn"),
            FeatureFlag::FuelRateUnknown => Some("fuel burn unknown"),
            FeatureFlag::ShortStint => Some("short stint"),
            FeatureFlag::Rain => None,
        })
        .collect();
    (!degraded.is_empty()).then(|| format!("features degraded: {}", degraded.join(", ")))
}
