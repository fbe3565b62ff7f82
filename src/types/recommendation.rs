//! Strategy recommendation output

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{ModelKind, TireCondition, TrackPositionBand};
use crate::config::UrgencyThresholds;

/// What the car should do next. Ordered from least to most urgent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Action {
    StayOut,
    Monitor,
    PitWindowOpening,
    PitNow,
}

impl Action {
    /// Map an urgency score onto its action band.
    pub fn from_urgency(urgency: f64, thresholds: &UrgencyThresholds) -> Self {
        if urgency >= thresholds.pit_opening {
            Action::PitNow
        } else if urgency >= thresholds.monitor {
            Action::PitWindowOpening
        } else if urgency >= thresholds.stay_out {
            Action::Monitor
        } else {
            Action::StayOut
        }
    }

    /// Lowest urgency score that lands in this action's band.
    pub fn urgency_floor(self, thresholds: &UrgencyThresholds) -> f64 {
        match self {
            Action::StayOut => 0.0,
            Action::Monitor => thresholds.stay_out,
            Action::PitWindowOpening => thresholds.monitor,
            Action::PitNow => thresholds.pit_opening,
        }
    }

    pub fn urgency(self) -> Urgency {
        match self {
            Action::StayOut => Urgency::Low,
            Action::Monitor => Urgency::Medium,
            Action::PitWindowOpening => Urgency::High,
            Action::PitNow => Urgency::Critical,
        }
    }
}

/// Urgency level shown alongside the action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Urgency {
    Low,
    Medium,
    High,
    Critical,
}

/// Factor that contributed to, or qualified, a recommendation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
#[serde(rename_all = "snake_case", tag = "kind", content = "model")]
pub enum RationaleFactor {
    FuelCritical,
    FuelRange,
    TireWear,
    TrackPosition,
    FactorDisagreement,
    PredictionBlended(ModelKind),
    PredictionIgnored(ModelKind),
    ModelUnavailable(ModelKind),
    FeaturesDegraded,
    WeatherRain,
    PitWindowPlanned,
    CautionPitDiscount,
    CautionFreeStop,
    CautionRecoveryStop,
    CautionUpgrade,
    CautionPositionCost,
    CautionHold,
    ProtectTrackPosition,
    StayOutOpportunity,
}

/// One line of the recommendation's explanation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub struct RationaleEntry {
    pub factor: RationaleFactor,
    pub detail: String,
}

impl RationaleEntry {
    pub fn new(factor: RationaleFactor, detail: impl Into<String>) -> Self {
        Self { factor, detail: detail.into() }
    }
}

/// Risk grade of the best pit lap found by the window planner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PitRiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

/// Best pit lap within the planner's lookahead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub struct PitWindow {
    pub pit_lap: u32,
    pub fuel_at_pit_pct: f64,
    pub tire_at_pit_pct: f64,
    /// Seconds gained over the rest of the race by pitting on `pit_lap`
    pub net_benefit_seconds: f64,
    pub risk: PitRiskLevel,
}

/// Terminal output of the engine. Never mutated once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub struct Recommendation {
    pub vehicle_id: String,
    pub lap: u32,
    pub action: Action,
    pub urgency: Urgency,
    /// Combined urgency score in [0, 1]
    pub urgency_score: f64,
    /// Ordered list of triggering factors, strongest first
    pub rationale: Vec<RationaleEntry>,
    pub numeric_scores: BTreeMap<String, f64>,
    pub pit_window: Option<PitWindow>,
    pub tire_condition: TireCondition,
    pub track_position: TrackPositionBand,
}

impl Recommendation {
    /// Whether any rationale entry has the given factor.
    pub fn mentions(&self, factor: RationaleFactor) -> bool {
        self.rationale.iter().any(|entry| entry.factor == factor)
    }

    pub fn score(&self, name: &str) -> Option<f64> {
        self.numeric_scores.get(name).copied()
    }
}
