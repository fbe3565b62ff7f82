//! Model prediction output

use serde::{Deserialize, Serialize};

/// Which predictive model produced a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
#[serde(rename_all = "snake_case")]
pub enum ModelKind {
    LapTime,
    FinishPosition,
    PitWindowRisk,
}

impl ModelKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ModelKind::LapTime => "lap_time",
            ModelKind::FinishPosition => "finish_position",
            ModelKind::PitWindowRisk => "pit_window_risk",
        }
    }
}

impl std::fmt::Display for ModelKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Qualifiers a model attaches to its output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PredictionFlag {
    /// Too few comparable samples to trust the value
    LowSample,
    /// The model was never trained; value is a placeholder
    ColdStart,
    /// The raw regression output was clamped into its valid range
    Clamped,
}

/// A single point-in-time prediction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub struct Prediction {
    pub value: f64,
    /// Self-reported reliability in [0, 1]
    pub confidence: f64,
    #[serde(default)]
    pub flags: Vec<PredictionFlag>,
}

impl Prediction {
    pub fn new(value: f64, confidence: f64) -> Self {
        Self { value, confidence: confidence.clamp(0.0, 1.0), flags: Vec::new() }
    }

    /// A prediction with zero confidence, carrying the reason as a flag.
    pub fn unreliable(value: f64, flag: PredictionFlag) -> Self {
        Self { value, confidence: 0.0, flags: vec![flag] }
    }

    pub fn with_flag(mut self, flag: PredictionFlag) -> Self {
        if !self.flags.contains(&flag) {
            self.flags.push(flag);
        }
        self
    }

    pub fn has_flag(&self, flag: PredictionFlag) -> bool {
        self.flags.contains(&flag)
    }

    /// Whether the prediction falls below `min_confidence` and must not be scored.
    pub fn is_low_confidence(&self, min_confidence: f64) -> bool {
        self.confidence < min_confidence
            || self.has_flag(PredictionFlag::ColdStart)
            || self.has_flag(PredictionFlag::LowSample)
    }
}

/// A prediction tagged with the model that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub struct ModelOutput {
    pub model: ModelKind,
    pub prediction: Prediction,
}

impl ModelOutput {
    pub fn new(model: ModelKind, prediction: Prediction) -> Self {
        Self { model, prediction }
    }
}
