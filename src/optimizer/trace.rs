//! Audit trail of the inputs behind a recommendation

use serde::{Deserialize, Serialize};

use crate::types::ModelKind;

/// An input the optimizer tried to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
#[serde(rename_all = "snake_case", tag = "kind", content = "model")]
pub enum TraceInput {
    Features,
    Model(ModelKind),
    Caution,
}

/// What happened to an input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InputStatus {
    /// Contributed to the score
    Used,
    /// Produced but excluded, e.g. low confidence
    Ignored,
    /// Errored; scoring went ahead without it
    Failed,
    /// Replaced by a fallback
    Degraded,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub struct TraceEntry {
    pub input: TraceInput,
    pub status: InputStatus,
    pub detail: String,
}

/// Ordered record of every input considered for one recommendation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub struct DecisionTrace {
    pub entries: Vec<TraceEntry>,
}

impl DecisionTrace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, input: TraceInput, status: InputStatus, detail: impl Into<String>) {
        self.entries.push(TraceEntry { input, status, detail: detail.into() });
    }

    /// Status of the last entry recorded for `input`.
    pub fn status_of(&self, input: TraceInput) -> Option<InputStatus> {
        self.entries.iter().rev().find(|entry| entry.input == input).map(|entry| entry.status)
    }

    pub fn with_status(&self, status: InputStatus) -> impl Iterator<Item = &TraceEntry> {
        self.entries.iter().filter(move |entry| entry.status == status)
    }

    /// Whether any input fell back or was dropped.
    pub fn is_degraded(&self) -> bool {
        self.entries.iter().any(|entry| matches!(entry.status, InputStatus::Failed | InputStatus::Degraded))
    }
}
