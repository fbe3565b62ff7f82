//! Core data model for the decision engine.
//!
//! - [`VehicleState`] is the primary input: one car at one point in time
//! - [`LapRecord`] is immutable lap history from the historical data store
//! - [`Prediction`] is the output of a single model call
//! - [`Recommendation`] is the terminal output handed to UI collaborators
//!
//! Everything here is plain serializable data; behaviour lives in the
//! feature, model, scorer, caution and optimizer modules.

mod lap;
mod prediction;
mod recommendation;
mod vehicle;

pub use lap::{LapRecord, MAX_VALID_LAP, SessionConditions};
pub use prediction::{ModelKind, ModelOutput, Prediction, PredictionFlag};
pub use recommendation::{
    Action, PitRiskLevel, PitWindow, RationaleEntry, RationaleFactor, Recommendation, Urgency,
};
pub use vehicle::{TireCondition, TrackPositionBand, VehicleState};
