//! Race strategy decision engine.
//!
//! Pitwall Strategy turns per-vehicle race state (fuel, tire wear, lap, gap to
//! the leader, field position) and optional learned predictions into a ranked,
//! explainable pit-stop recommendation.
//!
//! # Components
//!
//! - **Feature Builder**: rolling pace, fuel burn and degradation slope from lap history
//! - **Predictive Models**: lap time, finish position and pit-window risk behind one trait
//! - **Strategy Scorer**: deterministic urgency score and action thresholds
//! - **Caution Policy**: re-evaluates a recommendation while a caution is out
//! - **Strategy Optimizer**: runs the whole pipeline and records a decision trace
//!
//! All components are pure functions over immutable inputs. Nothing here does
//! network or disk I/O apart from loading configuration.
//!
//! # Quick Start
//!
//! ```rust
//! use pitwall_strategy::{Action, StrategyOptimizer, StrategyRequest, VehicleState};
//!
//! let optimizer = StrategyOptimizer::default().with_default_models();
//! let state = VehicleState::new("car-4", 12, 15.0, 65.0, 4, 2.3);
//! let outcome = optimizer.recommend(&StrategyRequest::new(state))?;
//!
//! assert!(outcome.recommendation.action >= Action::PitWindowOpening);
//! for entry in &outcome.recommendation.rationale {
//!     println!("{:?}: {}", entry.factor, entry.detail);
//! }
//! # Ok::<(), pitwall_strategy::StrategyError>(())
//! ```

// Core types and error handling
pub mod config;
mod error;
#[cfg(any(test, feature = "benchmark"))]
pub mod test_utils;
pub mod types;

// Decision pipeline
pub mod caution;
pub mod features;
pub mod models;
pub mod optimizer;
pub mod scorer;

// Core exports
pub use config::{StrategyConfig, UrgencyThresholds, UrgencyWeights};
pub use error::*;
pub use types::*;

// Pipeline exports
pub use caution::{CautionPolicy, PitCost};
pub use features::{FeatureBuilder, FeatureFlag, FeatureVector, FuelRateSource};
pub use models::{
    FinishPositionModel, LapTimeModel, PitWindowRiskModel, PredictiveModel, TrainingSet,
};
pub use optimizer::{
    DecisionTrace, InputStatus, StrategyOptimizer, StrategyOutcome, StrategyRequest, TraceEntry,
    TraceInput,
};
pub use scorer::{ScoringInputs, StrategyScorer};
