//! Error types for strategy evaluation.
//!
//! Every fallible operation in the decision engine returns [`StrategyError`].
//! Errors carry enough context to explain to a race engineer why a
//! recommendation could not be produced, and are classified by whether the
//! Strategy Optimizer may absorb them or must surface them.
//!
//! ## Error Categories
//!
//! - **Insufficient data**: no usable lap history and no configured default
//! - **Invalid state**: a state value outside its domain (e.g. lap beyond race length)
//! - **Invalid input**: malformed `VehicleState` percentages or negative values
//! - **Configuration**: YAML parse failures or inconsistent thresholds
//! - **Training**: a regression fit failed
//!
//! ## Degradation
//!
//! ```rust
//! use pitwall_strategy::StrategyError;
//!
//! let error = StrategyError::insufficient_data("GR86-004-78", "no laps recorded");
//! assert!(error.is_degradable());
//!
//! let error = StrategyError::invalid_input("fuel_pct", 140.0, "must be within [0, 100]");
//! assert!(!error.is_degradable());
//! for suggestion in error.recovery_suggestions() {
//!     println!("  - {}", suggestion);
//! }
//! ```

use thiserror::Error;

/// Result type alias for strategy operations.
pub type Result<T, E = StrategyError> = std::result::Result<T, E>;

/// Main error type for strategy operations.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum StrategyError {
    #[error("Insufficient data for vehicle {vehicle_id}: {details}")]
    InsufficientData { vehicle_id: String, details: String },

    #[error("Invalid state in {context}: {details}")]
    InvalidState { context: String, details: String },

    #[error("Invalid input '{field}' = {value}: {reason}")]
    InvalidInput { field: String, value: f64, reason: String },

    #[error("Configuration error: {details}")]
    Config {
        details: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Training failed for {model} model: {details}")]
    Training {
        model: String,
        details: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Worker task failed: {details}")]
    Worker { details: String },
}

impl StrategyError {
    /// Returns whether the Strategy Optimizer may degrade around this error
    /// instead of aborting the whole recommendation.
    pub fn is_degradable(&self) -> bool {
        match self {
            StrategyError::InsufficientData { .. } => true,
            StrategyError::InvalidState { .. } => true,
            StrategyError::Training { .. } => true,
            StrategyError::InvalidInput { .. } => false,
            StrategyError::Config { .. } => false,
            StrategyError::Worker { .. } => false,
        }
    }

    /// Returns suggested recovery actions for this error.
    pub fn recovery_suggestions(&self) -> Vec<&'static str> {
        match self {
            StrategyError::InsufficientData { .. } => vec![
                "Supply lap history for the vehicle",
                "Configure default_fuel_pct_per_lap for cold starts",
                "Check that lap records are not all flagged invalid",
            ],
            StrategyError::InvalidState { .. } => vec![
                "Check current_lap against race_length_laps",
                "Verify pit stop bookkeeping between state snapshots",
            ],
            StrategyError::InvalidInput { .. } => vec![
                "Check fuel_pct and tire_deg_pct are within [0, 100]",
                "Check position is at least 1",
                "Check gap_to_leader_seconds is finite and non-negative",
            ],
            StrategyError::Config { .. } => vec![
                "Check urgency thresholds are strictly increasing",
                "Verify YAML keys match the documented option names",
                "Remove the option to fall back to its default",
            ],
            StrategyError::Training { .. } => vec![
                "Provide more varied historical samples",
                "Check training features are finite",
                "Run with the untrained model until enough data exists",
            ],
            StrategyError::Worker { .. } => vec![
                "Retry the field-wide refresh",
                "Score the failing vehicle on its own to isolate the error",
            ],
        }
    }

    /// Helper constructor for missing history.
    pub fn insufficient_data(vehicle_id: impl Into<String>, details: impl Into<String>) -> Self {
        StrategyError::InsufficientData { vehicle_id: vehicle_id.into(), details: details.into() }
    }

    /// Helper constructor for out-of-domain state values.
    pub fn invalid_state(context: impl Into<String>, details: impl Into<String>) -> Self {
        StrategyError::InvalidState { context: context.into(), details: details.into() }
    }

    /// Helper constructor for malformed vehicle state fields.
    pub fn invalid_input(field: impl Into<String>, value: f64, reason: impl Into<String>) -> Self {
        StrategyError::InvalidInput { field: field.into(), value, reason: reason.into() }
    }

    /// Helper constructor for configuration errors.
    pub fn config(details: impl Into<String>) -> Self {
        StrategyError::Config { details: details.into(), source: None }
    }

    /// Helper constructor for regression fit failures.
    pub fn training_failed(
        model: impl Into<String>,
        details: impl Into<String>,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        StrategyError::Training { model: model.into(), details: details.into(), source }
    }
}

impl From<serde_yaml_ng::Error> for StrategyError {
    fn from(err: serde_yaml_ng::Error) -> Self {
        StrategyError::Config {
            details: format!("YAML parsing failed: {}", err),
            source: Some(Box::new(err)),
        }
    }
}

impl From<std::io::Error> for StrategyError {
    fn from(err: std::io::Error) -> Self {
        StrategyError::Config {
            details: format!("Failed to read configuration: {}", err),
            source: Some(Box::new(err)),
        }
    }
}
