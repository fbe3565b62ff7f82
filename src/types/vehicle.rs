//! Per-vehicle race state

use serde::{Deserialize, Serialize};

use crate::{Result, StrategyError};

/// Point-in-time state of one car.
///
/// Fuel only decreases and tire wear only increases within a stint; a pit
/// stop (recorded in `last_pit_lap`) resets both.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub struct VehicleState {
    pub vehicle_id: String,
    pub current_lap: u32,
    /// Fuel remaining, 0-100
    pub fuel_pct: f64,
    /// Tire wear, 0 = fresh, 100 = fully worn
    pub tire_deg_pct: f64,
    /// Classified position, 1 = leader
    pub position: u32,
    pub gap_to_leader_seconds: f64,
    /// Lap on which the car last completed a stop; `None` if it has not stopped
    #[serde(default)]
    pub last_pit_lap: Option<u32>,
}

impl VehicleState {
    /// Construct a state with no recorded stop.
    pub fn new(
        vehicle_id: impl Into<String>,
        current_lap: u32,
        fuel_pct: f64,
        tire_deg_pct: f64,
        position: u32,
        gap_to_leader_seconds: f64,
    ) -> Self {
        Self {
            vehicle_id: vehicle_id.into(),
            current_lap,
            fuel_pct,
            tire_deg_pct,
            position,
            gap_to_leader_seconds,
            last_pit_lap: None,
        }
    }

    /// Record the lap of the most recent stop.
    pub fn with_last_pit_lap(mut self, lap: u32) -> Self {
        self.last_pit_lap = Some(lap);
        self
    }

    /// Reject malformed percentages, positions and gaps.
    pub fn validate(&self) -> Result<()> {
        check_percentage("fuel_pct", self.fuel_pct)?;
        check_percentage("tire_deg_pct", self.tire_deg_pct)?;
        if self.position < 1 {
            return Err(StrategyError::invalid_input(
                "position",
                self.position as f64,
                "must be at least 1",
            ));
        }
        if !self.gap_to_leader_seconds.is_finite() || self.gap_to_leader_seconds < 0.0 {
            return Err(StrategyError::invalid_input(
                "gap_to_leader_seconds",
                self.gap_to_leader_seconds,
                "must be finite and non-negative",
            ));
        }
        if let Some(pit_lap) = self.last_pit_lap {
            if pit_lap > self.current_lap {
                return Err(StrategyError::invalid_input(
                    "last_pit_lap",
                    pit_lap as f64,
                    format!("cannot be after current lap {}", self.current_lap),
                ));
            }
        }
        Ok(())
    }

    /// Laps completed since the start of the current stint.
    ///
    /// The current lap is still in progress, so a car on lap 13 that pitted on
    /// lap 8 has completed laps 9 to 12.
    pub fn stint_laps(&self) -> u32 {
        self.current_lap.saturating_sub(self.last_pit_lap.unwrap_or(0)).saturating_sub(1)
    }

    /// Check that `next` can follow `prev` within the rules of a stint.
    ///
    /// Without a stop in between, fuel must not rise and tire wear must not fall.
    pub fn check_stint_continuity(prev: &VehicleState, next: &VehicleState) -> Result<()> {
        if prev.vehicle_id != next.vehicle_id {
            return Err(StrategyError::invalid_state(
                "stint continuity",
                format!("vehicle changed from {} to {}", prev.vehicle_id, next.vehicle_id),
            ));
        }
        if next.current_lap < prev.current_lap {
            return Err(StrategyError::invalid_state(
                "stint continuity",
                format!("lap went backwards from {} to {}", prev.current_lap, next.current_lap),
            ));
        }

        let pitted = next.last_pit_lap != prev.last_pit_lap;
        if pitted {
            return Ok(());
        }
        if next.fuel_pct > prev.fuel_pct {
            return Err(StrategyError::invalid_state(
                "stint continuity",
                format!("fuel rose from {} to {} without a stop", prev.fuel_pct, next.fuel_pct),
            ));
        }
        if next.tire_deg_pct < prev.tire_deg_pct {
            return Err(StrategyError::invalid_state(
                "stint continuity",
                format!(
                    "tire wear fell from {} to {} without a stop",
                    prev.tire_deg_pct, next.tire_deg_pct
                ),
            ));
        }
        Ok(())
    }
}

fn check_percentage(field: &str, value: f64) -> Result<()> {
    if !value.is_finite() || !(0.0..=100.0).contains(&value) {
        return Err(StrategyError::invalid_input(field, value, "must be within [0, 100]"));
    }
    Ok(())
}

/// Coarse tire status for race-engineer displays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TireCondition {
    Good,
    Moderate,
    Critical,
}

impl TireCondition {
    pub fn classify(tire_deg_pct: f64) -> Self {
        if tire_deg_pct > 80.0 {
            TireCondition::Critical
        } else if tire_deg_pct < 50.0 {
            TireCondition::Good
        } else {
            TireCondition::Moderate
        }
    }
}

/// What the car is fighting for at its current position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TrackPositionBand {
    PodiumFight,
    PointsBattle,
    RecoveryMode,
}

impl TrackPositionBand {
    pub fn classify(position: u32) -> Self {
        match position {
            0..=3 => TrackPositionBand::PodiumFight,
            4..=10 => TrackPositionBand::PointsBattle,
            _ => TrackPositionBand::RecoveryMode,
        }
    }
}
