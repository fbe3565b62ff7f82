//! Historical samples for offline model fitting

use std::collections::HashMap;

use tracing::{debug, warn};

use crate::features::{FeatureBuilder, FeatureVector};
use crate::types::{LapRecord, VehicleState};

/// One observed lap: the car's state at the start of the lap and its time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LapTimeSample {
    pub fuel_pct: f64,
    pub tire_deg_pct: f64,
    pub rolling_mean_ms: f64,
    pub lap_time_ms: f64,
}

impl LapTimeSample {
    pub(crate) fn inputs(&self) -> Vec<f64> {
        vec![self.fuel_pct, self.tire_deg_pct, self.rolling_mean_ms]
    }
}

/// A mid-race snapshot paired with the eventual classified result.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FinishSample {
    pub position: f64,
    pub gap_to_leader_seconds: f64,
    pub laps_remaining: f64,
    pub pace_trend_ms: f64,
    pub final_position: f64,
}

impl FinishSample {
    pub(crate) fn inputs(&self) -> Vec<f64> {
        vec![self.position, self.gap_to_leader_seconds, self.laps_remaining, self.pace_trend_ms]
    }
}

/// Samples accumulated for the regression models.
#[derive(Debug, Clone, Default)]
pub struct TrainingSet {
    pub lap_time: Vec<LapTimeSample>,
    pub finish: Vec<FinishSample>,
}

impl TrainingSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Derive lap-time samples from observed `(state, lap)` pairs.
    ///
    /// For each observation the features are rebuilt from the vehicle's
    /// history before that lap; observations whose lap is invalid or whose
    /// history yields no rolling pace are skipped.
    pub fn from_observations(
        builder: &FeatureBuilder,
        observations: &[(VehicleState, LapRecord)],
        history: &[LapRecord],
    ) -> Self {
        let mut by_vehicle: HashMap<&str, Vec<LapRecord>> = HashMap::new();
        for lap in history {
            by_vehicle.entry(lap.vehicle_id.as_str()).or_default().push(lap.clone());
        }

        let mut set = Self::new();
        let mut skipped = 0usize;
        for (state, lap) in observations {
            let Some(lap_time_ms) = lap.lap_time() else {
                skipped += 1;
                continue;
            };
            let laps = by_vehicle.get(state.vehicle_id.as_str()).map_or(&[][..], Vec::as_slice);
            match builder.build(state, laps, None) {
                Ok(FeatureVector { rolling_mean_lap_ms: Some(rolling_mean_ms), .. }) => {
                    set.lap_time.push(LapTimeSample {
                        fuel_pct: state.fuel_pct,
                        tire_deg_pct: state.tire_deg_pct,
                        rolling_mean_ms,
                        lap_time_ms,
                    });
                }
                Ok(_) => skipped += 1,
                Err(err) => {
                    warn!(vehicle_id = %state.vehicle_id, error = %err, "Skipping training observation");
                    skipped += 1;
                }
            }
        }

        debug!(samples = set.lap_time.len(), skipped, "Derived lap-time training samples");
        set
    }

    pub fn push_lap_time(&mut self, sample: LapTimeSample) {
        self.lap_time.push(sample);
    }

    /// Record a mid-race snapshot with its final result.
    pub fn push_finish(&mut self, features: &FeatureVector, race_length_laps: u32, final_position: u32) {
        self.finish.push(FinishSample {
            position: features.position as f64,
            gap_to_leader_seconds: features.gap_to_leader_seconds,
            laps_remaining: race_length_laps.saturating_sub(features.lap_number) as f64,
            pace_trend_ms: features.pace_trend_ms.unwrap_or(0.0),
            final_position: final_position as f64,
        });
    }
}
