//! Test utilities for building race fixtures
//!
//! Synthetic lap histories, vehicle states and training sets shared by the
//! unit tests, integration tests and benches.

#![cfg(any(test, feature = "benchmark"))]

use crate::models::{FinishSample, LapTimeSample, TrainingSet};
use crate::types::{LapRecord, VehicleState};

/// Lap history for laps `1..=laps` where each lap is `step_ms` slower than the last.
pub fn degrading_history(vehicle_id: &str, laps: u32, base_ms: u64, step_ms: u64) -> Vec<LapRecord> {
    (1..=laps)
        .map(|lap| {
            let time = base_ms + (lap as u64 - 1) * step_ms;
            LapRecord::new(vehicle_id, lap, Some(time), lap as u64 * base_ms)
        })
        .collect()
}

/// Vehicle in P5, 10 s behind the leader, never pitted.
pub fn state_at(vehicle_id: &str, lap: u32, fuel_pct: f64, tire_deg_pct: f64) -> VehicleState {
    VehicleState::new(vehicle_id, lap, fuel_pct, tire_deg_pct, 5, 10.0)
}

/// Lap-time samples following `rolling + 20 * fuel + 15 * tire` exactly.
pub fn lap_time_training_set(samples: usize) -> TrainingSet {
    let mut set = TrainingSet::new();
    for i in 0..samples {
        let fuel_pct = (i * 37 % 100) as f64;
        let tire_deg_pct = (i * 53 % 100) as f64;
        let rolling_mean_ms = 150_000.0 + (i * 17 % 13) as f64 * 100.0;
        set.push_lap_time(LapTimeSample {
            fuel_pct,
            tire_deg_pct,
            rolling_mean_ms,
            lap_time_ms: rolling_mean_ms + 20.0 * fuel_pct + 15.0 * tire_deg_pct,
        });
    }
    set
}

/// Finish samples where the result drifts back with gap and pace trend.
pub fn finish_training_set(samples: usize) -> TrainingSet {
    let mut set = TrainingSet::new();
    for i in 0..samples {
        let position = (1 + i * 7 % 30) as f64;
        let gap_to_leader_seconds = (i * 13 % 60) as f64;
        let laps_remaining = (1 + i * 3 % 19) as f64;
        let pace_trend_ms = (i * 11 % 9) as f64 * 20.0 - 80.0;
        set.finish.push(FinishSample {
            position,
            gap_to_leader_seconds,
            laps_remaining,
            pace_trend_ms,
            final_position: position + 0.05 * gap_to_leader_seconds - 0.01 * laps_remaining
                + pace_trend_ms / 100.0,
        });
    }
    set
}

/// A field of `size` cars spaced `spacing_seconds` apart, P1 first.
pub fn spaced_field(size: u32, spacing_seconds: f64) -> Vec<VehicleState> {
    (1..=size)
        .map(|position| {
            VehicleState::new(
                format!("car-{position}"),
                10,
                50.0,
                40.0,
                position,
                (position - 1) as f64 * spacing_seconds,
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn history_is_ordered_and_valid() {
        let history = degrading_history("car", 5, 150_000, 100);
        assert_eq!(history.len(), 5);
        assert!(history.iter().all(LapRecord::is_valid));
        assert_eq!(history[4].lap_time_ms, Some(150_400));
        assert!(history.windows(2).all(|w| w[0].timestamp < w[1].timestamp));
    }

    #[test]
    fn field_is_spaced_from_the_leader() {
        let field = spaced_field(4, 2.5);
        assert_eq!(field[0].gap_to_leader_seconds, 0.0);
        assert_eq!(field[3].gap_to_leader_seconds, 7.5);
        assert_eq!(field[3].position, 4);
    }

    #[test]
    fn training_sets_have_requested_size() {
        assert_eq!(lap_time_training_set(12).lap_time.len(), 12);
        assert_eq!(finish_training_set(12).finish.len(), 12);
    }
}
