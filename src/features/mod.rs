//! Feature Builder
//!
//! Derives a [`FeatureVector`] for one vehicle at one lap from its lap history
//! and current [`VehicleState`]. Feature vectors are never stored; they are
//! recomputed on every call.
//!
//! The builder computes:
//! - rolling mean and standard deviation of lap time over the last N valid laps
//! - fuel burn per lap over the current stint, or the configured default
//! - tire-degradation slope: least-squares lap-time increase per stint lap,
//!   scaled by the session's weather degradation factor
//! - pace trend: lap-time slope across the rolling window

mod stats;

pub use stats::{LineFit, line_fit, mean_std};

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::StrategyConfig;
use crate::types::{LapRecord, SessionConditions, VehicleState};
use crate::{Result, StrategyError};

/// Where the fuel burn estimate came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FuelRateSource {
    Stint,
    ConfiguredDefault,
    Unknown,
}

/// Qualifiers on a feature vector that downstream consumers must report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FeatureFlag {
    /// Fewer valid laps than the rolling window
    LowSample,
    /// No valid laps at all
    NoLapHistory,
    /// Fuel burn taken from configuration instead of stint data
    DefaultFuelRate,
    /// Fuel burn could not be estimated
    FuelRateUnknown,
    /// Too few stint laps for a stable degradation slope
    ShortStint,
    Rain,
}

/// Per-vehicle, per-lap features. Ephemeral.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    pub vehicle_id: String,
    pub lap_number: u32,
    pub fuel_pct: f64,
    pub tire_deg_pct: f64,
    pub position: u32,
    pub gap_to_leader_seconds: f64,
    pub rolling_mean_lap_ms: Option<f64>,
    pub rolling_std_lap_ms: Option<f64>,
    /// Valid laps that went into the rolling statistics
    pub window_laps: usize,
    pub fuel_pct_per_lap: Option<f64>,
    pub fuel_rate_source: FuelRateSource,
    /// Weather-adjusted lap-time increase per stint lap, in ms
    pub tire_deg_slope_ms: Option<f64>,
    pub tire_deg_slope_stderr_ms: Option<f64>,
    /// Valid laps in the current stint
    pub stint_laps: usize,
    /// Lap-time slope across the rolling window, in ms per lap
    pub pace_trend_ms: Option<f64>,
    pub degradation_factor: f64,
    pub flags: Vec<FeatureFlag>,
}

impl FeatureVector {
    pub fn has_flag(&self, flag: FeatureFlag) -> bool {
        self.flags.contains(&flag)
    }

    /// Laps of running left on the current fuel load, if the burn rate is known.
    pub fn laps_of_fuel(&self) -> Option<f64> {
        self.fuel_pct_per_lap.filter(|rate| *rate > 0.0).map(|rate| self.fuel_pct / rate)
    }
}

/// Builds feature vectors from lap history.
#[derive(Debug, Clone)]
pub struct FeatureBuilder {
    window: usize,
    default_fuel_pct_per_lap: Option<f64>,
    vehicle_fuel_pct_per_lap: BTreeMap<String, f64>,
    min_stint_laps: usize,
}

impl FeatureBuilder {
    pub fn new(config: &StrategyConfig) -> Self {
        Self {
            window: config.rolling_window_laps.max(1),
            default_fuel_pct_per_lap: config.default_fuel_pct_per_lap,
            vehicle_fuel_pct_per_lap: config.vehicle_fuel_pct_per_lap.clone(),
            min_stint_laps: config.min_stint_laps_for_slope,
        }
    }

    /// Build features for `state` from the vehicle's laps before `state.current_lap`.
    ///
    /// Records of other vehicles, invalid laps and laps at or after the
    /// current lap are ignored. Fails with `InsufficientData` only when no
    /// valid lap remains and no default fuel burn is configured.
    pub fn build(
        &self,
        state: &VehicleState,
        history: &[LapRecord],
        conditions: Option<&SessionConditions>,
    ) -> Result<FeatureVector> {
        let mut laps: Vec<(u32, f64)> = history
            .iter()
            .filter(|lap| lap.vehicle_id == state.vehicle_id && lap.lap_number < state.current_lap)
            .filter_map(|lap| lap.lap_time().map(|ms| (lap.lap_number, ms)))
            .collect();
        laps.sort_by_key(|(lap, _)| *lap);

        let default_rate = self
            .vehicle_fuel_pct_per_lap
            .get(&state.vehicle_id)
            .copied()
            .or(self.default_fuel_pct_per_lap);
        if laps.is_empty() && default_rate.is_none() {
            return Err(StrategyError::insufficient_data(
                state.vehicle_id.clone(),
                format!("no valid laps before lap {} and no default fuel rate", state.current_lap),
            ));
        }

        let mut flags = Vec::new();

        let window: Vec<(u32, f64)> = laps[laps.len().saturating_sub(self.window)..].to_vec();
        if laps.is_empty() {
            flags.push(FeatureFlag::NoLapHistory);
        }
        if window.len() < self.window {
            flags.push(FeatureFlag::LowSample);
        }
        let window_times: Vec<f64> = window.iter().map(|(_, ms)| *ms).collect();
        let rolling = mean_std(&window_times);
        let pace_trend_ms = line_fit(&as_points(&window)).map(|fit| fit.slope);

        let stint_laps_elapsed = state.stint_laps();
        let (fuel_pct_per_lap, fuel_rate_source) =
            if !laps.is_empty() && stint_laps_elapsed > 0 && state.fuel_pct < 100.0 {
                (Some((100.0 - state.fuel_pct) / stint_laps_elapsed as f64), FuelRateSource::Stint)
            } else if let Some(rate) = default_rate {
                flags.push(FeatureFlag::DefaultFuelRate);
                (Some(rate), FuelRateSource::ConfiguredDefault)
            } else {
                flags.push(FeatureFlag::FuelRateUnknown);
                (None, FuelRateSource::Unknown)
            };

        let stint_start = state.last_pit_lap.unwrap_or(0);
        let stint: Vec<(u32, f64)> =
            laps.iter().copied().filter(|(lap, _)| *lap > stint_start).collect();
        if stint.len() < self.min_stint_laps {
            flags.push(FeatureFlag::ShortStint);
        }

        let degradation_factor = conditions.map_or(1.0, SessionConditions::degradation_factor);
        if conditions.is_some_and(|c| c.rain) {
            flags.push(FeatureFlag::Rain);
        }
        let stint_fit = line_fit(&as_points(&stint));

        let features = FeatureVector {
            vehicle_id: state.vehicle_id.clone(),
            lap_number: state.current_lap,
            fuel_pct: state.fuel_pct,
            tire_deg_pct: state.tire_deg_pct,
            position: state.position,
            gap_to_leader_seconds: state.gap_to_leader_seconds,
            rolling_mean_lap_ms: rolling.map(|(mean, _)| mean),
            rolling_std_lap_ms: rolling.map(|(_, std)| std),
            window_laps: window.len(),
            fuel_pct_per_lap,
            fuel_rate_source,
            tire_deg_slope_ms: stint_fit.map(|fit| fit.slope * degradation_factor),
            tire_deg_slope_stderr_ms: stint_fit.map(|fit| fit.slope_stderr * degradation_factor),
            stint_laps: stint.len(),
            pace_trend_ms,
            degradation_factor,
            flags,
        };

        if features.fuel_rate_source != FuelRateSource::Stint {
            warn!(
                vehicle_id = %state.vehicle_id,
                lap = state.current_lap,
                source = ?features.fuel_rate_source,
                "Fuel burn not measured from stint data"
            );
        }
        debug!(
            vehicle_id = %state.vehicle_id,
            lap = state.current_lap,
            window = features.window_laps,
            stint_laps = features.stint_laps,
            flags = ?features.flags,
            "Built feature vector"
        );

        Ok(features)
    }
}

fn as_points(laps: &[(u32, f64)]) -> Vec<(f64, f64)> {
    laps.iter().map(|(lap, ms)| (*lap as f64, *ms)).collect()
}
