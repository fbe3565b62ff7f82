//! Pit window planner: best pit lap within a short lookahead

use crate::config::StrategyConfig;
use crate::features::FeatureVector;
use crate::types::{PitRiskLevel, PitWindow, VehicleState};

/// Fuel level below which a candidate pit lap is unreachable
const MIN_ARRIVAL_FUEL_PCT: f64 = 5.0;
/// Seconds per lap lost on fully worn tires
const FULL_WEAR_LOSS_SECONDS: f64 = 1.5;

/// Scan the next laps for the pit lap with the best net time benefit.
///
/// Returns `None` when the fuel burn is unknown or the race is already over.
/// When every candidate lap arrives below minimum fuel the window collapses
/// to the next lap with [`PitRiskLevel::Critical`].
pub fn plan(
    state: &VehicleState,
    features: Option<&FeatureVector>,
    config: &StrategyConfig,
) -> Option<PitWindow> {
    if state.current_lap >= config.race_length_laps {
        return None;
    }
    let fuel_rate = features
        .and_then(|f| f.fuel_pct_per_lap)
        .or_else(|| config.default_fuel_rate_for(&state.vehicle_id))?;

    let slope = features.and_then(|f| f.tire_deg_slope_ms).unwrap_or(0.0).max(0.0);
    let weather = features.map_or(1.0, |f| f.degradation_factor);
    let tire_rate = config.default_tire_deg_pct_per_lap
        * weather
        * (1.0 + (slope / config.reference_deg_slope_ms).min(1.0));

    let last_candidate = (state.current_lap + config.pit_window_lookahead_laps).min(config.race_length_laps);
    let mut best: Option<PitWindow> = None;

    for pit_lap in state.current_lap + 1..=last_candidate {
        let laps_to_pit = (pit_lap - state.current_lap) as f64;
        let fuel_at_pit_pct = state.fuel_pct - laps_to_pit * fuel_rate;
        if fuel_at_pit_pct < MIN_ARRIVAL_FUEL_PCT {
            continue;
        }
        let tire_at_pit_pct = (state.tire_deg_pct + laps_to_pit * tire_rate).min(100.0);

        let laps_after_pit = (config.race_length_laps - pit_lap) as f64;
        let loss_per_lap = tire_at_pit_pct / 100.0 * FULL_WEAR_LOSS_SECONDS;
        let net_benefit_seconds = laps_after_pit * loss_per_lap - config.pit_loss_seconds;

        let risk = if fuel_at_pit_pct > 20.0 {
            PitRiskLevel::Low
        } else if fuel_at_pit_pct > 10.0 {
            PitRiskLevel::Medium
        } else {
            PitRiskLevel::High
        };

        let candidate =
            PitWindow { pit_lap, fuel_at_pit_pct, tire_at_pit_pct, net_benefit_seconds, risk };
        if best.as_ref().is_none_or(|b| candidate.net_benefit_seconds > b.net_benefit_seconds) {
            best = Some(candidate);
        }
    }

    best.or_else(|| {
        Some(PitWindow {
            pit_lap: state.current_lap + 1,
            fuel_at_pit_pct: (state.fuel_pct - fuel_rate).max(0.0),
            tire_at_pit_pct: (state.tire_deg_pct + tire_rate).min(100.0),
            net_benefit_seconds: 0.0,
            risk: PitRiskLevel::Critical,
        })
    })
}
