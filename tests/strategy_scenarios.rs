//! End-to-end strategy scenarios
//!
//! Drives the public API the way a pit-wall dashboard would: vehicle state and
//! lap history in, recommendation and decision trace out.

use std::sync::Arc;

use anyhow::{Context, Result, ensure};
use pitwall_strategy::{
    Action, CautionPolicy, FeatureBuilder, InputStatus, LapRecord, LapTimeModel, ModelKind,
    PitWindowRiskModel, RationaleFactor, SessionConditions, StrategyConfig, StrategyError,
    StrategyOptimizer, StrategyRequest, StrategyScorer, TraceInput, TrainingSet, VehicleState,
};
use proptest::prelude::*;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn history(vehicle_id: &str, laps: u32, base_ms: u64, step_ms: u64) -> Vec<LapRecord> {
    (1..=laps)
        .map(|lap| LapRecord::new(vehicle_id, lap, Some(base_ms + (lap as u64 - 1) * step_ms), lap as u64))
        .collect()
}

/// Ten cars, `spacing` seconds apart.
fn field(spacing: f64) -> Vec<VehicleState> {
    (1..=10)
        .map(|p| VehicleState::new(format!("car-{p}"), 12, 50.0, 40.0, p, (p - 1) as f64 * spacing))
        .collect()
}

#[test]
fn low_fuel_and_worn_tires_open_the_pit_window() -> Result<()> {
    init_tracing();
    let scorer = StrategyScorer::new(&StrategyConfig::default());
    let state = VehicleState::new("car-4", 12, 15.0, 65.0, 4, 2.3);

    let rec = scorer.score_state(&state)?;
    ensure!(
        matches!(rec.action, Action::PitWindowOpening | Action::PitNow),
        "expected the pit window to open, got {:?}",
        rec.action
    );
    Ok(())
}

#[test]
fn caution_with_one_place_at_stake_upgrades_to_pit_now() -> Result<()> {
    init_tracing();
    let config = StrategyConfig::default();
    // P4 at 30 s in a field spaced 10 s apart: only P5 is inside the 12 s caution stop
    let state = VehicleState::new("car-4", 12, 15.0, 65.0, 4, 30.0);
    let baseline = StrategyScorer::new(&config).score_state(&state)?;
    ensure!(baseline.action == Action::PitWindowOpening);

    let policy = CautionPolicy::new(&config);
    ensure!(policy.pit_cost(&state, &field(10.0)).positions_lost == 1);

    let rec = policy.evaluate(&state, &field(10.0), &baseline)?;
    assert_eq!(rec.action, Action::PitNow);
    assert_eq!(baseline.action, Action::PitWindowOpening, "baseline must not change");
    Ok(())
}

#[test]
fn measured_burn_below_one_lap_of_fuel_pits_now() -> Result<()> {
    init_tracing();
    let optimizer = StrategyOptimizer::new(StrategyConfig::default())?;
    // laps 1-4 done at 20.5%/lap, 18% left: under one lap of fuel
    let request = StrategyRequest::new(VehicleState::new("car-7", 5, 18.0, 30.0, 7, 12.0))
        .with_history(history("car-7", 4, 150_000, 50));

    let rec = optimizer.recommend(&request)?.recommendation;
    let laps_of_fuel = rec.score("laps_of_fuel").context("fuel burn should be measured")?;
    ensure!((laps_of_fuel - 18.0 / 20.5).abs() < 1e-9, "laps of fuel {laps_of_fuel}");
    assert_eq!(rec.action, Action::PitNow);
    assert_eq!(rec.rationale[0].factor, RationaleFactor::FuelCritical);
    Ok(())
}

#[test]
fn healthy_leader_stays_out() -> Result<()> {
    let scorer = StrategyScorer::new(&StrategyConfig::default());
    let rec = scorer.score_state(&VehicleState::new("car-1", 5, 90.0, 10.0, 1, 0.0))?;
    assert_eq!(rec.action, Action::StayOut);
    assert!(rec.urgency_score < 0.3, "urgency {}", rec.urgency_score);
    Ok(())
}

#[test]
fn empty_history_without_default_is_insufficient_data() {
    let config = StrategyConfig { default_fuel_pct_per_lap: None, ..Default::default() };
    let state = VehicleState::new("car-1", 5, 80.0, 20.0, 3, 4.0);
    let err = FeatureBuilder::new(&config).build(&state, &[], None).unwrap_err();
    assert!(matches!(err, StrategyError::InsufficientData { .. }));
}

#[test]
fn optimizer_trace_explains_every_input() -> Result<()> {
    init_tracing();
    let config = StrategyConfig::default();
    let optimizer = StrategyOptimizer::new(config.clone())?.with_default_models();
    let request = StrategyRequest::new(VehicleState::new("car-9", 8, 55.0, 48.0, 9, 21.0))
        .with_history(history("car-9", 7, 151_000, 120))
        .with_conditions(SessionConditions { track_temp_c: 48.0, ..Default::default() });

    let outcome = optimizer.recommend(&request)?;
    let trace = &outcome.trace;
    ensure!(trace.status_of(TraceInput::Features).is_some());
    for kind in [ModelKind::LapTime, ModelKind::FinishPosition, ModelKind::PitWindowRisk] {
        let status = trace
            .status_of(TraceInput::Model(kind))
            .with_context(|| format!("{kind} missing from trace"))?;
        if status == InputStatus::Ignored {
            ensure!(
                outcome.recommendation.mentions(RationaleFactor::PredictionIgnored(kind)),
                "{kind} ignored but not named in the rationale"
            );
        }
    }
    // cold-start regressions never contribute
    assert_eq!(trace.status_of(TraceInput::Model(ModelKind::LapTime)), Some(InputStatus::Ignored));
    Ok(())
}

#[test]
fn models_train_from_observed_laps() -> Result<()> {
    init_tracing();
    let config = StrategyConfig::default();
    let builder = FeatureBuilder::new(&config);

    let mut laps = Vec::new();
    let mut observations = Vec::new();
    let cars = [(4.0, 3.0, 100, 150_000), (5.0, 5.0, 150, 151_000), (6.0, 2.0, 50, 152_000), (7.0, 6.0, 200, 153_000)];
    for (i, (burn, wear, step, base)) in cars.into_iter().enumerate() {
        let id = format!("car-{i}");
        let car_laps = history(&id, 10, base, step);
        for lap in &car_laps {
            let done = (lap.lap_number - 1) as f64;
            let state = VehicleState::new(&id, lap.lap_number, 100.0 - burn * done, wear * done, i as u32 + 1, 2.0 * i as f64);
            observations.push((state, lap.clone()));
        }
        laps.extend(car_laps);
    }

    let set = TrainingSet::from_observations(&builder, &observations, &laps);
    ensure!(set.lap_time.len() == 36, "expected 9 samples per car, got {}", set.lap_time.len());

    let model = LapTimeModel::train(&set, &config).context("lap-time model should fit")?;
    ensure!(model.is_trained());

    let optimizer = StrategyOptimizer::new(config.clone())?
        .with_model(Arc::new(model))
        .with_model(Arc::new(PitWindowRiskModel::from_config(&config)));
    let state = VehicleState::new("car-1", 10, 55.0, 45.0, 2, 2.0);
    let outcome = optimizer.recommend(&StrategyRequest::new(state).with_history(laps))?;
    let status = outcome.trace.status_of(TraceInput::Model(ModelKind::LapTime));
    ensure!(matches!(status, Some(InputStatus::Used | InputStatus::Ignored)), "status {status:?}");
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn field_pass_runs_concurrently_in_order() -> Result<()> {
    init_tracing();
    let optimizer = StrategyOptimizer::default().with_default_models();
    let requests: Vec<_> = (1..=12)
        .map(|p| {
            let state = VehicleState::new(format!("car-{p}"), 9, 100.0 - 7.0 * p as f64, 6.0 * p as f64, p, p as f64);
            StrategyRequest::new(state).with_history(history(&format!("car-{p}"), 8, 150_000 + p as u64 * 100, 80))
        })
        .collect();

    let results = optimizer.recommend_field_concurrent(requests).await;
    ensure!(results.len() == 12);
    let mut previous = Action::StayOut;
    for (i, result) in results.into_iter().enumerate() {
        let outcome = result?;
        assert_eq!(outcome.recommendation.vehicle_id, format!("car-{}", i + 1));
        // less fuel and more wear further down the list
        assert!(outcome.recommendation.action >= previous);
        previous = outcome.recommendation.action;
    }
    Ok(())
}

fn scorer() -> StrategyScorer {
    StrategyScorer::new(&StrategyConfig::default())
}

proptest! {
    #[test]
    fn full_tank_fresh_tires_never_pits(
        lap in 1u32..=20,
        position in 1u32..=31,
        gap in 0.0f64..120.0,
    ) {
        let rec = scorer().score_state(&VehicleState::new("car", lap, 100.0, 0.0, position, gap)).unwrap();
        prop_assert_ne!(rec.action, Action::PitNow);
        prop_assert!(rec.urgency_score < 0.3);
    }

    #[test]
    fn empty_tank_always_pits(
        lap in 1u32..=20,
        tire in 0.0f64..=100.0,
        position in 1u32..=31,
        gap in 0.0f64..120.0,
    ) {
        let rec = scorer().score_state(&VehicleState::new("car", lap, 0.0, tire, position, gap)).unwrap();
        prop_assert_eq!(rec.action, Action::PitNow);
    }

    #[test]
    fn urgency_is_monotonic_in_tire_wear(
        fuel in 0.0f64..=100.0,
        tire in 0.0f64..=100.0,
        extra in 0.0f64..=100.0,
        position in 1u32..=31,
    ) {
        let worn = (tire + extra).min(100.0);
        let a = scorer().score_state(&VehicleState::new("car", 10, fuel, tire, position, 5.0)).unwrap();
        let b = scorer().score_state(&VehicleState::new("car", 10, fuel, worn, position, 5.0)).unwrap();
        prop_assert!(b.urgency_score >= a.urgency_score);
        prop_assert!(b.action >= a.action);
    }

    #[test]
    fn scoring_is_idempotent(
        fuel in 0.0f64..=100.0,
        tire in 0.0f64..=100.0,
        position in 1u32..=31,
    ) {
        let state = VehicleState::new("car", 10, fuel, tire, position, 5.0);
        let first = serde_yaml_ng::to_string(&scorer().score_state(&state).unwrap()).unwrap();
        let second = serde_yaml_ng::to_string(&scorer().score_state(&state).unwrap()).unwrap();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn caution_never_downgrades_pit_now(
        fuel in 0.0f64..4.9,
        tire in 0.0f64..=100.0,
        spacing in 0.1f64..20.0,
    ) {
        let config = StrategyConfig::default();
        let state = VehicleState::new("car-4", 10, fuel, tire, 4, 3.0 * spacing);
        let baseline = scorer().score_state(&state).unwrap();
        prop_assert_eq!(baseline.action, Action::PitNow);
        let rec = CautionPolicy::new(&config).evaluate(&state, &field(spacing), &baseline).unwrap();
        prop_assert_eq!(rec.action, Action::PitNow);
    }
}
