//! Caution Response Policy
//!
//! Re-evaluates a green-flag recommendation while a caution is out. The field
//! bunches up behind the safety car, so a stop costs only
//! `pit_loss_seconds * (1 - caution_pit_discount)`. The number of rivals whose
//! gap to the leader falls inside that window is the estimated position loss.
//!
//! When the loss is within `caution_max_position_loss` the baseline urgency is
//! scaled by `1 + caution_pit_discount`, and any car that lands in the pit
//! window (or qualifies for a free or recovery stop) is told to pit now. The
//! policy never lowers the baseline action and never mutates the baseline.

use tracing::{debug, warn};

use crate::config::StrategyConfig;
use crate::types::{Action, RationaleEntry, RationaleFactor, Recommendation, VehicleState};
use crate::{Result, StrategyError};

/// Outcome of the caution position-cost estimate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PitCost {
    /// Time lost in the pits under caution
    pub effective_pit_loss_seconds: f64,
    /// Rivals that would pass while the car is in the pits
    pub positions_lost: u32,
}

/// Caution-flag decision layer.
#[derive(Debug, Clone)]
pub struct CautionPolicy {
    config: StrategyConfig,
}

impl CautionPolicy {
    pub fn new(config: &StrategyConfig) -> Self {
        Self { config: config.clone() }
    }

    /// Estimate how many places pitting under caution costs `state`.
    ///
    /// Rivals are matched by gap to the leader; the car itself and entries
    /// with a non-finite gap are skipped.
    pub fn pit_cost(&self, state: &VehicleState, field: &[VehicleState]) -> PitCost {
        let effective_pit_loss_seconds = self.config.pit_loss_seconds * (1.0 - self.config.caution_pit_discount);
        let own_gap = state.gap_to_leader_seconds;
        let window_end = own_gap + effective_pit_loss_seconds;

        let mut positions_lost = 0;
        for rival in field.iter().filter(|rival| rival.vehicle_id != state.vehicle_id) {
            if !rival.gap_to_leader_seconds.is_finite() {
                warn!(vehicle_id = %rival.vehicle_id, "Ignoring rival with non-finite gap");
                continue;
            }
            if rival.gap_to_leader_seconds > own_gap && rival.gap_to_leader_seconds <= window_end {
                positions_lost += 1;
            }
        }

        PitCost { effective_pit_loss_seconds, positions_lost }
    }

    /// Re-evaluate `baseline` under caution. Returns a new recommendation.
    pub fn evaluate(
        &self,
        state: &VehicleState,
        field: &[VehicleState],
        baseline: &Recommendation,
    ) -> Result<Recommendation> {
        state.validate()?;
        if baseline.vehicle_id != state.vehicle_id {
            return Err(StrategyError::invalid_state(
                "caution evaluation",
                format!(
                    "baseline is for vehicle '{}', state is for '{}'",
                    baseline.vehicle_id, state.vehicle_id
                ),
            ));
        }

        let config = &self.config;
        let thresholds = &config.urgency_thresholds;
        let cost = self.pit_cost(state, field);
        let position_cost_ok = cost.positions_lost <= config.caution_max_position_loss;

        let adjusted = if position_cost_ok {
            (baseline.urgency_score * (1.0 + config.caution_pit_discount)).min(1.0)
        } else {
            baseline.urgency_score
        };

        let mut notes = vec![
            RationaleEntry::new(
                RationaleFactor::CautionPitDiscount,
                format!(
                    "caution: pit stop costs {:.1}s instead of {:.1}s",
                    cost.effective_pit_loss_seconds, config.pit_loss_seconds
                ),
            ),
            RationaleEntry::new(
                RationaleFactor::CautionPositionCost,
                format!(
                    "pitting costs {} place(s), limit {}",
                    cost.positions_lost, config.caution_max_position_loss
                ),
            ),
        ];

        let mut candidate = Action::from_urgency(adjusted, thresholds);
        if state.fuel_pct < config.caution_free_stop_fuel_pct
            || state.tire_deg_pct > config.caution_free_stop_tire_pct
        {
            candidate = candidate.max(Action::PitWindowOpening);
            notes.push(RationaleEntry::new(
                RationaleFactor::CautionFreeStop,
                format!(
                    "free stop: fuel {:.0}%, tires {:.0}% worn",
                    state.fuel_pct, state.tire_deg_pct
                ),
            ));
        } else if state.position > config.caution_recovery_position
            && state.gap_to_leader_seconds > config.caution_recovery_gap_seconds
        {
            candidate = candidate.max(Action::PitWindowOpening);
            notes.push(RationaleEntry::new(
                RationaleFactor::CautionRecoveryStop,
                format!(
                    "P{} and {:.1}s back: little track position to lose",
                    state.position, state.gap_to_leader_seconds
                ),
            ));
        }
        if candidate >= Action::PitWindowOpening && position_cost_ok {
            candidate = Action::PitNow;
        }

        let action = baseline.action.max(candidate);
        if baseline.action == Action::PitNow {
            notes.push(RationaleEntry::new(
                RationaleFactor::CautionHold,
                "already PIT_NOW under green; caution keeps it",
            ));
        } else if action > baseline.action {
            notes.push(RationaleEntry::new(
                RationaleFactor::CautionUpgrade,
                format!("upgraded from {:?} to {:?} under caution", baseline.action, action),
            ));
        }

        if state.position <= 3 {
            notes.push(RationaleEntry::new(
                RationaleFactor::ProtectTrackPosition,
                format!("P{}: protect track position", state.position),
            ));
        } else if state.fuel_pct > 60.0 && state.tire_deg_pct < 50.0 {
            notes.push(RationaleEntry::new(
                RationaleFactor::StayOutOpportunity,
                "fuel and tires healthy: staying out may gain track position",
            ));
        }

        let urgency_score = adjusted.max(action.urgency_floor(thresholds));

        let mut numeric_scores = baseline.numeric_scores.clone();
        numeric_scores.insert("caution.effective_pit_loss".to_string(), cost.effective_pit_loss_seconds);
        numeric_scores.insert("caution.position_loss".to_string(), cost.positions_lost as f64);
        numeric_scores.insert("caution.adjusted".to_string(), adjusted);
        numeric_scores.insert("urgency".to_string(), urgency_score);

        let mut rationale = notes;
        rationale.extend(baseline.rationale.iter().cloned());

        debug!(
            vehicle_id = %state.vehicle_id,
            baseline = ?baseline.action,
            action = ?action,
            positions_lost = cost.positions_lost,
            "Caution evaluation"
        );

        Ok(Recommendation {
            action,
            urgency: action.urgency(),
            urgency_score,
            rationale,
            numeric_scores,
            ..baseline.clone()
        })
    }
}
