//! Historical lap records and session conditions

use serde::{Deserialize, Serialize};

/// Laps beyond this number are source artefacts and never used.
pub const MAX_VALID_LAP: u32 = 100;

/// One completed lap as delivered by the historical data store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LapRecord {
    pub vehicle_id: String,
    pub lap_number: u32,
    /// Lap time in milliseconds; `None` for laps the timing system voided
    pub lap_time_ms: Option<u64>,
    /// Wall-clock completion time, milliseconds since the Unix epoch
    pub timestamp: u64,
}

impl LapRecord {
    pub fn new(
        vehicle_id: impl Into<String>,
        lap_number: u32,
        lap_time_ms: Option<u64>,
        timestamp: u64,
    ) -> Self {
        Self { vehicle_id: vehicle_id.into(), lap_number, lap_time_ms, timestamp }
    }

    /// A lap counts when it has a positive time and a lap number in `1..=MAX_VALID_LAP`.
    pub fn is_valid(&self) -> bool {
        matches!(self.lap_time_ms, Some(ms) if ms > 0)
            && (1..=MAX_VALID_LAP).contains(&self.lap_number)
    }

    /// Lap time in milliseconds as a float, for valid laps only.
    pub fn lap_time(&self) -> Option<f64> {
        if self.is_valid() { self.lap_time_ms.map(|ms| ms as f64) } else { None }
    }
}

/// Weather context for the session.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SessionConditions {
    pub air_temp_c: f64,
    pub track_temp_c: f64,
    pub rain: bool,
}

/// Track temperature above which wear accelerates
const REFERENCE_TRACK_TEMP_C: f64 = 35.0;
/// Extra wear per degree above the reference
const HEAT_WEAR_PER_DEGREE: f64 = 0.02;
const RAIN_WEAR_FACTOR: f64 = 1.25;

impl Default for SessionConditions {
    fn default() -> Self {
        Self { air_temp_c: 25.0, track_temp_c: REFERENCE_TRACK_TEMP_C, rain: false }
    }
}

impl SessionConditions {
    /// Multiplier on the tire-degradation estimate (1.0 = nominal).
    pub fn degradation_factor(&self) -> f64 {
        let heat = (self.track_temp_c - REFERENCE_TRACK_TEMP_C).max(0.0) * HEAT_WEAR_PER_DEGREE;
        let rain = if self.rain { RAIN_WEAR_FACTOR } else { 1.0 };
        (1.0 + heat) * rain
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lap_validity() {
        assert!(LapRecord::new("car", 1, Some(150_000), 0).is_valid());
        assert!(LapRecord::new("car", 100, Some(150_000), 0).is_valid());
        assert!(!LapRecord::new("car", 101, Some(150_000), 0).is_valid());
        assert!(!LapRecord::new("car", 0, Some(150_000), 0).is_valid());
        assert!(!LapRecord::new("car", 5, None, 0).is_valid());
        assert!(!LapRecord::new("car", 5, Some(0), 0).is_valid());
        assert_eq!(LapRecord::new("car", 5, None, 0).lap_time(), None);
    }

    #[test]
    fn degradation_factor_reacts_to_heat_and_rain() {
        let nominal = SessionConditions::default();
        assert_eq!(nominal.degradation_factor(), 1.0);

        let cool = SessionConditions { track_temp_c: 20.0, ..nominal };
        assert_eq!(cool.degradation_factor(), 1.0);

        let hot = SessionConditions { track_temp_c: 45.0, ..nominal };
        assert!((hot.degradation_factor() - 1.2).abs() < 1e-9);

        let wet = SessionConditions { rain: true, ..nominal };
        assert!((wet.degradation_factor() - 1.25).abs() < 1e-9);
    }
}
