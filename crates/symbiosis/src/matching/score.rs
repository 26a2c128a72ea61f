//! Deterministic match score.
//!
//! ```text
//! base 0.5
//! +0.20 when no conversion is needed
//! +0.15 low | +0.05 medium | -0.10 high | +0 unknown complexity
//! +0.15 when distance < 100, +0.05 when distance < 500
//! clamped to [0, 1]
//! ```

use crate::models::Location;
use crate::oracle::{Complexity, ConversionEstimate};

/// Degrees-to-distance factor applied to the squared coordinate delta.
pub const DISTANCE_FACTOR: f64 = 111.0;

const BASE: f64 = 0.5;
const NO_CONVERSION_BONUS: f64 = 0.2;
const NEAR_DISTANCE: f64 = 100.0;
const REGIONAL_DISTANCE: f64 = 500.0;

/// Planar distance proxy: `(Δlat² + Δlng²) × 111`.
///
/// Not a great-circle distance and not even a Euclidean one (there is no
/// square root); the thresholds in [`score`] are tuned to this value.
pub fn planar_distance(a: &Location, b: &Location) -> f64 {
    let dlat = a.lat - b.lat;
    let dlng = a.lng - b.lng;
    (dlat * dlat + dlng * dlng) * DISTANCE_FACTOR
}

fn complexity_adjustment(complexity: Complexity) -> f64 {
    match complexity {
        Complexity::Low => 0.15,
        Complexity::Medium => 0.05,
        Complexity::High => -0.10,
        Complexity::Unknown => 0.0,
    }
}

fn proximity_bonus(distance: f64) -> f64 {
    if distance < NEAR_DISTANCE {
        0.15
    } else if distance < REGIONAL_DISTANCE {
        0.05
    } else {
        0.0
    }
}

pub fn score(conversion_needed: bool, complexity: Complexity, distance: f64) -> f64 {
    let mut total = BASE;
    if !conversion_needed {
        total += NO_CONVERSION_BONUS;
    }
    total += complexity_adjustment(complexity);
    total += proximity_bonus(distance);
    total.clamp(0.0, 1.0)
}

/// Score for a producer/candidate pair given the conversion estimate.
pub fn compute_score(
    producer: &Location,
    candidate: &Location,
    conversion: &ConversionEstimate,
) -> f64 {
    score(
        conversion.conversion_needed,
        conversion.complexity,
        planar_distance(producer, candidate),
    )
}
