//! Randomized size estimation.
//!
//! Stand-in for a future measurement model: weight and length are drawn
//! from fixed uniform ranges and do not depend on the classified species or
//! the image content. Callers must not assume any correlation.

use crate::core::types::{SizeCategory, SizeEstimate};
use rand::Rng;

pub const MIN_WEIGHT_KG: f64 = 0.5;
pub const MAX_WEIGHT_KG: f64 = 3.0;
pub const MIN_LENGTH_CM: f64 = 20.0;
pub const MAX_LENGTH_CM: f64 = 60.0;

/// Weights below this are Medium, at or above it Large.
pub const LARGE_WEIGHT_CUTOFF_KG: f64 = 1.5;

/// Draw a weight/length/category estimate from the injected RNG.
pub fn estimate(rng: &mut impl Rng) -> SizeEstimate {
    let weight_kg = rng.random_range(MIN_WEIGHT_KG..=MAX_WEIGHT_KG);
    let length_cm = rng.random_range(MIN_LENGTH_CM..=MAX_LENGTH_CM);
    SizeEstimate {
        weight_kg,
        length_cm,
        category: categorize(weight_kg),
    }
}

pub fn categorize(weight_kg: f64) -> SizeCategory {
    if weight_kg < LARGE_WEIGHT_CUTOFF_KG {
        SizeCategory::Medium
    } else {
        SizeCategory::Large
    }
}
