//! Market valuation: base-price lookup times grade multiplier.
//!
//! The same policy is applied on the single-image and batch paths. An
//! earlier revision priced batch items from a random range instead; that
//! divergence was judged accidental and unified on the table-driven policy.

use crate::core::catalog;
use crate::core::types::{Grade, MarketValuation};

/// Grade multiplier applied to the species base price.
pub fn multiplier(grade: Grade) -> f64 {
    match grade {
        Grade::Premium => 1.2,
        Grade::Standard => 1.0,
        Grade::Poor => 0.8,
    }
}

/// Monetary estimate for a (species, grade) pair.
///
/// Unknown species fall back to `catalog::DEFAULT_BASE_PRICE`. The grade
/// argument is an exhaustive enum, so an unknown grade is unrepresentable.
pub fn valuate(species: &str, grade: Grade) -> MarketValuation {
    let base_price = catalog::base_price(species);
    let multiplier = multiplier(grade);
    let total_value = base_price * multiplier;
    MarketValuation {
        base_price,
        multiplier,
        total_value,
        premium: total_value - base_price,
        price_per_pound: total_value,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::catalog::DEFAULT_BASE_PRICE;

    #[test]
    fn test_multipliers_exact() {
        assert_eq!(multiplier(Grade::Premium), 1.2);
        assert_eq!(multiplier(Grade::Standard), 1.0);
        assert_eq!(multiplier(Grade::Poor), 0.8);
    }

    #[test]
    fn test_sea_bass_premium_scenario() {
        let valuation = valuate("Sea Bass", Grade::Premium);
        assert_eq!(valuation.base_price, 24.0);
        assert!((valuation.total_value - 28.8).abs() < 1e-9);
        assert!((valuation.premium - 4.8).abs() < 1e-9);
    }

    #[test]
    fn test_unknown_species_standard() {
        let valuation = valuate("Anglerfish", Grade::Standard);
        assert_eq!(valuation.base_price, DEFAULT_BASE_PRICE);
        assert_eq!(valuation.total_value, DEFAULT_BASE_PRICE);
        assert_eq!(valuation.premium, 0.0);
    }

    #[test]
    fn test_total_is_base_times_multiplier() {
        for species in ["Trout", "Shrimp", "Red Mullet", "Nothing"] {
            for grade in [Grade::Premium, Grade::Standard, Grade::Poor] {
                let v = valuate(species, grade);
                assert_eq!(v.total_value, v.base_price * multiplier(grade));
            }
        }
    }
}
