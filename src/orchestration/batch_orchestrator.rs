//! Batch Orchestrator: runs the analysis pipeline over N images with
//! per-item failure isolation.
//!
//! Items are processed strictly in input order. A decode or classification
//! failure on item i yields an error entry at position i and never aborts
//! items i+1..N. Valuation uses the same table-driven policy as the
//! single-image path.

use crate::core::errors::AnalysisError;
use crate::core::types::{Grade, ItemOutcome};
use crate::db::{HistoryStore, NewHistoryRecord};
use crate::services::classifier::Classifier;
use crate::services::{grading, market, sizing};
use crate::utils::image_ops;
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::Arc;
use tracing::{debug, warn};

/// Per-item stage outputs before they are folded into an `ItemOutcome`.
struct ItemAnalysis {
    species: String,
    confidence: f64,
    grade: Grade,
    score: f64,
    weight_kg: f64,
    total_value: f64,
}

pub struct BatchOrchestrator {
    classifier: Arc<dyn Classifier>,
    history: Arc<HistoryStore>,
    rng: Mutex<StdRng>,
}

impl BatchOrchestrator {
    pub fn new(
        classifier: Arc<dyn Classifier>,
        history: Arc<HistoryStore>,
        rng_seed: Option<u64>,
    ) -> Self {
        let rng = match rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self {
            classifier,
            history,
            rng: Mutex::new(rng),
        }
    }

    /// Process every image, in order. Always returns one entry per input.
    pub async fn run(&self, images: &[String], save: bool) -> Vec<ItemOutcome> {
        let mut results = Vec::with_capacity(images.len());

        for (i, payload) in images.iter().enumerate() {
            let filename = format!("batch_{}.jpg", i + 1);

            match self.process_item(payload).await {
                Ok(analysis) => {
                    let outcome = ItemOutcome {
                        filename: filename.clone(),
                        species: Some(analysis.species.clone()),
                        quality: Some(analysis.grade),
                        weight: Some(analysis.weight_kg),
                        market_value: Some(analysis.total_value),
                        confidence: Some(analysis.confidence),
                        error: None,
                    };

                    if save {
                        let record = NewHistoryRecord {
                            filename: &filename,
                            analysis_type: "batch",
                            species: &analysis.species,
                            quality_grade: analysis.grade.as_str(),
                            quality_score: analysis.score,
                            weight: analysis.weight_kg,
                            market_value: analysis.total_value,
                            full_results: serde_json::to_value(&outcome)
                                .unwrap_or(serde_json::Value::Null),
                        };
                        self.history.append_best_effort(record).await;
                    }

                    results.push(outcome);
                }
                Err(e) => {
                    warn!("Batch item {} failed: {}", i + 1, e);
                    results.push(ItemOutcome::failure(filename, e.to_string()));
                }
            }
        }

        debug!(
            "Batch complete: {}/{} items succeeded",
            results.iter().filter(|r| r.is_success()).count(),
            results.len()
        );

        results
    }

    /// Simplified per-item derivation: classify, grade, draw a weight, and
    /// price it with the shared valuation table.
    async fn process_item(&self, payload: &str) -> Result<ItemAnalysis, AnalysisError> {
        let img = image_ops::decode_data_url(payload)?;
        let classification = self.classifier.classify(&img).await?;

        let (grade, score) = grading::grade_confidence(classification.confidence);
        let weight_kg = {
            let mut rng = self.rng.lock();
            sizing::estimate(&mut *rng).weight_kg
        };
        let valuation = market::valuate(&classification.species, grade);

        Ok(ItemAnalysis {
            species: classification.species,
            confidence: classification.confidence,
            grade,
            score,
            weight_kg,
            total_value: valuation.total_value,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::catalog::SPECIES;
    use crate::orchestration::pipeline::test_support::StubClassifier;
    use base64::{engine::general_purpose, Engine};
    use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
    use std::io::Cursor;

    fn valid_data_url() -> String {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(8, 8, Rgb([10, 20, 30])));
        let mut png_bytes = Vec::new();
        img.write_to(&mut Cursor::new(&mut png_bytes), ImageFormat::Png)
            .unwrap();
        format!(
            "data:image/png;base64,{}",
            general_purpose::STANDARD.encode(&png_bytes)
        )
    }

    async fn orchestrator(save_target: Arc<HistoryStore>) -> BatchOrchestrator {
        BatchOrchestrator::new(
            Arc::new(StubClassifier::confident(5, 50.0)),
            save_target,
            Some(11),
        )
    }

    #[tokio::test]
    async fn test_failed_item_does_not_abort_batch() {
        let history = Arc::new(HistoryStore::open_in_memory().await.unwrap());
        let orchestrator = orchestrator(history).await;

        let images = vec![
            valid_data_url(),
            "data:image/png;base64,not-an-image".to_string(),
            valid_data_url(),
        ];
        let results = orchestrator.run(&images, false).await;

        assert_eq!(results.len(), 3);
        assert!(results[0].is_success());
        assert!(!results[1].is_success());
        assert!(results[1].error.is_some());
        assert!(results[2].is_success());
        // Output order matches input order
        assert_eq!(results[0].filename, "batch_1.jpg");
        assert_eq!(results[1].filename, "batch_2.jpg");
        assert_eq!(results[2].filename, "batch_3.jpg");
    }

    #[tokio::test]
    async fn test_valuation_matches_single_path_policy() {
        let history = Arc::new(HistoryStore::open_in_memory().await.unwrap());
        let orchestrator = orchestrator(history).await;

        let results = orchestrator.run(&[valid_data_url()], false).await;
        let item = &results[0];

        assert_eq!(item.species.as_deref(), Some(SPECIES[5])); // Sea Bass
        assert_eq!(item.quality, Some(Grade::Premium));
        // Same table+multiplier policy as /analyze: 24.0 * 1.2
        assert!((item.market_value.unwrap() - 28.8).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_save_appends_only_successful_items() {
        let history = Arc::new(HistoryStore::open_in_memory().await.unwrap());
        let orchestrator = orchestrator(history.clone()).await;

        let images = vec![valid_data_url(), "garbage".to_string(), valid_data_url()];
        orchestrator.run(&images, true).await;

        let records = history.list(50, 0).await.unwrap();
        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|r| r.analysis_type == "batch"));
        // Newest first: batch_3 was appended after batch_1
        assert_eq!(records[0].filename, "batch_3.jpg");
    }

    #[tokio::test]
    async fn test_empty_input_yields_empty_output() {
        let history = Arc::new(HistoryStore::open_in_memory().await.unwrap());
        let orchestrator = orchestrator(history).await;
        assert!(orchestrator.run(&[], false).await.is_empty());
    }
}
