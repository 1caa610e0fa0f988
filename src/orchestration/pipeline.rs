//! Single-image analysis pipeline.
//!
//! decode -> preprocess/classify -> grade -> size -> valuate -> compose.
//! The classifier comes in as an explicit handle so a stub can stand in for
//! the ONNX model under test; the RNG is seedable for the same reason.

use crate::core::errors::AnalysisError;
use crate::core::types::{AnalysisResult, Classification};
use crate::services::classifier::Classifier;
use crate::services::{composer, grading, market, sizing};
use crate::utils::image_ops;
use image::DynamicImage;
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::Arc;
use tracing::debug;

pub struct AnalysisPipeline {
    classifier: Arc<dyn Classifier>,
    rng: Mutex<StdRng>,
}

impl AnalysisPipeline {
    pub fn new(classifier: Arc<dyn Classifier>, rng_seed: Option<u64>) -> Self {
        let rng = match rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self {
            classifier,
            rng: Mutex::new(rng),
        }
    }

    /// Run the full pipeline on a decoded image.
    pub async fn analyze(&self, img: &DynamicImage) -> Result<AnalysisResult, AnalysisError> {
        let classification = self.classifier.classify(img).await?;
        debug!(
            "Classified {} ({:.1}%)",
            classification.species, classification.confidence
        );
        Ok(self.derive(classification))
    }

    /// Decode a base64 data URL and run the full pipeline.
    pub async fn analyze_data_url(&self, payload: &str) -> Result<AnalysisResult, AnalysisError> {
        let img = image_ops::decode_data_url(payload)?;
        self.analyze(&img).await
    }

    /// Derivation stages downstream of classification. Pure except for the
    /// injected RNG draws.
    fn derive(&self, classification: Classification) -> AnalysisResult {
        let (quality, size) = {
            let mut rng = self.rng.lock();
            (
                grading::assess(classification.confidence, &mut *rng),
                sizing::estimate(&mut *rng),
            )
        };
        let valuation = market::valuate(&classification.species, quality.grade);
        composer::compose(classification, quality, size, valuation)
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::core::errors::ClassifyResult;
    use crate::services::classifier::classification_from_logits;
    use async_trait::async_trait;

    /// Deterministic classifier substitute: always reports the species at
    /// `index`, with confidence controlled by the logit magnitude.
    pub struct StubClassifier {
        logits: Vec<f32>,
    }

    impl StubClassifier {
        pub fn confident(index: usize, logit: f32) -> Self {
            let mut logits = vec![0.0f32; crate::core::catalog::SPECIES.len()];
            logits[index] = logit;
            Self { logits }
        }
    }

    #[async_trait]
    impl Classifier for StubClassifier {
        async fn classify(&self, _img: &DynamicImage) -> ClassifyResult<Classification> {
            Ok(classification_from_logits(&self.logits))
        }
    }

    pub fn test_image() -> DynamicImage {
        DynamicImage::ImageRgb8(image::RgbImage::from_pixel(
            16,
            16,
            image::Rgb([90, 120, 150]),
        ))
    }
}
