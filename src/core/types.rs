// Shared types for the analysis pipeline and API surface

use serde::{Deserialize, Serialize};
use std::fmt;

/// Quality bucket derived from classification confidence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Grade {
    Premium,
    Standard,
    Poor,
}

impl Grade {
    pub fn as_str(&self) -> &'static str {
        match self {
            Grade::Premium => "Premium",
            Grade::Standard => "Standard",
            Grade::Poor => "Poor",
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Size bucket derived by thresholding estimated weight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SizeCategory {
    Medium,
    Large,
}

impl fmt::Display for SizeCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SizeCategory::Medium => "Medium",
            SizeCategory::Large => "Large",
        })
    }
}

/// One entry of the class probability distribution, in percent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeciesScore {
    pub species: String,
    pub percent: f64,
}

/// Output of one classifier forward pass.
///
/// `distribution` preserves catalog order and sums to ~100 (softmax output
/// scaled to percentages).
#[derive(Debug, Clone)]
pub struct Classification {
    pub species: String,
    pub confidence: f64,
    pub distribution: Vec<SpeciesScore>,
}

/// Grade plus continuous score and jittered visual sub-metrics.
///
/// The sub-metrics are informational only; nothing downstream reads them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QualityAssessment {
    pub grade: Grade,
    pub score: f64,
    pub eye_clarity: f64,
    pub gill_color: f64,
    pub skin_condition: f64,
}

/// Randomized weight/length estimate. Placeholder for a measurement model:
/// independent of the classified species and of the image content.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SizeEstimate {
    #[serde(rename = "weight")]
    pub weight_kg: f64,
    #[serde(rename = "length")]
    pub length_cm: f64,
    pub category: SizeCategory,
}

/// Monetary estimate from the base-price table and grade multiplier.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketValuation {
    pub base_price: f64,
    pub multiplier: f64,
    pub total_value: f64,
    pub premium: f64,
    pub price_per_pound: f64,
}

/// Static market trend advisory block.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendInfo {
    pub current_trend: &'static str,
    pub price_change: &'static str,
    pub demand_level: &'static str,
    pub seasonal_factor: &'static str,
}

/// Handling and storage guidance templated from the analysis outcome.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HandlingAdvice {
    pub recommendations: Vec<String>,
    pub storage_temp: &'static str,
    pub shelf_life: &'static str,
}

/// Model provenance metadata attached to every result.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelProvenance {
    pub family: &'static str,
    pub trained_on: &'static str,
    pub accuracy: &'static str,
    pub all_probabilities: Vec<SpeciesScore>,
}

/// Species block of an analysis result.
#[derive(Debug, Clone, Serialize)]
pub struct SpeciesReport {
    pub name: String,
    pub confidence: f64,
}

/// Aggregate outcome of one analyzed image. Immutable after composition.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub species: SpeciesReport,
    pub quality: QualityAssessment,
    pub size: SizeEstimate,
    pub market: MarketValuation,
    pub trends: TrendInfo,
    pub handling: HandlingAdvice,
    pub model_info: ModelProvenance,
}

/// Per-image entry of a batch response. Carries either a result or an
/// error; a failed item never aborts the rest of the batch.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemOutcome {
    pub filename: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub species: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quality: Option<Grade>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub market_value: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ItemOutcome {
    pub fn failure(filename: String, error: String) -> Self {
        Self {
            filename,
            species: None,
            quality: None,
            weight: None,
            market_value: None,
            confidence: None,
            error: Some(error),
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

fn default_save() -> bool {
    true
}

/// Body of `POST /analyze`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeRequest {
    /// Base64 data URL of the image.
    pub image: Option<String>,
    #[serde(default = "default_save")]
    pub save_to_db: bool,
    #[serde(default)]
    pub debug: bool,
}

/// Body of `POST /batch`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchRequest {
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default = "default_save")]
    pub save_to_db: bool,
}

/// Response of `POST /batch`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchResponse {
    pub results: Vec<ItemOutcome>,
    pub total_processed: usize,
}
