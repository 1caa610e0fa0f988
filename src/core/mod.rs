pub mod catalog;
pub mod config;
pub mod errors;
pub mod types;

// Re-export commonly used items for convenience
pub use config::Config;
pub use errors::{AnalysisError, ClassifyError, ConfigError, HistoryError};
pub use types::{
    AnalysisResult, Classification, Grade, ItemOutcome, MarketValuation, QualityAssessment,
    SizeCategory, SizeEstimate, SpeciesScore,
};
