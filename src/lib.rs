// Library exports for the AquaGrade scoring service

// Core modules
pub mod core;
pub mod db;
pub mod orchestration;
pub mod services;
pub mod utils;

// Re-export commonly used types and functions
pub use self::core::{
    catalog,
    config::Config,
    errors::{AnalysisError, ClassifyError, ConfigError, HistoryError},
    types::{
        AnalysisResult, BatchResponse, Classification, Grade, ItemOutcome, MarketValuation,
        QualityAssessment, SizeCategory, SizeEstimate,
    },
};

pub use db::{HistoryRecord, HistoryStore, NewHistoryRecord};

pub use orchestration::{AnalysisPipeline, BatchOrchestrator};

pub use services::{Classifier, OnnxClassifier};

pub use utils::Metrics;
