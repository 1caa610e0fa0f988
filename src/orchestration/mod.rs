pub mod batch_orchestrator;
pub mod pipeline;

pub use batch_orchestrator::BatchOrchestrator;
pub use pipeline::AnalysisPipeline;
