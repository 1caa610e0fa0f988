pub mod classifier;
pub mod composer;
pub mod grading;
pub mod market;
pub mod preprocess;
pub mod sizing;

// Re-export commonly used services
pub use classifier::{Classifier, OnnxClassifier};
