//! Species classifier backed by a pretrained ONNX network.
//!
//! The model is loaded once at startup and its weights are read-only shared
//! state for the rest of the process. A small pool of sessions allows
//! concurrent forward passes without a global inference lock.

use crate::core::catalog::SPECIES;
use crate::core::config::Config;
use crate::core::errors::{ClassifyError, ClassifyResult};
use crate::core::types::{Classification, SpeciesScore};
use crate::services::preprocess;
use async_trait::async_trait;
use image::DynamicImage;
use ort::execution_providers::CPUExecutionProvider;
use ort::session::{builder::GraphOptimizationLevel, Session};
use ort::value::Value;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::mpsc::{channel, Receiver, Sender};
use tracing::{debug, info};

/// A pure `image -> probability distribution` operation.
///
/// Passed into the pipeline as an explicit handle rather than reached for
/// globally, so tests can substitute a stub.
#[async_trait]
pub trait Classifier: Send + Sync {
    async fn classify(&self, img: &DynamicImage) -> ClassifyResult<Classification>;
}

/// Session pool for concurrent inference
struct SessionPool {
    sender: Sender<Session>,
    receiver: tokio::sync::Mutex<Receiver<Session>>,
}

impl SessionPool {
    async fn acquire(&self) -> Session {
        let mut receiver = self.receiver.lock().await;
        receiver.recv().await.expect("Session pool exhausted")
    }

    async fn release(&self, session: Session) {
        self.sender
            .send(session)
            .await
            .expect("Failed to return session to pool");
    }
}

pub struct OnnxClassifier {
    session_pool: Arc<SessionPool>,
    input_name: String,
    output_name: String,
}

impl OnnxClassifier {
    /// Load the model and build the session pool.
    ///
    /// A load failure here leaves the service running with the classifier
    /// absent; callers answer every analysis request with `ModelUnavailable`
    /// instead of crashing per-request.
    pub async fn load(config: &Config) -> ClassifyResult<Self> {
        let model_path = config.model_path().to_string();
        if !Path::new(&model_path).exists() {
            return Err(ClassifyError::ModelFileMissing(model_path));
        }

        let pool_size = std::cmp::min(num_cpus::get(), config.session_pool_size()).max(1);
        debug!("Creating classifier session pool with {} sessions", pool_size);

        let first_session = build_session(&model_path)?;
        let input_name = first_session.inputs[0].name.clone();
        let output_name = first_session.outputs[0].name.clone();

        let (sender, receiver) = channel(pool_size);
        sender
            .send(first_session)
            .await
            .expect("fresh channel cannot be closed");

        // Create remaining sessions in parallel for faster startup
        if pool_size > 1 {
            let mut tasks = Vec::new();
            for i in 1..pool_size {
                let path = model_path.clone();
                tasks.push(tokio::task::spawn_blocking(move || {
                    debug!("Creating session {} of {}", i + 1, pool_size);
                    build_session(&path)
                }));
            }
            for task in tasks {
                let session = task.await.expect("session build task panicked")?;
                sender
                    .send(session)
                    .await
                    .expect("pool channel closed during startup");
            }
        }

        info!(
            "✓ Classifier: {} ({} sessions, input '{}', output '{}')",
            model_path, pool_size, input_name, output_name
        );

        Ok(Self {
            session_pool: Arc::new(SessionPool {
                sender,
                receiver: tokio::sync::Mutex::new(receiver),
            }),
            input_name,
            output_name,
        })
    }
}

fn build_session(model_path: &str) -> ClassifyResult<Session> {
    let session = Session::builder()?
        .with_execution_providers([CPUExecutionProvider::default().build()])?
        .with_optimization_level(GraphOptimizationLevel::Level3)?
        .with_intra_threads(num_cpus::get())?
        .commit_from_file(model_path)?;
    Ok(session)
}

#[async_trait]
impl Classifier for OnnxClassifier {
    async fn classify(&self, img: &DynamicImage) -> ClassifyResult<Classification> {
        let tensor = preprocess::prepare(img);
        let input_value = Value::from_array(tensor)?;

        let inference_start = std::time::Instant::now();

        // Acquire session from pool, run inference, clone logits out while
        // the session is borrowed, then return it to the pool
        let logits: Vec<f32> = {
            let mut session = self.session_pool.acquire().await;
            let outputs = session.run(ort::inputs![self.input_name.as_str() => input_value])?;

            let (_shape, data) = outputs[self.output_name.as_str()].try_extract_tensor::<f32>()?;
            let logits = data.to_vec();

            drop(outputs);
            self.session_pool.release(session).await;
            logits
        };

        debug!(
            "✓ Inference completed in {:.2}ms",
            inference_start.elapsed().as_secs_f64() * 1000.0
        );

        if logits.len() != SPECIES.len() {
            return Err(ClassifyError::UnexpectedOutputShape {
                got: logits.len(),
                expected: SPECIES.len(),
            });
        }

        Ok(classification_from_logits(&logits))
    }
}

/// Turn raw logits into a ranked classification with a percentage
/// distribution over the catalog. Deterministic for fixed logits.
pub fn classification_from_logits(logits: &[f32]) -> Classification {
    let probabilities = softmax(logits);

    let distribution: Vec<SpeciesScore> = SPECIES
        .iter()
        .zip(&probabilities)
        .map(|(species, p)| SpeciesScore {
            species: species.to_string(),
            percent: (*p as f64) * 100.0,
        })
        .collect();

    let top = distribution
        .iter()
        .enumerate()
        .max_by(|(_, a), (_, b)| a.percent.total_cmp(&b.percent))
        .map(|(i, _)| i)
        .unwrap_or(0);

    Classification {
        species: distribution[top].species.clone(),
        confidence: distribution[top].percent,
        distribution,
    }
}

/// Numerically stable softmax over raw logits.
fn softmax(logits: &[f32]) -> Vec<f32> {
    let max_logit = logits.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
    let exp_values: Vec<f32> = logits.iter().map(|&x| (x - max_logit).exp()).collect();
    let sum: f32 = exp_values.iter().sum();
    exp_values.iter().map(|&x| x / sum).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_softmax_sums_to_one() {
        let probs = softmax(&[1.0, 2.0, 3.0, 4.0]);
        let sum: f32 = probs.iter().sum();
        assert!((sum - 1.0).abs() < 1e-6);
        assert!(probs.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_softmax_large_logits_stable() {
        let probs = softmax(&[1000.0, 1001.0]);
        assert!(probs.iter().all(|p| p.is_finite()));
        assert!((probs.iter().sum::<f32>() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_distribution_sums_to_hundred() {
        let logits = [0.3, -1.2, 2.5, 0.0, 4.1, -0.7, 1.9, 0.4];
        let classification = classification_from_logits(&logits);
        let sum: f64 = classification.distribution.iter().map(|s| s.percent).sum();
        assert!((sum - 100.0).abs() < 0.01, "sum = {}", sum);
    }

    #[test]
    fn test_top_species_matches_max_logit() {
        let mut logits = [0.0f32; 8];
        logits[5] = 9.0;
        let classification = classification_from_logits(&logits);
        assert_eq!(classification.species, SPECIES[5]);
        assert!(classification.confidence > 99.0);
        assert_eq!(classification.distribution.len(), SPECIES.len());
    }
}
