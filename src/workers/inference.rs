use crate::core::PredictionResult;
use crate::pipeline::bus::PipelineEvent;
use crate::store::{WindowSnapshot, WINDOW_LEN};
use async_trait::async_trait;
use log::{debug, warn};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::sync::mpsc;

#[derive(Debug, Error)]
pub enum InferenceError {
    #[error("failed to load model: {0}")]
    ModelLoad(String),
    #[error("expected {expected} values per channel, got {got}")]
    ShortWindow { expected: usize, got: usize },
    #[error("inference failed: {0}")]
    Inference(String),
}

/// Trait implemented by trained tremor models.
///
/// The artifact is opaque to the pipeline: load once at startup, then map a
/// fixed-length magnitude sequence to a fixed-length score vector.
#[async_trait]
pub trait TremorModel: Send + Sync {
    /// Load the trained artifact. Idempotent; a failed load is a fatal
    /// startup condition, reported upward by the caller.
    async fn load(&mut self) -> Result<(), InferenceError>;

    /// Score one feature window. Raw model output, unscaled.
    async fn predict(&self, features: &[f64]) -> Result<Vec<f64>, InferenceError>;
}

/// Feature transform feeding the model: each channel value is divided by
/// 100, then the three channels collapse to one magnitude per time step,
/// sqrt(ch0^2 + ch1^2 + ch2^2).
pub fn magnitude_features(snapshot: &WindowSnapshot) -> Result<Vec<f64>, InferenceError> {
    let len = snapshot.len();
    if len < WINDOW_LEN {
        return Err(InferenceError::ShortWindow {
            expected: WINDOW_LEN,
            got: len,
        });
    }
    Ok((0..len)
        .map(|t| {
            snapshot
                .channels
                .iter()
                .map(|channel| {
                    let scaled = f64::from(channel[t]) / 100.0;
                    scaled * scaled
                })
                .sum::<f64>()
                .sqrt()
        })
        .collect())
}

/// Owns the loaded model and serializes inference: one window is processed
/// to completion before the next is accepted.
pub struct InferenceWorker {
    model: Box<dyn TremorModel>,
}

impl InferenceWorker {
    pub fn new(model: Box<dyn TremorModel>) -> Self {
        Self { model }
    }

    pub async fn load(&mut self) -> Result<(), InferenceError> {
        self.model.load().await
    }

    /// Run one inference pass. Output scores are scaled x100 back into
    /// domain units, matching the input normalization.
    pub async fn infer(&self, snapshot: &WindowSnapshot) -> Result<PredictionResult, InferenceError> {
        let features = magnitude_features(snapshot)?;
        let scores = self.model.predict(&features).await?;
        Ok(PredictionResult {
            scores: scores.into_iter().map(|s| s * 100.0).collect(),
        })
    }

    pub async fn run(
        self,
        mut rx: mpsc::Receiver<WindowSnapshot>,
        events: mpsc::Sender<PipelineEvent>,
    ) {
        while let Some(snapshot) = rx.recv().await {
            match self.infer(&snapshot).await {
                Ok(result) => {
                    debug!("prediction {result}");
                    let _ = events.send(PipelineEvent::Prediction(result)).await;
                }
                Err(e) => {
                    warn!("inference failed: {e}");
                    let _ = events
                        .send(PipelineEvent::InferenceFailed(e.to_string()))
                        .await;
                }
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct ModelArtifact {
    weights: Vec<Vec<f64>>,
    bias: Vec<f64>,
}

/// Linear scorer loaded from a JSON artifact: one weight row per output
/// score, each row spanning the 20-step feature window.
pub struct LinearModel {
    path: PathBuf,
    artifact: Option<ModelArtifact>,
}

impl LinearModel {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            artifact: None,
        }
    }
}

#[async_trait]
impl TremorModel for LinearModel {
    async fn load(&mut self) -> Result<(), InferenceError> {
        if self.artifact.is_some() {
            return Ok(());
        }
        let raw = tokio::fs::read(&self.path)
            .await
            .map_err(|e| InferenceError::ModelLoad(format!("{}: {e}", self.path.display())))?;
        let artifact: ModelArtifact = serde_json::from_slice(&raw)
            .map_err(|e| InferenceError::ModelLoad(e.to_string()))?;

        if artifact.weights.len() != artifact.bias.len() {
            return Err(InferenceError::ModelLoad(
                "weight rows and bias lengths differ".to_string(),
            ));
        }
        if artifact.weights.iter().any(|row| row.len() != WINDOW_LEN) {
            return Err(InferenceError::ModelLoad(format!(
                "weight rows must span {WINDOW_LEN} features"
            )));
        }
        self.artifact = Some(artifact);
        Ok(())
    }

    async fn predict(&self, features: &[f64]) -> Result<Vec<f64>, InferenceError> {
        let artifact = self
            .artifact
            .as_ref()
            .ok_or_else(|| InferenceError::Inference("model not loaded".to_string()))?;
        Ok(artifact
            .weights
            .iter()
            .zip(&artifact.bias)
            .map(|(row, bias)| {
                bias + row
                    .iter()
                    .zip(features)
                    .map(|(w, x)| w * x)
                    .sum::<f64>()
            })
            .collect())
    }
}
