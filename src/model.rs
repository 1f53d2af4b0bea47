use crate::error::AppError;
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::Value;
use std::path::Path;
use std::sync::Mutex;
use tracing::info;

/// Scores one encoded sequence. The seam exists so the request pipeline
/// can be exercised without a model artifact on disk.
pub trait SequenceModel: Send + Sync {
    fn predict(&self, sequence: &[i64]) -> Result<f32, AppError>;
}

/// ONNX-backed sentiment model. The exported graph takes a single `input`
/// tensor of shape `[1, max sequence length]` (int64) and produces one
/// sigmoid probability named `output`.
#[derive(Debug)]
pub struct OnnxSentimentModel {
    session: Mutex<Session>,
}

impl OnnxSentimentModel {
    pub fn load(model_path: &Path) -> Result<Self, AppError> {
        if !model_path.exists() {
            return Err(AppError::ModelUnavailable(model_path.display().to_string()));
        }

        let session = Session::builder()
            .map_err(|e| AppError::ModelInference(e.to_string()))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| AppError::ModelInference(e.to_string()))?
            .with_intra_threads(1)
            .map_err(|e| AppError::ModelInference(e.to_string()))?
            .commit_from_file(model_path)
            .map_err(|e| AppError::ModelInference(format!("failed to load model: {e}")))?;

        info!("Loaded sentiment model from {}", model_path.display());

        Ok(Self {
            session: Mutex::new(session),
        })
    }
}

impl SequenceModel for OnnxSentimentModel {
    fn predict(&self, sequence: &[i64]) -> Result<f32, AppError> {
        let input = ndarray::Array2::from_shape_vec((1, sequence.len()), sequence.to_vec())
            .map_err(|e| AppError::ModelInference(format!("failed to shape input: {e}")))?;
        let tensor = Value::from_array(input)
            .map_err(|e| AppError::ModelInference(format!("failed to build input tensor: {e}")))?;

        let mut session = self
            .session
            .lock()
            .map_err(|_| AppError::ModelInference("model session lock poisoned".to_string()))?;
        let outputs = session
            .run(ort::inputs!["input" => tensor])
            .map_err(|e| AppError::ModelInference(format!("inference failed: {e}")))?;

        let (_shape, scores) = outputs["output"]
            .try_extract_tensor::<f32>()
            .map_err(|e| AppError::ModelInference(format!("failed to extract output: {e}")))?;

        scores
            .first()
            .copied()
            .ok_or_else(|| AppError::ModelInference("model produced no output".to_string()))
    }
}
