use std::env;
use std::path::PathBuf;

/// Serving configuration. All values come from the environment with
/// defaults matching the artifact names the training export writes next
/// to the binary.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub model_path: PathBuf,
    pub vocabulary_path: PathBuf,
    pub threshold_path: PathBuf,
    pub history_path: PathBuf,
    pub predictions_log_path: PathBuf,
}

impl Config {
    pub fn from_env() -> Self {
        Config {
            port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(5000),
            model_path: env_path("MODEL_PATH", "sentiment_model.onnx"),
            vocabulary_path: env_path("WORD_INDEX_PATH", "word_index.json"),
            threshold_path: env_path("THRESHOLD_PATH", "threshold_eval.json"),
            history_path: env_path("HISTORY_PATH", "history.json"),
            predictions_log_path: env_path("PREDICTIONS_LOG_PATH", "predictions.log"),
        }
    }
}

fn env_path(key: &str, default: &str) -> PathBuf {
    env::var(key)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(default))
}
