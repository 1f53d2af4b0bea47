use crate::classifier;
use crate::config::Config;
use crate::encoder;
use crate::error::AppError;
use crate::model::{OnnxSentimentModel, SequenceModel};
use crate::storage::{PredictionLog, RECENT_LIMIT};
use crate::tokenizer;
use crate::types::{PredictResponse, PredictionRecord, ThresholdEval};
use crate::vocab::Vocabulary;
use chrono::Utc;
use std::path::Path;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

/// Default decision threshold when no evaluation record is available.
const DEFAULT_THRESHOLD: f32 = 0.5;

/// The serving pipeline and its process-wide state. Vocabulary, model and
/// threshold are loaded on first use and cached for the process lifetime;
/// no hot-reload. Shared across request handlers behind an `Arc`.
pub struct SentimentEngine {
    config: Config,
    vocabulary: OnceCell<Vocabulary>,
    model: OnceCell<Box<dyn SequenceModel>>,
    threshold: OnceCell<f32>,
    log: PredictionLog,
}

impl SentimentEngine {
    pub fn new(config: Config) -> Self {
        let log = PredictionLog::new(&config.predictions_log_path);
        Self {
            config,
            vocabulary: OnceCell::new(),
            model: OnceCell::new(),
            threshold: OnceCell::new(),
            log,
        }
    }

    /// Test seam: run the pipeline against a substitute model.
    #[cfg(test)]
    fn with_model(config: Config, model: Box<dyn SequenceModel>) -> Self {
        let log = PredictionLog::new(&config.predictions_log_path);
        Self {
            config,
            vocabulary: OnceCell::new(),
            model: OnceCell::new_with(Some(model)),
            threshold: OnceCell::new(),
            log,
        }
    }

    async fn vocabulary(&self) -> Result<&Vocabulary, AppError> {
        self.vocabulary
            .get_or_try_init(|| Vocabulary::load(&self.config.vocabulary_path))
            .await
    }

    async fn model(&self) -> Result<&dyn SequenceModel, AppError> {
        let model = self
            .model
            .get_or_try_init(|| async {
                let model = OnnxSentimentModel::load(&self.config.model_path)?;
                Ok::<Box<dyn SequenceModel>, AppError>(Box::new(model) as Box<dyn SequenceModel>)
            })
            .await?;
        Ok(model.as_ref())
    }

    /// Decision threshold from the offline evaluation pass. A missing or
    /// malformed file falls back to the default; that is not an error.
    async fn threshold(&self) -> f32 {
        *self
            .threshold
            .get_or_init(|| async {
                match load_threshold(&self.config.threshold_path).await {
                    Ok(Some(eval)) => match eval.best_threshold {
                        Some(threshold) => {
                            info!(
                                roc_auc = ?eval.roc_auc,
                                best_f1 = ?eval.best_f1,
                                "Using evaluated decision threshold {threshold}"
                            );
                            threshold as f32
                        }
                        None => DEFAULT_THRESHOLD,
                    },
                    Ok(None) => DEFAULT_THRESHOLD,
                    Err(e) => {
                        warn!("Ignoring unreadable threshold file: {e}");
                        DEFAULT_THRESHOLD
                    }
                }
            })
            .await
    }

    /// The full request pipeline: validate, tokenize, encode, score,
    /// classify, log, respond. A logging failure is reported and swallowed;
    /// it never fails the response.
    pub async fn predict(&self, text: &str) -> Result<PredictResponse, AppError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(AppError::EmptyText);
        }

        let vocabulary = self.vocabulary().await?;
        let tokens = tokenizer::tokenize(text);
        let sequence = encoder::encode(&tokens, vocabulary);
        let raw_score = self.model().await?.predict(&sequence)?;
        debug!(
            score = raw_score,
            tokens = ?&tokens[..tokens.len().min(20)],
            sequence_tail = ?&sequence[sequence.len().saturating_sub(20)..],
            "scored prediction request"
        );

        let threshold = self.threshold().await;
        let verdict = classifier::classify(raw_score, threshold, text, &tokens);

        let record = PredictionRecord {
            time: Utc::now(),
            text: text.to_string(),
            score: verdict.score,
            sentiment: verdict.sentiment,
            category: verdict.category,
            rating: verdict.rating,
        };
        if let Err(e) = self.log.append(&record).await {
            warn!("Failed to log prediction: {e}");
        }

        Ok(PredictResponse {
            sentiment: verdict.sentiment,
            score: verdict.score,
            category: verdict.category,
            color: verdict.color.to_string(),
            rating: verdict.rating,
        })
    }

    /// Training history pass-through for the dashboard, `{}` if absent.
    pub async fn training_history(&self) -> Result<serde_json::Value, AppError> {
        let path = &self.config.history_path;
        if !path.exists() {
            return Ok(serde_json::json!({}));
        }
        let raw = tokio::fs::read_to_string(path).await?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Most recent log entries, oldest first, capped for the dashboard.
    pub async fn recent_predictions(&self) -> Result<Vec<PredictionRecord>, AppError> {
        self.log.recent(RECENT_LIMIT).await
    }
}

async fn load_threshold(path: &Path) -> anyhow::Result<Option<ThresholdEval>> {
    if !path.exists() {
        return Ok(None);
    }
    let raw = tokio::fs::read_to_string(path).await?;
    let eval: ThresholdEval = serde_json::from_str(&raw)?;
    Ok(Some(eval))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Category, Sentiment};

    struct StubModel {
        score: f32,
    }

    impl SequenceModel for StubModel {
        fn predict(&self, sequence: &[i64]) -> Result<f32, AppError> {
            assert_eq!(sequence.len(), encoder::MAX_SEQUENCE_LENGTH);
            Ok(self.score)
        }
    }

    fn test_config(dir: &tempfile::TempDir) -> Config {
        Config {
            port: 0,
            model_path: dir.path().join("sentiment_model.onnx"),
            vocabulary_path: dir.path().join("word_index.json"),
            threshold_path: dir.path().join("threshold_eval.json"),
            history_path: dir.path().join("history.json"),
            predictions_log_path: dir.path().join("predictions.log"),
        }
    }

    async fn engine_with_score(dir: &tempfile::TempDir, score: f32) -> SentimentEngine {
        let config = test_config(dir);
        tokio::fs::write(
            &config.vocabulary_path,
            r#"{"a": 3, "pleasant": 120, "surprise": 250, "i": 9, "this": 11, "so": 35, "much": 71}"#,
        )
        .await
        .unwrap();
        SentimentEngine::with_model(config, Box::new(StubModel { score }))
    }

    #[tokio::test]
    async fn test_empty_text_is_rejected_and_not_logged() {
        let dir = tempfile::tempdir().unwrap();
        let engine = engine_with_score(&dir, 0.9).await;

        for input in ["", "   ", "\t\n"] {
            let err = engine.predict(input).await.unwrap_err();
            assert!(matches!(err, AppError::EmptyText));
            assert_eq!(err.to_string(), "empty text");
        }
        assert!(engine.recent_predictions().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_positive_text_is_classified_and_logged() {
        let dir = tempfile::tempdir().unwrap();
        let engine = engine_with_score(&dir, 0.9).await;

        let response = engine.predict("a pleasant surprise").await.unwrap();
        assert_eq!(response.sentiment, Sentiment::Positive);
        assert_eq!(response.category, Category::VeryPositive);
        assert_eq!(response.color, "#16a34a");
        assert_eq!(response.rating, 5);

        let entries = engine.recent_predictions().await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].text, "a pleasant surprise");
        assert_eq!(entries[0].score, 0.9);
        assert_eq!(entries[0].rating, 5);
    }

    #[tokio::test]
    async fn test_keyword_override_beats_a_confident_model() {
        let dir = tempfile::tempdir().unwrap();
        let engine = engine_with_score(&dir, 0.93).await;

        let response = engine.predict("i hate this so much").await.unwrap();
        assert_eq!(response.sentiment, Sentiment::Negative);
        assert_eq!(response.category, Category::VeryNegative);
        assert!(response.score <= 0.2);
        assert!(response.rating <= 2);
    }

    #[tokio::test]
    async fn test_slightly_positive_band_is_reported_negative() {
        let dir = tempfile::tempdir().unwrap();
        let engine = engine_with_score(&dir, 0.55).await;

        let response = engine.predict("a pleasant surprise").await.unwrap();
        assert_eq!(response.sentiment, Sentiment::Negative);
        assert_eq!(response.category, Category::Negative);
        assert_eq!(response.color, "#f87171");
    }

    #[tokio::test]
    async fn test_evaluated_threshold_is_honored() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(&dir);
        tokio::fs::write(&config.vocabulary_path, r#"{"a": 3}"#).await.unwrap();
        tokio::fs::write(
            &config.threshold_path,
            r#"{"roc_auc": 0.97, "best_threshold": 0.6, "best_f1": 0.91}"#,
        )
        .await
        .unwrap();
        let engine = SentimentEngine::with_model(config, Box::new(StubModel { score: 0.55 }));

        let response = engine.predict("a pleasant surprise").await.unwrap();
        // 0.55 is below the evaluated threshold but inside its 0.10 band.
        assert_eq!(response.sentiment, Sentiment::Negative);
        assert_eq!(response.category, Category::SlightlyNegative);
    }

    #[tokio::test]
    async fn test_malformed_threshold_falls_back_to_default() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(&dir);
        tokio::fs::write(&config.vocabulary_path, r#"{"a": 3}"#).await.unwrap();
        tokio::fs::write(&config.threshold_path, "not json").await.unwrap();
        let engine = SentimentEngine::with_model(config, Box::new(StubModel { score: 0.9 }));

        let response = engine.predict("a pleasant surprise").await.unwrap();
        assert_eq!(response.sentiment, Sentiment::Positive);
    }

    #[tokio::test]
    async fn test_legacy_threshold_keys_are_accepted() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(&dir);
        tokio::fs::write(&config.vocabulary_path, r#"{"a": 3}"#).await.unwrap();
        tokio::fs::write(&config.threshold_path, r#"{"best_th": 0.7}"#).await.unwrap();
        let engine = SentimentEngine::with_model(config, Box::new(StubModel { score: 0.66 }));

        let response = engine.predict("a pleasant surprise").await.unwrap();
        assert_eq!(response.sentiment, Sentiment::Negative);
    }

    #[tokio::test]
    async fn test_missing_model_artifact_is_a_server_error() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(&dir);
        tokio::fs::write(&config.vocabulary_path, r#"{"a": 3}"#).await.unwrap();
        let engine = SentimentEngine::new(config);

        let err = engine.predict("a fine film").await.unwrap_err();
        assert!(matches!(err, AppError::ModelUnavailable(_)));
        assert!(err.to_string().contains("run the offline training export"));
    }

    #[tokio::test]
    async fn test_missing_vocabulary_is_a_server_error() {
        let dir = tempfile::tempdir().unwrap();
        let engine =
            SentimentEngine::with_model(test_config(&dir), Box::new(StubModel { score: 0.5 }));

        let err = engine.predict("a fine film").await.unwrap_err();
        assert!(matches!(err, AppError::VocabularyUnavailable(_)));
    }

    #[tokio::test]
    async fn test_history_is_empty_object_when_absent() {
        let dir = tempfile::tempdir().unwrap();
        let engine = engine_with_score(&dir, 0.5).await;
        assert_eq!(engine.training_history().await.unwrap(), serde_json::json!({}));
    }

    #[tokio::test]
    async fn test_history_is_served_verbatim() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(&dir);
        let history = serde_json::json!({
            "saved_at": "2026-08-01T10:00:00Z",
            "history": {
                "loss": [0.6, 0.4],
                "accuracy": [0.7, 0.85],
                "val_loss": [0.65, 0.5],
                "val_accuracy": [0.68, 0.8]
            }
        });
        tokio::fs::write(&config.history_path, history.to_string()).await.unwrap();
        let engine = SentimentEngine::with_model(config, Box::new(StubModel { score: 0.5 }));

        assert_eq!(engine.training_history().await.unwrap(), history);
    }
}
