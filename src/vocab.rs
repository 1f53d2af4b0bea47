use crate::error::AppError;
use std::collections::HashMap;
use std::path::Path;
use tracing::info;

/// Word to raw-index mapping produced at training time. Indices are the
/// raw values from the training corpus; the serving-time offset for
/// reserved tokens is applied by the encoder, not here.
#[derive(Debug)]
pub struct Vocabulary {
    index: HashMap<String, u32>,
}

impl Vocabulary {
    pub async fn load(path: &Path) -> Result<Self, AppError> {
        if !path.exists() {
            return Err(AppError::VocabularyUnavailable(path.display().to_string()));
        }
        let raw = tokio::fs::read_to_string(path).await?;
        let vocab = Self::from_json(&raw)?;
        info!("Loaded vocabulary ({} words) from {}", vocab.len(), path.display());
        Ok(vocab)
    }

    pub fn from_json(raw: &str) -> Result<Self, AppError> {
        let index: HashMap<String, u32> = serde_json::from_str(raw)?;
        Ok(Self { index })
    }

    pub fn raw_index(&self, word: &str) -> Option<u32> {
        self.index.get(word).copied()
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }
}
