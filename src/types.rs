use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Binary verdict reported to the client once the decision threshold and
/// override rules have been applied.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Sentiment {
    Positive,
    Negative,
}

/// Sentiment intensity tier. Variants are declared from most negative to
/// most positive so the derived ordering matches the tier ordering.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
pub enum Category {
    #[serde(rename = "Very Negative")]
    VeryNegative,
    Negative,
    #[serde(rename = "Slightly Negative")]
    SlightlyNegative,
    #[serde(rename = "Slightly Positive")]
    SlightlyPositive,
    Positive,
    #[serde(rename = "Very Positive")]
    VeryPositive,
}

impl Category {
    /// Fixed display color for each tier, used by the chat UI badge.
    pub fn color(&self) -> &'static str {
        match self {
            Category::VeryNegative => "#dc2626",
            Category::Negative => "#f87171",
            Category::SlightlyNegative => "#fecaca",
            Category::SlightlyPositive => "#bbf7d0",
            Category::Positive => "#34d399",
            Category::VeryPositive => "#16a34a",
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PredictRequest {
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictResponse {
    pub sentiment: Sentiment,
    pub score: f32,
    pub category: Category,
    pub color: String,
    pub rating: u8,
}

/// One line of the append-only prediction log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionRecord {
    pub time: DateTime<Utc>,
    pub text: String,
    pub score: f32,
    pub sentiment: Sentiment,
    pub category: Category,
    pub rating: u8,
}

/// Result of the offline threshold evaluation pass. Only `best_threshold`
/// is consulted at serving time; older evaluation runs wrote the value
/// under `best_th` or `threshold`.
#[derive(Debug, Clone, Deserialize)]
pub struct ThresholdEval {
    #[serde(default)]
    pub roc_auc: Option<f64>,
    #[serde(default, alias = "best_th", alias = "threshold")]
    pub best_threshold: Option<f64>,
    #[serde(default)]
    pub best_f1: Option<f64>,
}
