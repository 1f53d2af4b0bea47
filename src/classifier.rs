use crate::types::{Category, Sentiment};

/// Strong negative language overrides the model outright. A hit is either
/// an exact token match or a raw substring of the lowercased input.
const NEGATIVE_KEYWORDS: &[&str] = &[
    "hate", "terrible", "worst", "awful", "bad", "boring", "disappoint", "dislike", "sucks",
    "horrible", "trash", "stupid", "worse", "dont", "don't", "no", "not",
];

/// Ceiling applied to the displayed score when the keyword override fires.
/// The score is only ever dampened, never raised.
const DAMPENED_SCORE_CEILING: f32 = 0.2;

/// Fully post-processed classification for one request.
#[derive(Debug, Clone, PartialEq)]
pub struct Verdict {
    pub sentiment: Sentiment,
    pub category: Category,
    pub color: &'static str,
    pub score: f32,
    pub rating: u8,
}

/// Six-tier band lookup layered on top of the tunable decision threshold.
pub fn categorize(score: f32, threshold: f32) -> Category {
    if score >= 0.85 {
        Category::VeryPositive
    } else if score >= 0.65 {
        Category::Positive
    } else if score >= threshold {
        Category::SlightlyPositive
    } else if score >= (threshold - 0.10).max(0.0) {
        Category::SlightlyNegative
    } else if score >= 0.35 {
        Category::Negative
    } else {
        Category::VeryNegative
    }
}

/// Linear map from [0,1] onto a 1-5 star rating.
pub fn star_rating(score: f32) -> u8 {
    let stars = (score * 4.0).round() as i32 + 1;
    stars.clamp(1, 5) as u8
}

fn contains_negative_keyword(text_lower: &str, tokens: &[String]) -> bool {
    NEGATIVE_KEYWORDS
        .iter()
        .any(|kw| tokens.iter().any(|t| t == kw) || text_lower.contains(kw))
}

/// Map a model score onto the response fields, applying both server-side
/// override rules. The star rating is computed from the possibly-dampened
/// score so the UI stays consistent with the overridden verdict.
pub fn classify(raw_score: f32, threshold: f32, text: &str, tokens: &[String]) -> Verdict {
    let mut score = raw_score;
    let mut sentiment = if score >= threshold {
        Sentiment::Positive
    } else {
        Sentiment::Negative
    };
    let mut category = categorize(score, threshold);

    // Rule A: unambiguous negative language beats the model.
    let text_lower = text.to_lowercase();
    if contains_negative_keyword(&text_lower, tokens) {
        sentiment = Sentiment::Negative;
        category = Category::VeryNegative;
        score = score.min(DAMPENED_SCORE_CEILING);
    }

    // Rule B: the mid-positive band is reported as plain Negative.
    if category == Category::SlightlyPositive {
        sentiment = Sentiment::Negative;
        category = Category::Negative;
    }

    Verdict {
        sentiment,
        category,
        color: category.color(),
        score,
        rating: star_rating(score),
    }
}
