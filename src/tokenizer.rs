use regex::Regex;
use std::sync::OnceLock;

static WORD_PATTERN: OnceLock<Regex> = OnceLock::new();

fn word_pattern() -> &'static Regex {
    WORD_PATTERN.get_or_init(|| Regex::new(r"[a-z0-9']+").expect("word pattern is valid"))
}

/// Split raw text into lowercase word tokens. A token is a maximal run of
/// alphanumerics and apostrophes, so "don't" stays a single token. Must
/// split the same way the training-time preprocessor did.
pub fn tokenize(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    word_pattern()
        .find_iter(&lowered)
        .map(|m| m.as_str().to_string())
        .collect()
}
