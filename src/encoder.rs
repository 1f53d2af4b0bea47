use crate::vocab::Vocabulary;

/// Fixed model input width. Must match the padding the model was trained
/// with; the model has no positional invariance guarantee.
pub const MAX_SEQUENCE_LENGTH: usize = 200;

/// Only the most frequent words are embedded; shifted indices at or above
/// this ceiling map to the unknown sentinel.
pub const VOCABULARY_CEILING: i64 = 10_000;

/// Reserved input ids: 0 = padding, 1 = sequence start, 2 = unknown.
pub const PADDING_TOKEN: i64 = 0;
pub const UNKNOWN_TOKEN: i64 = 2;

/// Raw vocabulary indices are shifted past the reserved ids.
pub const INDEX_OFFSET: i64 = 3;

/// Map tokens onto model input ids and fix the width: truncate from the
/// left (keeping the most recent tokens) or left-pad with zeros, matching
/// the training-time convention. Pure and deterministic for a given
/// vocabulary snapshot.
pub fn encode(tokens: &[String], vocab: &Vocabulary) -> Vec<i64> {
    let mapped: Vec<i64> = tokens
        .iter()
        .map(|token| match vocab.raw_index(token) {
            Some(raw) => {
                let shifted = i64::from(raw) + INDEX_OFFSET;
                if shifted >= VOCABULARY_CEILING {
                    UNKNOWN_TOKEN
                } else {
                    shifted
                }
            }
            None => UNKNOWN_TOKEN,
        })
        .collect();

    let mut sequence = vec![PADDING_TOKEN; MAX_SEQUENCE_LENGTH];
    let keep = mapped.len().min(MAX_SEQUENCE_LENGTH);
    sequence[MAX_SEQUENCE_LENGTH - keep..].copy_from_slice(&mapped[mapped.len() - keep..]);
    sequence
}
