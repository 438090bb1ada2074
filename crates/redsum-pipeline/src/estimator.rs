use std::collections::HashMap;
use std::sync::OnceLock;

use tiktoken_rs::{cl100k_base, o200k_base, CoreBPE};

/// Approximate token counting for a model family.
///
/// Implementations must be deterministic, return 0 for the empty string and
/// never decrease when text is appended.
pub trait TokenEstimator: Send + Sync {
    fn estimate(&self, text: &str, model: &str) -> usize;
}

/// BPE vocabulary used by a model family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    Cl100k,
    O200k,
}

impl Encoding {
    pub fn for_model(model: &str) -> Self {
        let model = model.to_ascii_lowercase();
        let o200k_families = ["gpt-4o", "gpt-4.1", "gpt-4.5", "gpt-5", "o1", "o3", "o4", "chatgpt-4o"];
        if o200k_families.iter().any(|family| model.starts_with(family)) {
            Encoding::O200k
        } else {
            Encoding::Cl100k
        }
    }
}

/// Loaded once, then shared read-only. `None` if the table failed to load.
fn bpe(encoding: Encoding) -> Option<&'static CoreBPE> {
    static CL100K: OnceLock<Option<CoreBPE>> = OnceLock::new();
    static O200K: OnceLock<Option<CoreBPE>> = OnceLock::new();

    let cell = match encoding {
        Encoding::Cl100k => &CL100K,
        Encoding::O200k => &O200K,
    };

    cell.get_or_init(|| {
        let loaded = match encoding {
            Encoding::Cl100k => cl100k_base(),
            Encoding::O200k => o200k_base(),
        };
        match loaded {
            Ok(bpe) => Some(bpe),
            Err(e) => {
                tracing::warn!(?encoding, error = %e, "Tokenizer unavailable, using heuristic estimate");
                None
            }
        }
    })
    .as_ref()
}

/// Pieces never grow past this many chars.
const MAX_PIECE_CHARS: usize = 32;

/// Token counts from the model family's BPE vocabulary.
///
/// Raw BPE counts are not monotonic under appends: `"<|endoftext"` costs
/// more than `"<|endoftext|>"` when special tokens are recognised, and a
/// word can merge into fewer tokens once its last letter arrives. The
/// estimate is built so that appending can never lower it:
///
/// 1. Special-token text is encoded as ordinary text.
/// 2. The text is split into pieces. A piece ends before whitespace that
///    follows non-whitespace, or after [`MAX_PIECE_CHARS`] chars. Each cut
///    depends only on the text before it, so appending extends the last
///    piece and adds new ones but never moves an earlier cut.
/// 3. A piece costs the largest BPE count over its non-empty prefixes.
///    Extending a piece only adds prefixes, so its cost cannot drop.
///
/// The estimate is the sum of piece costs, which is monotonic by (2) and (3).
/// It sits slightly above the raw count of the whole text.
#[derive(Debug, Clone, Copy, Default)]
pub struct TiktokenEstimator {
    fallback: HeuristicEstimator,
}

impl TiktokenEstimator {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TokenEstimator for TiktokenEstimator {
    fn estimate(&self, text: &str, model: &str) -> usize {
        if text.is_empty() {
            return 0;
        }
        let Some(bpe) = bpe(Encoding::for_model(model)) else {
            return self.fallback.estimate(text, model);
        };

        // Repeated words are common, so cost each distinct piece once
        let mut costs: HashMap<&str, usize> = HashMap::new();
        pieces(text)
            .into_iter()
            .map(|piece| *costs.entry(piece).or_insert_with(|| piece_cost(bpe, piece)))
            .sum()
    }
}

/// Cut `text` into append-stable pieces.
fn pieces(text: &str) -> Vec<&str> {
    let mut pieces = Vec::new();
    let mut start = 0;
    let mut len = 0;
    let mut after_word = false;

    for (i, c) in text.char_indices() {
        let space = c.is_whitespace();
        if len > 0 && ((space && after_word) || len == MAX_PIECE_CHARS) {
            pieces.push(&text[start..i]);
            start = i;
            len = 0;
        }
        len += 1;
        after_word = !space;
    }
    if start < text.len() {
        pieces.push(&text[start..]);
    }
    pieces
}

fn piece_cost(bpe: &CoreBPE, piece: &str) -> usize {
    piece
        .char_indices()
        .map(|(i, c)| i + c.len_utf8())
        .map(|end| bpe.encode_ordinary(&piece[..end]).len())
        .max()
        .unwrap_or(0)
}

/// Roughly four characters per token.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicEstimator;

impl TokenEstimator for HeuristicEstimator {
    fn estimate(&self, text: &str, _model: &str) -> usize {
        (text.chars().count() + 3) / 4
    }
}

/// Longest prefix of `text` (on a char boundary) whose estimate fits `limit`.
pub fn truncate_to_tokens(
    estimator: &dyn TokenEstimator,
    text: &str,
    model: &str,
    limit: usize,
) -> String {
    if estimator.estimate(text, model) <= limit {
        return text.to_string();
    }

    let boundaries: Vec<usize> = text
        .char_indices()
        .map(|(i, _)| i)
        .chain(std::iter::once(text.len()))
        .collect();

    // boundaries[lo] always fits, boundaries[hi] never does
    let (mut lo, mut hi) = (0, boundaries.len() - 1);
    while hi - lo > 1 {
        let mid = lo + (hi - lo) / 2;
        if estimator.estimate(&text[..boundaries[mid]], model) <= limit {
            lo = mid;
        } else {
            hi = mid;
        }
    }

    text[..boundaries[lo]].trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_empty_is_zero() {
        assert_eq!(TiktokenEstimator::new().estimate("", "gpt-3.5-turbo"), 0);
        assert_eq!(TiktokenEstimator::new().estimate("", "gpt-4o"), 0);
        assert_eq!(HeuristicEstimator.estimate("", "any"), 0);
    }

    #[test]
    fn test_encoding_families() {
        assert_eq!(Encoding::for_model("gpt-4o-mini"), Encoding::O200k);
        assert_eq!(Encoding::for_model("o1-preview"), Encoding::O200k);
        assert_eq!(Encoding::for_model("gpt-3.5-turbo"), Encoding::Cl100k);
        assert_eq!(Encoding::for_model("gpt-4"), Encoding::Cl100k);
        assert_eq!(Encoding::for_model("llama-3-8b"), Encoding::Cl100k);
    }

    #[test]
    fn test_counts_plain_words() {
        let estimator = TiktokenEstimator::new();
        let text = "hello world";
        let count = estimator.estimate(text, "gpt-3.5-turbo");
        // At least the raw BPE count, at most one token per byte
        assert!(count >= 2 && count <= text.len(), "unexpected count {}", count);
    }

    #[test]
    fn test_special_token_text_counts_as_ordinary() {
        let estimator = TiktokenEstimator::new();
        for model in ["gpt-3.5-turbo", "gpt-4o"] {
            let partial = estimator.estimate("<|endoftext", model);
            let complete = estimator.estimate("<|endoftext|>", model);
            assert!(partial <= complete, "{}: {} > {}", model, partial, complete);
            assert!(complete > 1);
        }
    }

    #[test]
    fn test_completing_a_word_never_lowers_count() {
        let estimator = TiktokenEstimator::new();
        let text = "the deal was reported by a counter offer at the counter";
        for model in ["gpt-3.5-turbo", "gpt-4o"] {
            let mut previous = 0;
            for (i, c) in text.char_indices() {
                let count = estimator.estimate(&text[..i + c.len_utf8()], model);
                assert!(count >= previous, "{}: dropped at {:?}", model, &text[..i + c.len_utf8()]);
                previous = count;
            }
        }
    }

    #[test]
    fn test_pieces_split_before_whitespace_and_at_width() {
        assert_eq!(pieces("hi there  you"), vec!["hi", " there", "  you"]);
        assert_eq!(pieces("  lead"), vec!["  lead"]);
        let long = "x".repeat(MAX_PIECE_CHARS + 3);
        assert_eq!(pieces(&long), vec![&long[..MAX_PIECE_CHARS], &long[MAX_PIECE_CHARS..]]);
        assert!(pieces("").is_empty());
    }

    #[test]
    fn test_garbled_input_does_not_fail() {
        let estimator = TiktokenEstimator::new();
        let garbled = "\u{fffd}\u{0}<|endoftext|>\u{202e}ﾟ･✿ヾ╲(｡◕‿◕｡)╱✿･ﾟ";
        assert!(estimator.estimate(garbled, "gpt-4o") > 0);
        assert!(estimator.estimate(garbled, "unknown-model") > 0);
    }

    #[test]
    fn test_heuristic_rounds_up() {
        assert_eq!(HeuristicEstimator.estimate("abc", "m"), 1);
        assert_eq!(HeuristicEstimator.estimate("abcde", "m"), 2);
    }

    #[test]
    fn test_truncate_to_tokens() {
        let estimator = HeuristicEstimator;
        let text = "abcdefghijklmnopqrstuvwxyz";

        let cut = truncate_to_tokens(&estimator, text, "m", 3);
        assert_eq!(cut, "abcdefghijkl");
        assert_eq!(truncate_to_tokens(&estimator, text, "m", 100), text);
        assert_eq!(truncate_to_tokens(&estimator, text, "m", 0), "");
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        let estimator = HeuristicEstimator;
        let text = "ééééééééé";
        let cut = truncate_to_tokens(&estimator, text, "m", 1);
        assert_eq!(cut, "éééé");
    }

    /// Free text, words cut mid-way, and special-token markup.
    fn fragment() -> impl Strategy<Value = String> {
        prop_oneof![
            "\\PC{0,24}",
            "[a-z]{1,12}",
            " ?[a-zA-Z]{0,6}",
            Just("<|endoftext|>".to_string()),
            Just("<|endof".to_string()),
            Just("text|>".to_string()),
            Just("\n\n".to_string()),
        ]
    }

    fn text() -> impl Strategy<Value = String> {
        prop::collection::vec(fragment(), 0..8).prop_map(|parts| parts.concat())
    }

    proptest! {
        #[test]
        fn prop_append_never_decreases(head in text(), tail in text()) {
            let estimator = TiktokenEstimator::new();
            let joined = format!("{}{}", head, tail);
            for model in ["gpt-3.5-turbo", "gpt-4o"] {
                prop_assert!(
                    estimator.estimate(&head, model) <= estimator.estimate(&joined, model),
                    "{}: {:?} + {:?}", model, head, tail
                );
            }
        }

        #[test]
        fn prop_heuristic_monotonic(head in ".{0,64}", tail in ".{0,64}") {
            let joined = format!("{}{}", head, tail);
            prop_assert!(HeuristicEstimator.estimate(&head, "m") <= HeuristicEstimator.estimate(&joined, "m"));
        }

        #[test]
        fn prop_deterministic(text in ".{0,128}") {
            let estimator = TiktokenEstimator::new();
            prop_assert_eq!(estimator.estimate(&text, "gpt-4"), estimator.estimate(&text, "gpt-4"));
        }
    }
}
