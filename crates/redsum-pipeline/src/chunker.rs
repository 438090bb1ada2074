use redsum_types::Chunk;

use crate::estimator::TokenEstimator;

/// Groups consecutive text items into token-bounded chunks.
pub struct Chunker<'a> {
    estimator: &'a dyn TokenEstimator,
    model: &'a str,
}

/// Items accumulated for the chunk currently being built.
#[derive(Default)]
struct Pending {
    items: Vec<String>,
    text: String,
    tokens: usize,
}

impl<'a> Chunker<'a> {
    pub fn new(estimator: &'a dyn TokenEstimator, model: &'a str) -> Self {
        Self { estimator, model }
    }

    /// Greedily pack `items` into chunks of at most `limit` tokens.
    ///
    /// An item that alone exceeds `limit` becomes its own chunk with
    /// `oversize` set; it is never split or dropped. Input order is kept.
    pub fn chunk(&self, items: &[String], limit: usize) -> Vec<Chunk> {
        let mut chunks = Vec::new();
        let mut pending = Pending::default();

        for item in items {
            let item_tokens = self.estimator.estimate(item, self.model);

            if item_tokens > limit {
                Self::flush(&mut pending, &mut chunks);
                tracing::warn!(
                    chunk = chunks.len(),
                    tokens = item_tokens,
                    limit,
                    "Item exceeds chunk limit, passing it through as its own chunk"
                );
                chunks.push(Chunk {
                    index: chunks.len(),
                    items: vec![item.clone()],
                    text: item.clone(),
                    token_count: item_tokens,
                    oversize: true,
                });
                continue;
            }

            if pending.items.is_empty() {
                pending.items.push(item.clone());
                pending.text = item.clone();
                pending.tokens = item_tokens;
                continue;
            }

            let candidate = format!("{}{}{}", pending.text, Chunk::SEPARATOR, item);
            let candidate_tokens = self.estimator.estimate(&candidate, self.model);

            if candidate_tokens <= limit {
                pending.items.push(item.clone());
                pending.text = candidate;
                pending.tokens = candidate_tokens;
            } else {
                Self::flush(&mut pending, &mut chunks);
                pending.items.push(item.clone());
                pending.text = item.clone();
                pending.tokens = item_tokens;
            }
        }

        Self::flush(&mut pending, &mut chunks);
        chunks
    }

    fn flush(pending: &mut Pending, chunks: &mut Vec<Chunk>) {
        if pending.items.is_empty() {
            return;
        }
        let Pending {
            items,
            text,
            tokens,
        } = std::mem::take(pending);
        chunks.push(Chunk {
            index: chunks.len(),
            items,
            text,
            token_count: tokens,
            oversize: false,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::estimator::{HeuristicEstimator, TiktokenEstimator};
    use proptest::prelude::*;

    /// One token per whitespace-separated word.
    struct WordEstimator;

    impl TokenEstimator for WordEstimator {
        fn estimate(&self, text: &str, _model: &str) -> usize {
            text.split_whitespace().count()
        }
    }

    fn words(n: usize) -> String {
        vec!["word"; n].join(" ")
    }

    #[test]
    fn test_empty_input() {
        let chunker = Chunker::new(&WordEstimator, "gpt-3.5-turbo");
        assert!(chunker.chunk(&[], 100).is_empty());
    }

    #[test]
    fn test_two_small_items_share_a_chunk() {
        let chunker = Chunker::new(&WordEstimator, "gpt-3.5-turbo");
        let items = vec![words(50), words(50)];

        let chunks = chunker.chunk(&items, 120);

        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].items, items);
        assert_eq!(chunks[0].token_count, 100);
        assert!(!chunks[0].oversize);
        assert_eq!(chunks[0].text, format!("{}\n\n{}", items[0], items[1]));
    }

    #[test]
    fn test_closes_chunk_when_limit_reached() {
        let chunker = Chunker::new(&WordEstimator, "gpt-3.5-turbo");
        let items = vec![words(40), words(40), words(40)];

        let chunks = chunker.chunk(&items, 100);

        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].items.len(), 2);
        assert_eq!(chunks[1].items.len(), 1);
        assert_eq!(chunks[1].index, 1);
    }

    #[test]
    fn test_oversize_items_pass_through() {
        let chunker = Chunker::new(&WordEstimator, "gpt-3.5-turbo");
        let items: Vec<String> = (0..10).map(|_| words(200)).collect();

        let chunks = chunker.chunk(&items, 150);

        assert_eq!(chunks.len(), 10);
        for (i, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.index, i);
            assert!(chunk.oversize);
            assert_eq!(chunk.items.len(), 1);
            assert_eq!(chunk.token_count, 200);
        }
    }

    #[test]
    fn test_oversize_item_splits_surrounding_chunks() {
        let chunker = Chunker::new(&WordEstimator, "gpt-3.5-turbo");
        let items = vec![words(10), words(500), words(10)];

        let chunks = chunker.chunk(&items, 100);

        assert_eq!(chunks.len(), 3);
        assert!(!chunks[0].oversize);
        assert!(chunks[1].oversize);
        assert!(!chunks[2].oversize);
    }

    #[test]
    fn test_real_tokenizer_keeps_limit() {
        let estimator = TiktokenEstimator::new();
        let chunker = Chunker::new(&estimator, "gpt-3.5-turbo");
        let items: Vec<String> = (0..30)
            .map(|i| format!("Comment number {} says the deal is good value for money.", i))
            .collect();

        let chunks = chunker.chunk(&items, 60);

        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(chunk.token_count <= 60);
            assert_eq!(estimator.estimate(&chunk.text, "gpt-3.5-turbo"), chunk.token_count);
        }
    }

    proptest! {
        #[test]
        fn prop_chunks_reconstruct_input(
            items in prop::collection::vec(".{0,80}", 1..40),
            limit in 1usize..60,
        ) {
            let chunker = Chunker::new(&HeuristicEstimator, "gpt-3.5-turbo");
            let chunks = chunker.chunk(&items, limit);

            let rebuilt: Vec<String> = chunks.iter().flat_map(|c| c.items.clone()).collect();
            prop_assert_eq!(rebuilt, items);
        }

        #[test]
        fn prop_chunks_within_limit(
            items in prop::collection::vec("[a-z ]{0,120}", 1..40),
            limit in 1usize..60,
        ) {
            let chunker = Chunker::new(&HeuristicEstimator, "gpt-3.5-turbo");
            for (i, chunk) in chunker.chunk(&items, limit).iter().enumerate() {
                prop_assert_eq!(chunk.index, i);
                prop_assert_eq!(chunk.text.clone(), chunk.items.join(Chunk::SEPARATOR));
                if chunk.oversize {
                    prop_assert_eq!(chunk.items.len(), 1);
                    prop_assert!(chunk.token_count > limit);
                } else {
                    prop_assert!(HeuristicEstimator.estimate(&chunk.text, "m") <= limit);
                }
            }
        }
    }
}
