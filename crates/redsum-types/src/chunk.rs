use serde::{Deserialize, Serialize};

/// A token-bounded group of consecutive source items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    /// Position of this chunk within its pass.
    pub index: usize,
    /// Source items in input order.
    pub items: Vec<String>,
    /// Items joined with [`Chunk::SEPARATOR`].
    pub text: String,
    /// Estimated token count of `text`.
    pub token_count: usize,
    /// Set when a single item alone exceeds the chunk limit.
    pub oversize: bool,
}

impl Chunk {
    pub const SEPARATOR: &'static str = "\n\n";
}

/// Completion produced for one chunk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkSummary {
    pub source_chunk_index: usize,
    pub text: String,
}
