use serde::{Deserialize, Serialize};

use crate::error::{ErrorKind, Stage};

/// A chunk whose completion did not survive the pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkFailure {
    pub chunk_index: usize,
    pub kind: ErrorKind,
    pub message: String,
}

/// What happened during one pass of the reducer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PassReport {
    pub pass: usize,
    pub stage: Stage,
    pub chunks: usize,
    pub oversize_chunks: usize,
    pub summaries: usize,
    pub failures: Vec<ChunkFailure>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Provenance {
    pub passes: Vec<PassReport>,
    pub completion_calls: usize,
    /// The pass cap was reached and the result is a truncated concatenation.
    pub pass_limit_exceeded: bool,
}

impl Provenance {
    pub fn pass_count(&self) -> usize {
        self.passes.len()
    }

    /// Chunks consumed at each pass, in pass order.
    pub fn chunks_per_pass(&self) -> Vec<usize> {
        self.passes.iter().map(|p| p.chunks).collect()
    }

    pub fn failed_chunks(&self) -> usize {
        self.passes.iter().map(|p| p.failures.len()).sum()
    }
}

/// Final output of the summarization pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineResult {
    pub text: String,
    pub provenance: Provenance,
}
