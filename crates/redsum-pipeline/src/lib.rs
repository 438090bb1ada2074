//! Chunk-and-reduce summarization of long discussion threads.
//!
//! The pipeline splits a thread into token-bounded chunks, summarizes each
//! chunk through a [`redsum_llm::ChatClient`], and reduces the summaries
//! again until they fit the requested output.

pub mod chunker;
pub mod driver;
pub mod estimator;
pub mod pipeline;
pub mod prompt;
pub mod templates;

pub use chunker::Chunker;
pub use driver::{CompletionDriver, DriverOutput};
pub use estimator::{truncate_to_tokens, Encoding, HeuristicEstimator, TiktokenEstimator, TokenEstimator};
pub use pipeline::{PipelineContext, PipelineOptions, SummaryPipeline, SummaryPipelineBuilder};
pub use prompt::{BuiltPrompt, DoesNotFit, Framing, PromptBuilder, ThreadHeader};

// Re-export the data model so callers need only this crate
pub use redsum_types::{
    Chunk, ChunkSummary, GenerationSettings, PipelineResult, Provenance, SummarizeError,
    ThreadContent,
};
