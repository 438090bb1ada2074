//! Shared data model for the redsum workspace: thread content, validated
//! generation settings, chunks, pipeline results and the error taxonomy.

pub mod chunk;
pub mod error;
pub mod models;
pub mod result;
pub mod settings;
pub mod thread;

pub use chunk::{Chunk, ChunkSummary};
pub use error::{ErrorKind, FetchError, Stage, SummarizeError};
pub use models::{ModelCatalog, ModelProfile, FALLBACK_CONTEXT_LENGTH};
pub use result::{ChunkFailure, PassReport, PipelineResult, Provenance};
pub use settings::{GenerationSettings, SettingsRequest};
pub use thread::ThreadContent;
