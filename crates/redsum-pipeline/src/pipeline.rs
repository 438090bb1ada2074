use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Result};
use futures::stream::{self, StreamExt};
use redsum_llm::ChatClient;
use redsum_types::{
    Chunk, ChunkFailure, ChunkSummary, GenerationSettings, PassReport, PipelineResult, Provenance,
    Stage, SummarizeError, ThreadContent,
};
use tokio_util::sync::CancellationToken;

use crate::chunker::Chunker;
use crate::driver::CompletionDriver;
use crate::estimator::{truncate_to_tokens, TiktokenEstimator, TokenEstimator};
use crate::prompt::{PromptBuilder, ThreadHeader};

/// Tuning knobs for the reducer. Not part of a request's settings.
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    /// Hard cap on passes, counting the collecting pass. At least 1.
    pub max_passes: usize,
    /// Chunk completions in flight at once within a pass.
    pub max_concurrency: usize,
    pub call_timeout: Duration,
    pub retry_delay: Duration,
    pub temperature: Option<f32>,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            max_passes: 5,
            max_concurrency: 4,
            call_timeout: Duration::from_secs(60),
            retry_delay: Duration::from_millis(500),
            temperature: None,
        }
    }
}

/// Per-request context handed to the pipeline by its caller.
#[derive(Debug, Clone)]
pub struct PipelineContext {
    pub request_id: String,
    pub cancel: CancellationToken,
}

impl PipelineContext {
    pub fn new(request_id: impl Into<String>) -> Self {
        Self {
            request_id: request_id.into(),
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }
}

/// Builder for [`SummaryPipeline`].
pub struct SummaryPipelineBuilder {
    chat_client: Option<Arc<dyn ChatClient>>,
    estimator: Option<Arc<dyn TokenEstimator>>,
    options: PipelineOptions,
}

impl SummaryPipelineBuilder {
    pub fn new() -> Self {
        Self {
            chat_client: None,
            estimator: None,
            options: PipelineOptions::default(),
        }
    }

    /// Set the chat client used for every completion
    pub fn chat_client(mut self, client: Arc<dyn ChatClient>) -> Self {
        self.chat_client = Some(client);
        self
    }

    /// Override the token estimator (defaults to BPE counts)
    pub fn estimator(mut self, estimator: Arc<dyn TokenEstimator>) -> Self {
        self.estimator = Some(estimator);
        self
    }

    pub fn options(mut self, options: PipelineOptions) -> Self {
        self.options = options;
        self
    }

    pub fn build(self) -> Result<SummaryPipeline> {
        let client = self
            .chat_client
            .ok_or_else(|| anyhow!("Chat client is required"))?;

        if self.options.max_passes == 0 {
            return Err(anyhow!("max_passes must be at least 1"));
        }
        if self.options.max_concurrency == 0 {
            return Err(anyhow!("max_concurrency must be at least 1"));
        }

        let driver = CompletionDriver::new(client)
            .with_timeout(self.options.call_timeout)
            .with_retry_delay(self.options.retry_delay)
            .with_temperature(self.options.temperature);

        Ok(SummaryPipeline {
            driver,
            estimator: self
                .estimator
                .unwrap_or_else(|| Arc::new(TiktokenEstimator::new())),
            options: self.options,
        })
    }
}

impl Default for SummaryPipelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// One chunk's completion, and how many calls it cost.
struct ChunkOutcome {
    calls: usize,
    result: Result<ChunkSummary, SummarizeError>,
}

struct PassOutcome {
    report: PassReport,
    calls: usize,
    summaries: Vec<ChunkSummary>,
    last_error: Option<SummarizeError>,
}

/// Chunk-and-reduce summarizer for a fetched thread.
///
/// Stateless across requests: share one instance behind an `Arc`.
pub struct SummaryPipeline {
    driver: CompletionDriver,
    estimator: Arc<dyn TokenEstimator>,
    options: PipelineOptions,
}

impl SummaryPipeline {
    pub fn builder() -> SummaryPipelineBuilder {
        SummaryPipelineBuilder::new()
    }

    pub fn options(&self) -> &PipelineOptions {
        &self.options
    }

    pub fn estimator(&self) -> &dyn TokenEstimator {
        self.estimator.as_ref()
    }

    /// Summarize `thread` under `settings`.
    ///
    /// Runs a collecting pass over the thread, then reducing passes over the
    /// summaries until one remains, they fit together, or `max_passes` is
    /// reached. Passes run one after another; chunks within a pass run
    /// concurrently and keep their order.
    #[tracing::instrument(
        name = "summarize",
        skip_all,
        fields(request_id = %ctx.request_id, model = %settings.selected_model())
    )]
    pub async fn summarize(
        &self,
        ctx: &PipelineContext,
        thread: &ThreadContent,
        settings: &GenerationSettings,
    ) -> Result<PipelineResult, SummarizeError> {
        let header = ThreadHeader {
            title: thread.title.clone(),
            subreddit: thread.subreddit.clone(),
        };
        let mut items = thread.items();
        let mut provenance = Provenance::default();

        tracing::info!(items = items.len(), "Starting summarization");

        let mut pass = 0;
        loop {
            pass += 1;
            if ctx.cancel.is_cancelled() {
                return Err(SummarizeError::Cancelled {
                    completed_passes: pass - 1,
                });
            }

            let outcome = tokio::select! {
                biased;
                _ = ctx.cancel.cancelled() => {
                    tracing::info!(pass, "Cancelled during pass");
                    return Err(SummarizeError::Cancelled { completed_passes: pass - 1 });
                }
                outcome = self.run_pass(pass, &items, &header, settings) => outcome,
            };

            provenance.completion_calls += outcome.calls;
            provenance.passes.push(outcome.report);

            if outcome.summaries.is_empty() {
                let err = outcome.last_error.unwrap_or(SummarizeError::Completion {
                    pass,
                    chunk_index: 0,
                    message: "pass produced no summaries".to_string(),
                });
                tracing::error!(pass, error = %err, "Every chunk in the pass failed");
                return Err(err);
            }

            let mut texts: Vec<String> = outcome.summaries.into_iter().map(|s| s.text).collect();

            if texts.len() == 1 {
                let text = texts.pop().unwrap_or_default();
                return Ok(self.finish(text, provenance));
            }

            let joined = texts.join(Chunk::SEPARATOR);
            let joined_tokens = self.estimator.estimate(&joined, settings.selected_model());
            let needs_reduce = texts.len() > settings.max_number_of_summaries()
                || joined_tokens > settings.max_context_length();

            if !needs_reduce {
                return Ok(self.finish(joined, provenance));
            }

            if pass >= self.options.max_passes {
                tracing::warn!(
                    passes = pass,
                    summaries = texts.len(),
                    joined_tokens,
                    "Pass limit reached, returning truncated summaries"
                );
                provenance.pass_limit_exceeded = true;
                let text = truncate_to_tokens(
                    self.estimator.as_ref(),
                    &joined,
                    settings.selected_model(),
                    settings.max_context_length(),
                );
                return Ok(self.finish(text, provenance));
            }

            tracing::debug!(
                pass,
                summaries = texts.len(),
                joined_tokens,
                "Summaries still too large, reducing again"
            );
            items = texts;
        }
    }

    fn finish(&self, text: String, provenance: Provenance) -> PipelineResult {
        tracing::info!(
            passes = provenance.pass_count(),
            completion_calls = provenance.completion_calls,
            failed_chunks = provenance.failed_chunks(),
            "Summarization finished"
        );
        PipelineResult { text, provenance }
    }

    async fn run_pass(
        &self,
        pass: usize,
        items: &[String],
        header: &ThreadHeader,
        settings: &GenerationSettings,
    ) -> PassOutcome {
        let stage = Stage::for_pass(pass);
        let chunks = Chunker::new(self.estimator.as_ref(), settings.selected_model())
            .chunk(items, settings.chunk_token_length());
        let builder = PromptBuilder::new(self.estimator.as_ref(), settings, header);

        let chunk_count = chunks.len();
        let oversize_chunks = chunks.iter().filter(|c| c.oversize).count();

        tracing::info!(pass, %stage, chunks = chunk_count, "Running pass");

        let outcomes: Vec<ChunkOutcome> = stream::iter(chunks)
            .map(|chunk| self.summarize_chunk(pass, stage, chunk, &builder, settings))
            .buffered(self.options.max_concurrency)
            .collect()
            .await;

        let mut report = PassReport {
            pass,
            stage,
            chunks: chunk_count,
            oversize_chunks,
            summaries: 0,
            failures: Vec::new(),
        };
        let mut calls = 0;
        let mut summaries = Vec::with_capacity(chunk_count);
        let mut last_error = None;

        for outcome in outcomes {
            calls += outcome.calls;
            match outcome.result {
                Ok(summary) => summaries.push(summary),
                Err(err) => {
                    report.failures.push(ChunkFailure {
                        chunk_index: err.chunk_index().unwrap_or_default(),
                        kind: err.kind(),
                        message: err.to_string(),
                    });
                    last_error = Some(err);
                }
            }
        }
        report.summaries = summaries.len();

        PassOutcome {
            report,
            calls,
            summaries,
            last_error,
        }
    }

    async fn summarize_chunk(
        &self,
        pass: usize,
        stage: Stage,
        chunk: Chunk,
        builder: &PromptBuilder<'_>,
        settings: &GenerationSettings,
    ) -> ChunkOutcome {
        let prompt = match builder.build(stage, &chunk.text) {
            Ok(prompt) => prompt,
            Err(e) => {
                tracing::warn!(pass, chunk = chunk.index, tokens = e.tokens, limit = e.limit, "Chunk does not fit the context window");
                return ChunkOutcome {
                    calls: 0,
                    result: Err(SummarizeError::OversizeChunk {
                        pass,
                        chunk_index: chunk.index,
                        tokens: e.tokens,
                        limit: e.limit,
                    }),
                };
            }
        };

        let output = self.driver.complete(&prompt, settings).await;
        let result = match output.result {
            Ok(text) => Ok(ChunkSummary {
                source_chunk_index: chunk.index,
                text,
            }),
            Err(e) => {
                tracing::warn!(pass, chunk = chunk.index, error = %e, "Chunk completion failed");
                Err(SummarizeError::Completion {
                    pass,
                    chunk_index: chunk.index,
                    message: format!("{:#}", e),
                })
            }
        };

        ChunkOutcome {
            calls: output.attempts,
            result,
        }
    }
}
