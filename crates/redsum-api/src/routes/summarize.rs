use axum::{
    extract::{rejection::QueryRejection, Query, State},
    Json,
};
use redsum_pipeline::PipelineContext;
use redsum_reddit::ThreadLocator;
use redsum_types::{GenerationSettings, Provenance, SettingsRequest};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;

use crate::{
    config::Config,
    error::{ApiError, ApiResult},
    state::AppState,
};

/// Query string of `GET /summarize`. Unset values come from config.
#[derive(Debug, Clone, Deserialize)]
pub struct SummarizeParams {
    pub url: String,
    pub model: Option<String>,
    pub max_summaries: Option<i64>,
    pub chunk_length: Option<i64>,
    pub max_tokens: Option<i64>,
    pub query: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SummarizeResponse {
    pub success: bool,
    pub summary: String,
    pub original_title: String,
    pub subreddit: String,
    /// Seconds, rounded to two decimals.
    pub processing_time: f64,
    pub url: String,
    pub model: String,
    pub provenance: Provenance,
}

/// Resolve request parameters against config defaults and validate them.
pub fn resolve_settings(
    config: &Config,
    params: &SummarizeParams,
) -> Result<GenerationSettings, ApiError> {
    let defaults = &config.summarizer;
    let model = params
        .model
        .clone()
        .unwrap_or_else(|| defaults.default_model.clone());
    let max_context_length = config.models.context_length_for(model.trim()) as i64;

    let request = SettingsRequest {
        query: params.query.clone().unwrap_or_else(|| defaults.query.clone()),
        chunk_token_length: params.chunk_length.unwrap_or(defaults.chunk_length),
        max_number_of_summaries: params.max_summaries.unwrap_or(defaults.max_summaries),
        max_token_length: params.max_tokens.unwrap_or(defaults.max_tokens),
        selected_model: model,
        system_role: defaults.system_role.clone(),
        max_context_length,
    };

    Ok(GenerationSettings::try_from(request)?)
}

pub async fn summarize(
    State(state): State<Arc<AppState>>,
    params: Result<Query<SummarizeParams>, QueryRejection>,
) -> ApiResult<Json<SummarizeResponse>> {
    let Query(params) = params.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let start = Instant::now();
    let request_id = uuid::Uuid::new_v4().to_string();

    // Everything below may call out, so reject bad input first
    let settings = resolve_settings(&state.config, &params)?;
    let locator = ThreadLocator::parse(&params.url)?;

    tracing::info!(
        request_id = %request_id,
        subreddit = %locator.subreddit,
        thread_id = %locator.thread_id,
        model = settings.selected_model(),
        "Summarizing thread"
    );

    let thread = state.fetcher.fetch(&params.url).await?;

    let ctx = PipelineContext::new(request_id.as_str()).with_cancel(state.shutdown.child_token());
    let result = state.pipeline.summarize(&ctx, &thread, &settings).await?;

    let processing_time = (start.elapsed().as_secs_f64() * 100.0).round() / 100.0;

    tracing::info!(
        request_id = %request_id,
        passes = result.provenance.pass_count(),
        completion_calls = result.provenance.completion_calls,
        processing_time,
        "Summary ready"
    );

    Ok(Json(SummarizeResponse {
        success: true,
        summary: result.text,
        original_title: thread.title,
        subreddit: thread.subreddit,
        processing_time,
        url: params.url,
        model: settings.selected_model().to_string(),
        provenance: result.provenance,
    }))
}
