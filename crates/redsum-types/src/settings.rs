use serde::{Deserialize, Serialize};

use crate::error::SummarizeError;

/// Unvalidated generation settings, as supplied by a caller.
///
/// Convert with [`GenerationSettings::try_from`] before handing it to the
/// pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettingsRequest {
    pub query: String,
    pub chunk_token_length: i64,
    pub max_number_of_summaries: i64,
    pub max_token_length: i64,
    pub selected_model: String,
    pub system_role: String,
    pub max_context_length: i64,
}

/// Validated, immutable settings for one summarization request.
///
/// Fields are private so the only way to get one is through validation;
/// the pipeline never re-checks them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenerationSettings {
    query: String,
    chunk_token_length: usize,
    max_number_of_summaries: usize,
    max_token_length: usize,
    selected_model: String,
    system_role: String,
    max_context_length: usize,
}

impl GenerationSettings {
    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn chunk_token_length(&self) -> usize {
        self.chunk_token_length
    }

    pub fn max_number_of_summaries(&self) -> usize {
        self.max_number_of_summaries
    }

    pub fn max_token_length(&self) -> usize {
        self.max_token_length
    }

    pub fn selected_model(&self) -> &str {
        &self.selected_model
    }

    pub fn system_role(&self) -> &str {
        &self.system_role
    }

    pub fn max_context_length(&self) -> usize {
        self.max_context_length
    }
}

fn positive(field: &'static str, value: i64) -> Result<usize, SummarizeError> {
    if value <= 0 {
        return Err(SummarizeError::invalid_settings(
            field,
            format!("must be positive, got {}", value),
        ));
    }
    usize::try_from(value)
        .map_err(|_| SummarizeError::invalid_settings(field, format!("out of range: {}", value)))
}

impl TryFrom<SettingsRequest> for GenerationSettings {
    type Error = SummarizeError;

    fn try_from(req: SettingsRequest) -> Result<Self, Self::Error> {
        let chunk_token_length = positive("chunk_token_length", req.chunk_token_length)?;
        let max_number_of_summaries =
            positive("max_number_of_summaries", req.max_number_of_summaries)?;
        let max_token_length = positive("max_token_length", req.max_token_length)?;
        let max_context_length = positive("max_context_length", req.max_context_length)?;

        if chunk_token_length >= max_context_length {
            return Err(SummarizeError::invalid_settings(
                "chunk_token_length",
                format!(
                    "must be smaller than max_context_length ({} >= {})",
                    chunk_token_length, max_context_length
                ),
            ));
        }

        let selected_model = req.selected_model.trim().to_string();
        if selected_model.is_empty() {
            return Err(SummarizeError::invalid_settings(
                "selected_model",
                "must not be empty",
            ));
        }

        if req.query.trim().is_empty() {
            return Err(SummarizeError::invalid_settings("query", "must not be empty"));
        }

        Ok(Self {
            query: req.query,
            chunk_token_length,
            max_number_of_summaries,
            max_token_length,
            selected_model,
            system_role: req.system_role,
            max_context_length,
        })
    }
}
