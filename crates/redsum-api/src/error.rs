use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use redsum_types::{ErrorKind, FetchError, SummarizeError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Summarize(#[from] SummarizeError),

    #[error("Invalid request: {0}")]
    BadRequest(String),
}

impl From<FetchError> for ApiError {
    fn from(e: FetchError) -> Self {
        ApiError::Summarize(e.into())
    }
}

/// JSON body of every error response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    pub kind: String,
    pub retryable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chunk_index: Option<usize>,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Summarize(e) => match e {
                SummarizeError::InvalidSettings { .. } => StatusCode::BAD_REQUEST,
                SummarizeError::Fetch(FetchError::InvalidUrl(_)) => StatusCode::BAD_REQUEST,
                SummarizeError::Fetch(FetchError::NotFound(_)) => StatusCode::NOT_FOUND,
                SummarizeError::Fetch(_) | SummarizeError::Completion { .. } => {
                    StatusCode::BAD_GATEWAY
                }
                SummarizeError::OversizeChunk { .. } => StatusCode::UNPROCESSABLE_ENTITY,
                SummarizeError::Cancelled { .. } => StatusCode::SERVICE_UNAVAILABLE,
            },
        }
    }

    fn body(&self) -> ErrorBody {
        match self {
            ApiError::BadRequest(msg) => ErrorBody {
                error: msg.clone(),
                kind: "bad_request".to_string(),
                retryable: false,
                stage: None,
                chunk_index: None,
            },
            ApiError::Summarize(e) => ErrorBody {
                error: e.to_string(),
                kind: kind_name(e.kind()).to_string(),
                retryable: e.is_retryable(),
                stage: Some(e.stage().to_string()),
                chunk_index: e.chunk_index(),
            },
        }
    }
}

fn kind_name(kind: ErrorKind) -> &'static str {
    match kind {
        ErrorKind::InvalidSettings => "invalid_settings",
        ErrorKind::Fetch => "fetch",
        ErrorKind::Completion => "completion",
        ErrorKind::OversizeChunk => "oversize_chunk",
        ErrorKind::Cancelled => "cancelled",
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        if status.is_server_error() {
            tracing::error!(status = %status, error = %self, "Request failed");
        } else {
            tracing::warn!(status = %status, error = %self, "Request rejected");
        }

        (status, Json(self.body())).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (SummarizeError::invalid_settings("query", "must not be empty"), 400),
            (FetchError::InvalidUrl("ftp://x".to_string()).into(), 400),
            (FetchError::NotFound("abc".to_string()).into(), 404),
            (FetchError::Network("reset".to_string()).into(), 502),
            (
                SummarizeError::OversizeChunk {
                    pass: 1,
                    chunk_index: 0,
                    tokens: 9000,
                    limit: 4000,
                },
                422,
            ),
            (SummarizeError::Cancelled { completed_passes: 1 }, 503),
        ];

        for (err, expected) in cases {
            assert_eq!(ApiError::from(err).status().as_u16(), expected);
        }
    }

    #[test]
    fn test_body_carries_chunk_details() {
        let err = ApiError::from(SummarizeError::Completion {
            pass: 2,
            chunk_index: 3,
            message: "timed out".to_string(),
        });
        let body = err.body();

        assert_eq!(body.kind, "completion");
        assert_eq!(body.stage.as_deref(), Some("reducing"));
        assert_eq!(body.chunk_index, Some(3));
        assert!(body.retryable);
    }
}
