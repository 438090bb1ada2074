use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failure reported by the Reddit collaborator.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("Invalid Reddit URL: {0}")]
    InvalidUrl(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Reddit returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Malformed thread JSON: {0}")]
    Malformed(String),

    #[error("Thread not found: {0}")]
    NotFound(String),
}

impl FetchError {
    /// Transient failures a caller may retry.
    pub fn is_retryable(&self) -> bool {
        match self {
            FetchError::Network(_) | FetchError::Timeout(_) => true,
            FetchError::Status { status, .. } => *status == 429 || *status >= 500,
            FetchError::InvalidUrl(_) | FetchError::Malformed(_) | FetchError::NotFound(_) => false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidSettings,
    Fetch,
    Completion,
    OversizeChunk,
    Cancelled,
}

/// Pipeline stage an error was raised in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Validation,
    Fetch,
    Collecting,
    Reducing,
}

impl Stage {
    /// Pass 1 works on the thread itself, every later pass on summaries.
    pub fn for_pass(pass: usize) -> Self {
        if pass <= 1 {
            Stage::Collecting
        } else {
            Stage::Reducing
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Stage::Validation => "validation",
            Stage::Fetch => "fetch",
            Stage::Collecting => "collecting",
            Stage::Reducing => "reducing",
        };
        f.write_str(name)
    }
}

#[derive(Error, Debug)]
pub enum SummarizeError {
    #[error("Invalid settings: {field} {reason}")]
    InvalidSettings { field: &'static str, reason: String },

    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    #[error("Completion failed (pass {pass}, chunk {chunk_index}): {message}")]
    Completion {
        pass: usize,
        chunk_index: usize,
        message: String,
    },

    #[error("Chunk {chunk_index} in pass {pass} does not fit the context window ({tokens} > {limit} tokens)")]
    OversizeChunk {
        pass: usize,
        chunk_index: usize,
        tokens: usize,
        limit: usize,
    },

    #[error("Summarization cancelled after {completed_passes} pass(es)")]
    Cancelled { completed_passes: usize },
}

impl SummarizeError {
    pub fn invalid_settings(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidSettings {
            field,
            reason: reason.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidSettings { .. } => ErrorKind::InvalidSettings,
            Self::Fetch(_) => ErrorKind::Fetch,
            Self::Completion { .. } => ErrorKind::Completion,
            Self::OversizeChunk { .. } => ErrorKind::OversizeChunk,
            Self::Cancelled { .. } => ErrorKind::Cancelled,
        }
    }

    pub fn stage(&self) -> Stage {
        match self {
            Self::InvalidSettings { .. } => Stage::Validation,
            Self::Fetch(_) => Stage::Fetch,
            Self::Completion { pass, .. } | Self::OversizeChunk { pass, .. } => {
                Stage::for_pass(*pass)
            }
            Self::Cancelled { completed_passes } => Stage::for_pass(completed_passes + 1),
        }
    }

    pub fn chunk_index(&self) -> Option<usize> {
        match self {
            Self::Completion { chunk_index, .. } | Self::OversizeChunk { chunk_index, .. } => {
                Some(*chunk_index)
            }
            _ => None,
        }
    }

    /// Whether repeating the same request may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Completion { .. } | Self::Cancelled { .. } => true,
            Self::Fetch(e) => e.is_retryable(),
            Self::InvalidSettings { .. } | Self::OversizeChunk { .. } => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_error_converts() {
        let err: SummarizeError = FetchError::NotFound("abc123".to_string()).into();
        assert_eq!(err.kind(), ErrorKind::Fetch);
        assert_eq!(err.stage(), Stage::Fetch);
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_completion_error_details() {
        let err = SummarizeError::Completion {
            pass: 2,
            chunk_index: 4,
            message: "timed out".to_string(),
        };
        assert_eq!(err.stage(), Stage::Reducing);
        assert_eq!(err.chunk_index(), Some(4));
        assert!(err.is_retryable());
    }

    #[test]
    fn test_fetch_retryable_statuses() {
        let throttled = FetchError::Status {
            status: 429,
            body: String::new(),
        };
        let forbidden = FetchError::Status {
            status: 403,
            body: String::new(),
        };
        assert!(throttled.is_retryable());
        assert!(!forbidden.is_retryable());
        assert!(FetchError::Timeout("10s".to_string()).is_retryable());
    }
}
