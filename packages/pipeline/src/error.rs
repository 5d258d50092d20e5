use std::path::PathBuf;

use charter_layout::LayoutError;
use thiserror::Error;

use crate::oracle::EnumerationIssue;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("input file not found: {}", .0.display())]
    InputNotFound(PathBuf),

    #[error("layout error: {0}")]
    Layout(#[from] LayoutError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("LLM API request failed: {0}")]
    LlmApiRequest(#[from] reqwest::Error),

    #[error("LLM API error (status {status}): {message}")]
    LlmApiError { status: u16, message: String },

    #[error("LLM rate limited, retry after {retry_after_secs}s")]
    LlmRateLimited { retry_after_secs: u64 },

    #[error("failed to parse LLM response: {0}")]
    LlmResponseParse(String),

    #[error("LLM returned empty response")]
    LlmEmptyResponse,

    #[error("invalid clause enumeration: {0}")]
    InvalidEnumeration(#[from] EnumerationIssue),

    #[error("background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

pub type Result<T> = std::result::Result<T, PipelineError>;
