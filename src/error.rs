//! Error types for Roundtable.

use crate::message::Transcript;
use std::time::Duration;
use thiserror::Error;

/// Library-level error type for Roundtable operations.
#[derive(Error, Debug)]
pub enum RoundtableError {
    /// Bad setup: duplicate tool names, empty participant list, invalid schema.
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Agent '{agent}' produced output violating its schema: {detail}")]
    SchemaViolation { agent: String, detail: String },

    #[error("Agent '{agent}' exceeded {iterations} tool iteration(s) without a final answer")]
    ToolLoopExceeded { agent: String, iterations: usize },

    #[error("Completion for agent '{agent}' timed out after {timeout:?}")]
    CompletionTimeout { agent: String, timeout: Duration },

    #[error("Completion provider error: {0}")]
    Provider(String),

    #[error("OpenAI API error: {0}")]
    OpenAI(String),

    #[error("Run cancelled")]
    Cancelled,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),
}

impl RoundtableError {
    /// Short, stable name of the error kind, used when reporting failed runs.
    pub fn kind(&self) -> &'static str {
        match self {
            RoundtableError::Configuration(_) => "ConfigurationError",
            RoundtableError::SchemaViolation { .. } => "SchemaViolationError",
            RoundtableError::ToolLoopExceeded { .. } => "ToolLoopExceededError",
            RoundtableError::CompletionTimeout { .. } => "CompletionTimeout",
            RoundtableError::Provider(_) | RoundtableError::OpenAI(_) => "ProviderError",
            RoundtableError::Cancelled => "Cancelled",
            RoundtableError::Io(_) => "IoError",
            RoundtableError::Json(_) => "JsonError",
            RoundtableError::TomlParse(_) => "TomlError",
        }
    }
}

/// Result type alias for Roundtable operations.
pub type Result<T> = std::result::Result<T, RoundtableError>;

/// A team run that stopped before reaching its turn budget.
///
/// Carries everything needed to diagnose the failure without re-running:
/// the error, the agent whose turn failed, the turn index and the log
/// accumulated up to that point.
#[derive(Error, Debug)]
#[error("turn {turn} ({agent}) failed: {error}")]
pub struct RunFailure {
    #[source]
    pub error: RoundtableError,
    pub agent: String,
    pub turn: usize,
    pub transcript: Transcript,
}

impl RunFailure {
    pub fn kind(&self) -> &'static str {
        self.error.kind()
    }
}
