// Pipeline error kinds.
//
// Stores and config return anyhow errors with context. At the orchestrator
// boundary those are folded into PipelineError so callers can decide whether
// an invocation is worth retrying.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Classification of a failure (or of a degraded capability) for reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    MalformedInput,
    UpstreamUnavailable,
    DegradedCapability,
    StateConflict,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::MalformedInput => "malformed_input",
            ErrorKind::UpstreamUnavailable => "upstream_unavailable",
            ErrorKind::DegradedCapability => "degraded_capability",
            ErrorKind::StateConflict => "state_conflict",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum PipelineError {
    /// The invocation carried nothing that can be turned into a review.
    #[error("malformed input: {0}")]
    MalformedInput(String),

    /// A blob store, record store, or worker call failed. Retry the invocation.
    #[error("upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    /// A conditional update lost its race. Only seen inside the tracker's
    /// retry loop; exhausted retries are reported as UpstreamUnavailable.
    #[error("state conflict on author {author_id} after {attempts} attempts")]
    StateConflict { author_id: String, attempts: u32 },
}

impl PipelineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PipelineError::MalformedInput(_) => ErrorKind::MalformedInput,
            PipelineError::UpstreamUnavailable(_) => ErrorKind::UpstreamUnavailable,
            PipelineError::StateConflict { .. } => ErrorKind::StateConflict,
        }
    }

    /// Wrap a store failure, keeping the whole anyhow context chain in the message.
    pub fn upstream(context: &str, err: anyhow::Error) -> Self {
        PipelineError::UpstreamUnavailable(format!("{context}: {err:#}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_mapping() {
        assert_eq!(
            PipelineError::MalformedInput("x".into()).kind(),
            ErrorKind::MalformedInput
        );
        assert_eq!(
            PipelineError::UpstreamUnavailable("x".into()).kind(),
            ErrorKind::UpstreamUnavailable
        );
        let conflict = PipelineError::StateConflict {
            author_id: "U1".into(),
            attempts: 5,
        };
        assert_eq!(conflict.kind(), ErrorKind::StateConflict);
    }

    #[test]
    fn test_upstream_keeps_context_chain() {
        let inner = anyhow::anyhow!("disk full").context("Failed to write blob");
        let err = PipelineError::upstream("persist normalized artifact", inner);
        let msg = err.to_string();
        assert!(msg.contains("persist normalized artifact"));
        assert!(msg.contains("disk full"));
    }

    #[test]
    fn test_kind_serializes_snake_case() {
        let json = serde_json::to_string(&ErrorKind::UpstreamUnavailable).unwrap();
        assert_eq!(json, "\"upstream_unavailable\"");
    }
}
