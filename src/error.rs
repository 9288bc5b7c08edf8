use thiserror::Error;

use crate::artifacts::ArtifactError;
use crate::generation::GenerationError;
use crate::state_machine::{Action, Stage};

#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("cannot {action} while in stage {stage}")]
    InvalidStage { action: Action, stage: Stage },

    #[error("Maximum revisions ({max_revisions}) reached; finalize or reset the assignment")]
    RevisionLimitExceeded {
        revision_count: u32,
        max_revisions: u32,
    },

    #[error("Generation failed: {0}")]
    Generation(#[from] GenerationError),

    #[error(transparent)]
    Artifact(#[from] ArtifactError),
}

impl WorkflowError {
    /// Classifies the failure for the caller.
    pub fn kind(&self) -> FailureKind {
        match self {
            WorkflowError::Generation(_) | WorkflowError::Artifact(_) => FailureKind::System,
            _ => FailureKind::Business,
        }
    }

    /// Whether re-invoking the same action can succeed without changing anything else.
    pub fn is_retryable(&self) -> bool {
        matches!(self, WorkflowError::Generation(_))
    }
}

/// Splits failures into user/input problems and infrastructure problems.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Invalid input or an action the current stage does not allow.
    Business,
    /// Model call or filesystem failure.
    System,
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailureKind::Business => write!(f, "Business"),
            FailureKind::System => write!(f, "System"),
        }
    }
}
