//! Remediation actions for one scanned project.
//!
//! Every action consumes a [`ProjectStatus`](crate::model::ProjectStatus)
//! and reports an [`ActionOutcome`] instead of an error: remediation
//! failures are surfaced to the caller, never retried automatically.

mod git;
mod upgrade;

pub use git::{checkout_branch, commit_and_push, BranchTarget, COMMIT_MESSAGE};
pub use upgrade::upgrade_project;

use serde::{Deserialize, Serialize};

/// Result of one remediation action.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionOutcome {
    pub success: bool,
    pub message: String,
}

impl ActionOutcome {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}
