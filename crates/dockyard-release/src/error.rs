use std::path::PathBuf;

use dockyard_build::{PlanError, Variant};
use dockyard_cloud::{DockerError, FetchError, GitError, GithubError, HubError};
use dockyard_core::MarkerError;

use crate::pipeline::InvalidTransition;

/// Recording a new version failed; nothing was published.
#[derive(Debug, thiserror::Error)]
pub enum MarkerWriteError {
    #[error("marker store failed")]
    Store(#[from] MarkerError),

    #[error("failed to commit marker change")]
    Commit { source: GitError },

    /// The commit failed and undoing it failed too, so the store may still
    /// hold a version that never reached the remote.
    #[error(
        "failed to commit marker change, rollback incomplete: {}",
        rollback_failures(.rollback)
    )]
    Rollback {
        #[source]
        commit: GitError,
        rollback: Vec<RollbackFailure>,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum RollbackFailure {
    #[error("marker commit not undone ({0})")]
    Undo(GitError),

    #[error("marker not restored ({0})")]
    Restore(MarkerError),
}

fn rollback_failures(failures: &[RollbackFailure]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// One variant whose push stopped early.
#[derive(Debug)]
pub struct PushFailure {
    pub variant: Variant,
    /// Tags of this variant that made it to the registry before the failure.
    pub pushed: Vec<String>,
    pub source: DockerError,
}

#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    #[error("build inputs missing")]
    Inputs(#[from] PlanError),

    #[error("registry login failed")]
    Login { source: DockerError },

    #[error("{variant} image failed to build, nothing was pushed")]
    Build { variant: Variant, source: DockerError },

    #[error("push failed for {}", failed_variants(.failures))]
    Push { failures: Vec<PushFailure> },

    #[error("failed to read description file {path}")]
    ReadDescription {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("registry description sync failed")]
    Description { source: HubError },

    #[error("GitHub release failed")]
    Release { source: GithubError },
}

fn failed_variants(failures: &[PushFailure]) -> String {
    failures
        .iter()
        .map(|f| format!("{} ({})", f.variant, f.source))
        .collect::<Vec<_>>()
        .join(", ")
}

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("upstream lookup failed")]
    Fetch(#[from] FetchError),

    #[error("marker update failed")]
    MarkerWrite(#[from] MarkerWriteError),

    #[error("publish failed")]
    Publish(#[from] PublishError),

    #[error(transparent)]
    InvalidTransition(#[from] InvalidTransition),
}
