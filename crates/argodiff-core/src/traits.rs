//! Async seams for the external collaborators of a run
//!
//! The runner only talks to Argo CD, GitHub and the `argocd` binary through
//! these traits, so tests drive it with in-memory fakes.

use crate::error::Result;
use crate::types::{Application, DiffOutcome};
use async_trait::async_trait;

/// An issue comment on the pull request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequestComment {
    /// Comment id used for deletion
    pub id: u64,
    /// Markdown body
    pub body: String,
}

/// Source of the applications known to the Argo CD server
#[async_trait]
pub trait ApplicationSource: Send + Sync {
    /// Every application the server reports
    async fn list_applications(&self) -> Result<Vec<Application>>;
}

/// The pull request under review
#[async_trait]
pub trait PullRequestApi: Send + Sync {
    /// Repository-relative paths of every file the pull request touches
    async fn changed_files(&self) -> Result<Vec<String>>;

    /// All issue comments on the pull request
    async fn list_comments(&self) -> Result<Vec<PullRequestComment>>;

    /// Delete one issue comment
    async fn delete_comment(&self, id: u64) -> Result<()>;

    /// Post a new issue comment
    async fn create_comment(&self, body: &str) -> Result<()>;
}

/// Runs the local-versus-live diff for one application
#[async_trait]
pub trait DiffCommand: Send + Sync {
    /// Diff `app` against the checked-out manifests
    ///
    /// Failures of the command itself are reported as
    /// [`DiffOutcome::Failed`], not as an `Err`.
    async fn diff(&self, app: &Application) -> DiffOutcome;
}
