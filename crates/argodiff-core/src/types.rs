//! Core type definitions shared across the pipeline

use serde::Deserialize;

/// Target revisions that count as the repository's primary branch
const PRIMARY_REVISIONS: [&str; 3] = ["master", "main", "HEAD"];

/// Sync status of an application as reported by the Argo CD server
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub enum SyncStatus {
    /// Live state matches the declared source
    Synced,
    /// Live state drifted from the declared source
    OutOfSync,
    /// Any status the server reports that we do not model
    #[default]
    #[serde(other)]
    Unknown,
}

impl SyncStatus {
    /// Get string representation
    #[inline]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Synced => "Synced",
            Self::OutOfSync => "OutOfSync",
            Self::Unknown => "Unknown",
        }
    }
}

/// Application metadata block
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppMetadata {
    /// Application name, unique within a fetch
    pub name: String,
}

/// Source location of an application
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppSource {
    /// Git repository URL
    #[serde(default)]
    pub repo_url: String,
    /// Path of the manifests inside the repository
    #[serde(default)]
    pub path: String,
    /// Branch, tag or commit the application follows
    #[serde(default)]
    pub target_revision: String,
}

/// Application spec block
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppSpec {
    /// Single-source applications carry their source here
    #[serde(default)]
    pub source: Option<AppSource>,
}

/// Sync block of the application status
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppSync {
    /// Current sync status
    #[serde(default)]
    pub status: SyncStatus,
}

/// Application status block
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppStatus {
    /// Sync information
    #[serde(default)]
    pub sync: AppSync,
}

/// An Argo CD application as returned by `/api/v1/applications`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Application {
    /// Metadata (name)
    pub metadata: AppMetadata,
    /// Spec (source)
    #[serde(default)]
    pub spec: AppSpec,
    /// Status (sync)
    #[serde(default)]
    pub status: AppStatus,
}

impl Application {
    /// Build an application from its parts, mostly useful in tests
    pub fn new(name: &str, source: AppSource, sync: SyncStatus) -> Self {
        Self {
            metadata: AppMetadata {
                name: name.to_string(),
            },
            spec: AppSpec {
                source: Some(source),
            },
            status: AppStatus {
                sync: AppSync { status: sync },
            },
        }
    }

    /// Application name
    #[inline]
    pub fn name(&self) -> &str {
        &self.metadata.name
    }

    /// Manifest path inside the repository, empty when the app has no single source
    #[inline]
    pub fn source_path(&self) -> &str {
        self.spec.source.as_ref().map_or("", |s| s.path.as_str())
    }

    /// Current sync status
    #[inline]
    pub fn sync_status(&self) -> SyncStatus {
        self.status.sync.status
    }

    /// Whether this application follows the primary branch of `owner/repo`
    pub fn tracks_repository(&self, owner_repo: &str) -> bool {
        let Some(source) = self.spec.source.as_ref() else {
            return false;
        };
        let revision = source.target_revision.as_str();
        let primary = revision.is_empty() || PRIMARY_REVISIONS.contains(&revision);
        primary && source.repo_url.contains(owner_repo)
    }
}

/// Failure captured from the diff command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffFailure {
    /// Captured standard error, or the spawn error
    pub stderr: String,
    /// The command line that failed (unscrubbed)
    pub command: String,
    /// Exit code when the process ran to completion
    pub exit_code: Option<i32>,
}

/// Outcome of running `argocd app diff` for one application
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiffOutcome {
    /// The tool exited non-zero and printed a diff
    DiffFound(String),
    /// The tool exited zero: desired and live state agree
    NoDiff,
    /// The tool failed without producing a diff
    Failed(DiffFailure),
}

/// Per-application diff result that reaches the report
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiffResult {
    /// Section-filtered diff text (may be empty after filtering)
    Diff(String),
    /// Captured failure
    Error(DiffFailure),
}

impl DiffResult {
    /// True for an error result
    #[inline]
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }

    /// True when the result would render a block in the report
    #[inline]
    pub fn is_reportable(&self) -> bool {
        match self {
            Self::Diff(text) => !text.trim().is_empty(),
            Self::Error(_) => true,
        }
    }
}

/// An application paired with its diff result
#[derive(Debug, Clone)]
pub struct AppDiff {
    /// The application
    pub app: Application,
    /// Its result for this run
    pub result: DiffResult,
}
