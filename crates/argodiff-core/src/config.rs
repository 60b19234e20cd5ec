//! Run configuration, built once at the entry point and passed down

use crate::error::{Error, Result};
use std::path::PathBuf;

/// Default label Argo CD uses to track resource ownership
pub const DEFAULT_TRACKING_LABEL: &str = "argocd.argoproj.io/instance";

/// Default external diff tool handed to the Argo CD CLI
pub const DEFAULT_DIFF_TOOL: &str = "diff -N -u";

/// Default GitHub REST endpoint
pub const DEFAULT_GITHUB_API_URL: &str = "https://api.github.com";

/// Default GitHub web host, used for links in the report
pub const DEFAULT_GITHUB_SERVER_URL: &str = "https://github.com";

/// Everything a run needs, grouped by collaborator
#[derive(Clone)]
pub struct RunConfig {
    /// Argo CD server host (and port), without scheme
    pub argocd_server: String,
    /// Argo CD API token
    pub argocd_token: String,
    /// Talk plain HTTP to the server
    pub plaintext: bool,

    /// Release tag of the CLI to download
    pub argocd_version: String,
    /// Preinstalled CLI, skips the download
    pub argocd_binary: Option<PathBuf>,
    /// Release asset platform (`linux`, `darwin`)
    pub arch: String,
    /// Value of `KUBECTL_EXTERNAL_DIFF`
    pub diff_tool: String,
    /// Whitespace-separated arguments appended to every CLI call
    pub extra_cli_args: String,

    /// Label key tying manifests to applications
    pub tracking_label: String,

    /// Environment name shown in the report heading
    pub environment: String,
    /// Wrap diffs in a collapsible block
    pub collapse_diff: bool,
    /// IANA timezone of the report timestamp
    pub timezone: String,
    /// Locale of the report timestamp
    pub timezone_locale: String,

    /// GitHub REST endpoint
    pub github_api_url: String,
    /// GitHub web host, for commit links
    pub github_server_url: String,
    /// Token for the GitHub REST API
    pub github_token: Option<String>,
    /// Repository owner
    pub owner: String,
    /// Repository name
    pub repo: String,
    /// Pull request number
    pub pr_number: u64,
    /// Head commit of the pull request
    pub head_sha: String,

    /// Working tree holding the pull request checkout
    pub repo_root: PathBuf,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            argocd_server: String::new(),
            argocd_token: String::new(),
            plaintext: false,
            argocd_version: String::new(),
            argocd_binary: None,
            arch: "linux".to_string(),
            diff_tool: DEFAULT_DIFF_TOOL.to_string(),
            extra_cli_args: String::new(),
            tracking_label: DEFAULT_TRACKING_LABEL.to_string(),
            environment: String::new(),
            collapse_diff: false,
            timezone: "UTC".to_string(),
            timezone_locale: "en_US".to_string(),
            github_api_url: DEFAULT_GITHUB_API_URL.to_string(),
            github_server_url: DEFAULT_GITHUB_SERVER_URL.to_string(),
            github_token: None,
            owner: String::new(),
            repo: String::new(),
            pr_number: 0,
            head_sha: String::new(),
            repo_root: PathBuf::from("."),
        }
    }
}

impl std::fmt::Debug for RunConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunConfig")
            .field("argocd_server", &self.argocd_server)
            .field("argocd_token", &"<redacted>")
            .field("plaintext", &self.plaintext)
            .field("argocd_version", &self.argocd_version)
            .field("argocd_binary", &self.argocd_binary)
            .field("environment", &self.environment)
            .field("tracking_label", &self.tracking_label)
            .field("github_token", &self.github_token.as_ref().map(|_| "<redacted>"))
            .field("owner", &self.owner)
            .field("repo", &self.repo)
            .field("pr_number", &self.pr_number)
            .finish_non_exhaustive()
    }
}

impl RunConfig {
    /// URL scheme for the Argo CD server
    #[inline]
    pub fn scheme(&self) -> &'static str {
        if self.plaintext {
            "http"
        } else {
            "https"
        }
    }

    /// Base URL of the Argo CD web UI and API
    pub fn argocd_base_url(&self) -> String {
        format!("{}://{}", self.scheme(), self.argocd_server)
    }

    /// `owner/repo` of the pull request
    pub fn owner_repo(&self) -> String {
        format!("{}/{}", self.owner, self.repo)
    }

    /// Extra arguments appended to every CLI invocation
    pub fn cli_extra_args(&self) -> Vec<String> {
        let mut args: Vec<String> = self
            .extra_cli_args
            .split_whitespace()
            .map(str::to_string)
            .collect();
        if self.plaintext {
            args.push("--plaintext".to_string());
        }
        args
    }

    /// Values that must never leave the process in clear text
    pub fn secrets(&self) -> Vec<&str> {
        [Some(self.argocd_token.as_str()), self.github_token.as_deref()]
            .into_iter()
            .flatten()
            .filter(|s| !s.is_empty())
            .collect()
    }

    /// Parse `owner/repo` (the `GITHUB_REPOSITORY` format)
    pub fn parse_repository(repository: &str) -> Result<(String, String)> {
        let parts: Vec<&str> = repository.split('/').collect();
        if parts.len() != 2 || parts.iter().any(|p| p.is_empty()) {
            return Err(Error::Config(format!(
                "Invalid repository format (expected owner/repo): {}",
                repository
            )));
        }
        Ok((parts[0].to_string(), parts[1].to_string()))
    }

    /// Check that the fields every run depends on are present
    pub fn validate(&self) -> Result<()> {
        if self.argocd_server.is_empty() {
            return Err(Error::Config("Argo CD server URL is required".to_string()));
        }
        if self.argocd_token.is_empty() {
            return Err(Error::Config("Argo CD token is required".to_string()));
        }
        if self.argocd_binary.is_none() && self.argocd_version.is_empty() {
            return Err(Error::Config(
                "either an Argo CD version or a binary path is required".to_string(),
            ));
        }
        if self.owner.is_empty() || self.repo.is_empty() {
            return Err(Error::Config("repository owner/name is required".to_string()));
        }
        if self.pr_number == 0 {
            return Err(Error::Config("pull request number is required".to_string()));
        }
        if self.tracking_label.is_empty() {
            return Err(Error::Config("tracking label must not be empty".to_string()));
        }
        Ok(())
    }
}
