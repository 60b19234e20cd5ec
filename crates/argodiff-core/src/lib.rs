//! # argodiff Core
//!
//! Argo CD diffs for GitHub pull requests.
//!
//! A run lists the applications an Argo CD server knows, keeps those whose
//! manifests the pull request touches, diffs each one against the checked-out
//! tree with `argocd app diff`, strips server-side noise from the output and
//! posts a single report comment on the pull request.
//!
//! The pieces are usable on their own:
//! - [`labels`] maps changed files to applications through the tracking label
//! - [`filter`] drops `managedFields` blocks and tracking-label churn
//! - [`report`] renders, scrubs and paginates the comment
//!
//! ## Example
//!
//! ```no_run
//! use argodiff_core::{run_pull_request, RunConfig};
//!
//! # async fn example() -> argodiff_core::Result<()> {
//! let config = RunConfig {
//!     argocd_server: "argocd.example.com".into(),
//!     argocd_token: "token".into(),
//!     argocd_version: "v2.9.3".into(),
//!     owner: "acme".into(),
//!     repo: "deploy".into(),
//!     pr_number: 42,
//!     ..Default::default()
//! };
//!
//! let summary = run_pull_request(&config).await?;
//! println!("{} application(s) with diffs", summary.diffs);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs, rust_2018_idioms)]

pub mod argocd;
pub mod config;
pub mod coordination;
pub mod error;
pub mod filter;
pub mod http;
pub mod labels;
pub mod report;
pub mod traits;
pub mod types;

pub use config::RunConfig;
pub use coordination::{DiffRunner, RunSummary};
pub use error::{Error, Result};
pub use filter::{filter_diff, DiffFilter};
pub use types::{AppDiff, Application, DiffFailure, DiffOutcome, DiffResult, SyncStatus};

/// Evaluate one pull request against the configured Argo CD server
///
/// Installs the CLI when needed, diffs every affected application and
/// replaces the report comment on the pull request.
pub async fn run_pull_request(config: &RunConfig) -> Result<RunSummary> {
    config.validate()?;

    let binary = argocd::install_cli(config).await?;
    let cli = argocd::ArgoCdCli::new(binary, config);
    let apps = http::ArgoCdApiClient::from_config(config);
    let pull = http::GitHubApiClient::from_config(config);

    DiffRunner::new(config, &apps, &pull, &cli)?.run().await
}
