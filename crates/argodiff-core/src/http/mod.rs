//! HTTP clients for the Argo CD and GitHub REST APIs

pub mod argocd;
pub mod github;

pub use argocd::ArgoCdApiClient;
pub use github::GitHubApiClient;
