//! GitHub REST API client for pull request files and issue comments

use crate::config::RunConfig;
use crate::error::{Error, Result};
use crate::traits::{PullRequestApi, PullRequestComment};
use async_trait::async_trait;
use log::debug;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// GitHub returns at most this many items per page
const PER_PAGE: u32 = 100;

/// Upper bound on pages walked for one listing
const MAX_PAGES: u32 = 1000;

/// GitHub API response for a changed file
#[derive(Debug, Deserialize)]
struct GitHubFile {
    filename: String,
}

/// GitHub API response for an issue comment
#[derive(Debug, Deserialize)]
struct GitHubComment {
    id: u64,
    #[serde(default)]
    body: Option<String>,
}

#[derive(Debug, Serialize)]
struct NewComment<'a> {
    body: &'a str,
}

/// GitHub API client bound to one pull request
pub struct GitHubApiClient {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
    owner: String,
    repo: String,
    pr_number: u64,
}

impl std::fmt::Debug for GitHubApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitHubApiClient")
            .field("base_url", &self.base_url)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("owner", &self.owner)
            .field("repo", &self.repo)
            .field("pr_number", &self.pr_number)
            .finish_non_exhaustive()
    }
}

impl GitHubApiClient {
    /// Create a new GitHub API client
    pub fn new(
        base_url: String,
        token: Option<String>,
        owner: String,
        repo: String,
        pr_number: u64,
    ) -> Self {
        let client = reqwest::Client::builder()
            .user_agent(concat!("argodiff/", env!("CARGO_PKG_VERSION")))
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
            owner,
            repo,
            pr_number,
        }
    }

    /// Create from the run configuration
    pub fn from_config(config: &RunConfig) -> Self {
        Self::new(
            config.github_api_url.clone(),
            config.github_token.clone(),
            config.owner.clone(),
            config.repo.clone(),
            config.pr_number,
        )
    }

    fn repo_url(&self) -> String {
        format!("{}/repos/{}/{}", self.base_url, self.owner, self.repo)
    }

    fn files_url(&self) -> String {
        format!("{}/pulls/{}/files", self.repo_url(), self.pr_number)
    }

    fn comments_url(&self) -> String {
        format!("{}/issues/{}/comments", self.repo_url(), self.pr_number)
    }

    fn comment_url(&self, id: u64) -> String {
        format!("{}/issues/comments/{}", self.repo_url(), id)
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        let request = request.header("Accept", "application/vnd.github+json");
        match self.token {
            Some(ref token) => request.header("Authorization", format!("Bearer {}", token)),
            None => request,
        }
    }

    async fn check(response: reqwest::Response, action: &str) -> Result<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(Error::GitHub(format!(
            "{} returned {}: {}",
            action,
            status,
            body.trim()
        )))
    }

    /// GET every page of a listing endpoint
    async fn get_paginated<T: DeserializeOwned>(&self, url: &str, action: &str) -> Result<Vec<T>> {
        let mut all = Vec::new();
        let mut page = 1;

        loop {
            let request = self
                .client
                .get(url)
                .query(&[("page", page.to_string()), ("per_page", PER_PAGE.to_string())]);

            let response = self
                .authorize(request)
                .send()
                .await
                .map_err(|e| Error::GitHub(format!("{} request failed: {}", action, e)))?;
            let response = Self::check(response, action).await?;

            let items: Vec<T> = response
                .json()
                .await
                .map_err(|e| Error::GitHub(format!("Failed to parse {} response: {}", action, e)))?;

            let count = items.len();
            all.extend(items);
            if count < PER_PAGE as usize {
                break;
            }

            page += 1;
            if page > MAX_PAGES {
                return Err(Error::GitHub(format!("Too many pages in {} response", action)));
            }
        }

        debug!("{}: {} item(s)", action, all.len());
        Ok(all)
    }
}

#[async_trait]
impl PullRequestApi for GitHubApiClient {
    async fn changed_files(&self) -> Result<Vec<String>> {
        let files: Vec<GitHubFile> = self
            .get_paginated(&self.files_url(), "List pull request files")
            .await?;
        Ok(files.into_iter().map(|file| file.filename).collect())
    }

    async fn list_comments(&self) -> Result<Vec<PullRequestComment>> {
        let comments: Vec<GitHubComment> = self
            .get_paginated(&self.comments_url(), "List comments")
            .await?;
        Ok(comments
            .into_iter()
            .map(|comment| PullRequestComment {
                id: comment.id,
                body: comment.body.unwrap_or_default(),
            })
            .collect())
    }

    async fn delete_comment(&self, id: u64) -> Result<()> {
        let request = self.client.delete(self.comment_url(id));
        let response = self
            .authorize(request)
            .send()
            .await
            .map_err(|e| Error::GitHub(format!("Delete comment request failed: {}", e)))?;
        Self::check(response, "Delete comment").await?;
        Ok(())
    }

    async fn create_comment(&self, body: &str) -> Result<()> {
        let request = self
            .client
            .post(self.comments_url())
            .json(&NewComment { body });
        let response = self
            .authorize(request)
            .send()
            .await
            .map_err(|e| Error::GitHub(format!("Create comment request failed: {}", e)))?;
        Self::check(response, "Create comment").await?;
        Ok(())
    }
}
