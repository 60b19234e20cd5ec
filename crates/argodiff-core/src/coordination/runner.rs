//! One pull request evaluation, from application listing to posted report

use crate::config::RunConfig;
use crate::error::Result;
use crate::filter::DiffFilter;
use crate::labels::LabelIndex;
use crate::report::{paginate_report, report_marker, scrub_secrets, ReportRenderer, MAX_COMMENT_LENGTH};
use crate::traits::{ApplicationSource, DiffCommand, PullRequestApi};
use crate::types::{AppDiff, Application, DiffOutcome, DiffResult};
use chrono::Utc;
use log::{debug, info, warn};
use serde::Serialize;

/// Counters describing a finished run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    /// Applications touched by the pull request
    pub affected: usize,
    /// Applications with a non-empty filtered diff
    pub diffs: usize,
    /// Applications whose diff could not be generated
    pub errors: usize,
    /// Comments posted
    pub posted: usize,
}

impl RunSummary {
    /// A run fails when any application failed to diff
    #[inline]
    pub fn is_success(&self) -> bool {
        self.errors == 0
    }
}

/// Drives a run against its collaborators
pub struct DiffRunner<'a, S, P, D> {
    config: &'a RunConfig,
    apps: &'a S,
    pull: &'a P,
    differ: &'a D,
    filter: DiffFilter,
}

impl<'a, S, P, D> DiffRunner<'a, S, P, D>
where
    S: ApplicationSource,
    P: PullRequestApi,
    D: DiffCommand,
{
    /// Create a runner; fails when the tracking label cannot be compiled
    pub fn new(config: &'a RunConfig, apps: &'a S, pull: &'a P, differ: &'a D) -> Result<Self> {
        Ok(Self {
            config,
            apps,
            pull,
            differ,
            filter: DiffFilter::new(&config.tracking_label)?,
        })
    }

    /// Run the whole pipeline and post the report
    ///
    /// Diff failures are counted in the summary rather than returned, so the
    /// report is still posted. Fetching applications or talking to the
    /// comment API fails the run.
    pub async fn run(&self) -> Result<RunSummary> {
        let renderer = ReportRenderer::new(self.config, Utc::now())?;
        let mut summary = RunSummary::default();

        let apps = self.tracked_applications().await?;
        let results = if apps.is_empty() {
            info!("No applications track {}", self.config.owner_repo());
            Vec::new()
        } else {
            let changed_files = self.pull.changed_files().await?;
            info!("Pull request changes {} file(s)", changed_files.len());
            debug!("Changed files: {}", changed_files.join(", "));
            self.diff_affected(&apps, &changed_files, &mut summary).await
        };

        let report = renderer.render(&results);
        summary.posted = self.publish(report.as_deref()).await?;

        info!(
            "Run finished: {} affected, {} with diffs, {} errors, {} comment(s) posted",
            summary.affected, summary.diffs, summary.errors, summary.posted
        );
        Ok(summary)
    }

    async fn tracked_applications(&self) -> Result<Vec<Application>> {
        let owner_repo = self.config.owner_repo();
        let apps: Vec<Application> = self
            .apps
            .list_applications()
            .await?
            .into_iter()
            .filter(|app| app.tracks_repository(&owner_repo))
            .collect();

        info!(
            "Found apps: {}",
            apps.iter().map(Application::name).collect::<Vec<_>>().join(", ")
        );
        Ok(apps)
    }

    async fn diff_affected(
        &self,
        apps: &[Application],
        changed_files: &[String],
        summary: &mut RunSummary,
    ) -> Vec<AppDiff> {
        let mut index = LabelIndex::new(&self.config.repo_root, self.config.tracking_label.as_str());
        let mut results = Vec::new();

        for app in apps {
            if !index.is_affected(changed_files, app.name()) {
                info!("App {} not affected by changes", app.name());
                continue;
            }
            summary.affected += 1;

            let result = match self.differ.diff(app).await {
                DiffOutcome::NoDiff => {
                    info!("App {} has no differences", app.name());
                    DiffResult::Diff(String::new())
                }
                DiffOutcome::DiffFound(raw) => {
                    let filtered = self.filter.filter(&raw);
                    if filtered.is_empty() {
                        info!("App {} only differs in filtered noise", app.name());
                    } else {
                        summary.diffs += 1;
                    }
                    DiffResult::Diff(filtered)
                }
                DiffOutcome::Failed(failure) => {
                    warn!(
                        "Diff for {} failed: {}",
                        app.name(),
                        scrub_secrets(failure.stderr.trim(), &self.config.secrets())
                    );
                    summary.errors += 1;
                    DiffResult::Error(failure)
                }
            };

            results.push(AppDiff {
                app: app.clone(),
                result,
            });
        }
        results
    }

    /// Replace earlier reports with `report`, returning the number of comments posted
    async fn publish(&self, report: Option<&str>) -> Result<usize> {
        let marker = report_marker(&self.config.environment);

        let stale: Vec<u64> = self
            .pull
            .list_comments()
            .await?
            .into_iter()
            .filter(|comment| comment.body.contains(&marker))
            .map(|comment| comment.id)
            .collect();
        for id in stale {
            info!("Deleting previous report comment {}", id);
            self.pull.delete_comment(id).await?;
        }

        let Some(report) = report else {
            info!("Nothing to report");
            return Ok(0);
        };

        let parts = paginate_report(report, &marker, MAX_COMMENT_LENGTH);
        for part in &parts {
            self.pull.create_comment(part).await?;
        }
        info!("Posted report in {} comment(s)", parts.len());
        Ok(parts.len())
    }
}
