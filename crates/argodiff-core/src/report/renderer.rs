//! Markdown rendering of a run's diff results into one pull request comment

use super::scrub::scrub_secrets;
use crate::config::RunConfig;
use crate::error::{Error, Result};
use crate::types::{AppDiff, DiffFailure, DiffResult, SyncStatus};
use chrono::{DateTime, Locale, Utc};
use chrono_tz::Tz;
use log::{debug, warn};
use std::fmt::Write;

/// Glyph for an application whose live state matches its source
pub const GLYPH_SYNCED: &str = "✅";
/// Glyph for an application that drifted (or whose status is unknown)
pub const GLYPH_OUT_OF_SYNC: &str = "⚠️";
/// Glyph for an application whose diff could not be generated
pub const GLYPH_ERROR: &str = "🛑";

const LEGEND: &str = "\
| Legend | Status |
| :---:  | :---   |
| ✅     | The app is synced in Argo CD, and the diffs you see come solely from this PR. |
| ⚠️     | The app is out of sync in Argo CD, and the diffs you see include those changes plus any from this PR. |
| 🛑     | There was an error generating the Argo CD diff due to changes in this PR. |
";

/// Heading prefix shared by every comment this tool posts for `env`
///
/// Comments whose body contains the marker are replaced on the next run.
pub fn report_marker(env: &str) -> String {
    if env.is_empty() {
        "## ArgoCD Diff for ".to_string()
    } else {
        format!("## ArgoCD Diff on {} for ", env)
    }
}

/// Renders the report for one pull request head
pub struct ReportRenderer<'a> {
    config: &'a RunConfig,
    updated_at: String,
}

impl<'a> ReportRenderer<'a> {
    /// Create a renderer stamping reports with `now` in the configured timezone
    pub fn new(config: &'a RunConfig, now: DateTime<Utc>) -> Result<Self> {
        let tz: Tz = config
            .timezone
            .parse()
            .map_err(|_| Error::Config(format!("unknown timezone '{}'", config.timezone)))?;
        let locale = parse_locale(&config.timezone_locale);
        let updated_at = now
            .with_timezone(&tz)
            .format_localized("%x %X %Z", locale)
            .to_string();

        Ok(Self { config, updated_at })
    }

    /// Heading line with the commit link
    pub fn header(&self) -> String {
        let marker = report_marker(&self.config.environment);
        let sha = &self.config.head_sha;
        if sha.is_empty() {
            return format!("{}pull request #{}", marker, self.config.pr_number);
        }
        format!(
            "{}commit [`{}`]({}/{}/{}/pull/{}/commits/{})",
            marker,
            short_sha(sha),
            self.config.github_server_url.trim_end_matches('/'),
            self.config.owner,
            self.config.repo,
            self.config.pr_number,
            sha
        )
    }

    /// Render every reportable result; `None` when there is nothing to post
    pub fn render(&self, results: &[AppDiff]) -> Option<String> {
        let reportable: Vec<&AppDiff> = results
            .iter()
            .filter(|diff| diff.result.is_reportable())
            .collect();

        if reportable.is_empty() {
            debug!("No application produced a diff or an error, nothing to report");
            return None;
        }

        let mut out = String::new();
        out.push_str(&self.header());
        out.push('\n');
        let _ = writeln!(out, "_Updated at {}_", self.updated_at);
        out.push('\n');

        for diff in reportable {
            self.render_app(&mut out, diff);
        }

        out.push_str(LEGEND);
        Some(scrub_secrets(&out, &self.config.secrets()))
    }

    fn render_app(&self, out: &mut String, diff: &AppDiff) {
        let name = diff.app.name();
        let sync = diff.app.sync_status();
        let glyph = match &diff.result {
            DiffResult::Error(_) => GLYPH_ERROR,
            DiffResult::Diff(_) => sync_glyph(sync),
        };

        let _ = writeln!(
            out,
            "### {} App: [`{}`]({}/applications/{})",
            glyph,
            name,
            self.config.argocd_base_url(),
            name
        );
        let generation = if diff.result.is_error() {
            format!("Error {}", GLYPH_ERROR)
        } else {
            "Success".to_string()
        };
        let _ = writeln!(out, "YAML generation: {}  ", generation);
        let _ = writeln!(out, "App sync status: {} {}", sync_label(sync), sync_glyph(sync));
        out.push('\n');

        match &diff.result {
            DiffResult::Diff(text) => self.render_diff(out, text),
            DiffResult::Error(failure) => render_failure(out, failure),
        }
        out.push_str("\n---\n\n");
    }

    fn render_diff(&self, out: &mut String, text: &str) {
        if self.config.collapse_diff {
            out.push_str("<details>\n<summary>Show diff</summary>\n\n");
        }
        let _ = writeln!(out, "```diff\n{}\n```", text.trim_end());
        if self.config.collapse_diff {
            out.push_str("\n</details>\n");
        }
    }
}

fn render_failure(out: &mut String, failure: &DiffFailure) {
    let stderr = failure.stderr.trim_end();
    let stderr = if !stderr.trim().is_empty() {
        stderr.to_string()
    } else {
        match failure.exit_code {
            Some(code) => format!("no output on stderr (exit code {})", code),
            None => "no output on stderr".to_string(),
        }
    };
    let _ = writeln!(out, "**`stderr:`**\n```\n{}\n```\n", stderr);
    let _ = writeln!(out, "**`command:`**\n```\n{}\n```", failure.command);
}

fn sync_glyph(sync: SyncStatus) -> &'static str {
    match sync {
        SyncStatus::Synced => GLYPH_SYNCED,
        SyncStatus::OutOfSync | SyncStatus::Unknown => GLYPH_OUT_OF_SYNC,
    }
}

fn sync_label(sync: SyncStatus) -> &'static str {
    match sync {
        SyncStatus::Synced => "Synced",
        SyncStatus::OutOfSync => "Out of Sync",
        SyncStatus::Unknown => "Unknown",
    }
}

fn short_sha(sha: &str) -> &str {
    sha.get(..7).unwrap_or(sha)
}

/// `en-US` and `en_US` both name the same locale; anything unknown is POSIX
fn parse_locale(name: &str) -> Locale {
    let normalized = name.trim().replace('-', "_");
    match Locale::try_from(normalized.as_str()) {
        Ok(locale) => locale,
        Err(_) => {
            if !normalized.is_empty() {
                warn!("Unknown timezone locale '{}', using POSIX", name);
            }
            Locale::POSIX
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AppSource, Application};
    use chrono::TimeZone;

    fn config() -> RunConfig {
        RunConfig {
            argocd_server: "argocd.example.com".into(),
            argocd_token: "argo-secret".into(),
            environment: "prod".into(),
            owner: "acme".into(),
            repo: "deploy".into(),
            pr_number: 42,
            head_sha: "0123456789abcdef".into(),
            ..Default::default()
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 0).unwrap()
    }

    fn app(name: &str, sync: SyncStatus) -> Application {
        Application::new(name, AppSource::default(), sync)
    }

    fn diff(name: &str, sync: SyncStatus, text: &str) -> AppDiff {
        AppDiff {
            app: app(name, sync),
            result: DiffResult::Diff(text.to_string()),
        }
    }

    fn failure(name: &str, stderr: &str, command: &str) -> AppDiff {
        AppDiff {
            app: app(name, SyncStatus::Synced),
            result: DiffResult::Error(DiffFailure {
                stderr: stderr.to_string(),
                command: command.to_string(),
                exit_code: Some(20),
            }),
        }
    }

    #[test]
    fn test_marker_per_environment() {
        assert_eq!(report_marker(""), "## ArgoCD Diff for ");
        assert_eq!(report_marker("prod"), "## ArgoCD Diff on prod for ");
        assert!(!report_marker("prod").contains(&report_marker("")));
    }

    #[test]
    fn test_header_links_commit() {
        let config = config();
        let renderer = ReportRenderer::new(&config, now()).unwrap();
        assert_eq!(
            renderer.header(),
            "## ArgoCD Diff on prod for commit [`0123456`](https://github.com/acme/deploy/pull/42/commits/0123456789abcdef)"
        );
    }

    #[test]
    fn test_header_without_sha() {
        let config = RunConfig {
            head_sha: String::new(),
            environment: String::new(),
            ..config()
        };
        let renderer = ReportRenderer::new(&config, now()).unwrap();
        assert_eq!(renderer.header(), "## ArgoCD Diff for pull request #42");
    }

    #[test]
    fn test_nothing_reportable() {
        let config = config();
        let renderer = ReportRenderer::new(&config, now()).unwrap();
        assert_eq!(renderer.render(&[]), None);
        assert_eq!(renderer.render(&[diff("web", SyncStatus::Synced, "  \n")]), None);
    }

    #[test]
    fn test_glyphs_and_legend() {
        let config = config();
        let renderer = ReportRenderer::new(&config, now()).unwrap();
        let report = renderer
            .render(&[
                diff("web", SyncStatus::Synced, "+  replicas: 3"),
                diff("api", SyncStatus::OutOfSync, "-  image: a"),
                failure("db", "rpc error", "argocd app diff db"),
            ])
            .unwrap();

        assert!(report.starts_with("## ArgoCD Diff on prod for commit"));
        assert!(report.contains("_Updated at "));
        assert!(report.contains("### ✅ App: [`web`](https://argocd.example.com/applications/web)"));
        assert!(report.contains("### ⚠️ App: [`api`]"));
        assert!(report.contains("### 🛑 App: [`db`]"));
        assert!(report.contains("```diff\n+  replicas: 3\n```"));
        assert!(report.contains("**`stderr:`**\n```\nrpc error\n```"));
        assert!(report.contains("**`command:`**\n```\nargocd app diff db\n```"));
        assert!(report.ends_with(LEGEND));
    }

    #[test]
    fn test_blank_diffs_are_skipped() {
        let config = config();
        let renderer = ReportRenderer::new(&config, now()).unwrap();
        let report = renderer
            .render(&[
                diff("quiet", SyncStatus::Synced, ""),
                diff("web", SyncStatus::Synced, "+  replicas: 3"),
            ])
            .unwrap();
        assert!(!report.contains("quiet"));
        assert!(report.contains("`web`"));
    }

    #[test]
    fn test_collapse_diff() {
        let config = RunConfig {
            collapse_diff: true,
            ..config()
        };
        let renderer = ReportRenderer::new(&config, now()).unwrap();
        let report = renderer
            .render(&[diff("web", SyncStatus::Synced, "+  replicas: 3")])
            .unwrap();
        assert!(report.contains("<details>\n<summary>Show diff</summary>\n\n```diff\n+  replicas: 3\n```\n\n</details>"));
    }

    #[test]
    fn test_secrets_scrubbed_everywhere() {
        let config = config();
        let renderer = ReportRenderer::new(&config, now()).unwrap();
        let report = renderer
            .render(&[failure(
                "web",
                "token tok.en.sig rejected; argo-secret",
                "argocd app diff web --auth-token=tok.en.sig --server=argocd.example.com",
            )])
            .unwrap();
        assert!(!report.contains("tok.en.sig"));
        assert!(!report.contains("argo-secret"));
        assert!(report.contains("--auth-token=***"));
        assert!(report.contains("token *** rejected; ***"));
    }

    #[test]
    fn test_empty_stderr_shows_exit_code() {
        let config = config();
        let renderer = ReportRenderer::new(&config, now()).unwrap();
        let report = renderer.render(&[failure("web", "", "argocd app diff web")]).unwrap();
        assert!(report.contains("no output on stderr (exit code 20)"));
    }

    #[test]
    fn test_timezone_applied() {
        let config = RunConfig {
            timezone: "Europe/Berlin".into(),
            timezone_locale: "de-DE".into(),
            ..config()
        };
        let renderer = ReportRenderer::new(&config, now()).unwrap();
        assert_eq!(renderer.updated_at, "01.03.2024 13:30:00 CET");
    }

    #[test]
    fn test_unknown_timezone_is_config_error() {
        let config = RunConfig {
            timezone: "Mars/Olympus".into(),
            ..config()
        };
        let err = ReportRenderer::new(&config, now()).err().unwrap();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_locale_parsing() {
        assert_eq!(parse_locale("en-US"), Locale::en_US);
        assert_eq!(parse_locale("de_DE"), Locale::de_DE);
        assert_eq!(parse_locale("xx_YY"), Locale::POSIX);
        assert_eq!(parse_locale(""), Locale::POSIX);
    }
}
