//! `argocd app diff` subprocess

use crate::config::RunConfig;
use crate::traits::DiffCommand;
use crate::types::{Application, DiffFailure, DiffOutcome};
use async_trait::async_trait;
use log::{debug, info};
use std::path::PathBuf;
use tokio::process::Command;

/// Environment variable the CLI reads to pick the external diff tool
pub const EXTERNAL_DIFF_ENV: &str = "KUBECTL_EXTERNAL_DIFF";

/// The Argo CD CLI, configured for one server
#[derive(Clone)]
pub struct ArgoCdCli {
    binary: PathBuf,
    server: String,
    token: String,
    repo_root: PathBuf,
    diff_tool: String,
    extra_args: Vec<String>,
}

impl std::fmt::Debug for ArgoCdCli {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArgoCdCli")
            .field("binary", &self.binary)
            .field("server", &self.server)
            .field("token", &"<redacted>")
            .field("repo_root", &self.repo_root)
            .field("extra_args", &self.extra_args)
            .finish_non_exhaustive()
    }
}

impl ArgoCdCli {
    /// Configure the installed `binary` from the run configuration
    pub fn new(binary: PathBuf, config: &RunConfig) -> Self {
        Self {
            binary,
            server: config.argocd_server.clone(),
            token: config.argocd_token.clone(),
            repo_root: config.repo_root.clone(),
            diff_tool: config.diff_tool.clone(),
            extra_args: config.cli_extra_args(),
        }
    }

    /// Arguments of `app diff` for `app`, in invocation order
    pub fn diff_args(&self, app: &Application) -> Vec<String> {
        let mut args = vec![
            "app".to_string(),
            "diff".to_string(),
            app.name().to_string(),
            format!("--local-repo-root={}", self.repo_root.display()),
            format!("--local={}", app.source_path()),
            format!("--auth-token={}", self.token),
            format!("--server={}", self.server),
        ];
        args.extend(self.extra_args.iter().cloned());
        args
    }

    fn command_line(&self, args: &[String]) -> String {
        let mut line = format!("{}='{}' {}", EXTERNAL_DIFF_ENV, self.diff_tool, self.binary.display());
        for arg in args {
            line.push(' ');
            line.push_str(arg);
        }
        line
    }
}

/// Map a finished diff process to its outcome
///
/// The CLI exits non-zero whenever it finds a difference, so a non-zero exit
/// with output on stdout is a diff, not a failure.
pub fn classify_exit(
    success: bool,
    exit_code: Option<i32>,
    stdout: String,
    stderr: String,
    command: String,
) -> DiffOutcome {
    if success {
        return DiffOutcome::NoDiff;
    }
    if !stdout.trim().is_empty() {
        return DiffOutcome::DiffFound(stdout);
    }
    DiffOutcome::Failed(DiffFailure {
        stderr,
        command,
        exit_code,
    })
}

#[async_trait]
impl DiffCommand for ArgoCdCli {
    async fn diff(&self, app: &Application) -> DiffOutcome {
        let args = self.diff_args(app);
        let command = self.command_line(&args);
        info!("Running: argocd app diff {}", app.name());

        let output = Command::new(&self.binary)
            .args(&args)
            .env(EXTERNAL_DIFF_ENV, &self.diff_tool)
            .kill_on_drop(true)
            .output()
            .await;

        match output {
            Ok(output) => {
                let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
                let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
                debug!(
                    "argocd app diff {} exited with {:?} ({} bytes stdout, {} bytes stderr)",
                    app.name(),
                    output.status.code(),
                    stdout.len(),
                    stderr.len()
                );
                classify_exit(output.status.success(), output.status.code(), stdout, stderr, command)
            }
            Err(e) => DiffOutcome::Failed(DiffFailure {
                stderr: format!("failed to start {}: {}", self.binary.display(), e),
                command,
                exit_code: None,
            }),
        }
    }
}
