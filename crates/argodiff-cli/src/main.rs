#[cfg(target_env = "musl")]
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use argodiff_core::config::{DEFAULT_DIFF_TOOL, DEFAULT_GITHUB_API_URL, DEFAULT_GITHUB_SERVER_URL, DEFAULT_TRACKING_LABEL};
use argodiff_core::{RunConfig, RunSummary};
use clap::Parser;
use log::{error, info, warn};
use std::io::Write;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "argodiff", version, about = "Argo CD diffs on pull requests")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Diff affected applications and post the report on the pull request
    Run(RunArgs),
}

#[derive(clap::Args)]
struct RunArgs {
    /// Argo CD server host (and port), without scheme
    #[arg(long, env = "INPUT_ARGOCD_SERVER_URL")]
    argocd_server_url: Option<String>,

    /// Argo CD API token
    #[arg(long, env = "INPUT_ARGOCD_TOKEN", hide_env_values = true)]
    argocd_token: Option<String>,

    /// Argo CD CLI release to download (e.g. v2.9.3)
    #[arg(long, env = "INPUT_ARGOCD_VERSION")]
    argocd_version: Option<String>,

    /// Use a preinstalled Argo CD CLI instead of downloading one
    #[arg(long, env = "INPUT_ARGOCD_BINARY")]
    argocd_binary: Option<String>,

    /// Release asset platform
    #[arg(long, env = "ARCH", default_value = "linux")]
    arch: String,

    /// Extra arguments for every Argo CD CLI call
    #[arg(long, env = "INPUT_ARGOCD_EXTRA_CLI_ARGS")]
    argocd_extra_cli_args: Option<String>,

    /// Environment name shown in the report heading
    #[arg(long, env = "INPUT_ENVIRONMENT")]
    environment: Option<String>,

    /// Talk plain HTTP to the Argo CD server
    #[arg(long, env = "INPUT_PLAINTEXT")]
    plaintext: Option<String>,

    /// Wrap each diff in a collapsible block
    #[arg(long, env = "INPUT_COLLAPSE_DIFF")]
    collapse_diff: Option<String>,

    /// IANA timezone of the report timestamp
    #[arg(long, env = "INPUT_TIMEZONE")]
    timezone: Option<String>,

    /// Locale of the report timestamp (e.g. en-US)
    #[arg(long, env = "INPUT_TIMEZONE_LOCALE")]
    timezone_locale: Option<String>,

    /// External diff command for KUBECTL_EXTERNAL_DIFF
    #[arg(long, env = "INPUT_DIFF_TOOL")]
    diff_tool: Option<String>,

    /// Label key tying manifests to applications
    #[arg(long, env = "INPUT_TRACKING_LABEL")]
    tracking_label: Option<String>,

    /// GitHub token for API access
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Repository in owner/repo form
    #[arg(long, env = "GITHUB_REPOSITORY")]
    repository: Option<String>,

    /// GitHub REST endpoint
    #[arg(long, env = "GITHUB_API_URL")]
    github_api_url: Option<String>,

    /// GitHub web host, for commit links
    #[arg(long, env = "GITHUB_SERVER_URL")]
    github_server_url: Option<String>,

    /// Pull request number (default: from the event payload)
    #[arg(long, env = "ARGODIFF_PR_NUMBER")]
    pr_number: Option<String>,

    /// Head commit SHA (default: from the event payload)
    #[arg(long, env = "ARGODIFF_SHA")]
    sha: Option<String>,

    /// Pull request event payload written by GitHub Actions
    #[arg(long, env = "GITHUB_EVENT_PATH")]
    event_path: Option<String>,

    /// Working tree of the pull request checkout (default: current directory)
    #[arg(long, env = "ARGODIFF_REPO_PATH")]
    repo_path: Option<String>,

    /// Output format: gha, json, text (default: auto-detect)
    #[arg(long, env = "ARGODIFF_OUTPUT_FORMAT")]
    output_format: Option<String>,
}

/// Output format for the run summary
enum OutputFormat {
    /// GitHub Actions: write to $GITHUB_OUTPUT + summary to stdout
    Gha,
    /// JSON to stdout
    Json,
    /// Human-readable text to stdout
    Text,
}

impl OutputFormat {
    fn detect(explicit: Option<&str>) -> Self {
        match explicit {
            Some("gha") => OutputFormat::Gha,
            Some("json") => OutputFormat::Json,
            Some("text") => OutputFormat::Text,
            _ => {
                if std::env::var("GITHUB_ACTIONS").is_ok() {
                    OutputFormat::Gha
                } else {
                    OutputFormat::Text
                }
            }
        }
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let code = match cli.command {
        Commands::Run(args) => run(args),
    };
    std::process::exit(code);
}

/// GitHub Actions passes unset inputs as empty strings
fn clean_opt(v: &Option<String>) -> Option<&str> {
    v.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

/// Action inputs are strings; only a case-insensitive `true` enables a flag
fn parse_flag(v: &Option<String>) -> bool {
    clean_opt(v).map_or(false, |s| s.eq_ignore_ascii_case("true"))
}

/// Pull request number and head SHA from a `pull_request` event payload
fn read_event(path: &str) -> Result<(Option<u64>, Option<String>), String> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| format!("failed to read event payload {}: {}", path, e))?;
    let event: serde_json::Value = serde_json::from_str(&content)
        .map_err(|e| format!("failed to parse event payload {}: {}", path, e))?;

    let pull_request = &event["pull_request"];
    let number = pull_request["number"]
        .as_u64()
        .or_else(|| event["number"].as_u64());
    let sha = pull_request["head"]["sha"].as_str().map(str::to_string);
    Ok((number, sha))
}

fn build_config(args: &RunArgs) -> Result<RunConfig, String> {
    let repository = clean_opt(&args.repository)
        .ok_or_else(|| "GITHUB_REPOSITORY (--repository) is required".to_string())?;
    let (owner, repo) = RunConfig::parse_repository(repository).map_err(|e| e.to_string())?;

    let (event_number, event_sha) = match clean_opt(&args.event_path) {
        Some(path) => match read_event(path) {
            Ok(found) => found,
            Err(e) => {
                warn!("{}", e);
                (None, None)
            }
        },
        None => (None, None),
    };

    let pr_number = match clean_opt(&args.pr_number) {
        Some(n) => n
            .parse::<u64>()
            .map_err(|_| format!("invalid pull request number: {}", n))?,
        None => event_number.ok_or_else(|| {
            "pull request number not found; pass --pr-number or run on a pull_request event"
                .to_string()
        })?,
    };

    let repo_root = clean_opt(&args.repo_path)
        .map(PathBuf::from)
        .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));

    let config = RunConfig {
        argocd_server: clean_opt(&args.argocd_server_url).unwrap_or_default().to_string(),
        argocd_token: clean_opt(&args.argocd_token).unwrap_or_default().to_string(),
        plaintext: parse_flag(&args.plaintext),
        argocd_version: clean_opt(&args.argocd_version).unwrap_or_default().to_string(),
        argocd_binary: clean_opt(&args.argocd_binary).map(PathBuf::from),
        arch: args.arch.clone(),
        diff_tool: clean_opt(&args.diff_tool).unwrap_or(DEFAULT_DIFF_TOOL).to_string(),
        extra_cli_args: clean_opt(&args.argocd_extra_cli_args).unwrap_or_default().to_string(),
        tracking_label: clean_opt(&args.tracking_label)
            .unwrap_or(DEFAULT_TRACKING_LABEL)
            .to_string(),
        environment: clean_opt(&args.environment).unwrap_or_default().to_string(),
        collapse_diff: parse_flag(&args.collapse_diff),
        timezone: clean_opt(&args.timezone).unwrap_or("UTC").to_string(),
        timezone_locale: clean_opt(&args.timezone_locale).unwrap_or("en_US").to_string(),
        github_api_url: clean_opt(&args.github_api_url)
            .unwrap_or(DEFAULT_GITHUB_API_URL)
            .to_string(),
        github_server_url: clean_opt(&args.github_server_url)
            .unwrap_or(DEFAULT_GITHUB_SERVER_URL)
            .to_string(),
        github_token: clean_opt(&args.token).map(str::to_string),
        owner,
        repo,
        pr_number,
        head_sha: clean_opt(&args.sha)
            .map(str::to_string)
            .or(event_sha)
            .unwrap_or_default(),
        repo_root,
    };

    config.validate().map_err(|e| e.to_string())?;
    Ok(config)
}

fn run(args: RunArgs) -> i32 {
    let output_format = OutputFormat::detect(clean_opt(&args.output_format));

    let config = match build_config(&args) {
        Ok(config) => config,
        Err(e) => {
            error!("{}", e);
            return 1;
        }
    };
    info!(
        "Evaluating {}#{} against {}",
        config.owner_repo(),
        config.pr_number,
        config.argocd_server
    );

    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build();
    let rt = match rt {
        Ok(rt) => rt,
        Err(e) => {
            error!("failed to create runtime: {e}");
            return 1;
        }
    };

    let summary = match rt.block_on(argodiff_core::run_pull_request(&config)) {
        Ok(summary) => summary,
        Err(e) => {
            error!("{e}");
            return 1;
        }
    };

    if let Err(e) = write_summary(&summary, output_format) {
        warn!("failed to write outputs: {e}");
    }

    if summary.is_success() {
        0
    } else {
        error!("ArgoCD diff failed: Encountered {} errors", summary.errors);
        1
    }
}

fn write_summary(summary: &RunSummary, format: OutputFormat) -> std::io::Result<()> {
    match format {
        OutputFormat::Gha => {
            if let Ok(path) = std::env::var("GITHUB_OUTPUT") {
                let mut file = std::fs::OpenOptions::new().append(true).create(true).open(path)?;
                writeln!(file, "affected={}", summary.affected)?;
                writeln!(file, "diffs={}", summary.diffs)?;
                writeln!(file, "errors={}", summary.errors)?;
                writeln!(file, "comments={}", summary.posted)?;
            }
            print_text(summary);
        }
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(summary)
                .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
            println!("{}", json);
        }
        OutputFormat::Text => print_text(summary),
    }
    Ok(())
}

fn print_text(summary: &RunSummary) {
    println!("Affected applications: {}", summary.affected);
    println!("With diffs:            {}", summary.diffs);
    println!("Errors:                {}", summary.errors);
    println!("Comments posted:       {}", summary.posted);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_opt() {
        assert_eq!(clean_opt(&None), None);
        assert_eq!(clean_opt(&Some(String::new())), None);
        assert_eq!(clean_opt(&Some("  ".into())), None);
        assert_eq!(clean_opt(&Some(" prod ".into())), Some("prod"));
    }

    #[test]
    fn test_parse_flag() {
        assert!(parse_flag(&Some("true".into())));
        assert!(parse_flag(&Some("TRUE".into())));
        assert!(!parse_flag(&Some("false".into())));
        assert!(!parse_flag(&Some("yes".into())));
        assert!(!parse_flag(&None));
    }

    #[test]
    fn test_read_event() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("event.json");
        std::fs::write(
            &path,
            r#"{"action":"synchronize","number":7,"pull_request":{"number":7,"head":{"sha":"abc123"}}}"#,
        )
        .unwrap();

        let (number, sha) = read_event(path.to_str().unwrap()).unwrap();
        assert_eq!(number, Some(7));
        assert_eq!(sha.as_deref(), Some("abc123"));

        let missing = dir.path().join("missing.json");
        assert!(read_event(missing.to_str().unwrap()).is_err());
    }

    #[test]
    fn test_cli_parses_run() {
        let cli = Cli::try_parse_from([
            "argodiff",
            "run",
            "--argocd-server-url",
            "argocd.example.com",
            "--repository",
            "acme/deploy",
            "--pr-number",
            "42",
            "--plaintext",
            "true",
        ])
        .unwrap();
        let Commands::Run(args) = cli.command;
        assert_eq!(clean_opt(&args.argocd_server_url), Some("argocd.example.com"));
        assert!(parse_flag(&args.plaintext));
        assert_eq!(args.arch, "linux");
    }
}
