//! Download of the Argo CD CLI release binary

use crate::config::RunConfig;
use crate::error::{Error, Result};
use log::info;
use std::path::{Path, PathBuf};

/// Where the downloaded binary lands, relative to the working tree
pub const INSTALL_PATH: &str = "bin/argo";

/// Release asset for `version` built for `arch` on amd64
pub fn release_url(version: &str, arch: &str) -> String {
    format!(
        "https://github.com/argoproj/argo-cd/releases/download/{}/argocd-{}-amd64",
        version, arch
    )
}

/// Make the CLI available, returning the path to invoke
///
/// A configured binary path is used as is; otherwise the release for the
/// configured version is downloaded to [`INSTALL_PATH`] under the working tree.
pub async fn install_cli(config: &RunConfig) -> Result<PathBuf> {
    if let Some(ref binary) = config.argocd_binary {
        info!("Using preinstalled Argo CD CLI at {}", binary.display());
        return Ok(binary.clone());
    }

    let destination = config.repo_root.join(INSTALL_PATH);
    let url = release_url(&config.argocd_version, &config.arch);
    download(&url, &destination).await?;
    Ok(destination)
}

async fn download(url: &str, destination: &Path) -> Result<()> {
    info!("Downloading Argo CD CLI from {}", url);

    let client = reqwest::Client::builder()
        .user_agent(concat!("argodiff/", env!("CARGO_PKG_VERSION")))
        .timeout(std::time::Duration::from_secs(300))
        .build()
        .map_err(|e| Error::Install(format!("Failed to build HTTP client: {}", e)))?;

    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| Error::Install(format!("Download failed: {}", e)))?;
    if !response.status().is_success() {
        return Err(Error::Install(format!(
            "Download of {} returned {}",
            url,
            response.status()
        )));
    }
    let bytes = response
        .bytes()
        .await
        .map_err(|e| Error::Install(format!("Download interrupted: {}", e)))?;

    if let Some(parent) = destination.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(destination, &bytes).await?;
    make_executable(destination).await?;

    info!("Installed Argo CD CLI to {} ({} bytes)", destination.display(), bytes.len());
    Ok(())
}

#[cfg(unix)]
async fn make_executable(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    tokio::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755)).await?;
    Ok(())
}

#[cfg(not(unix))]
async fn make_executable(_path: &Path) -> Result<()> {
    Ok(())
}
