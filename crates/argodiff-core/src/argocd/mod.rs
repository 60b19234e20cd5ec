//! Argo CD CLI installation and invocation

pub mod command;
pub mod install;

pub use command::{classify_exit, ArgoCdCli, EXTERNAL_DIFF_ENV};
pub use install::{install_cli, release_url, INSTALL_PATH};
