use std::fmt;
use std::path::PathBuf;

use clap::Args;
use owo_colors::OwoColorize;

use common::config::{Config, ConfigError};

use crate::cli::op::{Op, OpContext};

#[derive(Args, Debug, Clone)]
pub struct Init {
    /// rclone remote to mount, e.g. `gateway:`
    #[arg(long, default_value = "")]
    pub remote: String,

    /// Local directory the remote is mounted at
    #[arg(long, default_value = "")]
    pub mount_path: String,

    /// VFS cache directory
    #[arg(long, default_value = "")]
    pub cache_dir: String,

    /// Overwrite an existing config file
    #[arg(long)]
    pub force: bool,
}

#[derive(Debug)]
pub struct InitOutput {
    pub config_path: PathBuf,
    pub mount_path: String,
    pub listen_addr: String,
}

impl fmt::Display for InitOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} config at {}",
            "Wrote".green().bold(),
            self.config_path.display().to_string().bold()
        )?;
        let mount_path = if self.mount_path.is_empty() {
            "(not set)"
        } else {
            self.mount_path.as_str()
        };
        writeln!(f, "  {} {}", "Mount path:".dimmed(), mount_path)?;
        write!(f, "  {} {}", "API listen:".dimmed(), self.listen_addr)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum InitError {
    #[error("config already exists at {0}; pass --force to overwrite")]
    Exists(PathBuf),
    #[error("failed to create {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Config(#[from] ConfigError),
}

#[async_trait::async_trait]
impl Op for Init {
    type Error = InitError;
    type Output = InitOutput;

    async fn execute(&self, ctx: &OpContext) -> Result<Self::Output, Self::Error> {
        let path = &ctx.config_path;
        if path.exists() && !self.force {
            return Err(InitError::Exists(path.clone()));
        }
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| InitError::CreateDir {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let mut config = Config {
            mount_path: self.mount_path.clone(),
            ..Default::default()
        };
        config.rclone.remote = self.remote.clone();
        config.rclone.cache_dir = self.cache_dir.clone();
        config.save(path)?;

        Ok(InitOutput {
            config_path: path.clone(),
            mount_path: config.mount_path,
            listen_addr: config.api.listen_addr,
        })
    }
}
