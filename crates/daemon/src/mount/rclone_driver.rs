//! Mount driver backed by the rclone CLI

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;

use parking_lot::Mutex;

use tokio::process::Command;
use tokio_util::sync::CancellationToken;

use common::config::{Config, SharedConfig};

use super::driver::{DriverError, MountDriver};

/// Runs `rclone mount --daemon` to attach and `fusermount -u` (or `umount`)
/// to detach. Mount settings are read from the live config on every call;
/// once attached, the path actually mounted is kept so a config reload
/// cannot redirect the unmount.
#[derive(Debug, Clone)]
pub struct RcloneCliDriver {
    config: SharedConfig,
    attached: Arc<Mutex<Option<PathBuf>>>,
}

impl RcloneCliDriver {
    pub fn new(config: SharedConfig) -> Self {
        Self {
            config,
            attached: Arc::new(Mutex::new(None)),
        }
    }

    /// Arguments passed to `rclone` for a mount
    pub fn mount_args(config: &Config) -> Result<Vec<String>, DriverError> {
        let remote = config.rclone.remote.trim();
        if remote.is_empty() {
            return Err(DriverError::NotConfigured("rclone.remote"));
        }
        let mount_path = config.mount_path.trim();
        if mount_path.is_empty() {
            return Err(DriverError::NotConfigured("mount_path"));
        }

        let mut args = vec![
            "mount".to_string(),
            remote.to_string(),
            mount_path.to_string(),
            "--daemon".to_string(),
        ];

        if let Some(cache_dir) = config.cache_dir() {
            args.push("--cache-dir".to_string());
            args.push(cache_dir.display().to_string());
        }

        for (key, value) in &config.rclone.mount_options {
            args.push(format!("--{}", key));
            if !value.is_empty() {
                args.push(value.clone());
            }
        }

        Ok(args)
    }

    fn unmount_command(mount_path: &Path) -> Command {
        #[cfg(target_os = "linux")]
        {
            let mut cmd = Command::new("fusermount");
            cmd.arg("-u").arg(mount_path);
            cmd
        }

        #[cfg(not(target_os = "linux"))]
        {
            let mut cmd = Command::new("umount");
            cmd.arg(mount_path);
            cmd
        }
    }
}

/// Run a command to completion, killing it if `cancel` fires first.
async fn run(mut cmd: Command, cancel: &CancellationToken) -> Result<(), DriverError> {
    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    tracing::debug!(command = ?cmd.as_std(), "running");
    let child = cmd.spawn()?;

    let output = tokio::select! {
        _ = cancel.cancelled() => return Err(DriverError::Cancelled),
        output = child.wait_with_output() => output?,
    };

    if output.status.success() {
        Ok(())
    } else {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let stderr = stderr.trim();
        Err(DriverError::Failed(if stderr.is_empty() {
            format!("{:?} exited with {}", cmd.as_std().get_program(), output.status)
        } else {
            stderr.to_string()
        }))
    }
}

#[async_trait::async_trait]
impl MountDriver for RcloneCliDriver {
    async fn mount(&self, cancel: &CancellationToken) -> Result<(), DriverError> {
        let config = self.config.current();
        let args = Self::mount_args(&config)?;
        let mount_path = PathBuf::from(config.mount_path.trim());

        tokio::fs::create_dir_all(&mount_path).await?;

        let mut cmd = Command::new(&config.rclone.rclone_path);
        cmd.args(&args);
        run(cmd, cancel).await?;

        *self.attached.lock() = Some(mount_path);
        Ok(())
    }

    async fn unmount(&self, cancel: &CancellationToken) -> Result<(), DriverError> {
        let mount_path = self.mount_path();
        if mount_path.as_os_str().is_empty() {
            return Err(DriverError::NotConfigured("mount_path"));
        }
        run(Self::unmount_command(&mount_path), cancel).await?;

        *self.attached.lock() = None;
        Ok(())
    }

    fn mount_path(&self) -> PathBuf {
        if let Some(path) = self.attached.lock().as_ref() {
            return path.clone();
        }
        PathBuf::from(self.config.current().mount_path.trim())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> Config {
        let mut config = Config {
            mount_path: "/mnt/media".to_string(),
            ..Default::default()
        };
        config.rclone.remote = "gateway:".to_string();
        config
    }

    #[test]
    fn test_mount_args_minimal() {
        let args = RcloneCliDriver::mount_args(&config()).unwrap();
        assert_eq!(args, vec!["mount", "gateway:", "/mnt/media", "--daemon"]);
    }

    #[test]
    fn test_mount_args_with_cache_and_options() {
        let mut config = config();
        config.rclone.cache_dir = "/var/cache/rclone".to_string();
        config
            .rclone
            .mount_options
            .insert("vfs-cache-mode".to_string(), "full".to_string());
        config
            .rclone
            .mount_options
            .insert("allow-other".to_string(), String::new());

        let args = RcloneCliDriver::mount_args(&config).unwrap();
        assert_eq!(
            args,
            vec![
                "mount",
                "gateway:",
                "/mnt/media",
                "--daemon",
                "--cache-dir",
                "/var/cache/rclone",
                "--allow-other",
                "--vfs-cache-mode",
                "full",
            ]
        );
    }

    #[test]
    fn test_mount_args_require_remote() {
        let mut config = config();
        config.rclone.remote.clear();
        assert!(matches!(
            RcloneCliDriver::mount_args(&config),
            Err(DriverError::NotConfigured("rclone.remote"))
        ));
    }

    #[test]
    fn test_mount_path_follows_config() {
        let shared = SharedConfig::new(config());
        let driver = RcloneCliDriver::new(shared.clone());
        assert_eq!(driver.mount_path(), PathBuf::from("/mnt/media"));

        let mut next = config();
        next.mount_path = "/mnt/other".to_string();
        shared.replace(next);
        assert_eq!(driver.mount_path(), PathBuf::from("/mnt/other"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_mounted_path_survives_config_reload() {
        let temp = tempfile::tempdir().unwrap();
        let first = temp.path().join("a");
        let second = temp.path().join("b");

        let mut initial = config();
        initial.mount_path = first.display().to_string();
        // `true` ignores its arguments and exits 0
        initial.rclone.rclone_path = "true".to_string();
        let shared = SharedConfig::new(initial.clone());
        let driver = RcloneCliDriver::new(shared.clone());

        driver.mount(&CancellationToken::new()).await.unwrap();
        assert!(first.is_dir());

        let mut reloaded = initial;
        reloaded.mount_path = second.display().to_string();
        shared.replace(reloaded);

        assert_eq!(driver.mount_path(), first);
        let cmd = RcloneCliDriver::unmount_command(&driver.mount_path());
        let args: Vec<_> = cmd.as_std().get_args().collect();
        assert_eq!(args.last().copied(), Some(first.as_os_str()));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_failed_mount_does_not_pin_path() {
        let mut initial = config();
        initial.rclone.rclone_path = "false".to_string();
        let temp = tempfile::tempdir().unwrap();
        initial.mount_path = temp.path().join("a").display().to_string();
        let shared = SharedConfig::new(initial.clone());
        let driver = RcloneCliDriver::new(shared.clone());

        assert!(driver.mount(&CancellationToken::new()).await.is_err());

        let mut reloaded = initial;
        reloaded.mount_path = "/mnt/other".to_string();
        shared.replace(reloaded);
        assert_eq!(driver.mount_path(), PathBuf::from("/mnt/other"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_run_reports_stderr() {
        let mut cmd = Command::new("sh");
        cmd.args(["-c", "echo boom >&2; exit 3"]);
        let err = run(cmd, &CancellationToken::new()).await.unwrap_err();
        assert!(matches!(err, DriverError::Failed(ref msg) if msg == "boom"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_run_cancelled() {
        let mut cmd = Command::new("sleep");
        cmd.arg("30");
        let cancel = CancellationToken::new();
        cancel.cancel();
        let err = run(cmd, &cancel).await.unwrap_err();
        assert!(matches!(err, DriverError::Cancelled));
    }
}
