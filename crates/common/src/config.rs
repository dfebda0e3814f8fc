//! Control plane configuration
//!
//! `Config` is a plain value loaded from TOML. The daemon shares it through
//! [`SharedConfig`], which hands out immutable `Arc<Config>` snapshots so a
//! reload never changes a value someone is already holding. Dry-run checks go
//! through [`Config::with_override`], which returns a new value and leaves the
//! live snapshot alone.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::validation::ValidationError;

pub const CONFIG_FILE_NAME: &str = "config.toml";
pub const DEFAULT_API_LISTEN_ADDR: &str = "127.0.0.1:8090";
pub const DEFAULT_RCLONE_PATH: &str = "rclone";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Local path the remote is mounted on
    pub mount_path: String,
    pub rclone: RCloneConfig,
    pub api: ApiConfig,
}

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RCloneConfig {
    /// rclone remote spec, e.g. `gateway:` or `gateway:media`
    pub remote: String,
    pub rc_url: String,
    pub rc_user: String,
    pub rc_pass: String,
    /// VFS name expected on the RC endpoint
    pub vfs_name: String,
    /// VFS cache directory; empty means not configured
    pub cache_dir: String,
    /// Extra `--key value` flags passed to `rclone mount`
    pub mount_options: BTreeMap<String, String>,
    pub rclone_path: String,
}

impl Default for RCloneConfig {
    fn default() -> Self {
        Self {
            remote: String::new(),
            rc_url: String::new(),
            rc_user: String::new(),
            rc_pass: String::new(),
            vfs_name: String::new(),
            cache_dir: String::new(),
            mount_options: BTreeMap::new(),
            rclone_path: DEFAULT_RCLONE_PATH.to_string(),
        }
    }
}

impl std::fmt::Debug for RCloneConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RCloneConfig")
            .field("remote", &self.remote)
            .field("rc_url", &self.rc_url)
            .field("rc_user", &self.rc_user)
            .field("rc_pass", &"***")
            .field("vfs_name", &self.vfs_name)
            .field("cache_dir", &self.cache_dir)
            .field("mount_options", &self.mount_options)
            .field("rclone_path", &self.rclone_path)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub listen_addr: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            listen_addr: DEFAULT_API_LISTEN_ADDR.to_string(),
        }
    }
}

/// Hypothetical mount settings checked without touching the live config
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MountConfigOverride {
    #[serde(default)]
    pub mount_point: Option<String>,
    #[serde(default)]
    pub mount_options: Option<BTreeMap<String, String>>,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("failed to write config {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("config has no backing file to reload from")]
    NoBackingFile,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let raw = toml::to_string_pretty(self)?;
        std::fs::write(path, raw).map_err(|source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        })
    }

    /// The configured cache directory, if any
    pub fn cache_dir(&self) -> Option<PathBuf> {
        let dir = self.rclone.cache_dir.trim();
        if dir.is_empty() {
            None
        } else {
            Some(PathBuf::from(dir))
        }
    }

    /// Return a copy of this config with the non-empty override fields applied.
    pub fn with_override(&self, over: &MountConfigOverride) -> Config {
        let mut next = self.clone();
        if let Some(mount_point) = over.mount_point.as_deref() {
            if !mount_point.trim().is_empty() {
                next.mount_path = mount_point.to_string();
            }
        }
        if let Some(options) = &over.mount_options {
            next.rclone.mount_options = options.clone();
        }
        next
    }

    /// Check the mount-related fields are well formed. Does not touch the
    /// filesystem.
    pub fn validate_mount(&self) -> Result<(), ValidationError> {
        let mount_path = self.mount_path.trim();
        if mount_path.is_empty() {
            return Err(ValidationError::MissingField("mount_path"));
        }
        if !Path::new(mount_path).is_absolute() {
            return Err(ValidationError::Invalid(format!(
                "mount path must be absolute: {}",
                mount_path
            )));
        }

        for key in self.rclone.mount_options.keys() {
            if !is_valid_option_key(key) {
                return Err(ValidationError::Invalid(format!(
                    "invalid mount option name: {:?}",
                    key
                )));
            }
        }

        Ok(())
    }
}

fn is_valid_option_key(key: &str) -> bool {
    !key.is_empty()
        && !key.starts_with('-')
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// Live configuration shared across the daemon.
///
/// Readers take a snapshot with [`SharedConfig::current`]; the lock is only
/// held long enough to clone the `Arc`.
#[derive(Debug, Clone)]
pub struct SharedConfig {
    inner: Arc<RwLock<Arc<Config>>>,
    path: Option<PathBuf>,
}

impl SharedConfig {
    pub fn new(config: Config) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Arc::new(config))),
            path: None,
        }
    }

    /// Load from a TOML file and remember the path for [`SharedConfig::reload`]
    pub fn from_file(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let config = Config::load(&path)?;
        Ok(Self {
            inner: Arc::new(RwLock::new(Arc::new(config))),
            path: Some(path),
        })
    }

    pub fn current(&self) -> Arc<Config> {
        self.inner.read().clone()
    }

    pub fn replace(&self, config: Config) {
        *self.inner.write() = Arc::new(config);
    }

    /// Re-read the backing file. On error the previous snapshot stays live.
    pub fn reload(&self) -> Result<Arc<Config>, ConfigError> {
        let path = self.path.as_ref().ok_or(ConfigError::NoBackingFile)?;
        let config = Arc::new(Config::load(path)?);
        *self.inner.write() = config.clone();
        tracing::info!(path = %path.display(), "configuration reloaded");
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Config {
        let mut config = Config {
            mount_path: "/mnt/remote".to_string(),
            ..Default::default()
        };
        config.rclone.cache_dir = "/var/cache/rclone".to_string();
        config
            .rclone
            .mount_options
            .insert("vfs-cache-mode".to_string(), "full".to_string());
        config
    }

    #[test]
    fn test_empty_toml_is_default() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.rclone.rclone_path, DEFAULT_RCLONE_PATH);
        assert_eq!(config.api.listen_addr, DEFAULT_API_LISTEN_ADDR);
        assert!(config.cache_dir().is_none());
    }

    #[test]
    fn test_parse_nested_tables() {
        let raw = r#"
            mount_path = "/mnt/media"

            [rclone]
            remote = "gateway:"
            rc_url = "http://localhost:5572"
            cache_dir = "/tmp/cache"

            [rclone.mount_options]
            vfs-cache-mode = "full"
            dir-cache-time = "10m"
        "#;
        let config: Config = toml::from_str(raw).unwrap();
        assert_eq!(config.mount_path, "/mnt/media");
        assert_eq!(config.rclone.remote, "gateway:");
        assert_eq!(config.cache_dir(), Some(PathBuf::from("/tmp/cache")));
        assert_eq!(config.rclone.mount_options.len(), 2);
    }

    #[test]
    fn test_with_override_leaves_original_untouched() {
        let original = sample();
        let mut options = BTreeMap::new();
        options.insert("read-only".to_string(), "true".to_string());

        let over = MountConfigOverride {
            mount_point: Some("/mnt/other".to_string()),
            mount_options: Some(options.clone()),
        };
        let next = original.with_override(&over);

        assert_eq!(next.mount_path, "/mnt/other");
        assert_eq!(next.rclone.mount_options, options);
        assert_eq!(original, sample());
    }

    #[test]
    fn test_with_override_ignores_empty_mount_point() {
        let original = sample();
        let over = MountConfigOverride {
            mount_point: Some("  ".to_string()),
            mount_options: None,
        };
        assert_eq!(original.with_override(&over), original);
    }

    #[test]
    fn test_validate_mount() {
        assert!(sample().validate_mount().is_ok());

        let mut missing = sample();
        missing.mount_path.clear();
        assert_eq!(
            missing.validate_mount(),
            Err(ValidationError::MissingField("mount_path"))
        );

        let mut relative = sample();
        relative.mount_path = "mnt/remote".to_string();
        assert!(matches!(
            relative.validate_mount(),
            Err(ValidationError::Invalid(_))
        ));

        let mut bad_key = sample();
        bad_key
            .rclone
            .mount_options
            .insert("--allow-other".to_string(), String::new());
        assert!(matches!(
            bad_key.validate_mount(),
            Err(ValidationError::Invalid(_))
        ));
    }

    #[test]
    fn test_debug_redacts_password() {
        let mut config = sample();
        config.rclone.rc_pass = "hunter2".to_string();
        let debug = format!("{:?}", config);
        assert!(!debug.contains("hunter2"));
    }

    #[test]
    fn test_shared_config_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        sample().save(&path).unwrap();

        let shared = SharedConfig::from_file(&path).unwrap();
        let before = shared.current();
        assert_eq!(before.rclone.cache_dir, "/var/cache/rclone");

        let mut updated = sample();
        updated.rclone.cache_dir = "/srv/cache".to_string();
        updated.save(&path).unwrap();

        shared.reload().unwrap();
        assert_eq!(shared.current().rclone.cache_dir, "/srv/cache");
        // snapshots taken before the reload are unaffected
        assert_eq!(before.rclone.cache_dir, "/var/cache/rclone");
    }

    #[test]
    fn test_reload_without_file() {
        let shared = SharedConfig::new(sample());
        assert!(matches!(shared.reload(), Err(ConfigError::NoBackingFile)));
    }

    #[test]
    fn test_reload_parse_error_keeps_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        sample().save(&path).unwrap();
        let shared = SharedConfig::from_file(&path).unwrap();

        std::fs::write(&path, "mount_path = [").unwrap();
        assert!(matches!(shared.reload(), Err(ConfigError::Parse { .. })));
        assert_eq!(shared.current().mount_path, "/mnt/remote");
    }
}
