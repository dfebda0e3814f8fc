//! Shared types for the rcmount control plane
//!
//! - `config`: TOML configuration model, live shared snapshot, dry-run overrides
//! - `mount_state`: the mount lifecycle state enumeration
//! - `validation`: caller input errors shared by config checks and probes

pub mod config;
pub mod mount_state;
pub mod validation;

pub mod prelude {
    pub use crate::config::{
        Config, ConfigError, MountConfigOverride, RCloneConfig, SharedConfig,
    };
    pub use crate::mount_state::MountState;
    pub use crate::validation::ValidationError;
}
