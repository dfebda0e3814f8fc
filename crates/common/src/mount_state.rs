use serde::{Deserialize, Serialize};

/// Lifecycle state of a mount target
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MountState {
    #[default]
    Unmounted,
    Mounting,
    Mounted,
    Unmounting,
    Error,
}

impl MountState {
    pub fn as_str(&self) -> &'static str {
        match self {
            MountState::Unmounted => "unmounted",
            MountState::Mounting => "mounting",
            MountState::Mounted => "mounted",
            MountState::Unmounting => "unmounting",
            MountState::Error => "error",
        }
    }

    /// True while a mount or unmount is in flight
    pub fn is_transitioning(&self) -> bool {
        matches!(self, MountState::Mounting | MountState::Unmounting)
    }
}

impl std::fmt::Display for MountState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
