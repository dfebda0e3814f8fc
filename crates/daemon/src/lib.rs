//! rcmount daemon: control plane for a single rclone VFS mount
//!
//! The [`controller::MountController`] is the one entry point the HTTP API
//! and CLI go through. It owns the mount lifecycle state machine, the RC
//! connectivity probe and the cache resetter.

pub mod cache;
pub mod controller;
pub mod http_server;
pub mod mount;
pub mod probe;
pub mod process;
pub mod service_state;

pub use cache::{CacheError, CacheResetter};
pub use controller::{ControllerError, MountController};
pub use mount::{MountError, MountLifecycle, MountStatus};
pub use probe::{ConnectionProbe, ProbeRequest, ProbeResult};
pub use process::{spawn_service, start_service, ServiceError, ShutdownHandle};
pub use service_state::State as ServiceState;
