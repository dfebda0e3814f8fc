//! Mount lifecycle management
//!
//! # Architecture
//!
//! - `MountLifecycle`: owns the state of one mount target and serializes
//!   mount/unmount transitions
//! - `MountDriver`: the seam to whatever actually attaches the filesystem
//! - `RcloneCliDriver`: driver that shells out to `rclone mount`
//!
//! Transitions run on their own task. A caller that gives up (drops its future
//! or cancels its token) never leaves the target stuck in `Mounting` or
//! `Unmounting`.

mod driver;
mod lifecycle;
mod rclone_driver;

pub use driver::{DriverError, MountDriver};
pub use lifecycle::{MountError, MountLifecycle, MountStatus};
pub use rclone_driver::RcloneCliDriver;
