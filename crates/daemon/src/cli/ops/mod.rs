pub mod cache;
pub mod daemon;
pub mod health;
pub mod init;
pub mod mount;
pub mod rc;

pub use cache::Cache;
pub use daemon::Daemon;
pub use health::Health;
pub use init::Init;
pub use mount::Mount;
pub use rc::Rc;
