use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, OwnedMutexGuard};
use tokio_util::sync::CancellationToken;

use common::mount_state::MountState;

use super::driver::{DriverError, MountDriver};

/// Point-in-time view of a mount target
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MountStatus {
    pub state: MountState,
    pub mount_path: PathBuf,
    pub last_error: Option<String>,
    /// When `state` was entered
    pub since: DateTime<Utc>,
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum MountError {
    #[error("a mount transition is already in progress")]
    Busy,
    #[error("mount driver failed: {0}")]
    Driver(String),
    #[error("mount operation cancelled")]
    Cancelled,
}

#[derive(Debug, Clone)]
struct Snapshot {
    state: MountState,
    last_error: Option<String>,
    since: DateTime<Utc>,
}

impl Snapshot {
    fn new(state: MountState, last_error: Option<String>) -> Self {
        Self {
            state,
            last_error,
            since: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Mount,
    Unmount,
}

impl Direction {
    fn in_flight(self) -> MountState {
        match self {
            Direction::Mount => MountState::Mounting,
            Direction::Unmount => MountState::Unmounting,
        }
    }

    fn target(self) -> MountState {
        match self {
            Direction::Mount => MountState::Mounted,
            Direction::Unmount => MountState::Unmounted,
        }
    }

    fn verb(self) -> &'static str {
        match self {
            Direction::Mount => "mount",
            Direction::Unmount => "unmount",
        }
    }

    async fn run(
        self,
        driver: &dyn MountDriver,
        cancel: &CancellationToken,
    ) -> Result<(), DriverError> {
        match self {
            Direction::Mount => driver.mount(cancel).await,
            Direction::Unmount => driver.unmount(cancel).await,
        }
    }
}

/// Owns the state of a single mount target.
///
/// Status reads copy a snapshot under a short read lock and never wait on an
/// in-flight transition. Mount and unmount take the transition lock with
/// `try_lock`; a second request while one is running is rejected with
/// [`MountError::Busy`] rather than queued.
#[derive(Clone)]
pub struct MountLifecycle {
    driver: Arc<dyn MountDriver>,
    snapshot: Arc<RwLock<Snapshot>>,
    transition_lock: Arc<Mutex<()>>,
}

impl MountLifecycle {
    pub fn new(driver: Arc<dyn MountDriver>) -> Self {
        Self {
            driver,
            snapshot: Arc::new(RwLock::new(Snapshot::new(MountState::Unmounted, None))),
            transition_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn status(&self) -> MountStatus {
        let snapshot = self.snapshot.read().clone();
        MountStatus {
            state: snapshot.state,
            mount_path: self.driver.mount_path(),
            last_error: snapshot.last_error,
            since: snapshot.since,
        }
    }

    /// Attach the filesystem. Succeeds without calling the driver if already
    /// mounted.
    pub async fn mount(&self, cancel: &CancellationToken) -> Result<(), MountError> {
        self.transition(Direction::Mount, cancel).await
    }

    /// Detach the filesystem. Succeeds without calling the driver if already
    /// unmounted.
    pub async fn unmount(&self, cancel: &CancellationToken) -> Result<(), MountError> {
        self.transition(Direction::Unmount, cancel).await
    }

    async fn transition(
        &self,
        direction: Direction,
        cancel: &CancellationToken,
    ) -> Result<(), MountError> {
        let lock = self
            .transition_lock
            .clone()
            .try_lock_owned()
            .map_err(|_| {
                tracing::warn!(
                    operation = direction.verb(),
                    state = %self.snapshot.read().state,
                    "rejecting request: transition already in progress"
                );
                MountError::Busy
            })?;

        let from = self.snapshot.read().state;
        if from == direction.target() {
            tracing::debug!(state = %from, "{} requested, nothing to do", direction.verb());
            return Ok(());
        }

        tracing::info!(
            from = %from,
            to = %direction.in_flight(),
            mount_path = %self.driver.mount_path().display(),
            "starting {}",
            direction.verb()
        );
        let guard = TransitionGuard::begin(self.snapshot.clone(), lock, direction);

        let driver = self.driver.clone();
        let cancel = cancel.clone();
        let task = tokio::spawn(async move {
            let result = tokio::select! {
                biased;
                _ = cancel.cancelled() => Err(DriverError::Cancelled),
                result = direction.run(driver.as_ref(), &cancel) => result,
            };
            guard.finish(result)
        });

        match task.await {
            Ok(result) => result,
            Err(e) => Err(MountError::Driver(format!(
                "{} task aborted: {}",
                direction.verb(),
                e
            ))),
        }
    }
}

impl std::fmt::Debug for MountLifecycle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MountLifecycle")
            .field("snapshot", &*self.snapshot.read())
            .finish()
    }
}

/// Holds the transition lock for the duration of one transition.
///
/// Whatever happens to the task driving it, the state is moved to a terminal
/// value before the lock is released (`Drop` runs before the fields drop).
struct TransitionGuard {
    snapshot: Arc<RwLock<Snapshot>>,
    direction: Direction,
    resolved: bool,
    _lock: OwnedMutexGuard<()>,
}

impl TransitionGuard {
    fn begin(
        snapshot: Arc<RwLock<Snapshot>>,
        lock: OwnedMutexGuard<()>,
        direction: Direction,
    ) -> Self {
        *snapshot.write() = Snapshot::new(direction.in_flight(), None);
        Self {
            snapshot,
            direction,
            resolved: false,
            _lock: lock,
        }
    }

    fn finish(mut self, result: Result<(), DriverError>) -> Result<(), MountError> {
        let verb = self.direction.verb();
        let (next, outcome) = match result {
            Ok(()) => {
                tracing::info!(state = %self.direction.target(), "{} completed", verb);
                (Snapshot::new(self.direction.target(), None), Ok(()))
            }
            Err(DriverError::Cancelled) => {
                tracing::warn!("{} cancelled by caller", verb);
                (
                    Snapshot::new(MountState::Error, Some(format!("{} cancelled", verb))),
                    Err(MountError::Cancelled),
                )
            }
            Err(e) => {
                let detail = e.to_string();
                tracing::error!(error = %detail, "{} failed", verb);
                (
                    Snapshot::new(MountState::Error, Some(detail.clone())),
                    Err(MountError::Driver(detail)),
                )
            }
        };

        *self.snapshot.write() = next;
        self.resolved = true;
        outcome
    }
}

impl Drop for TransitionGuard {
    fn drop(&mut self) {
        if !self.resolved {
            let verb = self.direction.verb();
            tracing::error!("{} aborted before the driver returned", verb);
            *self.snapshot.write() = Snapshot::new(
                MountState::Error,
                Some(format!("{} aborted before completion", verb)),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use tokio::sync::Semaphore;

    use super::*;

    /// Driver whose calls block until a permit is released on `gate`
    struct GatedDriver {
        mounts: AtomicUsize,
        unmounts: AtomicUsize,
        gate: Arc<Semaphore>,
        fail_with: parking_lot::Mutex<Option<String>>,
    }

    impl GatedDriver {
        fn open() -> Arc<Self> {
            Self::with_permits(Semaphore::MAX_PERMITS)
        }

        fn closed() -> Arc<Self> {
            Self::with_permits(0)
        }

        fn with_permits(permits: usize) -> Arc<Self> {
            Arc::new(Self {
                mounts: AtomicUsize::new(0),
                unmounts: AtomicUsize::new(0),
                gate: Arc::new(Semaphore::new(permits)),
                fail_with: parking_lot::Mutex::new(None),
            })
        }

        async fn pass_gate(&self) -> Result<(), DriverError> {
            self.gate.acquire().await.unwrap().forget();
            match self.fail_with.lock().take() {
                Some(msg) => Err(DriverError::Failed(msg)),
                None => Ok(()),
            }
        }
    }

    #[async_trait::async_trait]
    impl MountDriver for GatedDriver {
        async fn mount(&self, _cancel: &CancellationToken) -> Result<(), DriverError> {
            self.mounts.fetch_add(1, Ordering::SeqCst);
            self.pass_gate().await
        }

        async fn unmount(&self, _cancel: &CancellationToken) -> Result<(), DriverError> {
            self.unmounts.fetch_add(1, Ordering::SeqCst);
            self.pass_gate().await
        }

        fn mount_path(&self) -> PathBuf {
            PathBuf::from("/mnt/test")
        }
    }

    async fn wait_for_state(lifecycle: &MountLifecycle, state: MountState) {
        for _ in 0..1000 {
            if lifecycle.status().state == state {
                return;
            }
            tokio::task::yield_now().await;
        }
        panic!(
            "state never reached {}, stuck at {}",
            state,
            lifecycle.status().state
        );
    }

    #[tokio::test]
    async fn test_initial_status() {
        let lifecycle = MountLifecycle::new(GatedDriver::open());
        let status = lifecycle.status();
        assert_eq!(status.state, MountState::Unmounted);
        assert_eq!(status.mount_path, PathBuf::from("/mnt/test"));
        assert!(status.last_error.is_none());
    }

    #[tokio::test]
    async fn test_mount_is_idempotent() {
        let driver = GatedDriver::open();
        let lifecycle = MountLifecycle::new(driver.clone());
        let cancel = CancellationToken::new();

        lifecycle.mount(&cancel).await.unwrap();
        assert_eq!(lifecycle.status().state, MountState::Mounted);

        lifecycle.mount(&cancel).await.unwrap();
        assert_eq!(driver.mounts.load(Ordering::SeqCst), 1);
        assert_eq!(lifecycle.status().state, MountState::Mounted);
    }

    #[tokio::test]
    async fn test_unmount_when_unmounted_skips_driver() {
        let driver = GatedDriver::open();
        let lifecycle = MountLifecycle::new(driver.clone());

        lifecycle.unmount(&CancellationToken::new()).await.unwrap();
        assert_eq!(driver.unmounts.load(Ordering::SeqCst), 0);
        assert_eq!(lifecycle.status().state, MountState::Unmounted);
    }

    #[tokio::test]
    async fn test_mount_then_unmount() {
        let driver = GatedDriver::open();
        let lifecycle = MountLifecycle::new(driver.clone());
        let cancel = CancellationToken::new();

        lifecycle.mount(&cancel).await.unwrap();
        lifecycle.unmount(&cancel).await.unwrap();
        assert_eq!(lifecycle.status().state, MountState::Unmounted);
        assert_eq!(driver.unmounts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_driver_failure_records_error() {
        let driver = GatedDriver::open();
        *driver.fail_with.lock() = Some("fusermount: permission denied".to_string());
        let lifecycle = MountLifecycle::new(driver.clone());

        let err = lifecycle.mount(&CancellationToken::new()).await.unwrap_err();
        assert!(matches!(err, MountError::Driver(ref d) if d.contains("permission denied")));

        let status = lifecycle.status();
        assert_eq!(status.state, MountState::Error);
        assert_eq!(
            status.last_error.as_deref(),
            Some("fusermount: permission denied")
        );

        // a retry from the error state goes back through the driver
        lifecycle.mount(&CancellationToken::new()).await.unwrap();
        let status = lifecycle.status();
        assert_eq!(status.state, MountState::Mounted);
        assert!(status.last_error.is_none());
        assert_eq!(driver.mounts.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_concurrent_requests_are_rejected() {
        let driver = GatedDriver::closed();
        let lifecycle = MountLifecycle::new(driver.clone());

        let first = {
            let lifecycle = lifecycle.clone();
            tokio::spawn(async move { lifecycle.mount(&CancellationToken::new()).await })
        };
        wait_for_state(&lifecycle, MountState::Mounting).await;

        let second = lifecycle.mount(&CancellationToken::new()).await;
        assert!(matches!(second, Err(MountError::Busy)));
        let stop = lifecycle.unmount(&CancellationToken::new()).await;
        assert!(matches!(stop, Err(MountError::Busy)));

        driver.gate.add_permits(1);
        first.await.unwrap().unwrap();

        assert_eq!(driver.mounts.load(Ordering::SeqCst), 1);
        assert_eq!(driver.unmounts.load(Ordering::SeqCst), 0);
        assert_eq!(lifecycle.status().state, MountState::Mounted);
    }

    #[tokio::test]
    async fn test_cancel_resolves_to_error_and_releases_lock() {
        let driver = GatedDriver::closed();
        let lifecycle = MountLifecycle::new(driver.clone());
        let cancel = CancellationToken::new();

        let pending = {
            let lifecycle = lifecycle.clone();
            let cancel = cancel.clone();
            tokio::spawn(async move { lifecycle.mount(&cancel).await })
        };
        wait_for_state(&lifecycle, MountState::Mounting).await;

        cancel.cancel();
        let result = pending.await.unwrap();
        assert!(matches!(result, Err(MountError::Cancelled)));

        let status = lifecycle.status();
        assert_eq!(status.state, MountState::Error);
        assert_eq!(status.last_error.as_deref(), Some("mount cancelled"));

        driver.gate.add_permits(1);
        lifecycle.mount(&CancellationToken::new()).await.unwrap();
        assert_eq!(lifecycle.status().state, MountState::Mounted);
    }

    #[tokio::test]
    async fn test_dropped_caller_still_resolves() {
        let driver = GatedDriver::closed();
        let lifecycle = MountLifecycle::new(driver.clone());

        let caller = {
            let lifecycle = lifecycle.clone();
            tokio::spawn(async move { lifecycle.mount(&CancellationToken::new()).await })
        };
        wait_for_state(&lifecycle, MountState::Mounting).await;

        caller.abort();
        assert!(caller.await.unwrap_err().is_cancelled());
        assert_eq!(lifecycle.status().state, MountState::Mounting);

        // one permit for the orphaned mount, one for the unmount below
        driver.gate.add_permits(2);
        wait_for_state(&lifecycle, MountState::Mounted).await;

        // lock was released once the orphaned transition finished
        for _ in 0..1000 {
            match lifecycle.unmount(&CancellationToken::new()).await {
                Err(MountError::Busy) => tokio::task::yield_now().await,
                other => {
                    other.unwrap();
                    break;
                }
            }
        }
        assert_eq!(driver.unmounts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_status_serializes() {
        let lifecycle = MountLifecycle::new(GatedDriver::open());
        let json = serde_json::to_value(lifecycle.status()).unwrap();
        assert_eq!(json["state"], "unmounted");
        assert_eq!(json["mount_path"], "/mnt/test");
        assert!(json["last_error"].is_null());
    }
}
