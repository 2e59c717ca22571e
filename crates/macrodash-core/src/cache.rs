//! Stale-while-revalidate cache for the macro payload.
//!
//! | State | Condition | Behaviour |
//! |-------|-----------|-----------|
//! | no cache | snapshot missing or unreadable | refresh inline, tag `fresh` or `error` |
//! | fresh | age <= TTL | return snapshot |
//! | stale | age > TTL | return snapshot, refresh in the background |
//!
//! Refreshes go through one [`SingleFlight`] so concurrent callers share a
//! single upstream batch. A refresh in which every indicator failed never
//! replaces an existing snapshot.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures::future::{BoxFuture, FutureExt, Shared};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::aggregate::PayloadSource;
use crate::clock::Clock;
use crate::domain::{CacheState, MacroPayload};
use crate::EngineError;

pub const DEFAULT_TTL: Duration = Duration::from_secs(15 * 60);

const MILLIS_PER_MINUTE: i64 = 60_000;

/// The single persisted document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheSnapshot {
    /// Unix epoch milliseconds at which the payload was written.
    pub cached_at: i64,
    pub payload: MacroPayload,
}

pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, EngineError>> + Send + 'a>>;

/// Reads and writes the snapshot as one whole document.
pub trait SnapshotStore: Send + Sync {
    /// `Ok(None)` when nothing has been written yet.
    fn load<'a>(&'a self) -> StoreFuture<'a, Option<CacheSnapshot>>;

    fn save<'a>(&'a self, snapshot: &'a CacheSnapshot) -> StoreFuture<'a, ()>;
}

/// JSON file on local disk.
#[derive(Debug, Clone)]
pub struct FileSnapshotStore {
    path: PathBuf,
}

impl FileSnapshotStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read(&self) -> Result<Option<CacheSnapshot>, EngineError> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(error) => return Err(self.unavailable("read", error)),
        };
        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|error| self.unavailable("parse", error))
    }

    async fn write(&self, snapshot: &CacheSnapshot) -> Result<(), EngineError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|error| self.unavailable("create directory for", error))?;
        }
        let body =
            serde_json::to_vec(snapshot).map_err(|error| self.unavailable("serialize", error))?;
        tokio::fs::write(&self.path, body)
            .await
            .map_err(|error| self.unavailable("write", error))
    }

    fn unavailable(&self, action: &str, error: impl std::fmt::Display) -> EngineError {
        EngineError::CacheUnavailable(format!(
            "failed to {action} '{}': {error}",
            self.path.display()
        ))
    }
}

impl SnapshotStore for FileSnapshotStore {
    fn load<'a>(&'a self) -> StoreFuture<'a, Option<CacheSnapshot>> {
        Box::pin(self.read())
    }

    fn save<'a>(&'a self, snapshot: &'a CacheSnapshot) -> StoreFuture<'a, ()> {
        Box::pin(self.write(snapshot))
    }
}

/// Process-local store, mostly for tests and one-shot runs.
#[derive(Debug, Default)]
pub struct MemorySnapshotStore {
    slot: Mutex<Option<CacheSnapshot>>,
}

impl MemorySnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_snapshot(snapshot: CacheSnapshot) -> Self {
        Self {
            slot: Mutex::new(Some(snapshot)),
        }
    }

    pub fn snapshot(&self) -> Option<CacheSnapshot> {
        self.slot.lock().expect("lock poisoned").clone()
    }
}

impl SnapshotStore for MemorySnapshotStore {
    fn load<'a>(&'a self) -> StoreFuture<'a, Option<CacheSnapshot>> {
        let current = self.snapshot();
        Box::pin(async move { Ok(current) })
    }

    fn save<'a>(&'a self, snapshot: &'a CacheSnapshot) -> StoreFuture<'a, ()> {
        *self.slot.lock().expect("lock poisoned") = Some(snapshot.clone());
        Box::pin(async { Ok(()) })
    }
}

pub type SharedFlight<T> = Shared<BoxFuture<'static, T>>;

enum Flight<T: Clone> {
    Idle,
    InProgress { generation: u64, future: SharedFlight<T> },
}

struct FlightSlot<T: Clone> {
    state: Flight<T>,
    next_generation: u64,
}

/// At most one in-progress operation; callers arriving while it runs get a
/// handle to the same future. The slot returns to idle when it completes.
pub struct SingleFlight<T: Clone> {
    slot: Arc<Mutex<FlightSlot<T>>>,
}

impl<T: Clone> Default for SingleFlight<T> {
    fn default() -> Self {
        Self {
            slot: Arc::new(Mutex::new(FlightSlot {
                state: Flight::Idle,
                next_generation: 0,
            })),
        }
    }
}

impl<T> SingleFlight<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the in-progress future, or starts `start()` if idle.
    pub fn join<F, Fut>(&self, start: F) -> SharedFlight<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T> + Send + 'static,
    {
        let mut slot = self.slot.lock().expect("lock poisoned");
        if let Flight::InProgress { future, .. } = &slot.state {
            debug!("joining in-flight operation");
            return future.clone();
        }

        let generation = slot.next_generation;
        slot.next_generation += 1;

        let operation = start();
        let release = Arc::clone(&self.slot);
        let future = async move {
            let output = operation.await;
            let mut slot = release.lock().expect("lock poisoned");
            if matches!(slot.state, Flight::InProgress { generation: g, .. } if g == generation) {
                slot.state = Flight::Idle;
            }
            output
        }
        .boxed()
        .shared();

        slot.state = Flight::InProgress {
            generation,
            future: future.clone(),
        };
        future
    }

    /// Handle to the running operation, if any.
    pub fn current(&self) -> Option<SharedFlight<T>> {
        match &self.slot.lock().expect("lock poisoned").state {
            Flight::InProgress { future, .. } => Some(future.clone()),
            Flight::Idle => None,
        }
    }

    pub fn is_in_flight(&self) -> bool {
        matches!(
            self.slot.lock().expect("lock poisoned").state,
            Flight::InProgress { .. }
        )
    }
}

/// Result of one refresh cycle as seen by every caller that joined it.
#[derive(Debug, Clone)]
pub struct RefreshOutcome {
    pub payload: MacroPayload,
    /// At least one indicator was fetched, so the snapshot was replaced.
    pub replaced_snapshot: bool,
}

pub struct CacheManager {
    source: Arc<dyn PayloadSource>,
    store: Arc<dyn SnapshotStore>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
    flight: SingleFlight<RefreshOutcome>,
}

impl CacheManager {
    pub fn new(
        source: Arc<dyn PayloadSource>,
        store: Arc<dyn SnapshotStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            source,
            store,
            clock,
            ttl: DEFAULT_TTL,
            flight: SingleFlight::new(),
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn is_refreshing(&self) -> bool {
        self.flight.is_in_flight()
    }

    /// Waits for a background refresh started by a stale read, if one is
    /// running. One-shot processes call this before exiting.
    pub async fn wait_for_refresh(&self) {
        if let Some(refresh) = self.flight.current() {
            refresh.await;
        }
    }

    /// Serves the cached payload, blocking only when there is no usable
    /// snapshot.
    pub async fn get_macro_payload(&self) -> MacroPayload {
        let Some(snapshot) = self.load_snapshot().await else {
            debug!("no cached snapshot, refreshing inline");
            let outcome = self.join_refresh().await;
            return tag_outcome(outcome);
        };

        let (state, age_minutes) = self.classify(&snapshot);
        if state == CacheState::Fresh {
            return snapshot.payload.tagged(state, age_minutes);
        }

        debug!(age_minutes, "snapshot is stale, refreshing in the background");
        let refresh = self.join_refresh();
        tokio::spawn(async move {
            refresh.await;
        });
        snapshot.payload.tagged(state, age_minutes)
    }

    /// Forces a refresh, joining one already in flight.
    ///
    /// When every indicator fails the existing snapshot is served with its
    /// age-based tag, or an empty payload tagged `error` if there is none.
    pub async fn refresh(&self) -> MacroPayload {
        let outcome = self.join_refresh().await;
        if outcome.replaced_snapshot {
            return tag_outcome(outcome);
        }
        match self.load_snapshot().await {
            Some(snapshot) => {
                let (state, age_minutes) = self.classify(&snapshot);
                snapshot.payload.tagged(state, age_minutes)
            }
            None => tag_outcome(outcome),
        }
    }

    /// `Fresh` while the snapshot age is within the TTL, `Stale` after.
    fn classify(&self, snapshot: &CacheSnapshot) -> (CacheState, u64) {
        let age_ms = (self.clock.now_millis() - snapshot.cached_at).max(0);
        let ttl_ms = i64::try_from(self.ttl.as_millis()).unwrap_or(i64::MAX);
        let state = if age_ms <= ttl_ms {
            CacheState::Fresh
        } else {
            CacheState::Stale
        };
        (state, age_minutes(age_ms))
    }

    async fn load_snapshot(&self) -> Option<CacheSnapshot> {
        match self.store.load().await {
            Ok(snapshot) => snapshot,
            Err(error) => {
                warn!(%error, "cache unreadable, treating as cold");
                None
            }
        }
    }

    fn join_refresh(&self) -> SharedFlight<RefreshOutcome> {
        let source = Arc::clone(&self.source);
        let store = Arc::clone(&self.store);
        let clock = Arc::clone(&self.clock);
        self.flight.join(move || async move {
            let payload = source.build_payload().await;
            if !payload.has_healthy_indicator() {
                warn!("refresh fetched no indicators, keeping existing snapshot");
                return RefreshOutcome {
                    payload,
                    replaced_snapshot: false,
                };
            }

            let snapshot = CacheSnapshot {
                cached_at: clock.now_millis(),
                payload,
            };
            match store.save(&snapshot).await {
                Ok(()) => info!(ok = snapshot.payload.ok_count, "macro snapshot written"),
                Err(error) => warn!(%error, "failed to persist macro snapshot"),
            }
            RefreshOutcome {
                payload: snapshot.payload,
                replaced_snapshot: true,
            }
        })
    }
}

fn age_minutes(age_ms: i64) -> u64 {
    u64::try_from(age_ms / MILLIS_PER_MINUTE).unwrap_or(0)
}

fn tag_outcome(outcome: RefreshOutcome) -> MacroPayload {
    let state = if outcome.replaced_snapshot {
        CacheState::Fresh
    } else {
        CacheState::Error
    };
    outcome.payload.tagged(state, 0)
}
