use std::sync::{
    mpsc::{self, Receiver, Sender},
    Arc, Mutex, MutexGuard, PoisonError,
};

use log::{info, warn};

use crate::{
    error::{LaunchpadError, Result},
    filter::{filter_visible, search_visible},
    indexer::CatalogBuilder,
    models::{ApplicationRecord, CatalogSnapshot, RefreshReason},
    registry::{validate_candidate, HiddenAppRegistry},
};

/// Published to subscribers whenever the snapshot is replaced.
#[derive(Debug, Clone)]
pub struct StateEvent {
    pub reason: RefreshReason,
    pub snapshot: Arc<CatalogSnapshot>,
}

/// Owned application state shared by the presentation layer.
///
/// Mutations rebuild the catalog and publish a fresh immutable snapshot;
/// readers never observe a partially updated one.
pub struct AppState {
    builder: CatalogBuilder,
    /// Held from reading the hidden list until the snapshot is published.
    refreshing: Mutex<()>,
    registry: Mutex<HiddenAppRegistry>,
    snapshot: Mutex<Arc<CatalogSnapshot>>,
    subscribers: Mutex<Vec<Sender<StateEvent>>>,
}

impl AppState {
    /// Creates the state without scanning; call [`AppState::refresh`] to populate it.
    pub fn new(builder: CatalogBuilder, registry: HiddenAppRegistry) -> Self {
        let hidden_paths = registry.entries().to_vec();
        Self {
            builder,
            refreshing: Mutex::new(()),
            registry: Mutex::new(registry),
            snapshot: Mutex::new(Arc::new(CatalogSnapshot {
                hidden_paths,
                ..CatalogSnapshot::default()
            })),
            subscribers: Mutex::new(Vec::new()),
        }
    }

    pub fn snapshot(&self) -> Arc<CatalogSnapshot> {
        Arc::clone(&lock(&self.snapshot))
    }

    pub fn hidden_paths(&self) -> Vec<String> {
        lock(&self.registry).entries().to_vec()
    }

    /// Visible records whose name contains `query`.
    pub fn search(&self, query: &str) -> Vec<ApplicationRecord> {
        search_visible(&self.snapshot().visible, query)
    }

    pub fn find(&self, identifier: &str) -> Option<ApplicationRecord> {
        self.snapshot()
            .catalog
            .iter()
            .find(|record| record.identifier == identifier)
            .cloned()
    }

    /// Registers a new listener. Dropped receivers are pruned on the next publish.
    pub fn subscribe(&self) -> Receiver<StateEvent> {
        let (sender, receiver) = mpsc::channel();
        lock(&self.subscribers).push(sender);
        receiver
    }

    /// Rescans the application directories and publishes a new snapshot.
    ///
    /// Concurrent refreshes run one after another, so a newer generation never
    /// carries an older hidden list.
    pub fn refresh(&self, reason: RefreshReason) -> Arc<CatalogSnapshot> {
        let _refreshing = lock(&self.refreshing);
        let hidden_paths = self.hidden_paths();
        let catalog = self.builder.build();
        let visible = filter_visible(&catalog, &hidden_paths);
        info!(
            "catalog refreshed ({}): {} applications, {} visible",
            reason.as_str(),
            catalog.len(),
            visible.len()
        );

        let snapshot = {
            let mut current = lock(&self.snapshot);
            let next = Arc::new(CatalogSnapshot {
                generation: current.generation + 1,
                catalog,
                hidden_paths,
                visible,
            });
            *current = Arc::clone(&next);
            next
        };

        self.publish(StateEvent {
            reason,
            snapshot: Arc::clone(&snapshot),
        });
        snapshot
    }

    /// Validates and hides `path`. Returns whether the hidden list changed.
    pub fn add_hidden(&self, path: &str) -> Result<bool> {
        let path = path.trim();
        validate_candidate(path)?;
        let changed = lock(&self.registry).add(path)?;
        if changed {
            self.refresh(RefreshReason::HiddenAppsChanged);
        }
        Ok(changed)
    }

    pub fn remove_hidden(&self, path: &str) -> Result<usize> {
        let removed = lock(&self.registry).remove(path)?;
        if removed > 0 {
            self.refresh(RefreshReason::HiddenAppsChanged);
        }
        Ok(removed)
    }

    /// Removes the hidden entry at `index`. Out-of-range indices are logged and ignored.
    pub fn remove_hidden_at(&self, index: i64) -> Result<Option<String>> {
        let outcome = lock(&self.registry).remove_at(index);
        match outcome {
            Ok(removed) => {
                self.refresh(RefreshReason::HiddenAppsChanged);
                Ok(Some(removed))
            }
            Err(err @ LaunchpadError::IndexOutOfRange { .. }) => {
                warn!("ignoring hidden-app removal: {err}");
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }

    fn publish(&self, event: StateEvent) {
        let mut subscribers = lock(&self.subscribers);
        subscribers.retain(|subscriber| subscriber.send(event.clone()).is_ok());
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
