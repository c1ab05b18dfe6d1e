use super::{IdMappingSource, MissingRecordCreator, NoticeKind, Notifier, PayloadTransport};
use crate::api::ApiError;
use crate::cache::{RecordResolutionCache, RecordSource, Resolution};
use crate::models::{MenuItem, MenuQuery, NavItemNode};
use crate::reconcile::compute_payload;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, strum::Display, strum::AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum SaveStage {
    #[default]
    Idle,
    Creating,
    Resolving,
    Diffing,
    Submitting,
    Done,
    Failed,
}

#[derive(Debug, thiserror::Error)]
pub enum SaveError {
    #[error("creating missing menu items failed: {0}")]
    Create(#[source] ApiError),
    #[error("loading menu items failed: {0}")]
    Resolve(#[source] ApiError),
    #[error("submitting menu failed: {0}")]
    Submit(#[source] ApiError),
    #[error("server rejected the menu save")]
    Rejected,
}

/// Saves an edited navigation tree back to its menu.
///
/// Each save runs one fixed pipeline:
/// 1. create records for nodes that have none yet
/// 2. refetch the menu's records and read the id mapping (after 1, never before)
/// 3. flatten + diff into the customizer payload
/// 4. submit it
/// 5. report exactly one outcome and one notice
///
/// Any failure stops the pipeline; nothing partial is ever submitted and records created
/// in step 1 are left for the next save to reconcile. Saves for the same query are
/// queued behind each other; different queries don't block each other.
///
/// Non-responsibilities:
/// - retrying failed saves
/// - editing the tree (it is borrowed for the whole save)
pub struct MenuSyncController<S, C, T> {
    source: S,
    creator: C,
    transport: T,
    mapping: Arc<dyn IdMappingSource + Send + Sync>,
    notifier: Arc<dyn Notifier + Send + Sync>,
    records: Arc<RecordResolutionCache>,

    /// Per-query save queue.
    save_locks: Mutex<HashMap<MenuQuery, Arc<tokio::sync::Mutex<()>>>>,
    stages: Mutex<HashMap<MenuQuery, SaveStage>>,
}

impl<S, C, T> MenuSyncController<S, C, T>
where
    S: RecordSource,
    C: MissingRecordCreator,
    T: PayloadTransport,
{
    pub fn new(
        source: S,
        creator: C,
        transport: T,
        mapping: Arc<dyn IdMappingSource + Send + Sync>,
        notifier: Arc<dyn Notifier + Send + Sync>,
    ) -> Self {
        Self {
            source,
            creator,
            transport,
            mapping,
            notifier,
            records: Arc::new(RecordResolutionCache::new()),
            save_locks: Mutex::new(HashMap::new()),
            stages: Mutex::new(HashMap::new()),
        }
    }

    /// Share a cache with readers outside the controller.
    pub fn with_cache(mut self, records: Arc<RecordResolutionCache>) -> Self {
        self.records = records;
        self
    }

    pub fn cache(&self) -> &Arc<RecordResolutionCache> {
        &self.records
    }

    /// Last resolved items for the query, or `Pending` before the first fetch lands.
    pub fn menu_items(&self, query: &MenuQuery) -> Resolution {
        self.records.reported(query)
    }

    pub async fn fetch_menu_items(&self, query: &MenuQuery) -> Result<Arc<Vec<MenuItem>>, ApiError> {
        self.records.resolve(&self.source, query).await
    }

    pub fn stage(&self, query: &MenuQuery) -> SaveStage {
        self.stages
            .lock()
            .ok()
            .and_then(|map| map.get(query).copied())
            .unwrap_or_default()
    }

    pub async fn save(&self, query: &MenuQuery, items: &[NavItemNode]) -> Result<(), SaveError> {
        let lock = self.save_lock(query);
        let result = {
            let _queued = lock.lock().await;
            let result = self.run_save(query, items).await;
            self.report(query, &result);
            result
        };
        self.release_save_lock(query, lock);
        result
    }

    fn report(&self, query: &MenuQuery, result: &Result<(), SaveError>) {
        match result {
            Ok(()) => {
                self.set_stage(query, SaveStage::Done);
                tracing::info!(menu = query.menus, "navigation saved");
                self.notifier.notify(NoticeKind::Success);
            }
            Err(e) => {
                self.set_stage(query, SaveStage::Failed);
                tracing::warn!(menu = query.menus, error = %e, "navigation save failed");
                self.notifier.notify(NoticeKind::Error);
            }
        }
    }

    async fn run_save(&self, query: &MenuQuery, items: &[NavItemNode]) -> Result<(), SaveError> {
        self.set_stage(query, SaveStage::Creating);
        self.creator
            .create_missing(query, items)
            .await
            .map_err(SaveError::Create)?;

        // Fresh read: the create step may have added records and mapping entries.
        self.set_stage(query, SaveStage::Resolving);
        let prior = self
            .records
            .resolve(&self.source, query)
            .await
            .map_err(SaveError::Resolve)?;
        let mapping = self.mapping.id_mapping(query);

        self.set_stage(query, SaveStage::Diffing);
        let payload = compute_payload(query.menus, items, &prior, &mapping);
        tracing::debug!(
            menu = query.menus,
            upserts = payload.upsert_keys().count(),
            deletions = payload.deletion_keys().count(),
            "built menu payload"
        );

        self.set_stage(query, SaveStage::Submitting);
        let response = self
            .transport
            .submit(query, &payload)
            .await
            .map_err(SaveError::Submit)?;
        if !response.success {
            return Err(SaveError::Rejected);
        }
        Ok(())
    }

    fn save_lock(&self, query: &MenuQuery) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self.save_locks.lock().unwrap_or_else(|e| e.into_inner());
        locks.entry(query.clone()).or_default().clone()
    }

    /// Drop the queue entry once no other save for the query holds or waits on it.
    fn release_save_lock(&self, query: &MenuQuery, lock: Arc<tokio::sync::Mutex<()>>) {
        let mut locks = self.save_locks.lock().unwrap_or_else(|e| e.into_inner());
        drop(lock);
        let idle = locks
            .get(query)
            .is_some_and(|entry| Arc::strong_count(entry) == 1);
        if idle {
            locks.remove(query);
        }
    }

    #[cfg(test)]
    fn queued_queries(&self) -> usize {
        self.save_locks.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    fn set_stage(&self, query: &MenuQuery, stage: SaveStage) {
        tracing::debug!(menu = query.menus, stage = %stage, "save stage");
        if let Ok(mut map) = self.stages.lock() {
            map.insert(query.clone(), stage);
        }
    }
}
