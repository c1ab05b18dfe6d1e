pub(crate) mod create_missing;
pub(crate) mod menu_sync;

pub use create_missing::ApiMissingRecordCreator;
pub use menu_sync::{MenuSyncController, SaveError, SaveStage};

use crate::api::{ApiResult, SaveResponse};
use crate::models::{ClientId, IdMapping, MenuQuery, NavItemNode};
use crate::reconcile::DiffPayload;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Gives every node of the tree a server record, recording new ids in the mapping.
#[allow(async_fn_in_trait)]
pub trait MissingRecordCreator {
    async fn create_missing(&self, query: &MenuQuery, items: &[NavItemNode]) -> ApiResult<()>;
}

/// Sends a finished payload to the server.
#[allow(async_fn_in_trait)]
pub trait PayloadTransport {
    async fn submit(&self, query: &MenuQuery, payload: &DiffPayload) -> ApiResult<SaveResponse>;
}

/// Current server-id -> client-id mapping for a query.
pub trait IdMappingSource {
    fn id_mapping(&self, query: &MenuQuery) -> IdMapping;
}

impl<T: MissingRecordCreator> MissingRecordCreator for Arc<T> {
    async fn create_missing(&self, query: &MenuQuery, items: &[NavItemNode]) -> ApiResult<()> {
        (**self).create_missing(query, items).await
    }
}

impl<T: PayloadTransport> PayloadTransport for Arc<T> {
    async fn submit(&self, query: &MenuQuery, payload: &DiffPayload) -> ApiResult<SaveResponse> {
        (**self).submit(query, payload).await
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, strum::Display, strum::AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum NoticeKind {
    Success,
    Error,
}

impl NoticeKind {
    pub fn message(&self) -> &'static str {
        match self {
            NoticeKind::Success => "Navigation saved.",
            NoticeKind::Error => "There was an error.",
        }
    }
}

/// User-facing snackbar sink. Fire-and-forget.
pub trait Notifier {
    fn notify(&self, kind: NoticeKind);
}

/// Notifier that only writes the notice to the log.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, kind: NoticeKind) {
        match kind {
            NoticeKind::Success => tracing::info!(notice = %kind, "{}", kind.message()),
            NoticeKind::Error => tracing::warn!(notice = %kind, "{}", kind.message()),
        }
    }
}

/// In-memory server-id -> client-id mapping per query, shared between the editor and the
/// create step.
#[derive(Default)]
pub struct IdMappingStore {
    mappings: RwLock<HashMap<MenuQuery, IdMapping>>,
}

impl IdMappingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the mapping for a query, e.g. after the editor (re)loads the menu.
    pub fn set_mapping(&self, query: &MenuQuery, mapping: IdMapping) {
        if let Ok(mut map) = self.mappings.write() {
            map.insert(query.clone(), mapping);
        }
    }

    pub fn assign(&self, query: &MenuQuery, server_id: u64, client_id: ClientId) {
        if let Ok(mut map) = self.mappings.write() {
            let mapping = map.entry(query.clone()).or_default();
            // One node maps to one record.
            mapping.retain(|_, c| *c != client_id);
            mapping.insert(server_id, client_id);
        }
    }

    pub fn server_id_for(&self, query: &MenuQuery, client_id: &ClientId) -> Option<u64> {
        let map = self.mappings.read().ok()?;
        map.get(query)?
            .iter()
            .find(|(_, c)| *c == client_id)
            .map(|(id, _)| *id)
    }

    pub fn clear(&self, query: &MenuQuery) {
        if let Ok(mut map) = self.mappings.write() {
            map.remove(query);
        }
    }
}

impl IdMappingSource for IdMappingStore {
    fn id_mapping(&self, query: &MenuQuery) -> IdMapping {
        self.mappings
            .read()
            .ok()
            .and_then(|map| map.get(query).cloned())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assign_and_lookup() {
        let store = IdMappingStore::new();
        let q = MenuQuery::all_items(1);
        store.assign(&q, 10, "a".into());
        store.assign(&q, 11, "b".into());

        assert_eq!(store.server_id_for(&q, &"a".into()), Some(10));
        assert_eq!(store.server_id_for(&q, &"missing".into()), None);
        assert_eq!(store.id_mapping(&q).len(), 2);
        assert!(store.id_mapping(&MenuQuery::all_items(2)).is_empty());
    }

    #[test]
    fn test_reassigning_a_node_drops_its_old_record() {
        let store = IdMappingStore::new();
        let q = MenuQuery::all_items(1);
        store.assign(&q, 10, "a".into());
        store.assign(&q, 12, "a".into());

        let mapping = store.id_mapping(&q);
        assert_eq!(mapping.len(), 1);
        assert_eq!(mapping.get(&12).map(|c| c.as_str()), Some("a"));
    }

    #[test]
    fn test_set_mapping_and_clear() {
        let store = IdMappingStore::new();
        let q = MenuQuery::all_items(1);
        store.set_mapping(&q, [(1, "x".into())].into_iter().collect());
        assert_eq!(store.server_id_for(&q, &"x".into()), Some(1));
        store.clear(&q);
        assert!(store.id_mapping(&q).is_empty());
    }

    #[test]
    fn test_notice_messages() {
        assert_eq!(NoticeKind::Success.message(), "Navigation saved.");
        assert_eq!(NoticeKind::Error.message(), "There was an error.");
        assert_eq!(NoticeKind::Error.to_string(), "error");
    }
}
