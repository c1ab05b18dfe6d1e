//! Keeps an editable navigation tree in sync with a site's flat list of menu items.
//!
//! The editor owns a tree of [`NavItemNode`]s; the server stores [`MenuItem`] rows with
//! explicit parent ids and positions. Saving flattens the tree, correlates nodes with
//! their records and sends one complete customizer payload: every live node as an
//! upsert, every record that fell out of the tree as an explicit `false`.

pub mod api;
pub mod cache;
pub mod models;
pub mod reconcile;
pub mod state;
mod util;

pub use api::{ApiClient, ApiError, ApiErrorKind, ApiResult, EnvConfig, SaveResponse};
pub use cache::{RecordResolutionCache, RecordSource, Resolution, ResolutionStatus};
pub use models::{ClientId, IdMapping, MenuItem, MenuQuery, NavItemNode};
pub use reconcile::{
    compute_payload, flatten, DiffPayload, DiffPayloadBuilder, FlatEntry, IdCorrelator,
    PayloadEntry,
};
pub use state::{
    ApiMissingRecordCreator, IdMappingSource, IdMappingStore, LogNotifier, MenuSyncController,
    MissingRecordCreator, NoticeKind, Notifier, PayloadTransport, SaveError, SaveStage,
};

/// Controller wired to the REST API: records, creates and the customizer save all go
/// through one client, and new ids land in `mapping`.
pub fn api_controller(
    api: ApiClient,
    mapping: std::sync::Arc<IdMappingStore>,
) -> MenuSyncController<ApiClient, ApiMissingRecordCreator, ApiClient> {
    let creator = ApiMissingRecordCreator::new(api.clone(), mapping.clone());
    MenuSyncController::new(api.clone(), creator, api, mapping, std::sync::Arc::new(LogNotifier))
}
