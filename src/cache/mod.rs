pub mod menu_items;

pub use menu_items::{RecordResolutionCache, Resolution, ResolutionStatus};

use crate::api::ApiResult;
use crate::models::{MenuItem, MenuQuery};
use std::sync::Arc;

/// Where menu item records come from (REST collection, test stub, ...).
#[allow(async_fn_in_trait)]
pub trait RecordSource {
    async fn fetch_records(&self, query: &MenuQuery) -> ApiResult<Vec<MenuItem>>;
}

impl<T: RecordSource> RecordSource for Arc<T> {
    async fn fetch_records(&self, query: &MenuQuery) -> ApiResult<Vec<MenuItem>> {
        (**self).fetch_records(query).await
    }
}
