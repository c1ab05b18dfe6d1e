use super::RecordSource;
use crate::api::ApiResult;
use crate::models::{MenuItem, MenuQuery};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// What a reader of the cache gets back.
#[derive(Clone, Debug, PartialEq)]
pub enum Resolution {
    /// Nothing has resolved yet for this query.
    Pending,
    Resolved(Arc<Vec<MenuItem>>),
}

impl Resolution {
    pub fn items(&self) -> Option<&[MenuItem]> {
        match self {
            Resolution::Pending => None,
            Resolution::Resolved(items) => Some(items.as_slice()),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, strum::Display, strum::AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum ResolutionStatus {
    Unresolved,
    Resolving,
    Resolved,
}

#[derive(Clone, Debug)]
enum ResolutionState {
    Unresolved,
    /// A fetch is in flight; `last` is what readers keep seeing until it lands.
    Resolving { last: Option<Arc<Vec<MenuItem>>> },
    Resolved(Arc<Vec<MenuItem>>),
}

impl ResolutionState {
    fn last(&self) -> Option<Arc<Vec<MenuItem>>> {
        match self {
            ResolutionState::Unresolved => None,
            ResolutionState::Resolving { last } => last.clone(),
            ResolutionState::Resolved(items) => Some(items.clone()),
        }
    }

    fn status(&self) -> ResolutionStatus {
        match self {
            ResolutionState::Unresolved => ResolutionStatus::Unresolved,
            ResolutionState::Resolving { .. } => ResolutionStatus::Resolving,
            ResolutionState::Resolved(_) => ResolutionStatus::Resolved,
        }
    }
}

/// Per-query slot. `issued` counts resolves started, `landed` is the generation of the
/// newest fetch whose result was stored.
#[derive(Clone, Debug)]
struct Slot {
    state: ResolutionState,
    issued: u64,
    landed: u64,
}

impl Default for Slot {
    fn default() -> Self {
        Self {
            state: ResolutionState::Unresolved,
            issued: 0,
            landed: 0,
        }
    }
}

/// Per-query cache of fetched menu items with stale-while-revalidate reads.
///
/// A refetch never makes readers see an empty or missing list: the previously resolved
/// list stays reported until the new one replaces it. A failed refetch leaves the old
/// list in place and hands the error to the caller that triggered it.
///
/// Overlapping resolves for one query are ordered by generation: a result only lands if
/// nothing newer has, and the state stays `Resolving` while a newer fetch is in flight.
#[derive(Default)]
pub struct RecordResolutionCache {
    entries: RwLock<HashMap<MenuQuery, Slot>>,
}

impl RecordResolutionCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reported(&self, query: &MenuQuery) -> Resolution {
        match self.state(query).last() {
            Some(items) => Resolution::Resolved(items),
            None => Resolution::Pending,
        }
    }

    pub fn status(&self, query: &MenuQuery) -> ResolutionStatus {
        self.state(query).status()
    }

    /// Fetch through `source` and store the result.
    pub async fn resolve<S: RecordSource>(
        &self,
        source: &S,
        query: &MenuQuery,
    ) -> ApiResult<Arc<Vec<MenuItem>>> {
        let generation = self.begin(query);

        match source.fetch_records(query).await {
            Ok(items) => {
                let items = Arc::new(items);
                tracing::debug!(
                    menu = query.menus,
                    generation,
                    records = items.len(),
                    "menu items resolved"
                );
                self.land(query, generation, Some(items.clone()));
                Ok(items)
            }
            Err(e) => {
                tracing::debug!(menu = query.menus, generation, error = %e, "menu items fetch failed");
                self.land(query, generation, None);
                Err(e)
            }
        }
    }

    /// Feed the cache from an external store snapshot: `items` is whatever the store
    /// currently holds, `is_resolving` whether it is still fetching. Snapshots taken
    /// mid-fetch are ignored so the reported list doesn't flicker.
    pub fn observe(&self, query: &MenuQuery, is_resolving: bool, items: Option<Vec<MenuItem>>) {
        let Ok(mut map) = self.entries.write() else {
            return;
        };
        let slot = map.entry(query.clone()).or_default();
        let last = slot.state.last();
        slot.state = match (is_resolving, items) {
            (true, _) => ResolutionState::Resolving { last },
            (false, Some(items)) => ResolutionState::Resolved(Arc::new(items)),
            // Store reports idle with nothing loaded: keep whatever we had.
            (false, None) => settled(last),
        };
    }

    /// Forget the query. Fetches already in flight for it are not stored.
    pub fn invalidate(&self, query: &MenuQuery) {
        if let Ok(mut map) = self.entries.write() {
            if let Some(slot) = map.get_mut(query) {
                slot.state = ResolutionState::Unresolved;
                slot.landed = slot.issued;
            }
        }
    }

    fn begin(&self, query: &MenuQuery) -> u64 {
        let Ok(mut map) = self.entries.write() else {
            return 0;
        };
        let slot = map.entry(query.clone()).or_default();
        slot.issued += 1;
        slot.state = ResolutionState::Resolving {
            last: slot.state.last(),
        };
        slot.issued
    }

    /// Store the outcome of fetch `generation`; `None` means it failed.
    fn land(&self, query: &MenuQuery, generation: u64, fetched: Option<Arc<Vec<MenuItem>>>) {
        let Ok(mut map) = self.entries.write() else {
            return;
        };
        let slot = map.entry(query.clone()).or_default();
        if generation <= slot.landed {
            tracing::debug!(menu = query.menus, generation, "dropping superseded fetch result");
            return;
        }

        let newest = match fetched {
            Some(items) => {
                slot.landed = generation;
                Some(items)
            }
            None => slot.state.last(),
        };
        slot.state = if slot.issued > generation {
            ResolutionState::Resolving { last: newest }
        } else {
            settled(newest)
        };
    }

    fn state(&self, query: &MenuQuery) -> ResolutionState {
        self.entries
            .read()
            .ok()
            .and_then(|map| map.get(query).map(|slot| slot.state.clone()))
            .unwrap_or(ResolutionState::Unresolved)
    }
}

fn settled(last: Option<Arc<Vec<MenuItem>>>) -> ResolutionState {
    match last {
        Some(items) => ResolutionState::Resolved(items),
        None => ResolutionState::Unresolved,
    }
}
