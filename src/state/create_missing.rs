use super::{IdMappingStore, MissingRecordCreator};
use crate::api::{ApiClient, ApiResult, CreateMenuItemRequest};
use crate::models::{ClientId, MenuQuery, NavItemNode};
use std::sync::Arc;

const PLACEHOLDER: &str = "Placeholder";

/// Creates a record for every node the mapping doesn't know yet, via the REST
/// collection, and writes the new ids back into the mapping store.
///
/// Parents are created before their children so a child's `parent` can point at its
/// parent's fresh id. The save that follows rewrites titles, urls and positions anyway.
#[derive(Clone)]
pub struct ApiMissingRecordCreator {
    api: ApiClient,
    mapping: Arc<IdMappingStore>,
}

impl ApiMissingRecordCreator {
    pub fn new(api: ApiClient, mapping: Arc<IdMappingStore>) -> Self {
        Self { api, mapping }
    }
}

impl MissingRecordCreator for ApiMissingRecordCreator {
    async fn create_missing(&self, query: &MenuQuery, items: &[NavItemNode]) -> ApiResult<()> {
        let mut stack: Vec<(&NavItemNode, Option<&ClientId>)> =
            items.iter().rev().map(|n| (n, None)).collect();

        while let Some((node, parent)) = stack.pop() {
            if self.mapping.server_id_for(query, &node.client_id).is_none() {
                let parent_id = parent
                    .and_then(|p| self.mapping.server_id_for(query, p))
                    .unwrap_or(0);
                let req = placeholder_request(query, node, parent_id);
                let created = self.api.create_menu_item(&req).await?;
                tracing::debug!(
                    menu = query.menus,
                    id = created.id,
                    client_id = %node.client_id,
                    "created menu item"
                );
                self.mapping.assign(query, created.id, node.client_id.clone());
            }

            stack.extend(node.children.iter().rev().map(|c| (c, Some(&node.client_id))));
        }

        Ok(())
    }
}

fn placeholder_request(query: &MenuQuery, node: &NavItemNode, parent_id: u64) -> CreateMenuItemRequest {
    let non_empty = |s: &Option<String>| {
        s.as_deref()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or(PLACEHOLDER)
            .to_string()
    };

    CreateMenuItemRequest {
        title: non_empty(&node.label),
        url: non_empty(&node.url),
        menus: query.menus,
        parent: parent_id,
        menu_order: 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholder_request_uses_node_fields() {
        let q = MenuQuery::all_items(4);
        let node = NavItemNode::new("a", "Blog", "/blog");
        let req = placeholder_request(&q, &node, 12);
        assert_eq!(req.title, "Blog");
        assert_eq!(req.url, "/blog");
        assert_eq!(req.menus, 4);
        assert_eq!(req.parent, 12);
        assert_eq!(req.menu_order, 0);
    }

    #[test]
    fn test_placeholder_request_fills_blank_fields() {
        let q = MenuQuery::all_items(4);
        let mut node = NavItemNode::new("a", "  ", "/");
        node.url = None;
        let req = placeholder_request(&q, &node, 0);
        assert_eq!(req.title, PLACEHOLDER);
        assert_eq!(req.url, PLACEHOLDER);
    }
}
