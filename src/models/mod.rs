use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Which menu's items a fetch/save is scoped to.
///
/// Mirrors the REST collection query (`menus=<id>&per_page=<n>`); `per_page = -1` asks
/// for every item in one page.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash)]
pub struct MenuQuery {
    pub menus: u64,
    pub per_page: i64,
}

impl MenuQuery {
    pub fn all_items(menus: u64) -> Self {
        Self {
            menus,
            per_page: -1,
        }
    }
}

/// Editor-local node identity. Lives only as long as the editing session and never
/// crosses the wire.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct ClientId(pub String);

impl ClientId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ClientId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// One node of the navigation tree being edited.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct NavItemNode {
    pub client_id: ClientId,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub children: Vec<NavItemNode>,
}

impl NavItemNode {
    pub fn new(client_id: impl Into<String>, label: &str, url: &str) -> Self {
        Self {
            client_id: ClientId::new(client_id),
            label: Some(label.to_string()),
            url: Some(url.to_string()),
            children: vec![],
        }
    }

    pub fn with_children(mut self, children: Vec<NavItemNode>) -> Self {
        self.children = children;
        self
    }
}

/// A persisted menu item as returned by the menu-items REST collection.
///
/// Only the fields reconciliation reads are typed; everything else (`title`, `url`,
/// `status`, `menus`, `meta`, `_links`, ...) rides along untouched in `extra`.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct MenuItem {
    pub id: u64,

    /// Parent item id. Root items use 0.
    #[serde(default)]
    pub parent: u64,

    /// 1-based position among siblings.
    #[serde(default)]
    pub menu_order: u32,

    #[serde(default)]
    pub classes: Vec<String>,

    #[serde(default)]
    pub xfn: Vec<String>,

    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl MenuItem {
    pub fn new(id: u64, parent: u64, menu_order: u32) -> Self {
        Self {
            id,
            parent,
            menu_order,
            classes: vec![],
            xfn: vec![],
            extra: serde_json::Map::new(),
        }
    }
}

/// server item id -> editor node id, for one query's editing session.
pub type IdMapping = HashMap<u64, ClientId>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_menu_item_keeps_unknown_fields() {
        let json = r#"{
            "id": 12,
            "parent": 3,
            "menu_order": 2,
            "classes": ["a", "b"],
            "title": {"raw": "About", "rendered": "About"},
            "_links": {"self": []}
        }"#;
        let item: MenuItem = serde_json::from_str(json).expect("menu item should parse");
        assert_eq!(item.id, 12);
        assert_eq!(item.parent, 3);
        assert_eq!(item.menu_order, 2);
        assert_eq!(item.classes, vec!["a", "b"]);
        assert!(item.xfn.is_empty());
        assert_eq!(item.extra["title"]["raw"], "About");
        assert!(item.extra.contains_key("_links"));
    }

    #[test]
    fn test_menu_item_defaults_missing_hierarchy_fields() {
        let item: MenuItem = serde_json::from_str(r#"{"id": 7}"#).expect("should parse");
        assert_eq!(item.parent, 0);
        assert_eq!(item.menu_order, 0);
    }

    #[test]
    fn test_nav_item_node_deserializes_nested_children() {
        let json = r#"{
            "client_id": "a",
            "label": "Home",
            "children": [{"client_id": "b", "url": "/about"}]
        }"#;
        let node: NavItemNode = serde_json::from_str(json).expect("node should parse");
        assert_eq!(node.client_id.as_str(), "a");
        assert!(node.url.is_none());
        assert_eq!(node.children.len(), 1);
        assert_eq!(node.children[0].url.as_deref(), Some("/about"));
        assert!(node.children[0].label.is_none());
    }

    #[test]
    fn test_all_items_query() {
        let q = MenuQuery::all_items(5);
        assert_eq!(q.menus, 5);
        assert_eq!(q.per_page, -1);
    }
}
