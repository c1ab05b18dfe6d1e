use crate::models::{ClientId, IdMapping, MenuItem};
use serde_json::{Map, Value};
use std::collections::HashMap;

/// Fields the REST layer attaches for hypermedia only; never echoed back.
const TRANSPORT_FIELDS: &[&str] = &["_links"];

/// Reverse index from editor node to the server record it was loaded from.
///
/// Built from the current record list and the externally kept server-id -> client-id
/// mapping. Records the mapping doesn't mention, and mapping entries whose record is
/// gone, are simply absent.
#[derive(Clone, Debug, Default)]
pub struct IdCorrelator<'a> {
    by_client: HashMap<&'a ClientId, &'a MenuItem>,
}

impl<'a> IdCorrelator<'a> {
    pub fn new(records: &'a [MenuItem], mapping: &'a IdMapping) -> Self {
        let mut by_client = HashMap::with_capacity(records.len());
        for record in records {
            if let Some(client_id) = mapping.get(&record.id) {
                by_client.insert(client_id, record);
            }
        }
        Self { by_client }
    }

    pub fn lookup(&self, client_id: &ClientId) -> Option<&'a MenuItem> {
        self.by_client.get(client_id).copied()
    }

    /// Server id for a node, 0 when the node has no record yet.
    pub fn server_id(&self, client_id: &ClientId) -> u64 {
        self.lookup(client_id).map(|r| r.id).unwrap_or(0)
    }

    /// The node's record as a JSON object without transport metadata; empty for a node
    /// that has no record yet.
    pub fn fields(&self, client_id: &ClientId) -> Map<String, Value> {
        let Some(record) = self.lookup(client_id) else {
            return Map::new();
        };

        let mut fields = match serde_json::to_value(record) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        };
        for key in TRANSPORT_FIELDS {
            fields.remove(*key);
        }
        fields
    }

    pub fn len(&self) -> usize {
        self.by_client.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_client.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record_with_links(id: u64) -> MenuItem {
        let mut item = MenuItem::new(id, 0, 1);
        item.extra.insert("_links".to_string(), json!({"self": [{"href": "x"}]}));
        item.extra.insert("title".to_string(), json!({"raw": "Home"}));
        item
    }

    #[test]
    fn test_lookup_follows_mapping() {
        let records = vec![MenuItem::new(1, 0, 1), MenuItem::new(2, 1, 1)];
        let mapping: IdMapping = [(1, "a".into()), (2, "b".into())].into_iter().collect();
        let c = IdCorrelator::new(&records, &mapping);

        assert_eq!(c.lookup(&"a".into()).map(|r| r.id), Some(1));
        assert_eq!(c.server_id(&"b".into()), 2);
        assert_eq!(c.len(), 2);
    }

    #[test]
    fn test_unmapped_node_gets_placeholder() {
        let records = vec![MenuItem::new(1, 0, 1)];
        let mapping = IdMapping::new();
        let c = IdCorrelator::new(&records, &mapping);

        let new_node: ClientId = "fresh".into();
        assert!(c.lookup(&new_node).is_none());
        assert_eq!(c.server_id(&new_node), 0);
        assert!(c.fields(&new_node).is_empty());
        assert!(c.is_empty());
    }

    #[test]
    fn test_mapping_entry_without_record_is_ignored() {
        let records = vec![];
        let mapping: IdMapping = [(9, "ghost".into())].into_iter().collect();
        let c = IdCorrelator::new(&records, &mapping);
        assert!(c.lookup(&"ghost".into()).is_none());
    }

    #[test]
    fn test_fields_strip_links_but_keep_the_rest() {
        let records = vec![record_with_links(4)];
        let mapping: IdMapping = [(4, "a".into())].into_iter().collect();
        let c = IdCorrelator::new(&records, &mapping);

        let fields = c.fields(&"a".into());
        assert!(!fields.contains_key("_links"));
        assert_eq!(fields["id"], 4);
        assert_eq!(fields["title"]["raw"], "Home");
    }
}
