use super::correlate::IdCorrelator;
use super::flatten::FlatEntry;
use crate::models::MenuItem;
use crate::util::join_tokens;
use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Customizer setting id prefix for menu items.
pub const SETTING_PREFIX: &str = "nav_menu_item";

/// Fields of a fetched record the customizer must not receive back.
const SERVER_ONLY_FIELDS: &[&str] = &["_links", "menus", "meta"];

pub fn setting_key(id: u64) -> String {
    format!("{SETTING_PREFIX}[{id}]")
}

#[derive(Clone, Debug, PartialEq)]
pub enum PayloadEntry {
    Upsert(Map<String, Value>),
    /// Serialized as the literal `false`.
    Delete,
}

impl Serialize for PayloadEntry {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            PayloadEntry::Upsert(fields) => fields.serialize(serializer),
            PayloadEntry::Delete => serializer.serialize_bool(false),
        }
    }
}

/// Complete `customized` value for one save: every live node as an upsert and every
/// prior record that fell out of the tree as a deletion.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DiffPayload {
    entries: BTreeMap<String, PayloadEntry>,
}

impl DiffPayload {
    pub fn get(&self, key: &str) -> Option<&PayloadEntry> {
        self.entries.get(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &PayloadEntry)> {
        self.entries.iter()
    }

    pub fn upsert_keys(&self) -> impl Iterator<Item = &str> {
        self.entries
            .iter()
            .filter(|(_, e)| matches!(e, PayloadEntry::Upsert(_)))
            .map(|(k, _)| k.as_str())
    }

    pub fn deletion_keys(&self) -> impl Iterator<Item = &str> {
        self.entries
            .iter()
            .filter(|(_, e)| matches!(e, PayloadEntry::Delete))
            .map(|(k, _)| k.as_str())
    }

    pub fn to_json_string(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

impl Serialize for DiffPayload {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (k, v) in &self.entries {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

/// Builds the customizer payload for one menu.
#[derive(Clone, Debug)]
pub struct DiffPayloadBuilder {
    menu_id: u64,
}

impl DiffPayloadBuilder {
    pub fn new(menu_id: u64) -> Self {
        Self { menu_id }
    }

    pub fn build(
        &self,
        entries: &[FlatEntry<'_>],
        correlator: &IdCorrelator<'_>,
        prior: &[MenuItem],
    ) -> DiffPayload {
        let mut payload = DiffPayload::default();

        for entry in entries {
            let id = correlator.server_id(&entry.node.client_id);
            if id == 0 {
                tracing::warn!(
                    menu = self.menu_id,
                    client_id = %entry.node.client_id,
                    "menu item has no server record; sending as new"
                );
            }
            let fields = self.upsert_fields(entry, correlator);
            payload
                .entries
                .insert(setting_key(id), PayloadEntry::Upsert(fields));
        }

        for record in prior {
            payload
                .entries
                .entry(setting_key(record.id))
                .or_insert(PayloadEntry::Delete);
        }

        payload
    }

    fn upsert_fields(&self, entry: &FlatEntry<'_>, correlator: &IdCorrelator<'_>) -> Map<String, Value> {
        let record = correlator.lookup(&entry.node.client_id);
        let mut fields = correlator.fields(&entry.node.client_id);
        for key in SERVER_ONLY_FIELDS {
            fields.remove(*key);
        }

        let classes = record.map(|r| join_tokens(&r.classes)).unwrap_or_default();
        let xfn = record.map(|r| join_tokens(&r.xfn)).unwrap_or_default();

        fields.insert("position".into(), entry.position.into());
        set_or_remove(&mut fields, "title", entry.node.label.as_deref());
        set_or_remove(&mut fields, "url", entry.node.url.as_deref());
        fields.insert("original_title".into(), "".into());
        fields.insert("classes".into(), classes.into());
        fields.insert("xfn".into(), xfn.into());
        fields.insert("nav_menu_term_id".into(), self.menu_id.into());
        fields.insert("menu_item_parent".into(), entry.parent_id.into());
        fields.insert("status".into(), "publish".into());
        fields.insert("_invalid".into(), false.into());
        fields
    }
}

fn set_or_remove(fields: &mut Map<String, Value>, key: &str, value: Option<&str>) {
    match value {
        Some(v) => {
            fields.insert(key.to_string(), v.into());
        }
        None => {
            fields.remove(key);
        }
    }
}
