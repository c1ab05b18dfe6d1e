//! Tree -> flat reconciliation: correlate editor nodes with server records, flatten the
//! tree into (node, parent, position) rows and turn those into the customizer payload.

pub mod correlate;
pub mod flatten;
pub mod payload;

pub use correlate::IdCorrelator;
pub use flatten::{flatten, FlatEntry};
pub use payload::{setting_key, DiffPayload, DiffPayloadBuilder, PayloadEntry, SETTING_PREFIX};

use crate::models::{IdMapping, MenuItem, NavItemNode};

/// Correlate, flatten and diff in one go.
pub fn compute_payload(
    menu_id: u64,
    items: &[NavItemNode],
    prior: &[MenuItem],
    mapping: &IdMapping,
) -> DiffPayload {
    let correlator = IdCorrelator::new(prior, mapping);
    let entries = flatten(items, &correlator);
    DiffPayloadBuilder::new(menu_id).build(&entries, &correlator, prior)
}
