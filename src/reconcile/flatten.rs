use super::correlate::IdCorrelator;
use crate::models::NavItemNode;

/// One node of the tree placed in the flat, server-shaped list.
#[derive(Clone, Debug, PartialEq)]
pub struct FlatEntry<'t> {
    pub node: &'t NavItemNode,
    /// Server id of the parent node; 0 at the top level or when the parent has no record.
    pub parent_id: u64,
    /// 1-based index among siblings.
    pub position: u32,
}

/// Pre-order flattening of the items under the navigation container.
///
/// Positions are recomputed from tree order on every call; whatever `menu_order` the
/// server currently holds is ignored.
pub fn flatten<'t>(items: &'t [NavItemNode], correlator: &IdCorrelator<'_>) -> Vec<FlatEntry<'t>> {
    let mut out = Vec::new();
    walk(items, 0, correlator, &mut out);
    out
}

fn walk<'t>(
    items: &'t [NavItemNode],
    parent_id: u64,
    correlator: &IdCorrelator<'_>,
    out: &mut Vec<FlatEntry<'t>>,
) {
    for (index, node) in items.iter().enumerate() {
        out.push(FlatEntry {
            node,
            parent_id,
            position: index as u32 + 1,
        });
        // Children link to this node's server id, resolved before descending.
        walk(&node.children, correlator.server_id(&node.client_id), correlator, out);
    }
}
