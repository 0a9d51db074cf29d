use codeatlas_core::{NodeId, RelationshipKind};
use codeatlas_store::GraphSnapshot;
use serde::Serialize;

/// Entry points, hubs, and leaves, computed fresh on every call, never
/// cached. Categories are not mutually exclusive.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Categories {
    pub entry_points: Vec<NodeId>,
    pub hubs: Vec<NodeId>,
    pub leaves: Vec<NodeId>,
}

fn calls_degree(snapshot: &GraphSnapshot, id: &NodeId) -> (usize, usize) {
    let callers = snapshot.incoming(id).iter().filter(|r| r.kind == RelationshipKind::Calls).count();
    let callees = snapshot.outgoing(id).iter().filter(|r| r.kind == RelationshipKind::Calls).count();
    (callers, callees)
}

/// `entryPoint`: zero `calls` callers, at least one `calls` callee.
/// `leaf`: zero `calls` callees, at least one `calls` caller.
/// `hub`: total `calls` degree (`callers + callees`) >= `hub_threshold`.
pub fn categorize(snapshot: &GraphSnapshot, hub_threshold: u32) -> Categories {
    let mut categories = Categories::default();
    for node in snapshot.nodes() {
        let (callers, callees) = calls_degree(snapshot, &node.id);
        if callers == 0 && callees >= 1 {
            categories.entry_points.push(node.id.clone());
        }
        if callees == 0 && callers >= 1 {
            categories.leaves.push(node.id.clone());
        }
        if (callers + callees) as u32 >= hub_threshold {
            categories.hubs.push(node.id.clone());
        }
    }
    categories.entry_points.sort();
    categories.hubs.sort();
    categories.leaves.sort();
    categories
}
