use codeatlas_core::{page, Relationship};
use codeatlas_store::GraphSnapshot;

/// All `isSeam` edges, ordered by `(sourceLanguage, targetLanguage,
/// sourceId)` and paginated per the shared `(offset, limit)` contract.
pub fn seams(snapshot: &GraphSnapshot, offset: usize, limit: usize) -> (Vec<Relationship>, usize) {
    let mut edges: Vec<Relationship> = Vec::new();
    for node in snapshot.nodes() {
        for rel in snapshot.outgoing(&node.id) {
            if rel.is_seam {
                edges.push(rel.clone());
            }
        }
    }
    edges.sort_by(|a, b| {
        let lang = |id: &codeatlas_core::NodeId| snapshot.get_node(id).map(|n| n.language.clone()).unwrap_or_default();
        (lang(&a.source_id), lang(&a.target_id), a.source_id.clone())
            .cmp(&(lang(&b.source_id), lang(&b.target_id), b.source_id.clone()))
    });
    page(edges, offset, limit)
}
