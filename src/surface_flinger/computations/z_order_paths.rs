use crate::hierarchy::{Computation, HierarchyTree, NodeId};
use crate::properties::{PropertySource, PropertyTree};
use crate::surface_flinger::computations::ZOrderPath;
use crate::util::Result;

/// Writes `zOrderPath`: the z values from the root down to each layer.
///
/// A layer z-ordered relative to another one hangs under that layer's
/// path instead of its parent's. Paths compare element-wise, except that
/// a descendant whose next z is negative draws under its ancestor.
pub struct ZOrderPathsComputation;

/// Node whose path a layer extends.
fn z_parent(tree: &HierarchyTree, id: NodeId) -> Option<NodeId> {
    let node = tree.node(id);
    node.relative_parent().or(node.parent())
}

fn z_of(tree: &HierarchyTree, id: NodeId) -> i64 {
    tree.node(id).eager().and_then(|e| e.child_i64("z")).unwrap_or(0)
}

/// Paths of every layer. Each walk up the z parents stops at the first
/// layer whose path is already known. Paths of layers on a relative-z
/// cycle depend on where the walk entered it and are never reused.
fn all_paths(tree: &HierarchyTree) -> Vec<(NodeId, ZOrderPath)> {
    let mut known: Vec<Option<ZOrderPath>> = vec![None; tree.len()];
    let mut on_chain = vec![false; tree.len()];
    let mut chain: Vec<NodeId> = Vec::new();
    let mut paths = Vec::with_capacity(tree.len());

    for start in tree.ids() {
        if tree.node(start).is_root() {
            continue;
        }
        if let Some(path) = &known[start.index()] {
            paths.push((start, path.clone()));
            continue;
        }

        let mut path = ZOrderPath::new();
        let mut cycle_start = None;
        let mut current = Some(start);
        while let Some(id) = current {
            let node = tree.node(id);
            if node.is_root() {
                break;
            }
            if let Some(prefix) = &known[id.index()] {
                path = prefix.clone();
                break;
            }
            if on_chain[id.index()] {
                tracing::warn!(node = node.id(), "relative z-order cycle; truncating path");
                cycle_start = chain.iter().position(|&c| c == id);
                break;
            }
            on_chain[id.index()] = true;
            chain.push(id);
            current = z_parent(tree, id);
        }

        for (position, &id) in chain.iter().enumerate().rev() {
            path.push(z_of(tree, id));
            if cycle_start.map_or(true, |first| position < first) {
                known[id.index()] = Some(path.clone());
            }
        }
        for id in chain.drain(..) {
            on_chain[id.index()] = false;
        }
        paths.push((start, path));
    }
    paths
}

impl Computation for ZOrderPathsComputation {
    fn name(&self) -> &'static str {
        "z_order_paths"
    }

    fn execute(&self, tree: &mut HierarchyTree) -> Result<()> {
        for (id, path) in all_paths(tree) {
            let Some(eager) = tree.eager_properties_mut(id) else {
                continue;
            };
            let mut node = PropertyTree::node("zOrderPath", PropertySource::Calculated);
            for (i, z) in path.iter().enumerate() {
                node.add_child(PropertyTree::new(i.to_string(), *z, PropertySource::Calculated));
            }
            eager.add_child(node);
        }
        Ok(())
    }
}
