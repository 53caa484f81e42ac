//! Assembly of hierarchy trees from flat, parent-linked records.

use std::collections::HashMap;

use crate::hierarchy::{ComputationList, HierarchyNode, HierarchyTree, NodeId, NodeIdentity};
use crate::properties::{PropertiesProvider, PropertyTree};
use crate::util::{Error, Result};

/// Parent id meaning "attached to the root".
pub const NO_PARENT: i64 = -1;

/// Tree assembly policy.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HierarchyConfig {
    /// Attach nodes with an unknown parent (or in a parent cycle) under
    /// the root instead of failing the snapshot.
    pub tolerate_orphans: bool,
}

impl Default for HierarchyConfig {
    fn default() -> Self {
        Self { tolerate_orphans: true }
    }
}

/// Reads structural links from a node's eager properties.
pub trait NodeLinks {
    /// Parent record id; `None` or [`NO_PARENT`] attach to the root.
    fn parent_id(&self, eager: &PropertyTree) -> Option<i64>;

    /// Record id this node is z-ordered relative to.
    fn relative_parent_id(&self, eager: &PropertyTree) -> Option<i64>;
}

/// Assigns occurrence indexes to records sharing an id.
#[derive(Debug, Default)]
pub struct DuplicateCounter {
    seen: HashMap<i64, usize>,
}

impl DuplicateCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Occurrence of the next record with `id` (0 for the first).
    pub fn next(&mut self, id: i64) -> usize {
        let count = self.seen.entry(id).or_insert(0);
        let occurrence = *count;
        *count += 1;
        occurrence
    }
}

/// Builder for [`HierarchyTree`].
pub struct HierarchyTreeBuilder {
    config: HierarchyConfig,
    root: Option<(String, PropertiesProvider)>,
    children: Vec<(NodeIdentity, PropertiesProvider)>,
    computations: ComputationList,
}

impl HierarchyTreeBuilder {
    pub fn new(config: HierarchyConfig) -> Self {
        Self {
            config,
            root: None,
            children: Vec::new(),
            computations: &[],
        }
    }

    /// Root node id string and its (entry-level) provider.
    pub fn set_root(mut self, id_string: impl Into<String>, provider: PropertiesProvider) -> Self {
        self.root = Some((id_string.into(), provider));
        self
    }

    /// Non-root records in input order.
    pub fn set_children(mut self, children: Vec<(NodeIdentity, PropertiesProvider)>) -> Self {
        self.children = children;
        self
    }

    pub fn set_computations(mut self, computations: ComputationList) -> Self {
        self.computations = computations;
        self
    }

    /// Assemble the tree, then run the computations in order.
    pub fn build(self, links: &dyn NodeLinks) -> Result<HierarchyTree> {
        let (root_id, root_provider) = self
            .root
            .ok_or_else(|| Error::other("hierarchy root not set"))?;

        let mut nodes = Vec::with_capacity(self.children.len() + 1);
        nodes.push(HierarchyNode::new(root_id, None, root_provider));

        // (record id, occurrence) -> node
        let mut by_record: HashMap<(i64, usize), NodeId> = HashMap::with_capacity(self.children.len());
        for (identity, provider) in self.children {
            let id = NodeId(nodes.len());
            by_record.insert((identity.id, identity.occurrence), id);
            nodes.push(HierarchyNode::new(identity.to_string(), Some(identity), provider));
        }

        let mut tree = HierarchyTree { nodes };
        link_parents(&mut tree, &by_record, links, self.config)?;
        link_relatives(&mut tree, &by_record, links);

        for computation in self.computations {
            let _span = tracing::debug_span!("computation", pass = computation.name()).entered();
            computation.execute(&mut tree)?;
        }
        Ok(tree)
    }
}

/// Resolve parents, then attach everything reachable from the root.
/// Unreachable nodes sit in parent cycles and are broken like orphans.
fn link_parents(
    tree: &mut HierarchyTree,
    by_record: &HashMap<(i64, usize), NodeId>,
    links: &dyn NodeLinks,
    config: HierarchyConfig,
) -> Result<()> {
    let root = tree.root();
    let count = tree.nodes.len();

    // Parent index, one pass in input order
    let mut children_of: Vec<Vec<NodeId>> = vec![Vec::new(); count];
    for index in 1..count {
        let node = &tree.nodes[index];
        let parent_id = node.provider.eager().and_then(|eager| links.parent_id(eager));
        let parent = match parent_id {
            None | Some(NO_PARENT) => root,
            Some(pid) => match by_record.get(&(pid, 0)) {
                Some(&parent) if parent.0 != index => parent,
                _ => orphan(node, pid, config)?,
            },
        };
        children_of[parent.0].push(NodeId(index));
    }

    let mut attached = vec![false; count];
    attach_from(root, &children_of, &mut attached, tree);

    for index in 1..count {
        if attached[index] {
            continue;
        }
        let node = &tree.nodes[index];
        let pid = node
            .provider
            .eager()
            .and_then(|eager| links.parent_id(eager))
            .unwrap_or(NO_PARENT);
        if !config.tolerate_orphans {
            return Err(Error::OrphanNode { node: node.id_string.clone(), parent: pid });
        }
        tracing::warn!(node = %node.id_string, parent = pid, "parent cycle; attaching under root");

        let id = NodeId(index);
        for list in children_of.iter_mut() {
            list.retain(|&c| c != id);
        }
        children_of[root.0].push(id);
        tree.nodes[index].parent = Some(root);
        tree.nodes[root.0].children.push(id);
        attached[index] = true;
        attach_from(id, &children_of, &mut attached, tree);
    }
    Ok(())
}

fn orphan(node: &HierarchyNode, parent: i64, config: HierarchyConfig) -> Result<NodeId> {
    if !config.tolerate_orphans {
        return Err(Error::OrphanNode { node: node.id_string.clone(), parent });
    }
    tracing::warn!(node = %node.id_string, parent, "orphan node; attaching under root");
    Ok(NodeId(0))
}

/// Depth-first attach with an explicit stack.
fn attach_from(start: NodeId, children_of: &[Vec<NodeId>], attached: &mut [bool], tree: &mut HierarchyTree) {
    attached[start.0] = true;
    let mut stack = vec![start];
    while let Some(parent) = stack.pop() {
        for &child in &children_of[parent.0] {
            if attached[child.0] {
                continue;
            }
            attached[child.0] = true;
            tree.nodes[child.0].parent = Some(parent);
            tree.nodes[parent.0].children.push(child);
            stack.push(child);
        }
    }
}

fn link_relatives(tree: &mut HierarchyTree, by_record: &HashMap<(i64, usize), NodeId>, links: &dyn NodeLinks) {
    for index in 1..tree.nodes.len() {
        let Some(rid) = tree.nodes[index]
            .provider
            .eager()
            .and_then(|eager| links.relative_parent_id(eager))
        else {
            continue;
        };
        match by_record.get(&(rid, 0)) {
            Some(&target) if target.0 != index => {
                tree.nodes[index].relative_parent = Some(target);
                tree.nodes[target.0].relative_children.push(NodeId(index));
            }
            _ => tracing::debug!(node = %tree.nodes[index].id_string, relative = rid, "relative parent not found"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::properties::{PropertiesProviderBuilder, PropertySource};

    struct TestLinks;

    impl NodeLinks for TestLinks {
        fn parent_id(&self, eager: &PropertyTree) -> Option<i64> {
            eager.child_i64("parent")
        }

        fn relative_parent_id(&self, eager: &PropertyTree) -> Option<i64> {
            eager.child_i64("relativeOf")
        }
    }

    fn provider(parent: i64) -> PropertiesProvider {
        let mut tree = PropertyTree::node("", PropertySource::Proto);
        tree.add_child(PropertyTree::new("parent", parent, PropertySource::Proto));
        PropertiesProviderBuilder::new().set_eager_properties(tree).build()
    }

    fn build(records: &[(i64, i64)], config: HierarchyConfig) -> Result<HierarchyTree> {
        let mut counter = DuplicateCounter::new();
        let children = records
            .iter()
            .map(|&(id, parent)| {
                let identity = NodeIdentity::new(id, format!("L{}", id), counter.next(id));
                (identity, provider(parent))
            })
            .collect();
        HierarchyTreeBuilder::new(config)
            .set_root("root", provider(NO_PARENT))
            .set_children(children)
            .build(&TestLinks)
    }

    #[test]
    fn test_parent_links() {
        let tree = build(&[(1, -1), (2, 1), (3, 1), (4, 2)], HierarchyConfig::default()).unwrap();
        assert_eq!(tree.len(), 5);
        let one = tree.find("1 L1").unwrap();
        assert_eq!(tree.node(one).children().len(), 2);
        let four = tree.find("4 L4").unwrap();
        assert_eq!(tree.depth(four), 3);
        assert_eq!(tree.preorder().len(), 5);
    }

    #[test]
    fn test_children_before_parent_in_input() {
        let tree = build(&[(2, 1), (1, -1)], HierarchyConfig::default()).unwrap();
        let two = tree.find("2 L2").unwrap();
        assert_eq!(tree.node(two).parent(), tree.find("1 L1"));
    }

    #[test]
    fn test_orphans() {
        let tree = build(&[(1, -1), (2, 99)], HierarchyConfig::default()).unwrap();
        let two = tree.find("2 L2").unwrap();
        assert_eq!(tree.node(two).parent(), Some(tree.root()));

        let err = build(&[(1, -1), (2, 99)], HierarchyConfig { tolerate_orphans: false }).unwrap_err();
        assert_eq!(err, Error::OrphanNode { node: "2 L2".to_string(), parent: 99 });
    }

    #[test]
    fn test_parent_cycle_broken() {
        let tree = build(&[(1, 2), (2, 1), (3, 3)], HierarchyConfig::default()).unwrap();
        assert_eq!(tree.preorder().len(), 4);
        for id in tree.ids().skip(1) {
            assert!(tree.node(id).parent().is_some());
        }
        assert!(build(&[(1, 2), (2, 1)], HierarchyConfig { tolerate_orphans: false }).is_err());
    }

    #[test]
    fn test_duplicates() {
        let tree = build(&[(7, -1), (7, -1), (8, 7)], HierarchyConfig::default()).unwrap();
        assert!(tree.find("7 L7").is_some());
        let dup = tree.find("7 L7 duplicate(1)").unwrap();
        assert_eq!(tree.node(dup).occurrence(), 1);

        let first = tree.find_record(7, 0).unwrap();
        let eight = tree.find("8 L8").unwrap();
        assert_eq!(tree.node(eight).parent(), Some(first));
    }

    #[test]
    fn test_duplicate_counter() {
        let mut counter = DuplicateCounter::new();
        assert_eq!(counter.next(5), 0);
        assert_eq!(counter.next(5), 1);
        assert_eq!(counter.next(6), 0);
    }
}
