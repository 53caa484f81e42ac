//! Arena-backed hierarchy trees.

use std::fmt;
use std::sync::Arc;

use crate::hierarchy::TraceRect;
use crate::properties::{PropertiesProvider, PropertyTree};
use crate::util::Result;

/// Index of a node within its [`HierarchyTree`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    #[inline]
    pub fn index(self) -> usize {
        self.0
    }
}

/// Record identity of a non-root node.
///
/// `occurrence` tells apart records sharing the same id within one
/// snapshot; the first one seen is occurrence 0.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct NodeIdentity {
    pub id: i64,
    pub name: String,
    pub occurrence: usize,
}

impl NodeIdentity {
    pub fn new(id: i64, name: impl Into<String>, occurrence: usize) -> Self {
        Self { id, name: name.into(), occurrence }
    }
}

impl fmt::Display for NodeIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.id, self.name)?;
        if self.occurrence > 0 {
            write!(f, " duplicate({})", self.occurrence)?;
        }
        Ok(())
    }
}

/// One node of a hierarchy tree.
#[derive(Debug)]
pub struct HierarchyNode {
    pub(crate) id_string: String,
    pub(crate) identity: Option<NodeIdentity>,
    pub(crate) provider: PropertiesProvider,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
    pub(crate) relative_parent: Option<NodeId>,
    pub(crate) relative_children: Vec<NodeId>,
    pub(crate) rects: Vec<TraceRect>,
}

impl HierarchyNode {
    pub(crate) fn new(id_string: String, identity: Option<NodeIdentity>, provider: PropertiesProvider) -> Self {
        Self {
            id_string,
            identity,
            provider,
            parent: None,
            children: Vec::new(),
            relative_parent: None,
            relative_children: Vec::new(),
            rects: Vec::new(),
        }
    }

    /// Unique id string, e.g. `"7 StatusBar duplicate(1)"`.
    #[inline]
    pub fn id(&self) -> &str {
        &self.id_string
    }

    /// Record identity; `None` for the root.
    #[inline]
    pub fn identity(&self) -> Option<&NodeIdentity> {
        self.identity.as_ref()
    }

    pub fn name(&self) -> &str {
        self.identity.as_ref().map_or(&self.id_string, |i| &i.name)
    }

    /// Occurrence index among records with the same id.
    pub fn occurrence(&self) -> usize {
        self.identity.as_ref().map_or(0, |i| i.occurrence)
    }

    #[inline]
    pub fn is_root(&self) -> bool {
        self.identity.is_none()
    }

    pub fn provider(&self) -> &PropertiesProvider {
        &self.provider
    }

    pub fn eager_properties(&self) -> Result<Arc<PropertyTree>> {
        self.provider.eager_properties()
    }

    pub fn lazy_properties(&self) -> Result<Arc<PropertyTree>> {
        self.provider.lazy_properties()
    }

    /// Eager tree if it materialized.
    pub fn eager(&self) -> Option<&PropertyTree> {
        self.provider.eager()
    }

    #[inline]
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    #[inline]
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Node this one is z-ordered relative to, if any.
    #[inline]
    pub fn relative_parent(&self) -> Option<NodeId> {
        self.relative_parent
    }

    #[inline]
    pub fn relative_children(&self) -> &[NodeId] {
        &self.relative_children
    }

    #[inline]
    pub fn rects(&self) -> &[TraceRect] {
        &self.rects
    }
}

/// A snapshot's node tree.
///
/// The shape is fixed once built: computations may annotate nodes (eager
/// properties, rects) but cannot add, remove or move them.
#[derive(Debug)]
pub struct HierarchyTree {
    pub(crate) nodes: Vec<HierarchyNode>,
}

impl HierarchyTree {
    /// The synthetic root.
    #[inline]
    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// Number of nodes, root included.
    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Always false; every tree has a root.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Node by id. Ids come from this tree, so lookups cannot miss.
    #[inline]
    pub fn node(&self, id: NodeId) -> &HierarchyNode {
        &self.nodes[id.0]
    }

    pub fn get(&self, id: NodeId) -> Option<&HierarchyNode> {
        self.nodes.get(id.0)
    }

    /// All node ids in arena (input) order.
    pub fn ids(&self) -> impl Iterator<Item = NodeId> {
        (0..self.nodes.len()).map(NodeId)
    }

    /// Node ids in depth-first pre-order from the root.
    pub fn preorder(&self) -> Vec<NodeId> {
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut stack = vec![self.root()];
        while let Some(id) = stack.pop() {
            order.push(id);
            stack.extend(self.node(id).children.iter().rev().copied());
        }
        order
    }

    /// Depth of a node; the root is at depth 0.
    pub fn depth(&self, id: NodeId) -> usize {
        let mut depth = 0;
        let mut current = self.node(id).parent;
        while let Some(parent) = current {
            depth += 1;
            current = self.node(parent).parent;
        }
        depth
    }

    /// Find a node by id string.
    pub fn find(&self, id_string: &str) -> Option<NodeId> {
        self.nodes.iter().position(|n| n.id_string == id_string).map(NodeId)
    }

    /// Find a node by record id and occurrence.
    pub fn find_record(&self, id: i64, occurrence: usize) -> Option<NodeId> {
        self.nodes
            .iter()
            .position(|n| {
                n.identity
                    .as_ref()
                    .is_some_and(|i| i.id == id && i.occurrence == occurrence)
            })
            .map(NodeId)
    }

    /// Mutable eager properties of a node, for annotation.
    pub fn eager_properties_mut(&mut self, id: NodeId) -> Option<&mut PropertyTree> {
        self.nodes.get_mut(id.0).and_then(|n| n.provider.eager_mut())
    }

    /// Replace the rects of a node.
    pub fn set_rects(&mut self, id: NodeId, rects: Vec<TraceRect>) {
        if let Some(node) = self.nodes.get_mut(id.0) {
            node.rects = rects;
        }
    }

    /// Indented text rendering, one node per line.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for id in self.preorder() {
            let node = self.node(id);
            out.push_str(&"  ".repeat(self.depth(id)));
            out.push_str(node.id());
            out.push('\n');
        }
        out
    }
}
