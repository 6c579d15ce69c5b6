use super::node::{Node, NodeId, NodeKey, NodeKind, NodeVariant};
use crate::error::TreeError;
use std::collections::HashMap;

/// Ordered set of sibling nodes
///
/// Insertion order is display order. Keys are unique within one collection.
#[derive(Debug, Clone, Default)]
pub struct NodeCollection {
    order: Vec<NodeId>,
    by_key: HashMap<NodeKey, NodeId>,
}

impl NodeCollection {
    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Node IDs in display order
    pub fn ids(&self) -> &[NodeId] {
        &self.order
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = NodeId> + '_ {
        self.order.iter().copied()
    }

    pub fn get(&self, key: &NodeKey) -> Option<NodeId> {
        self.by_key.get(key).copied()
    }

    pub fn contains_key(&self, key: &NodeKey) -> bool {
        self.by_key.contains_key(key)
    }

    fn insert(&mut self, key: NodeKey, id: NodeId) -> Result<(), TreeError> {
        if self.by_key.contains_key(&key) {
            return Err(TreeError::DuplicateIdentity(key));
        }
        self.by_key.insert(key, id);
        self.order.push(id);
        Ok(())
    }

    fn clear(&mut self) {
        self.order.clear();
        self.by_key.clear();
    }
}

/// A forest of nodes: the root collection plus every node reachable from it
///
/// Nodes are created and attached in one step, so every node belongs to
/// exactly one collection for its whole life. A tree swaps in a freshly
/// built `Nodes` on every reload instead of patching this one.
#[derive(Debug, Default)]
pub struct Nodes {
    /// All nodes indexed by ID
    nodes: HashMap<NodeId, Node>,
    /// Top level collection
    roots: NodeCollection,
}

impl Nodes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a node under `parent` (or as a root)
    ///
    /// # Errors
    ///
    /// `DuplicateIdentity` when a sibling already has the same key, and
    /// `NodeNotFound` when `parent` is not in this forest.
    pub fn add_node(&mut self, parent: Option<NodeId>, kind: NodeKind) -> Result<NodeId, TreeError> {
        let node = Node::new(kind, parent);
        let id = node.id;
        let key = node.key();

        let siblings = match parent {
            Some(parent_id) => {
                &mut self
                    .nodes
                    .get_mut(&parent_id)
                    .ok_or(TreeError::NodeNotFound(parent_id))?
                    .children
            }
            None => &mut self.roots,
        };
        siblings.insert(key, id)?;

        self.nodes.insert(id, node);
        Ok(id)
    }

    /// Append several nodes under `parent`, preserving input order
    pub fn add_nodes<I>(&mut self, parent: Option<NodeId>, kinds: I) -> Result<Vec<NodeId>, TreeError>
    where
        I: IntoIterator<Item = NodeKind>,
    {
        kinds
            .into_iter()
            .map(|kind| self.add_node(parent, kind))
            .collect()
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    pub(crate) fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(&id)
    }

    pub fn roots(&self) -> &NodeCollection {
        &self.roots
    }

    /// Number of top level nodes
    pub fn root_count(&self) -> usize {
        self.roots.len()
    }

    /// Number of nodes in the whole forest
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Find a child of `parent` (or a root) by identity
    pub fn find(&self, parent: Option<NodeId>, key: &NodeKey) -> Option<&Node> {
        let siblings = match parent {
            Some(parent_id) => &self.get(parent_id)?.children,
            None => &self.roots,
        };
        siblings.get(key).and_then(|id| self.get(id))
    }

    /// Drop every node
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.roots.clear();
    }

    /// Pre-order, depth-first walk over every node
    ///
    /// The walk is lazy and reads the forest as it is when iterated, so a
    /// fresh call always reflects structural changes made since the last one.
    pub fn depth_first(&self) -> DepthFirst<'_> {
        DepthFirst {
            nodes: self,
            stack: self.roots.iter().rev().collect(),
        }
    }

    /// Pre-order walk over `id` and everything below it
    pub fn subtree(&self, id: NodeId) -> DepthFirst<'_> {
        DepthFirst {
            nodes: self,
            stack: vec![id],
        }
    }

    /// Pre-order walk restricted to one variant
    pub fn depth_enumerate<'a, T: NodeVariant + 'a>(
        &'a self,
    ) -> impl Iterator<Item = (NodeId, &'a T)> + 'a {
        self.depth_first()
            .filter_map(|node| T::from_kind(&node.kind).map(|variant| (node.id, variant)))
    }

    /// Chain of IDs from the root down to `id` (inclusive)
    pub fn ancestors(&self, id: NodeId) -> Vec<NodeId> {
        let mut ancestors = Vec::new();
        let mut current = Some(id);

        while let Some(node_id) = current {
            ancestors.push(node_id);
            current = self.get(node_id).and_then(|n| n.parent);
        }

        ancestors.reverse();
        ancestors
    }

    /// Depth of a node (roots are 0)
    pub fn depth(&self, id: NodeId) -> usize {
        self.ancestors(id).len().saturating_sub(1)
    }

    /// Display labels joined from the root down to `id`
    pub fn label_path(&self, id: NodeId) -> Vec<String> {
        self.ancestors(id)
            .into_iter()
            .filter_map(|node_id| self.get(node_id))
            .map(|node| node.display_text())
            .collect()
    }
}

/// Iterator returned by [`Nodes::depth_first`]
pub struct DepthFirst<'a> {
    nodes: &'a Nodes,
    stack: Vec<NodeId>,
}

impl<'a> Iterator for DepthFirst<'a> {
    type Item = &'a Node;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(id) = self.stack.pop() {
            if let Some(node) = self.nodes.get(id) {
                self.stack.extend(node.children.iter().rev());
                return Some(node);
            }
        }
        None
    }
}
