use crate::audit::node::{NodeArena, NodeId};

/// The alternate outcomes not yet ruled out, hardest first.
///
/// Expandable nodes with no assertion come first, then the remaining
/// expandable nodes by descending estimate. Leaves sit at the end in the
/// order they arrived. No node's tail is a suffix of another's.
#[derive(Debug, Default)]
pub(crate) struct Frontier {
    nodes: Vec<NodeId>,
}

impl Frontier {
    /// Insert `id` in its place in the ordering.
    pub fn insert_node(&mut self, arena: &NodeArena, id: NodeId) {
        let node = &arena[id];
        if !node.expandable {
            self.nodes.push(id);
        } else if !node.estimate.is_bounded() {
            self.nodes.insert(0, id);
        } else {
            let position = self
                .nodes
                .iter()
                .position(|&other| {
                    let other = &arena[other];
                    !other.expandable || other.estimate <= node.estimate
                })
                .unwrap_or(self.nodes.len());
            self.nodes.insert(position, id);
        }
    }

    /// Remove every node that `id` covers (its descendents, and any earlier
    /// copy of `id` itself), then insert `id`. Returns how many were removed.
    pub fn replace_descendents(&mut self, arena: &NodeArena, id: NodeId) -> usize {
        let node = &arena[id];
        let before = self.nodes.len();
        self.nodes.retain(|&other| !arena[other].is_covered_by(node));
        let removed = before - self.nodes.len();
        self.insert_node(arena, id);
        removed
    }

    /// The hardest node still to be dealt with.
    pub fn first(&self) -> Option<NodeId> {
        self.nodes.first().copied()
    }

    /// Remove and return [`Self::first`].
    pub fn pop_first(&mut self) -> Option<NodeId> {
        if self.nodes.is_empty() {
            None
        } else {
            Some(self.nodes.remove(0))
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &NodeId> {
        self.nodes.iter()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }
}
