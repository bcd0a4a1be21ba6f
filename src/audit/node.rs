use std::ops::Index;

use crate::model::{Assertion, CandidateIndex, Difficulty};

/// Handle to a node in a [`NodeArena`].
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub(crate) struct NodeId(usize);

/// One branch of the tree of alternate outcomes: every elimination order
/// that ends with `tail`.
#[derive(Debug, Clone)]
pub(crate) struct RaireNode {
    /// The last candidates eliminated, in order; the final entry is the
    /// hypothetical winner.
    pub tail: Vec<CandidateIndex>,
    /// Cheapest assertion found that rules out every outcome ending in `tail`.
    pub best_assertion: Option<Assertion>,
    /// The cheapest node whose tail is a strict suffix of this one. Ruling
    /// that out rules this out too.
    pub best_ancestor: Option<NodeId>,
    /// False once `tail` names every candidate.
    pub expandable: bool,
    /// Difficulty of `best_assertion`, or unbounded if there is none.
    pub estimate: Difficulty,
}

impl RaireNode {
    /// A fresh, unaudited node.
    pub fn new(tail: Vec<CandidateIndex>, num_candidates: usize) -> Self {
        let expandable = tail.len() < num_candidates;
        Self {
            tail,
            best_assertion: None,
            best_ancestor: None,
            expandable,
            estimate: Difficulty::UNBOUNDED,
        }
    }

    /// A node for the outcomes in which `candidate` is eliminated just
    /// before everyone in `tail`.
    pub fn extending(tail: &[CandidateIndex], candidate: CandidateIndex, num_candidates: usize) -> Self {
        let mut extended = Vec::with_capacity(tail.len() + 1);
        extended.push(candidate);
        extended.extend_from_slice(tail);
        Self::new(extended, num_candidates)
    }

    /// Is `other` a strict ancestor of this node, i.e. is its tail a strict
    /// suffix of ours?
    pub fn is_descendent_of(&self, other: &RaireNode) -> bool {
        self.tail.len() > other.tail.len() && self.tail.ends_with(&other.tail)
    }

    /// Does `other` already account for every outcome this node represents?
    pub fn is_covered_by(&self, other: &RaireNode) -> bool {
        self.tail.ends_with(&other.tail)
    }
}

/// Owner of every node created during one contest's search. Nodes are never
/// removed, so a [`NodeId`] stays valid for the whole search even after the
/// node leaves the frontier.
#[derive(Debug, Default)]
pub(crate) struct NodeArena {
    nodes: Vec<RaireNode>,
}

impl NodeArena {
    /// Take ownership of `node`, returning its handle.
    pub fn alloc(&mut self, node: RaireNode) -> NodeId {
        self.nodes.push(node);
        NodeId(self.nodes.len() - 1)
    }

    /// The node children of `id` should treat as their best ancestor: `id`'s
    /// own best ancestor if that is no harder, otherwise `id` itself.
    pub fn inherited_ancestor(&self, id: NodeId) -> NodeId {
        let node = &self[id];
        match node.best_ancestor {
            Some(ancestor) if self[ancestor].estimate <= node.estimate => ancestor,
            _ => id,
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }
}

impl Index<NodeId> for NodeArena {
    type Output = RaireNode;

    fn index(&self, id: NodeId) -> &RaireNode {
        &self.nodes[id.0]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn descendents() {
        let root = RaireNode::new(vec![2], 4);
        let child = RaireNode::extending(&root.tail, 0, 4);
        let grandchild = RaireNode::extending(&child.tail, 3, 4);
        let cousin = RaireNode::new(vec![0, 1], 4);

        assert_eq!(grandchild.tail, [3, 0, 2]);
        assert!(child.is_descendent_of(&root));
        assert!(grandchild.is_descendent_of(&root));
        assert!(grandchild.is_descendent_of(&child));
        assert!(!root.is_descendent_of(&child));
        assert!(!root.is_descendent_of(&root));
        assert!(!cousin.is_descendent_of(&root));

        assert!(root.is_covered_by(&root));
        assert!(grandchild.is_covered_by(&root));
        assert!(!cousin.is_covered_by(&root));
    }

    #[test]
    fn leaves() {
        assert!(RaireNode::new(vec![0], 2).expandable);
        assert!(!RaireNode::new(vec![1, 0], 2).expandable);
        assert!(!RaireNode::new(vec![0], 1).expandable);
    }

    #[test]
    fn inherited_ancestor() {
        let mut arena = NodeArena::default();
        let mut root = RaireNode::new(vec![1], 3);
        root.estimate = Difficulty::new(5.0);
        let root = arena.alloc(root);

        // Harder than the root, so the root is the better ancestor.
        let mut hard = RaireNode::new(vec![0, 1], 3);
        hard.estimate = Difficulty::new(9.0);
        hard.best_ancestor = Some(root);
        let hard = arena.alloc(hard);
        assert_eq!(arena.inherited_ancestor(hard), root);

        // Easier than the root, so it is its own best ancestor.
        let mut easy = RaireNode::new(vec![2, 1], 3);
        easy.estimate = Difficulty::new(2.0);
        easy.best_ancestor = Some(root);
        let easy = arena.alloc(easy);
        assert_eq!(arena.inherited_ancestor(easy), easy);

        // No ancestor at all.
        assert_eq!(arena.inherited_ancestor(root), root);
        assert_eq!(arena.len(), 3);
    }
}
