use std::fmt::{Display, Formatter};
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::audit::{
    frontier::Frontier,
    node::{NodeArena, NodeId, RaireNode},
};
use crate::model::Contest;

/// A unique identifier for a particular audit search, used to tell apart the
/// log lines of contests audited in parallel.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd)]
pub struct SearchId(pub usize);

impl Display for SearchId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "search{}", self.0)
    }
}

impl SearchId {
    /// Atomically get the next ID. This wraps around back to zero if you somehow exceed a usize.
    pub fn next() -> SearchId {
        static SEARCH_ID_COUNTER: AtomicUsize = AtomicUsize::new(0);
        SearchId(SEARCH_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

/// Renders a node as `first | rest [estimate]`, followed by its best ancestor
/// if it has one.
pub(crate) struct NodeDisplay<'a> {
    pub contest: &'a Contest,
    pub arena: &'a NodeArena,
    pub node: &'a RaireNode,
}

impl<'a> NodeDisplay<'a> {
    fn write_tail(&self, f: &mut Formatter<'_>, node: &RaireNode) -> std::fmt::Result {
        let mut tail = node.tail.iter().map(|&c| self.contest.candidate(c));
        if let Some(first) = tail.next() {
            write!(f, "{first} |")?;
        }
        for candidate in tail {
            write!(f, " {candidate}")?;
        }
        write!(f, " [{}]", node.estimate)
    }
}

impl<'a> Display for NodeDisplay<'a> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        self.write_tail(f, self.node)?;
        if let Some(ancestor) = self.node.best_ancestor {
            write!(f, " (best ancestor ")?;
            self.write_tail(f, &self.arena[ancestor])?;
            write!(f, ")")?;
        }
        Ok(())
    }
}

/// Renders every node on the frontier, one per line.
pub(crate) struct FrontierDisplay<'a> {
    pub contest: &'a Contest,
    pub arena: &'a NodeArena,
    pub frontier: &'a Frontier,
}

impl<'a> Display for FrontierDisplay<'a> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for &id in self.frontier.iter() {
            writeln!(f, "  {}", display_node(self.contest, self.arena, id))?;
        }
        Ok(())
    }
}

/// Convenience constructor for [`NodeDisplay`].
pub(crate) fn display_node<'a>(contest: &'a Contest, arena: &'a NodeArena, id: NodeId) -> NodeDisplay<'a> {
    NodeDisplay {
        contest,
        arena,
        node: &arena[id],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_unique() {
        let a = SearchId::next();
        let b = SearchId::next();
        assert!(b > a);
        assert_eq!(SearchId(3).to_string(), "search3");
    }

    #[test]
    fn node_rendering() {
        let contest = Contest::new("1", ["A", "B", "C"], "A", 0).unwrap();
        let mut arena = NodeArena::default();
        let parent = arena.alloc(RaireNode::new(vec![1], 3));
        let mut child = RaireNode::new(vec![0, 1], 3);
        child.best_ancestor = Some(parent);
        let child = arena.alloc(child);

        assert_eq!(display_node(&contest, &arena, parent).to_string(), "B | [inf]");
        assert_eq!(
            display_node(&contest, &arena, child).to_string(),
            "A | B [inf] (best ancestor B | [inf])"
        );
    }
}
