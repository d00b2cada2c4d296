// Diagnostic counters. Callers own these and pass them through the tree operations.

/// Counters gathered while inserting into a tree.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TreeStats {
    /// Nodes allocated by subdivision. `Octree` also records its root here;
    /// stats passed straight to `Node::add` never see the root.
    pub nodes: usize,
    pub deepest: usize,
    pub subdivisions: usize,
    /// Leaves at max depth that went over the item limit.
    pub overfull_leaves: usize,
}

impl TreeStats {
    pub(crate) fn record_node(&mut self, depth: usize) {
        self.nodes += 1;
        self.deepest = self.deepest.max(depth);
    }

    pub(crate) fn record_subdivision(&mut self, child_depth: usize) {
        self.subdivisions += 1;
        self.nodes += 8;
        self.deepest = self.deepest.max(child_depth);
    }

    /// Combines counters of disjoint subtrees.
    pub fn merge(self, other: Self) -> Self {
        Self {
            nodes: self.nodes + other.nodes,
            deepest: self.deepest.max(other.deepest),
            subdivisions: self.subdivisions + other.subdivisions,
            overfull_leaves: self.overfull_leaves + other.overfull_leaves,
        }
    }
}

/// Counters gathered during range queries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueryStats {
    pub nodes_visited: usize,
    pub leaves_scanned: usize,
    pub items_tested: usize,
}
