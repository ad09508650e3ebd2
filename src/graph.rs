//! Graph entity over a dense integer node space.
//!
//! Nodes are `usize` ids in `0..node_count()`. Walking always happens on
//! the symmetrized (undirected) edge set; when the input was directed, the
//! original orientations are retained separately so positive-sample
//! extraction can filter pairs that contradict a known edge direction.
//!
//! # Example
//!
//! ```rust
//! use hyperwalk::Graph;
//!
//! let graph = Graph::from_edges(4, &[(0, 1), (1, 2), (2, 3)]);
//!
//! assert_eq!(graph.node_count(), 4);
//! assert_eq!(graph.degree(1), 2);
//! assert!(graph.has_edge(2, 1));
//! ```

use petgraph::graph::{NodeIndex, UnGraph};
use std::collections::HashSet;

/// An undirected graph with dense node ids, backed by petgraph.
#[derive(Debug, Clone, Default)]
pub struct Graph {
    /// The underlying undirected graph. Node `i` is `NodeIndex(i)`.
    graph: UnGraph<(), ()>,
    /// Original edge orientations, kept only when built from directed input.
    directed_edges: Option<HashSet<(usize, usize)>>,
}

impl Graph {
    /// Create a graph with `num_nodes` isolated nodes.
    pub fn with_nodes(num_nodes: usize) -> Self {
        let mut graph = UnGraph::with_capacity(num_nodes, 0);
        for _ in 0..num_nodes {
            graph.add_node(());
        }
        Self {
            graph,
            directed_edges: None,
        }
    }

    /// Build from an undirected edge list.
    ///
    /// Node ids beyond `num_nodes` grow the node space; duplicate edges
    /// are collapsed.
    pub fn from_edges(num_nodes: usize, edges: &[(usize, usize)]) -> Self {
        let mut g = Self::with_nodes(num_nodes);
        for &(u, v) in edges {
            g.add_edge(u, v);
        }
        g
    }

    /// Build from a directed edge list.
    ///
    /// The graph is symmetrized for walking; the original orientations are
    /// retained and available through [`Graph::directed_edges`].
    pub fn from_directed_edges(num_nodes: usize, edges: &[(usize, usize)]) -> Self {
        let mut g = Self::with_nodes(num_nodes);
        let mut directed = HashSet::with_capacity(edges.len());
        for &(u, v) in edges {
            g.add_edge(u, v);
            directed.insert((u, v));
        }
        g.directed_edges = Some(directed);
        g
    }

    fn ensure_node(&mut self, id: usize) -> NodeIndex {
        while self.graph.node_count() <= id {
            self.graph.add_node(());
        }
        NodeIndex::new(id)
    }

    /// Add an undirected edge, growing the node space as needed.
    pub fn add_edge(&mut self, u: usize, v: usize) {
        let a = self.ensure_node(u);
        let b = self.ensure_node(v);
        self.graph.update_edge(a, b, ());
    }

    /// Number of nodes.
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Number of undirected edges.
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Iterate over all node ids in order.
    pub fn nodes(&self) -> impl Iterator<Item = usize> {
        0..self.graph.node_count()
    }

    /// Neighbor ids of a node. O(d).
    pub fn neighbors(&self, node: usize) -> Vec<usize> {
        self.graph
            .neighbors(NodeIndex::new(node))
            .map(|n| n.index())
            .collect()
    }

    /// Degree of a node. O(d).
    pub fn degree(&self, node: usize) -> usize {
        self.graph.neighbors(NodeIndex::new(node)).count()
    }

    /// Check whether an (undirected) edge exists. O(d).
    pub fn has_edge(&self, u: usize, v: usize) -> bool {
        if u >= self.node_count() || v >= self.node_count() {
            return false;
        }
        self.graph
            .find_edge(NodeIndex::new(u), NodeIndex::new(v))
            .is_some()
    }

    /// The retained directed edge set, if the graph was built from
    /// directed input.
    pub fn directed_edges(&self) -> Option<&HashSet<(usize, usize)>> {
        self.directed_edges.as_ref()
    }

    /// Get the underlying petgraph for advanced operations.
    pub fn as_petgraph(&self) -> &UnGraph<(), ()> {
        &self.graph
    }
}
