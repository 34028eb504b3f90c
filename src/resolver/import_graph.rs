//! Import graph with deterministic topological ordering.
//!
//! Nodes are display paths of resolved files and an edge `a -> b` means `a`
//! imports `b`, so `b` is ordered before `a`. Ordering uses Kahn's algorithm
//! with a min-heap so that ties always break lexicographically. Nodes that
//! cannot be flattened form the unreducible subgraph, and a colored DFS over
//! it yields one representative cycle.

use petgraph::Direction;
use petgraph::graph::{DiGraph, NodeIndex};
use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap, HashSet};

/// Color states for cycle detection using DFS.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Color {
    /// Node has not been visited.
    White,
    /// Node is currently being visited (in the DFS stack).
    Gray,
    /// Node has been fully visited.
    Black,
}

/// Directed graph of import relationships.
#[derive(Debug, Default)]
pub struct ImportGraph {
    graph: DiGraph<String, ()>,
    node_map: HashMap<String, NodeIndex>,
}

impl ImportGraph {
    /// Create an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node if it does not exist yet and return its index.
    pub fn ensure_node(&mut self, name: &str) -> NodeIndex {
        if let Some(&index) = self.node_map.get(name) {
            index
        } else {
            let index = self.graph.add_node(name.to_string());
            self.node_map.insert(name.to_string(), index);
            index
        }
    }

    /// Record that `from` imports `to`.
    pub fn add_import(&mut self, from: &str, to: &str) {
        let from_idx = self.ensure_node(from);
        let to_idx = self.ensure_node(to);
        if !self.graph.contains_edge(from_idx, to_idx) {
            self.graph.add_edge(from_idx, to_idx, ());
        }
    }

    /// Order nodes so every file comes after everything it imports.
    ///
    /// # Errors
    ///
    /// Returns a representative cycle (first and last element equal) when
    /// the graph is not a DAG.
    pub fn topological_order(&self) -> Result<Vec<String>, Vec<String>> {
        // Pending import count per node; a node is ready once all of its
        // imports have been emitted.
        let mut pending: HashMap<NodeIndex, usize> = self
            .graph
            .node_indices()
            .map(|n| (n, self.graph.neighbors_directed(n, Direction::Outgoing).count()))
            .collect();

        let mut ready: BinaryHeap<Reverse<(String, NodeIndex)>> = pending
            .iter()
            .filter(|(_, count)| **count == 0)
            .map(|(&n, _)| Reverse((self.graph[n].clone(), n)))
            .collect();

        let mut order = Vec::with_capacity(self.graph.node_count());
        let mut emitted: HashSet<NodeIndex> = HashSet::new();

        while let Some(Reverse((name, index))) = ready.pop() {
            order.push(name);
            emitted.insert(index);
            for importer in self.graph.neighbors_directed(index, Direction::Incoming) {
                if let Some(count) = pending.get_mut(&importer) {
                    *count -= 1;
                    if *count == 0 {
                        ready.push(Reverse((self.graph[importer].clone(), importer)));
                    }
                }
            }
        }

        if order.len() == self.graph.node_count() {
            return Ok(order);
        }

        let remaining: HashSet<NodeIndex> =
            self.graph.node_indices().filter(|n| !emitted.contains(n)).collect();
        Err(self.find_cycle(&remaining))
    }

    /// Find one cycle inside `subgraph`, starting from its smallest node and
    /// walking neighbors in lexicographic order.
    fn find_cycle(&self, subgraph: &HashSet<NodeIndex>) -> Vec<String> {
        let mut starts: Vec<NodeIndex> = subgraph.iter().copied().collect();
        starts.sort_by(|a, b| self.graph[*a].cmp(&self.graph[*b]));

        let mut colors: HashMap<NodeIndex, Color> =
            subgraph.iter().map(|&n| (n, Color::White)).collect();
        let mut path: Vec<NodeIndex> = Vec::new();

        for start in starts {
            if matches!(colors.get(&start), Some(Color::White))
                && let Some(cycle) = self.dfs_visit(start, subgraph, &mut colors, &mut path)
            {
                return cycle;
            }
        }
        Vec::new()
    }

    fn dfs_visit(
        &self,
        node: NodeIndex,
        subgraph: &HashSet<NodeIndex>,
        colors: &mut HashMap<NodeIndex, Color>,
        path: &mut Vec<NodeIndex>,
    ) -> Option<Vec<String>> {
        colors.insert(node, Color::Gray);
        path.push(node);

        let mut neighbors: Vec<NodeIndex> =
            self.graph.neighbors(node).filter(|n| subgraph.contains(n)).collect();
        neighbors.sort_by(|a, b| self.graph[*a].cmp(&self.graph[*b]));
        neighbors.dedup();

        for neighbor in neighbors {
            match colors.get(&neighbor) {
                Some(Color::Gray) => {
                    let start = path.iter().position(|n| *n == neighbor)?;
                    let mut cycle: Vec<String> =
                        path[start..].iter().map(|n| self.graph[*n].clone()).collect();
                    // Close the cycle on its entry node
                    cycle.push(self.graph[neighbor].clone());
                    return Some(cycle);
                }
                Some(Color::White) => {
                    if let Some(cycle) = self.dfs_visit(neighbor, subgraph, colors, path) {
                        return Some(cycle);
                    }
                }
                _ => {}
            }
        }

        path.pop();
        colors.insert(node, Color::Black);
        None
    }
}
