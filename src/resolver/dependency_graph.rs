//! Dependency graph over the nodes of a stack.
//!
//! Edges point from the referencing node to the referenced node (`bucket → key` when the
//! bucket holds a reference to the key's ARN), so a node's out-neighbors are the nodes
//! that must be resolved before it. The graph is derived data: [`DependencyGraph::build`]
//! recomputes it from property references and explicit `dependsOn` hints every time.
//!
//! Every traversal visits nodes and neighbors in ascending id order. Ties in the
//! topological order are broken the same way, so the order depends only on the logical
//! content of the stack and never on the order nodes were registered.

use petgraph::Direction;
use petgraph::graph::{DiGraph, NodeIndex};
use std::cmp::Reverse;
use std::collections::{BTreeMap, BTreeSet, BinaryHeap, HashMap};

use crate::core::SynthError;
use crate::stack::Stack;

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

/// Directed graph of "must be resolved after" relationships between logical ids.
#[derive(Debug, Clone)]
pub struct DependencyGraph {
    /// The underlying directed graph.
    graph: DiGraph<String, ()>,
    /// Map from logical ids to their graph indices, ascending by id.
    node_map: BTreeMap<String, NodeIndex>,
}

impl DependencyGraph {
    /// Create a new empty dependency graph.
    #[must_use]
    pub fn new() -> Self {
        Self {
            graph: DiGraph::new(),
            node_map: BTreeMap::new(),
        }
    }

    /// Build the graph for `stack` and reject it if it contains a cycle.
    ///
    /// Every node becomes a vertex, including nodes with no edges. For each node, one edge
    /// is added per distinct referenced target and per explicit dependency.
    ///
    /// # Errors
    ///
    /// - [`SynthError::UnknownTarget`] if an edge names a node outside the stack
    /// - [`SynthError::CyclicDependency`] if the edges form a cycle, self-references
    ///   included
    pub fn build(stack: &Stack) -> Result<Self, SynthError> {
        let mut graph = Self::new();

        for node in stack.nodes() {
            graph.add_node(node.id());
        }

        for node in stack.nodes() {
            for target in node.dependencies() {
                if !graph.contains(target) {
                    return Err(SynthError::UnknownTarget {
                        node_id: node.id().to_string(),
                        target: target.to_string(),
                    });
                }
                graph.add_dependency(node.id(), target);
            }
        }

        tracing::debug!(
            "Built dependency graph with {} nodes and {} edges",
            graph.node_count(),
            graph.edge_count()
        );

        graph.detect_cycles()?;
        Ok(graph)
    }

    /// Add a node to the graph if it doesn't already exist.
    ///
    /// Returns the node index in the graph.
    pub fn add_node(&mut self, id: &str) -> NodeIndex {
        if let Some(&index) = self.node_map.get(id) {
            index
        } else {
            let index = self.graph.add_node(id.to_string());
            self.node_map.insert(id.to_string(), index);
            index
        }
    }

    /// Add a dependency relationship to the graph.
    ///
    /// `from` depends on `to`, meaning `to` must be resolved before `from`.
    pub fn add_dependency(&mut self, from: &str, to: &str) {
        let from_idx = self.add_node(from);
        let to_idx = self.add_node(to);

        if !self.graph.contains_edge(from_idx, to_idx) {
            self.graph.add_edge(from_idx, to_idx, ());
        }
    }

    /// Whether `id` is a vertex.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.node_map.contains_key(id)
    }

    /// Detect cycles in the dependency graph using DFS with colors.
    ///
    /// Roots and neighbors are visited in ascending id order, so the reported path is the
    /// same on every run. The path closes on its first node: `a → b → a`.
    pub fn detect_cycles(&self) -> Result<(), SynthError> {
        let mut colors: HashMap<NodeIndex, Color> =
            self.graph.node_indices().map(|idx| (idx, Color::White)).collect();
        let mut path: Vec<NodeIndex> = Vec::new();

        for &node in self.node_map.values() {
            if colors.get(&node) == Some(&Color::White) {
                if let Some(cycle) = self.dfs_visit(node, &mut colors, &mut path) {
                    let path: Vec<String> =
                        cycle.into_iter().map(|idx| self.graph[idx].clone()).collect();
                    tracing::debug!("Cycle detected: {}", path.join(" → "));
                    return Err(SynthError::CyclicDependency { path });
                }
            }
        }

        Ok(())
    }

    /// DFS visit for cycle detection.
    ///
    /// Returns `Some(cycle_path)` if a cycle is detected, None otherwise.
    fn dfs_visit(
        &self,
        node: NodeIndex,
        colors: &mut HashMap<NodeIndex, Color>,
        path: &mut Vec<NodeIndex>,
    ) -> Option<Vec<NodeIndex>> {
        colors.insert(node, Color::Gray);
        path.push(node);

        for neighbor in self.sorted_neighbors(node, Direction::Outgoing) {
            match colors.get(&neighbor) {
                Some(Color::Gray) => {
                    if let Some(start) = path.iter().position(|&n| n == neighbor) {
                        let mut cycle = path[start..].to_vec();
                        cycle.push(neighbor);
                        return Some(cycle);
                    }
                }
                Some(Color::White) => {
                    if let Some(cycle) = self.dfs_visit(neighbor, colors, path) {
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

    /// Neighbors of `node` in one direction, ascending by id.
    fn sorted_neighbors(&self, node: NodeIndex, direction: Direction) -> Vec<NodeIndex> {
        let mut neighbors: Vec<NodeIndex> =
            self.graph.neighbors_directed(node, direction).collect();
        neighbors.sort_by(|a, b| self.graph[*a].cmp(&self.graph[*b]));
        neighbors.dedup();
        neighbors
    }

    /// Number of dependencies still unresolved for every node, before anything runs.
    fn pending_counts(&self) -> HashMap<NodeIndex, usize> {
        self.graph
            .node_indices()
            .map(|idx| (idx, self.graph.neighbors_directed(idx, Direction::Outgoing).count()))
            .collect()
    }

    /// Get the resolution order.
    ///
    /// Dependencies come before their dependents. Among nodes that are ready at the same
    /// time the smallest id goes first (Kahn's algorithm over a min-heap).
    pub fn topological_order(&self) -> Result<Vec<String>, SynthError> {
        self.detect_cycles()?;

        let mut pending = self.pending_counts();
        let mut ready: BinaryHeap<Reverse<(String, NodeIndex)>> = pending
            .iter()
            .filter(|&(_, &count)| count == 0)
            .map(|(&idx, _)| Reverse((self.graph[idx].clone(), idx)))
            .collect();

        let mut order = Vec::with_capacity(self.node_count());
        while let Some(Reverse((id, idx))) = ready.pop() {
            order.push(id);
            for dependent in self.graph.neighbors_directed(idx, Direction::Incoming) {
                if let Some(count) = pending.get_mut(&dependent) {
                    *count -= 1;
                    if *count == 0 {
                        ready.push(Reverse((self.graph[dependent].clone(), dependent)));
                    }
                }
            }
        }

        Ok(order)
    }

    /// Group nodes into topological levels.
    ///
    /// Level 0 holds every node without dependencies. Level `k + 1` holds the nodes whose
    /// last dependency sits in level `k`. Each level is sorted by id. All nodes of a level
    /// can be resolved concurrently once every earlier level is done.
    pub fn levels(&self) -> Result<Vec<Vec<String>>, SynthError> {
        self.detect_cycles()?;

        let mut pending = self.pending_counts();
        let mut current: Vec<NodeIndex> = self
            .node_map
            .values()
            .copied()
            .filter(|idx| pending.get(idx) == Some(&0))
            .collect();

        let mut levels = Vec::new();
        while !current.is_empty() {
            let mut next = Vec::new();
            for &idx in &current {
                for dependent in self.graph.neighbors_directed(idx, Direction::Incoming) {
                    if let Some(count) = pending.get_mut(&dependent) {
                        *count -= 1;
                        if *count == 0 {
                            next.push(dependent);
                        }
                    }
                }
            }

            let mut level: Vec<String> =
                current.iter().map(|&idx| self.graph[idx].clone()).collect();
            level.sort();
            levels.push(level);

            next.sort_by(|a, b| self.graph[*a].cmp(&self.graph[*b]));
            current = next;
        }

        Ok(levels)
    }

    /// Get direct dependencies for a given node, ascending by id.
    #[must_use]
    pub fn get_direct_deps(&self, id: &str) -> Vec<String> {
        self.node_map.get(id).map_or_else(Vec::new, |&idx| {
            self.sorted_neighbors(idx, Direction::Outgoing)
                .into_iter()
                .map(|n| self.graph[n].clone())
                .collect()
        })
    }

    /// Nodes nothing depends on, ascending by id. Tree rendering starts from these.
    #[must_use]
    pub fn roots(&self) -> Vec<String> {
        self.node_map
            .iter()
            .filter(|&(_, &idx)| {
                self.graph.neighbors_directed(idx, Direction::Incoming).next().is_none()
            })
            .map(|(id, _)| id.clone())
            .collect()
    }

    /// Get the total number of nodes in the graph.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Get the total number of edges (dependencies) in the graph.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Build a human-readable dependency tree representation.
    ///
    /// Returns a string showing the dependency hierarchy below `root`. A node reached
    /// twice on one branch is printed once more and marked, then not expanded again.
    #[must_use]
    pub fn to_tree_string(&self, root: &str) -> String {
        let mut result = String::new();
        let mut visited = BTreeSet::new();
        self.build_tree_string(root, &mut result, "", true, &mut visited);
        result
    }

    fn build_tree_string(
        &self,
        node: &str,
        result: &mut String,
        prefix: &str,
        is_last: bool,
        visited: &mut BTreeSet<String>,
    ) {
        let connector = if is_last {
            "└── "
        } else {
            "├── "
        };
        result.push_str(&format!("{prefix}{connector}{node}\n"));

        let child_prefix = if is_last {
            format!("{prefix}    ")
        } else {
            format!("{prefix}│   ")
        };

        if !visited.insert(node.to_string()) {
            result.push_str(&format!("{child_prefix}└── (already shown)\n"));
            return;
        }

        let deps = self.get_direct_deps(node);
        for (i, dep) in deps.iter().enumerate() {
            let is_last_child = i == deps.len() - 1;
            self.build_tree_string(dep, result, &child_prefix, is_last_child, visited);
        }
    }
}

impl Default for DependencyGraph {
    fn default() -> Self {
        Self::new()
    }
}
