use std::collections::HashMap;
use std::fmt;

use petgraph::dot::Dot;
use petgraph::graph::{Graph, NodeIndex};
use petgraph::visit::EdgeRef;

use crate::END;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EdgeKind {
    Default,
    Conditional,
}

impl fmt::Display for EdgeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EdgeKind::Default => f.write_str(""),
            EdgeKind::Conditional => f.write_str("conditional"),
        }
    }
}

/// Read-only view of a built graph's topology.
pub struct GraphProgram {
    entry: String,
    graph: Graph<String, EdgeKind>,
    name_to_index: HashMap<String, NodeIndex>,
}

impl GraphProgram {
    pub(crate) fn new(entry: &str, nodes: &[String], edges: Vec<(String, String, EdgeKind)>) -> Self {
        let mut graph = Graph::new();
        let mut name_to_index = HashMap::new();
        for name in nodes {
            let idx = graph.add_node(name.clone());
            name_to_index.insert(name.clone(), idx);
        }
        for (from, to, kind) in edges {
            let from_idx = *name_to_index
                .entry(from.clone())
                .or_insert_with(|| graph.add_node(from));
            let to_idx = *name_to_index
                .entry(to.clone())
                .or_insert_with(|| graph.add_node(to));
            graph.add_edge(from_idx, to_idx, kind);
        }
        Self {
            entry: entry.to_string(),
            graph,
            name_to_index,
        }
    }

    pub fn entry(&self) -> &str {
        &self.entry
    }

    /// Node names in registration order; [`END`] is listed last when reachable.
    pub fn node_names(&self) -> Vec<String> {
        self.graph
            .node_indices()
            .filter_map(|idx| self.graph.node_weight(idx).cloned())
            .collect()
    }

    pub fn edge_names(&self) -> Vec<(String, String)> {
        self.graph
            .edge_references()
            .filter_map(|edge| {
                let from = self.graph.node_weight(edge.source())?;
                let to = self.graph.node_weight(edge.target())?;
                Some((from.clone(), to.clone()))
            })
            .collect()
    }

    pub fn successors(&self, node: &str) -> Vec<String> {
        let Some(idx) = self.name_to_index.get(node) else {
            return Vec::new();
        };
        let mut names: Vec<String> = self
            .graph
            .edges(*idx)
            .filter_map(|edge| self.graph.node_weight(edge.target()).cloned())
            .collect();
        names.sort();
        names
    }

    pub fn terminates(&self) -> bool {
        self.name_to_index.contains_key(END)
    }

    /// Graphviz DOT rendering; conditional edges carry a `conditional` label.
    pub fn to_dot(&self) -> String {
        format!("{}", Dot::new(&self.graph))
    }
}
