use std::sync::Arc;

use ahash::AHashMap;
use novelist_core::{GraphState, NovelistError, StateSchema, StateUpdate};

use crate::program::{EdgeKind, GraphProgram};
use crate::{ExecutionConfig, ExecutionOptions, GraphError};

/// Sentinel target that terminates a run.
pub const END: &str = "__end__";

#[async_trait::async_trait]
pub trait GraphNode<S: StateSchema>: Send + Sync {
    async fn invoke(&self, state: GraphState<S>) -> Result<StateUpdate<S>, NovelistError>;
}

type Router<S> = Arc<dyn Fn(&GraphState<S>) -> String + Send + Sync>;

pub(crate) enum Edge<S: StateSchema> {
    Direct(String),
    Conditional { targets: Vec<String>, router: Router<S> },
}

impl<S: StateSchema> Edge<S> {
    fn targets(&self) -> Vec<&str> {
        match self {
            Edge::Direct(target) => vec![target.as_str()],
            Edge::Conditional { targets, .. } => targets.iter().map(String::as_str).collect(),
        }
    }
}

pub struct GraphBuilder<S: StateSchema> {
    nodes: AHashMap<String, Arc<dyn GraphNode<S>>>,
    order: Vec<String>,
    edges: AHashMap<String, Edge<S>>,
    entry: Option<String>,
    config: ExecutionConfig,
}

impl<S: StateSchema> Default for GraphBuilder<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: StateSchema> GraphBuilder<S> {
    pub fn new() -> Self {
        Self {
            nodes: AHashMap::new(),
            order: Vec::new(),
            edges: AHashMap::new(),
            entry: None,
            config: ExecutionConfig::default(),
        }
    }

    pub fn add_node<N>(mut self, name: &str, node: N) -> Self
    where
        N: GraphNode<S> + 'static,
    {
        if !self.order.iter().any(|existing| existing == name) {
            self.order.push(name.to_string());
        }
        self.nodes.insert(name.to_string(), Arc::new(node));
        self
    }

    pub fn set_entry(mut self, name: &str) -> Self {
        self.entry = Some(name.to_string());
        self
    }

    pub fn add_edge(mut self, from: &str, to: &str) -> Self {
        self.edges
            .insert(from.to_string(), Edge::Direct(to.to_string()));
        self
    }

    /// Routes from `from` to whichever of `targets` the router names.
    pub fn add_conditional_edge<F>(mut self, from: &str, targets: &[&str], router: F) -> Self
    where
        F: Fn(&GraphState<S>) -> String + Send + Sync + 'static,
    {
        self.edges.insert(
            from.to_string(),
            Edge::Conditional {
                targets: targets.iter().map(|t| t.to_string()).collect(),
                router: Arc::new(router),
            },
        );
        self
    }

    pub fn with_config(mut self, config: ExecutionConfig) -> Self {
        self.config = config;
        self
    }

    /// Checks that the entry and every edge endpoint name a registered node
    /// (or [`END`]).
    pub fn build(self) -> Result<ExecutableGraph<S>, GraphError> {
        let entry = self.entry.ok_or(GraphError::MissingEntry)?;
        if !self.nodes.contains_key(&entry) {
            return Err(GraphError::MissingNode { node: entry });
        }
        for (from, edge) in &self.edges {
            if !self.nodes.contains_key(from) {
                return Err(GraphError::MissingNode { node: from.clone() });
            }
            for target in edge.targets() {
                if target != END && !self.nodes.contains_key(target) {
                    return Err(GraphError::InvalidEdge {
                        from: from.clone(),
                        to: target.to_string(),
                    });
                }
            }
        }

        Ok(ExecutableGraph {
            nodes: self.nodes,
            order: self.order,
            edges: self.edges,
            entry,
            config: self.config,
        })
    }
}

pub struct ExecutableGraph<S: StateSchema> {
    nodes: AHashMap<String, Arc<dyn GraphNode<S>>>,
    order: Vec<String>,
    edges: AHashMap<String, Edge<S>>,
    entry: String,
    config: ExecutionConfig,
}

impl<S: StateSchema> ExecutableGraph<S> {
    pub async fn invoke(&self, state: GraphState<S>) -> Result<GraphState<S>, GraphError> {
        self.invoke_with_options(state, ExecutionOptions::default())
            .await
    }

    pub async fn invoke_with_options(
        &self,
        mut state: GraphState<S>,
        options: ExecutionOptions,
    ) -> Result<GraphState<S>, GraphError> {
        let config = self.config.merge(&options);
        let mut current = self.entry.clone();
        let mut steps = 0usize;

        loop {
            if let Some(max) = config.max_steps {
                if steps >= max {
                    return Err(GraphError::MaxStepsExceeded {
                        max,
                        reached: steps,
                    });
                }
            }
            let node = self
                .nodes
                .get(&current)
                .ok_or_else(|| GraphError::MissingNode {
                    node: current.clone(),
                })?;

            tracing::debug!(node = %current, step = steps, "entering graph node");
            let update = node
                .invoke(state.clone())
                .await
                .map_err(|source| GraphError::NodeFailed {
                    node: current.clone(),
                    source,
                })?;
            state = state.apply(update);
            steps += 1;

            let next = match self.edges.get(&current) {
                None => break,
                Some(Edge::Direct(next)) => next.clone(),
                Some(Edge::Conditional { targets, router }) => {
                    let next = router(&state);
                    if !targets.contains(&next) {
                        return Err(GraphError::InvalidEdge {
                            from: current,
                            to: next,
                        });
                    }
                    next
                }
            };
            if next == END {
                break;
            }
            current = next;
        }

        Ok(state)
    }

    pub fn entry(&self) -> &str {
        &self.entry
    }

    /// Static description of the topology, for inspection and rendering.
    pub fn program(&self) -> GraphProgram {
        let mut edges = Vec::new();
        for from in &self.order {
            let Some(edge) = self.edges.get(from) else {
                continue;
            };
            let kind = match edge {
                Edge::Direct(_) => EdgeKind::Default,
                Edge::Conditional { .. } => EdgeKind::Conditional,
            };
            for target in edge.targets() {
                edges.push((from.clone(), target.to_string(), kind));
            }
        }
        GraphProgram::new(&self.entry, &self.order, edges)
    }
}
