use serde::{Deserialize, Serialize};
use novelist_core::NovelistError;
use novelist_graph::{
    ExecutionConfig, ExecutionOptions, GraphBuilder, GraphError, GraphNode, GraphState,
    StateSchema, StateUpdate, END,
};

#[derive(Clone, Default, Debug, Serialize, Deserialize, PartialEq)]
struct DemoState {
    count: i32,
    visited: Vec<String>,
}

impl StateSchema for DemoState {
    type Update = DemoState;
    fn apply(_: &Self, update: DemoState) -> Self {
        update
    }
}

struct Inc {
    name: &'static str,
}

#[async_trait::async_trait]
impl GraphNode<DemoState> for Inc {
    async fn invoke(
        &self,
        input: GraphState<DemoState>,
    ) -> Result<StateUpdate<DemoState>, NovelistError> {
        let mut next = input.data;
        next.count += 1;
        next.visited.push(self.name.to_string());
        Ok(StateUpdate::new(next))
    }
}

struct Broken;

#[async_trait::async_trait]
impl GraphNode<DemoState> for Broken {
    async fn invoke(
        &self,
        _input: GraphState<DemoState>,
    ) -> Result<StateUpdate<DemoState>, NovelistError> {
        Err(NovelistError::Custom("boom".to_string()))
    }
}

#[tokio::test]
async fn linear_graph_runs_in_edge_order() {
    let graph = GraphBuilder::<DemoState>::new()
        .add_node("a", Inc { name: "a" })
        .add_node("b", Inc { name: "b" })
        .add_edge("a", "b")
        .add_edge("b", END)
        .set_entry("a")
        .build()
        .unwrap();

    let out = graph.invoke(GraphState::new(DemoState::default())).await.unwrap();
    assert_eq!(out.data.count, 2);
    assert_eq!(out.data.visited, vec!["a", "b"]);
}

#[tokio::test]
async fn conditional_edge_loops_until_router_ends() {
    let graph = GraphBuilder::<DemoState>::new()
        .add_node("check", Inc { name: "check" })
        .add_node("fix", Inc { name: "fix" })
        .add_conditional_edge("check", &["fix", END], |state: &GraphState<DemoState>| {
            if state.data.count < 5 {
                "fix".to_string()
            } else {
                END.to_string()
            }
        })
        .add_edge("fix", "check")
        .set_entry("check")
        .build()
        .unwrap();

    let out = graph.invoke(GraphState::new(DemoState::default())).await.unwrap();
    assert_eq!(out.data.visited, vec!["check", "fix", "check", "fix", "check"]);
}

#[tokio::test]
async fn max_steps_stops_runaway_cycles() {
    let graph = GraphBuilder::<DemoState>::new()
        .add_node("a", Inc { name: "a" })
        .add_node("b", Inc { name: "b" })
        .add_edge("a", "b")
        .add_edge("b", "a")
        .set_entry("a")
        .with_config(ExecutionConfig { max_steps: Some(5) })
        .build()
        .unwrap();

    let err = graph
        .invoke(GraphState::new(DemoState::default()))
        .await
        .unwrap_err();
    assert!(matches!(err, GraphError::MaxStepsExceeded { max: 5, reached: 5 }));

    let err = graph
        .invoke_with_options(
            GraphState::new(DemoState::default()),
            ExecutionOptions { max_steps: Some(3) },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, GraphError::MaxStepsExceeded { max: 3, .. }));
}

#[tokio::test]
async fn router_returning_undeclared_target_is_rejected() {
    let graph = GraphBuilder::<DemoState>::new()
        .add_node("a", Inc { name: "a" })
        .add_conditional_edge("a", &[END], |_: &GraphState<DemoState>| "elsewhere".to_string())
        .set_entry("a")
        .build()
        .unwrap();

    let err = graph
        .invoke(GraphState::new(DemoState::default()))
        .await
        .unwrap_err();
    assert!(matches!(err, GraphError::InvalidEdge { ref to, .. } if to == "elsewhere"));
}

#[tokio::test]
async fn node_failure_names_the_node() {
    let graph = GraphBuilder::<DemoState>::new()
        .add_node("a", Inc { name: "a" })
        .add_node("bad", Broken)
        .add_edge("a", "bad")
        .set_entry("a")
        .build()
        .unwrap();

    let err = graph
        .invoke(GraphState::new(DemoState::default()))
        .await
        .unwrap_err();
    assert!(matches!(err, GraphError::NodeFailed { ref node, .. } if node == "bad"));
}

#[test]
fn build_validates_topology() {
    let missing_entry = GraphBuilder::<DemoState>::new()
        .add_node("a", Inc { name: "a" })
        .build();
    assert!(matches!(missing_entry, Err(GraphError::MissingEntry)));

    let unknown_entry = GraphBuilder::<DemoState>::new()
        .add_node("a", Inc { name: "a" })
        .set_entry("z")
        .build();
    assert!(matches!(unknown_entry, Err(GraphError::MissingNode { ref node }) if node == "z"));

    let dangling = GraphBuilder::<DemoState>::new()
        .add_node("a", Inc { name: "a" })
        .add_edge("a", "ghost")
        .set_entry("a")
        .build();
    assert!(matches!(dangling, Err(GraphError::InvalidEdge { ref to, .. }) if to == "ghost"));
}
