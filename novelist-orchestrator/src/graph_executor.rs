use std::sync::Arc;

use novelist_core::NovelistError;
use novelist_graph::{
    ExecutableGraph, ExecutionConfig, GraphBuilder, GraphError, GraphNode, GraphState,
    StateUpdate, END,
};

use crate::stages::{Pipeline, RefineDecision, Stage};
use crate::AgentState;

struct StageNode {
    pipeline: Arc<Pipeline>,
    stage: Stage,
}

#[async_trait::async_trait]
impl GraphNode<AgentState> for StageNode {
    async fn invoke(
        &self,
        state: GraphState<AgentState>,
    ) -> Result<StateUpdate<AgentState>, NovelistError> {
        let next = self.pipeline.run_stage(self.stage, state.into_inner()).await;
        Ok(StateUpdate::new(next))
    }
}

fn node(pipeline: &Arc<Pipeline>, stage: Stage) -> StageNode {
    StageNode {
        pipeline: Arc::clone(pipeline),
        stage,
    }
}

/// Same transition table as [`crate::executor::run_sequential`], expressed as
/// a graph over the same stage functions.
pub fn build_stage_graph(pipeline: Arc<Pipeline>) -> Result<ExecutableGraph<AgentState>, GraphError> {
    let max_refinements = pipeline.config().max_refinements;
    let max_steps = pipeline.config().graph_max_steps();
    let refine = Stage::Refine.name();

    GraphBuilder::<AgentState>::new()
        .add_node(Stage::Understand.name(), node(&pipeline, Stage::Understand))
        .add_node(Stage::Retrieve.name(), node(&pipeline, Stage::Retrieve))
        .add_node(Stage::Generate.name(), node(&pipeline, Stage::Generate))
        .add_node(Stage::Validate.name(), node(&pipeline, Stage::Validate))
        .add_node(refine, node(&pipeline, Stage::Refine))
        .set_entry(Stage::Understand.name())
        .add_edge(Stage::Understand.name(), Stage::Retrieve.name())
        .add_edge(Stage::Retrieve.name(), Stage::Generate.name())
        .add_edge(Stage::Generate.name(), Stage::Validate.name())
        .add_conditional_edge(
            Stage::Validate.name(),
            &[refine, END],
            move |state: &GraphState<AgentState>| {
                match crate::stages::should_refine(&state.data, max_refinements) {
                    RefineDecision::Refine => Stage::Refine.name().to_string(),
                    RefineDecision::Finish => END.to_string(),
                }
            },
        )
        .add_edge(refine, Stage::Validate.name())
        .with_config(ExecutionConfig {
            max_steps: Some(max_steps),
        })
        .build()
}
