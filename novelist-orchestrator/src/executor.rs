use crate::stages::{Pipeline, RefineDecision, Stage};
use crate::AgentState;

/// Plain call-chain driver: the forward stages once, then refine/validate
/// pairs until the decision says finish.
pub async fn run_sequential(pipeline: &Pipeline, mut state: AgentState) -> AgentState {
    for stage in Stage::FORWARD {
        state = pipeline.run_stage(stage, state).await;
    }
    while pipeline.decide(&state) == RefineDecision::Refine {
        state = pipeline.run_stage(Stage::Refine, state).await;
        state = pipeline.run_stage(Stage::Validate, state).await;
    }
    state
}
