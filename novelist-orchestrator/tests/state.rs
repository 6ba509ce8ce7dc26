use novelist_core::{StateSchema, ValidationResult, Value};
use novelist_orchestrator::{
    should_refine, AgentState, ExecutionMode, OrchestratorConfig, ProcessRequest, RefineDecision,
    RunParameters, TaskType, META_REFINE_COUNT,
};

#[test]
fn task_type_labels_outside_the_taxonomy_become_generate() {
    assert_eq!(TaskType::from_label("continue"), TaskType::Continue);
    assert_eq!(TaskType::from_label(" Outline "), TaskType::Outline);
    assert_eq!(TaskType::from_label("poem"), TaskType::Generate);
    assert_eq!(TaskType::from_label(""), TaskType::Generate);
    assert_eq!(TaskType::Summarize.to_string(), "summarize");
    assert!(TaskType::Continue.wants_summaries());
    assert!(!TaskType::Check.wants_summaries());
}

#[test]
fn fresh_state_starts_with_zero_refinements() {
    let state = AgentState::new("写一段打斗场景");
    assert_eq!(state.refine_count(), 0);
    assert_eq!(state.metadata[META_REFINE_COUNT], 0);
    assert!(state.validation_result.is_none());
    assert_eq!(state.task_id(), None);
}

#[test]
fn refine_decision_respects_verdict_and_budget() {
    let mut state = AgentState::new("x");
    assert_eq!(should_refine(&state, 2), RefineDecision::Finish);

    state.validation_result = Some(ValidationResult::pass());
    assert_eq!(should_refine(&state, 2), RefineDecision::Finish);

    state.validation_result = Some(ValidationResult::fail(["人物OOC"]));
    assert_eq!(should_refine(&state, 2), RefineDecision::Refine);

    state.set_metadata(META_REFINE_COUNT, 1u32);
    assert_eq!(should_refine(&state, 2), RefineDecision::Refine);

    state.set_metadata(META_REFINE_COUNT, 2u32);
    assert_eq!(should_refine(&state, 2), RefineDecision::Finish);
    assert_eq!(should_refine(&state, 0), RefineDecision::Finish);
}

#[test]
fn continuation_requires_existing_prose() {
    let mut state = AgentState::new("接着写");
    state.task_type = TaskType::Continue;
    assert!(!state.continues_existing());

    state.existing_content = Some("\n ".to_string());
    assert!(!state.continues_existing());

    state.existing_content = Some("林风收剑。".to_string());
    assert!(state.continues_existing());

    state.task_type = TaskType::Edit;
    assert!(!state.continues_existing());
}

#[test]
fn state_round_trips_through_json_with_key_order() {
    let mut state = AgentState::new("写一段打斗场景");
    state.task_type = TaskType::Continue;
    state
        .locked_settings
        .insert("主角绝招".to_string(), Value::from("烈焰斩"));
    state
        .locked_settings
        .insert("境界".to_string(), Value::from("金丹"));
    state.validation_result = Some(ValidationResult::fail(["人物OOC"]));

    let json = serde_json::to_string(&state).expect("serialize");
    assert!(json.contains("\"task_type\":\"continue\""));
    let back: AgentState = serde_json::from_str(&json).expect("deserialize");
    assert_eq!(back, state);
    let keys: Vec<&String> = back.locked_settings.keys().collect();
    assert_eq!(keys, vec!["主角绝招", "境界"]);
    assert_eq!(AgentState::SCHEMA_VERSION, 1);
}

#[test]
fn config_defaults_and_validation() {
    let config = OrchestratorConfig::default();
    assert_eq!(config.max_refinements, 2);
    assert_eq!(config.retrieval_top_k, 10);
    assert_eq!(config.summary_count, 3);
    assert_eq!(config.default_max_tokens, 4000);
    assert_eq!(config.execution, ExecutionMode::Graph);
    assert_eq!(config.graph_max_steps(), 9);
    assert!(config.validate().is_ok());

    let bad = OrchestratorConfig {
        retrieval_top_k: 0,
        ..OrchestratorConfig::default()
    };
    assert!(bad.validate().is_err());

    let bad = OrchestratorConfig {
        default_temperature: f32::NAN,
        ..OrchestratorConfig::default()
    };
    assert!(bad.validate().is_err());

    let parsed: OrchestratorConfig =
        serde_json::from_str(r#"{"max_refinements": 1, "execution": "sequential"}"#)
            .expect("config");
    assert_eq!(parsed.max_refinements, 1);
    assert_eq!(parsed.execution, ExecutionMode::Sequential);
    assert_eq!(parsed.retrieval_top_k, 10);
}

#[test]
fn request_deserializes_with_free_form_parameters() {
    let request: ProcessRequest = serde_json::from_str(
        r#"{
            "user_input": "写一段打斗场景",
            "params": {
                "locked_settings": {"主角绝招": "烈焰斩"},
                "task_id": "book-1",
                "max_tokens": 800,
                "chapter": 12
            }
        }"#,
    )
    .expect("request");

    assert_eq!(request.resume_from, None);
    let params: RunParameters = request.params;
    assert_eq!(params.task_id.as_deref(), Some("book-1"));
    assert_eq!(params.max_tokens, Some(800));
    assert_eq!(params.locked_settings["主角绝招"], "烈焰斩");
    assert_eq!(params.extra["chapter"], 12);
    assert!(!params.extra.contains_key("task_id"));
}
