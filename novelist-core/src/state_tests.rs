use super::{GraphState, StateSchema, StateUpdate};
use serde::{Deserialize, Serialize};

#[derive(Clone, Default, Debug, Serialize, Deserialize, PartialEq)]
struct DraftState {
    draft: String,
    revisions: u32,
}

#[derive(Clone, Default, Debug, Serialize, Deserialize, PartialEq)]
struct DraftUpdate {
    draft: Option<String>,
    revised: bool,
}

impl StateSchema for DraftState {
    type Update = DraftUpdate;
    const SCHEMA_VERSION: u32 = 3;

    fn apply(current: &Self, update: Self::Update) -> Self {
        Self {
            draft: update.draft.unwrap_or_else(|| current.draft.clone()),
            revisions: current.revisions + u32::from(update.revised),
        }
    }
}

#[test]
fn partial_update_keeps_untouched_fields() {
    let initial = DraftState {
        draft: "first".to_string(),
        revisions: 0,
    };

    let next = DraftState::apply(
        &initial,
        DraftUpdate {
            draft: None,
            revised: true,
        },
    );

    assert_eq!(next.draft, "first");
    assert_eq!(next.revisions, 1);
}

#[test]
fn graph_state_applies_update_through_schema() {
    let state = GraphState::new(DraftState::default());
    let next = state.apply(StateUpdate::new(DraftUpdate {
        draft: Some("second".to_string()),
        revised: true,
    }));

    assert_eq!(next.data.draft, "second");
    assert_eq!(next.into_inner().revisions, 1);
}

#[test]
fn schema_version_is_overridable() {
    assert_eq!(DraftState::SCHEMA_VERSION, 3);
    assert!(DraftState::default().trace_repr().contains("\"revisions\": 0"));
}
