use serde::{Deserialize, Serialize};
use novelist_core::{
    Checkpoint, Checkpointer, HistoryCheckpointer, InMemoryCheckpointer, NovelistError,
    StateSchema,
};

#[derive(Clone, Default, Debug, Serialize, Deserialize, PartialEq)]
struct DemoState {
    count: i32,
}

impl StateSchema for DemoState {
    type Update = Self;
    fn apply(_: &Self, update: Self) -> Self {
        update
    }
}

#[tokio::test]
async fn checkpointer_roundtrip() {
    let checkpointer = InMemoryCheckpointer::<DemoState>::default();
    let checkpoint = Checkpoint::new("task-1_intent_understood", DemoState { count: 1 }, 1, "understand");
    checkpointer.save(&checkpoint).await.unwrap();

    let loaded = checkpointer.load("task-1_intent_understood").await.unwrap().unwrap();
    assert_eq!(loaded.state.count, 1);
    assert_eq!(loaded.step, 1);
    assert_eq!(loaded.node, "understand");
    assert_eq!(loaded.schema_version, DemoState::SCHEMA_VERSION);
}

#[tokio::test]
async fn latest_write_wins_and_history_is_kept() {
    let checkpointer = InMemoryCheckpointer::<DemoState>::default();
    for (step, count) in [(4u64, 1), (6, 2)] {
        checkpointer
            .save(&Checkpoint::new("task-1_output_validated", DemoState { count }, step, "validate"))
            .await
            .unwrap();
    }

    let loaded = checkpointer.load("task-1_output_validated").await.unwrap().unwrap();
    assert_eq!(loaded.state.count, 2);

    let history = checkpointer.list_checkpoints("task-1_output_validated").await.unwrap();
    assert_eq!(history.iter().map(|m| m.seq).collect::<Vec<_>>(), vec![1, 2]);
    assert!(history.iter().all(|m| m.node == "validate"));
}

#[tokio::test]
async fn missing_identifier_loads_none() {
    let checkpointer = InMemoryCheckpointer::<DemoState>::default();
    assert!(checkpointer.load("nope").await.unwrap().is_none());
    assert!(checkpointer.ids().is_empty());
}

#[test]
fn incompatible_version_is_detected() {
    let mut checkpoint = Checkpoint::new("id", DemoState::default(), 1, "understand");
    assert!(checkpoint.ensure_compatible().is_ok());

    checkpoint.schema_version = 99;
    assert!(matches!(
        checkpoint.ensure_compatible(),
        Err(NovelistError::IncompatibleCheckpoint { found: 99, expected: 1 })
    ));
}

#[tokio::test]
async fn concurrent_writes_to_distinct_ids_all_land() {
    let checkpointer = InMemoryCheckpointer::<DemoState>::default();
    let mut handles = Vec::new();
    for task in 0..8 {
        let checkpointer = checkpointer.clone();
        handles.push(tokio::spawn(async move {
            let id = format!("task-{task}_content_generated");
            checkpointer
                .save(&Checkpoint::new(id, DemoState { count: task }, 3, "generate"))
                .await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    for task in 0..8 {
        let loaded = checkpointer
            .load(&format!("task-{task}_content_generated"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(loaded.state.count, task);
    }
}
