mod common;

use common::*;
use learn_portal::{
    Session,
    models::Role,
    sequencer::{ContentSequencer, SequencerError},
};
use std::sync::Arc;

fn student() -> Session {
    Session::new("student-token", Some(Role::Student), Some("s1".into()))
}

#[tokio::test]
async fn test_mark_complete_flips_flag_after_backend_success() {
    let api = Arc::new(StubApi::default());
    let mut sequencer =
        ContentSequencer::new(vec![module("m1", 1, vec![item("a", 1), item("b", 2)])]).unwrap();

    sequencer
        .mark_complete(api.as_ref(), &student(), "c1", "b")
        .await
        .unwrap();

    assert_eq!(sequencer.progress(), 50.0);
    assert!(sequencer.modules()[0].content_items[1].completed);
    assert_eq!(api.calls(), ["complete_content".to_string()]);
    assert_eq!(
        api.tokens.lock().unwrap().as_slice(),
        [Some("student-token".to_string())]
    );
}

#[tokio::test]
async fn test_mark_complete_leaves_flag_on_failure() {
    let api = Arc::new(StubApi {
        fail: ["complete_content"].into(),
        ..Default::default()
    });
    let mut sequencer = ContentSequencer::new(vec![module("m1", 1, vec![item("a", 1)])]).unwrap();

    let err = sequencer
        .mark_complete(api.as_ref(), &student(), "c1", "a")
        .await
        .unwrap_err();

    assert!(matches!(err, SequencerError::Api(_)));
    assert!(!sequencer.current().completed);
    assert_eq!(sequencer.progress(), 0.0);
}

#[tokio::test]
async fn test_mark_complete_of_unknown_item_sends_nothing() {
    let api = Arc::new(StubApi::default());
    let mut sequencer = ContentSequencer::new(vec![module("m1", 1, vec![item("a", 1)])]).unwrap();

    let err = sequencer
        .mark_complete(api.as_ref(), &student(), "c1", "zzz")
        .await
        .unwrap_err();

    assert!(matches!(err, SequencerError::UnknownItem(_)));
    assert!(api.calls().is_empty());
}
