mod common;

use std::sync::Arc;

use common::{abcd_tree, engine, CallEvent, MockProvider};
use taxotree::application::services::ExpansionPolicy;
use taxotree::application::ApplicationError;
use taxotree::domain::{DomainError, NodeState};
use taxotree::util::testing;

fn state_of(engine: &taxotree::ExpansionEngine, id: &str) -> NodeState {
    engine
        .node_by_id(id)
        .map(|node| node.state)
        .unwrap_or_else(|| panic!("{id} not loaded"))
}

fn three_by_two_tree() -> MockProvider {
    MockProvider::from_tree(&[
        ("X", "X", None),
        ("Y", "Y", None),
        ("Z", "Z", None),
        ("X1", "X1", Some("X")),
        ("X2", "X2", Some("X")),
        ("Y1", "Y1", Some("Y")),
        ("Y2", "Y2", Some("Y")),
        ("Z1", "Z1", Some("Z")),
        ("Z2", "Z2", Some("Z")),
        ("X1a", "X1a", Some("X1")),
        ("X2a", "X2a", Some("X2")),
        ("Y1a", "Y1a", Some("Y1")),
        ("Y2a", "Y2a", Some("Y2")),
        ("Z1a", "Z1a", Some("Z1")),
        ("Z2a", "Z2a", Some("Z2")),
    ])
}

#[tokio::test]
async fn given_filters_when_bootstrapping_then_ancestors_open_and_selected_stays_collapsed() {
    testing::init_test_setup();
    // Arrange
    let provider = Arc::new(abcd_tree());
    let engine = engine(&provider, ExpansionPolicy::default());
    engine.set_active_filters(&["|A|B", "|C"]);

    // Act
    let report = engine.bootstrap().await;

    // Assert
    assert!(report.is_complete());
    assert!(!report.used_default);
    assert_eq!(provider.calls(), ["null", "A"]);
    assert_eq!(state_of(&engine, "A"), NodeState::Expanded);
    assert_eq!(state_of(&engine, "B"), NodeState::Unloaded);
    assert_eq!(state_of(&engine, "C"), NodeState::Unloaded);
    assert_eq!(state_of(&engine, "D"), NodeState::Unloaded);
}

#[tokio::test]
async fn given_expand_selected_when_bootstrapping_then_selected_nodes_open_too() {
    testing::init_test_setup();
    // Arrange
    let provider = Arc::new(abcd_tree());
    let policy = ExpansionPolicy {
        expand_selected: true,
        ..ExpansionPolicy::default()
    };
    let engine = engine(&provider, policy);
    engine.set_active_filters(&["|A|B", "|C"]);

    // Act
    let report = engine.bootstrap().await;

    // Assert
    assert!(report.is_complete());
    assert_eq!(provider.calls(), ["null", "A", "C", "B"]);
    let a = engine.node_by_id("A").unwrap();
    assert!(a.is_expanded());
    assert_eq!(engine.children(a.key)[0].id, "B");
    assert_eq!(state_of(&engine, "B"), NodeState::Expanded);
    let c = engine.node_by_id("C").unwrap();
    assert!(c.is_expanded());
    assert!(c.children.is_empty());
    assert_eq!(state_of(&engine, "D"), NodeState::Unloaded);
    assert_eq!(state_of(&engine, "E"), NodeState::Unloaded);
}

#[tokio::test]
async fn given_deep_filter_when_bootstrapping_then_fetches_never_overlap() {
    testing::init_test_setup();
    // Arrange
    let provider = Arc::new(three_by_two_tree());
    let engine = engine(&provider, ExpansionPolicy::default());
    engine.set_active_filters(&["|X|X1|X1a", "|Y|Y2|Y2a", "|Z|Z1"]);

    // Act
    let report = engine.bootstrap().await;

    // Assert
    assert!(report.is_complete());
    assert_eq!(provider.max_in_flight(), 1);
    let events = provider.events();
    assert_eq!(events.len(), provider.calls().len() * 2);
    for pair in events.chunks(2) {
        match pair {
            [CallEvent::Start(a), CallEvent::End(b)] => assert_eq!(a, b),
            other => panic!("overlapping fetches: {other:?}"),
        }
    }
    assert_eq!(provider.calls(), ["null", "X", "Y", "Z", "X1", "Y2"]);
}

#[tokio::test]
async fn given_three_roots_with_two_children_when_no_filters_then_two_levels_open() {
    testing::init_test_setup();
    // Arrange
    let provider = Arc::new(three_by_two_tree());
    let engine = engine(&provider, ExpansionPolicy::default());

    // Act
    let report = engine.bootstrap().await;

    // Assert
    assert!(report.is_complete());
    assert!(report.used_default);
    assert_eq!(report.top_level, 3);
    assert_eq!(report.fetches, 10);
    assert_eq!(
        provider.calls(),
        ["null", "X", "X1", "X2", "Y", "Y1", "Y2", "Z", "Z1", "Z2"]
    );
    for id in ["X", "Y", "Z", "X1", "X2", "Y1", "Y2", "Z1", "Z2"] {
        assert_eq!(state_of(&engine, id), NodeState::Expanded, "{id}");
    }
    for id in ["X1a", "X2a", "Y1a", "Y2a", "Z1a", "Z2a"] {
        assert_eq!(state_of(&engine, id), NodeState::Unloaded, "{id}");
    }
}

#[tokio::test]
async fn given_four_roots_when_no_filters_then_nothing_expands() {
    testing::init_test_setup();
    // Arrange
    let provider = Arc::new(MockProvider::from_tree(&[
        ("A", "A", None),
        ("B", "B", None),
        ("C", "C", None),
        ("D", "D", None),
        ("A1", "A1", Some("A")),
    ]));
    let engine = engine(&provider, ExpansionPolicy::default());

    // Act
    let report = engine.bootstrap().await;

    // Assert
    assert!(report.is_complete());
    assert!(!report.used_default);
    assert!(report.expanded.is_empty());
    assert_eq!(provider.calls(), ["null"]);
    assert!(engine.roots().iter().all(|&key| !engine.node(key).unwrap().is_expanded()));
}

#[tokio::test]
async fn given_root_with_many_children_when_default_expanding_then_no_cascade_below_it() {
    testing::init_test_setup();
    // Arrange
    let provider = Arc::new(MockProvider::from_tree(&[
        ("A", "A", None),
        ("B", "B", None),
        ("A1", "A1", Some("A")),
        ("A2", "A2", Some("A")),
        ("A3", "A3", Some("A")),
        ("A4", "A4", Some("A")),
        ("B1", "B1", Some("B")),
    ]));
    let engine = engine(&provider, ExpansionPolicy::default());

    // Act
    let report = engine.bootstrap().await;

    // Assert
    assert!(report.used_default);
    assert_eq!(provider.calls(), ["null", "A", "B", "B1"]);
    assert_eq!(state_of(&engine, "A"), NodeState::Expanded);
    assert_eq!(state_of(&engine, "A1"), NodeState::Unloaded);
    assert_eq!(state_of(&engine, "B"), NodeState::Expanded);
    assert_eq!(state_of(&engine, "B1"), NodeState::Expanded);
}

#[tokio::test]
async fn given_failing_child_fetch_when_bootstrapping_then_walk_stops_and_earlier_work_stays() {
    testing::init_test_setup();
    // Arrange
    let provider = Arc::new(abcd_tree());
    provider.fail_on("B");
    let engine = engine(&provider, ExpansionPolicy::default());
    engine.set_active_filters(&["|A|B|E"]);

    // Act
    let report = engine.bootstrap().await;

    // Assert
    assert!(!report.is_complete());
    assert!(matches!(
        &report.failure,
        Some(ApplicationError::Provider { parent, .. }) if parent == "B"
    ));
    assert_eq!(report.fetches, 2);
    assert!(engine.is_bootstrapped());
    assert_eq!(state_of(&engine, "A"), NodeState::Expanded);
    assert_eq!(state_of(&engine, "B"), NodeState::Unloaded);
    assert!(engine.find("E").is_none());
    assert!(report.into_result().is_err());
}

#[tokio::test]
async fn given_failing_top_level_fetch_when_bootstrapping_then_retry_is_allowed() {
    testing::init_test_setup();
    // Arrange
    let provider = Arc::new(abcd_tree());
    provider.fail_on("null");
    let engine = engine(&provider, ExpansionPolicy::default());

    // Act
    let first = engine.bootstrap().await;
    provider.recover("null");
    let second = engine.bootstrap().await;

    // Assert
    assert!(first.failure.as_ref().is_some_and(ApplicationError::is_provider));
    assert_eq!(first.top_level, 0);
    assert!(second.is_complete());
    assert_eq!(second.top_level, 3);
    assert!(engine.is_bootstrapped());
}

#[tokio::test]
async fn given_bootstrapped_engine_when_bootstrapping_again_then_nothing_is_fetched() {
    testing::init_test_setup();
    // Arrange
    let provider = Arc::new(abcd_tree());
    let engine = engine(&provider, ExpansionPolicy::default());
    engine.bootstrap().await;
    let calls = provider.calls();

    // Act
    let report = engine.bootstrap().await;

    // Assert
    assert_eq!(
        report.failure,
        Some(ApplicationError::Domain(DomainError::AlreadyBootstrapped))
    );
    assert_eq!(provider.calls(), calls);
}

#[tokio::test]
async fn given_filter_sharing_an_id_when_bootstrapping_then_unrelated_root_over_matches() {
    testing::init_test_setup();
    // Arrange
    let provider = Arc::new(MockProvider::from_tree(&[
        ("A", "A", None),
        ("V", "V", None),
        ("W", "W", None),
        ("X", "X", None),
    ]));
    let engine = engine(&provider, ExpansionPolicy::default());
    engine.set_active_filters(&["|X|A|Q"]);

    // Act
    let report = engine.bootstrap().await;

    // Assert
    assert!(report.is_complete());
    assert_eq!(state_of(&engine, "X"), NodeState::Expanded);
    assert_eq!(state_of(&engine, "A"), NodeState::Expanded);
    assert_eq!(state_of(&engine, "V"), NodeState::Unloaded);
    assert_eq!(state_of(&engine, "W"), NodeState::Unloaded);
}

#[tokio::test]
async fn given_filters_changed_after_bootstrap_when_reading_tree_then_no_new_walk() {
    testing::init_test_setup();
    // Arrange
    let provider = Arc::new(abcd_tree());
    let engine = engine(&provider, ExpansionPolicy::default());
    engine.set_active_filters(&["|A|B"]);
    engine.bootstrap().await;

    // Act
    let changed = engine.set_active_filters(&["|C|X"]);

    // Assert
    assert!(changed);
    assert_eq!(engine.active_filters(), ["|C|X"]);
    assert_eq!(engine.prefixes().len(), 2);
    assert_eq!(provider.calls(), ["null", "A"]);
    assert_eq!(state_of(&engine, "C"), NodeState::Unloaded);
}
