//! Tests for the RuleSyncEngine

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use bridge_core::{ConfigCenter, Error, RemoteError, RuleType, SyncOutcome, encode_rules};
use bridge_test_utils::fixtures::{APP_ID, engine};
use bridge_test_utils::{Operation, RecordingConfigCenter, RemoteCall};
use pretty_assertions::assert_eq;
use serde_json::json;

fn flow_rules() -> Vec<serde_json::Value> {
    vec![
        json!({"resource": "/orders", "grade": 1, "count": 20}),
        json!({"resource": "/orders/{id}", "grade": 1, "count": 5}),
    ]
}

fn unavailable() -> RemoteError {
    RemoteError::Unavailable {
        message: "portal timed out".to_string(),
    }
}

#[tokio::test]
async fn test_first_set_rules_call_sequence() {
    let center = Arc::new(RecordingConfigCenter::new());
    let engine = engine(&center);

    let outcome = engine
        .set_rules("orders", RuleType::Flow, flow_rules())
        .await
        .unwrap();

    assert_eq!(outcome, SyncOutcome::Published);
    let calls = center.calls();
    assert_eq!(
        center.operations(),
        vec![
            Operation::Get,
            Operation::Create,
            Operation::Publish,
            Operation::Write,
            Operation::Publish,
        ]
    );
    assert_eq!(
        calls[3],
        RemoteCall::WriteItem {
            namespace: "app.orders".to_string(),
            key: "orders.flow-rules".to_string(),
        }
    );
    match (&calls[2], &calls[4]) {
        (RemoteCall::Publish { title: initial, .. }, RemoteCall::Publish { title: release, .. }) => {
            assert!(initial.ends_with("-first-publish-release"));
            assert!(release.starts_with("rule dashboard operate on "));
        }
        other => panic!("expected two publishes, got {:?}", other),
    }
    assert!(engine.list_cached_project_names().contains("orders"));
}

#[tokio::test]
async fn test_second_set_rules_skips_provisioning() {
    let center = Arc::new(RecordingConfigCenter::new());
    let engine = engine(&center);
    engine
        .set_rules("orders", RuleType::Flow, flow_rules())
        .await
        .unwrap();
    center.reset_calls();

    engine
        .set_rules("orders", RuleType::Degrade, vec![])
        .await
        .unwrap();

    assert_eq!(
        center.operations(),
        vec![Operation::Write, Operation::Publish]
    );
}

#[tokio::test]
async fn test_invalid_project_name_fails_before_any_remote_call() {
    let center = Arc::new(RecordingConfigCenter::new());
    let engine = engine(&center);

    let err = engine
        .set_rules(&"x".repeat(40), RuleType::Flow, flow_rules())
        .await
        .unwrap_err();

    assert!(matches!(err, Error::InvalidArgument { .. }));
    assert!(center.calls().is_empty());
}

#[tokio::test]
async fn test_write_failure_is_absorbed() {
    let center = Arc::new(RecordingConfigCenter::new());
    center.fail_next(Operation::Write, unavailable());
    let engine = engine(&center);

    let outcome = engine
        .set_rules("orders", RuleType::Flow, flow_rules())
        .await
        .unwrap();

    assert!(!outcome.is_published());
    assert!(matches!(outcome, SyncOutcome::Failed { reason } if reason.contains("write item")));
    // Publish is never attempted after a failed write
    assert_eq!(center.count(Operation::Publish), 1);
}

#[tokio::test]
async fn test_publish_failure_is_absorbed_and_retry_succeeds() {
    let center = Arc::new(RecordingConfigCenter::new());
    let engine = engine(&center);
    engine.register_project_if_absent("orders").await.unwrap();
    center.fail_next(Operation::Publish, unavailable());

    let failed = engine
        .set_rules("orders", RuleType::Flow, flow_rules())
        .await
        .unwrap();
    let retried = engine
        .set_rules("orders", RuleType::Flow, flow_rules())
        .await
        .unwrap();

    assert!(!failed.is_published());
    assert!(retried.is_published());
}

#[tokio::test]
async fn test_initial_publish_failure_is_absorbed() {
    let center = Arc::new(RecordingConfigCenter::new());
    center.fail_next(Operation::Publish, unavailable());
    let engine = engine(&center);

    let outcome = engine
        .set_rules("orders", RuleType::Flow, flow_rules())
        .await
        .unwrap();

    assert!(matches!(outcome, SyncOutcome::Failed { .. }));
    assert_eq!(center.count(Operation::Write), 0);
}

#[tokio::test]
async fn test_set_rules_async_handle() {
    let center = Arc::new(RecordingConfigCenter::new());
    let engine = engine(&center);

    let handle = engine
        .set_rules_async("orders", RuleType::Flow, flow_rules())
        .await
        .unwrap();
    assert_eq!(handle.project(), "orders");
    handle.wait().await.unwrap();

    assert_eq!(
        center
            .store()
            .item_value(APP_ID, "app.orders", "orders.flow-rules"),
        Some(encode_rules(&flow_rules()).unwrap())
    );
}

#[tokio::test]
async fn test_set_rules_async_failure_surfaces_in_handle() {
    let center = Arc::new(RecordingConfigCenter::new());
    let engine = engine(&center);
    engine.register_project_if_absent("orders").await.unwrap();
    center.fail_next(Operation::Write, unavailable());

    let handle = engine
        .set_rules_async("orders", RuleType::Flow, flow_rules())
        .await
        .unwrap();
    let err = handle.wait().await.unwrap_err();

    assert!(matches!(err, Error::Remote { operation: "write item", .. }));
}

#[tokio::test]
async fn test_fire_and_forget_still_publishes() {
    let center = Arc::new(RecordingConfigCenter::new().with_latency(Duration::from_millis(5)));
    let engine = engine(&center);

    let handle = engine
        .set_rules_async("orders", RuleType::Flow, flow_rules())
        .await
        .unwrap();
    drop(handle);

    for _ in 0..100 {
        if center.store().releases(APP_ID, "app.orders").len() == 2 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(center.store().releases(APP_ID, "app.orders").len(), 2);
}

#[tokio::test]
async fn test_set_all_rules_publishes_once_per_project() {
    let center = Arc::new(RecordingConfigCenter::new());
    let engine = engine(&center);
    engine.register_project_if_absent("orders").await.unwrap();
    engine.register_project_if_absent("billing").await.unwrap();
    center.reset_calls();

    let projects = BTreeMap::from([
        (
            "orders".to_string(),
            BTreeMap::from([
                (RuleType::Flow, flow_rules()),
                (RuleType::Degrade, vec![json!({"resource": "/orders", "grade": 0})]),
            ]),
        ),
        (
            "billing".to_string(),
            BTreeMap::from([(RuleType::System, vec![json!({"highestCpuUsage": 0.8})])]),
        ),
    ]);
    engine.set_all_rules(&projects).await.unwrap();

    // Projects are pushed in name order, each closed by a single publish
    assert_eq!(
        center.operations(),
        vec![
            Operation::Write,
            Operation::Publish,
            Operation::Write,
            Operation::Write,
            Operation::Publish,
        ]
    );
    let read = engine.get_rules("orders").await.unwrap();
    assert_eq!(read.len(), 2);
}

#[tokio::test]
async fn test_set_all_rules_provisions_unknown_projects() {
    let center = Arc::new(RecordingConfigCenter::new());
    let engine = engine(&center);

    let projects = BTreeMap::from([(
        "orders".to_string(),
        BTreeMap::from([
            (RuleType::Flow, flow_rules()),
            (RuleType::Degrade, vec![json!({"resource": "/orders", "grade": 0})]),
        ]),
    )]);
    engine.set_all_rules(&projects).await.unwrap();

    assert_eq!(
        center.operations(),
        vec![
            Operation::Get,
            Operation::Create,
            Operation::Publish,
            Operation::Write,
            Operation::Write,
            Operation::Publish,
        ]
    );
    let releases = center.store().releases(APP_ID, "app.orders");
    assert_eq!(releases.len(), 2);
    assert!(releases[0].title.ends_with("-first-publish-release"));
    assert!(releases[1].title.starts_with("rule dashboard operate on "));
    assert!(engine.list_cached_project_names().contains("orders"));
    assert_eq!(engine.get_rules("orders").await.unwrap(), projects["orders"]);
}

#[tokio::test]
async fn test_set_all_rules_stops_at_first_remote_failure() {
    let center = Arc::new(RecordingConfigCenter::new());
    let engine = engine(&center);
    engine.register_project_if_absent("billing").await.unwrap();
    engine.register_project_if_absent("orders").await.unwrap();
    center.reset_calls();
    center.fail_next(Operation::Publish, unavailable());

    let projects = BTreeMap::from([
        ("billing".to_string(), BTreeMap::from([(RuleType::Flow, flow_rules())])),
        ("orders".to_string(), BTreeMap::from([(RuleType::Flow, flow_rules())])),
    ]);
    let err = engine.set_all_rules(&projects).await.unwrap_err();

    assert!(matches!(
        err,
        Error::Remote {
            operation: "publish",
            ref namespace,
            ..
        } if namespace == "app.billing"
    ));
    // Nothing reaches the second project
    assert_eq!(center.operations(), vec![Operation::Write, Operation::Publish]);
    assert_eq!(
        center
            .store()
            .item_value(APP_ID, "app.orders", "orders.flow-rules"),
        None
    );
}

#[tokio::test]
async fn test_set_all_rules_validates_everything_first() {
    let center = Arc::new(RecordingConfigCenter::new());
    let engine = engine(&center);

    let projects = BTreeMap::from([
        ("a-valid-project".to_string(), BTreeMap::from([(RuleType::Flow, flow_rules())])),
        ("z".repeat(40), BTreeMap::from([(RuleType::Flow, flow_rules())])),
    ]);
    let err = engine.set_all_rules(&projects).await.unwrap_err();

    assert!(err.is_invalid_argument());
    assert!(center.calls().is_empty());
}

#[tokio::test]
async fn test_get_rules_ignores_foreign_keys() {
    let center = Arc::new(RecordingConfigCenter::new());
    let engine = engine(&center);
    engine
        .set_rules("orders", RuleType::Flow, flow_rules())
        .await
        .unwrap();
    center
        .store()
        .create_or_update_item(
            &bridge_test_utils::fixtures::target(),
            "app.orders",
            &bridge_core::Item {
                key: "orders.notes".to_string(),
                value: "not rules".to_string(),
                modified_by: "someone".to_string(),
            },
        )
        .await
        .unwrap();
    center
        .store()
        .publish_namespace(
            &bridge_test_utils::fixtures::target(),
            "app.orders",
            &bridge_core::Release {
                title: "manual edit".to_string(),
                released_by: "someone".to_string(),
            },
        )
        .await
        .unwrap();

    let rules = engine.get_rules("orders").await.unwrap();

    assert_eq!(rules, BTreeMap::from([(RuleType::Flow, flow_rules())]));
}

#[tokio::test]
async fn test_get_rules_reads_published_state_only() {
    let center = Arc::new(RecordingConfigCenter::new());
    let engine = engine(&center);
    engine
        .set_rules("orders", RuleType::Flow, flow_rules())
        .await
        .unwrap();
    center.fail_next(Operation::Publish, unavailable());

    let outcome = engine
        .set_rules("orders", RuleType::Flow, vec![json!({"resource": "/draft"})])
        .await
        .unwrap();

    assert!(!outcome.is_published());
    assert_eq!(
        engine.get_rules("orders").await.unwrap(),
        BTreeMap::from([(RuleType::Flow, flow_rules())])
    );
}

#[tokio::test]
async fn test_get_rules_of_missing_project_fails() {
    let center = Arc::new(RecordingConfigCenter::new());
    let engine = engine(&center);

    let err = engine.get_rules("orders").await.unwrap_err();

    assert!(matches!(
        err,
        Error::Remote {
            source: RemoteError::NotFound { .. },
            ..
        }
    ));
}

#[tokio::test]
async fn test_get_all_rules_enumerates_public_project_namespaces() {
    let center = Arc::new(RecordingConfigCenter::new());
    let engine = engine(&center);
    engine
        .set_rules("orders", RuleType::Flow, flow_rules())
        .await
        .unwrap();
    engine.register_project_if_absent("billing").await.unwrap();
    center.seed_namespace(APP_ID, "application", true).await;
    center.seed_namespace(APP_ID, "app.private", false).await;
    center.seed_namespace(APP_ID, "app.", true).await;

    let all = engine.get_all_rules().await.unwrap();

    assert_eq!(all.keys().cloned().collect::<Vec<_>>(), vec!["billing", "orders"]);
    assert!(all["billing"].is_empty());
    assert_eq!(all["orders"][&RuleType::Flow], flow_rules());
}

#[tokio::test]
async fn test_cache_introspection() {
    let center = Arc::new(RecordingConfigCenter::new());
    let engine = engine(&center);
    engine.register_project_if_absent("orders").await.unwrap();
    engine.register_project_if_absent("billing").await.unwrap();

    let before = engine.list_cached_project_names();
    assert_eq!(before.len(), 2);

    assert!(engine.clear_cache_of_project("billing").unwrap());
    assert!(!engine.clear_cache_of_project("billing").unwrap());
    assert_eq!(engine.list_cached_project_names().len(), 1);

    engine.register_project_if_absent("billing").await.unwrap();
    let cleared = engine.clear_all_cached_project_names();

    assert_eq!(cleared, before);
    assert!(engine.list_cached_project_names().is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_writers_to_same_project() {
    let center = Arc::new(RecordingConfigCenter::new().with_latency(Duration::from_millis(2)));
    let engine = engine(&center);

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let engine = engine.clone();
            tokio::spawn(async move {
                engine
                    .set_rules("orders", RuleType::Flow, vec![json!({"count": i})])
                    .await
            })
        })
        .collect();

    for handle in handles {
        assert!(handle.await.unwrap().unwrap().is_published());
    }

    // One initial publish plus one per writer; the last publish wins
    assert_eq!(center.count(Operation::Create), 1);
    assert_eq!(center.store().releases(APP_ID, "app.orders").len(), 9);
}
