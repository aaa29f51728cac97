//! Lockmgr Client Unit Tests
//!
//! Unit tests for individual modules and components.
//! These tests can run without a live coordinator.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use lockmgr_api::model::{LockRequest, LockResponse, RequestKind, ResponseStatus};
use lockmgr_client::{
    ClientConfig, ClientError, ClientState, CyclePhase, CycleReport, FnResponseHandler,
    FnSendListener, LockClient, ResponseHandler, SendListener, WorkerFailure,
};

// ============== Configuration Tests ==============

#[test]
fn test_config_default() {
    let config = ClientConfig::default();
    assert_eq!(config.server_addr, "127.0.0.1:8088");
    assert_eq!(config.worker_count, 10);
    assert_eq!(config.hold_duration, Duration::from_millis(500));
    assert_eq!(config.lock_name, "lock");
    assert!(config.client_id.is_none());
}

#[test]
fn test_config_builder() {
    let config = ClientConfig::new("coordinator:8088")
        .with_workers(3)
        .with_hold_duration(Duration::from_millis(25))
        .with_lock_name("inventory")
        .with_client_id("node-a");

    assert_eq!(config.server_addr, "coordinator:8088");
    assert_eq!(config.worker_count, 3);
    assert_eq!(config.hold_duration, Duration::from_millis(25));
    assert_eq!(config.lock_name, "inventory");
    assert_eq!(config.client_id.as_deref(), Some("node-a"));
}

// ============== Identity Tests ==============

#[test]
fn test_requestor_ids_combine_client_id_and_discriminator() {
    let client = LockClient::new(ClientConfig::default().with_client_id("node-a"));
    assert_eq!(client.requestor_id(0), "node-a-0");
    assert_eq!(client.requestor_id(9), "node-a-9");
}

#[test]
fn test_distinct_discriminators_give_distinct_requestors() {
    let client = LockClient::new(ClientConfig::default());
    let ids: Vec<String> = (0..10).map(|i| client.requestor_id(i)).collect();
    for (i, id) in ids.iter().enumerate() {
        assert_eq!(ids.iter().filter(|other| *other == id).count(), 1, "{i}");
    }
}

// ============== State Tests ==============

#[test]
fn test_client_starts_in_new_state() {
    let client = LockClient::new(ClientConfig::default());
    assert_eq!(client.state(), ClientState::New);
}

#[tokio::test]
async fn test_stop_before_start_is_a_noop() {
    let client = LockClient::new(ClientConfig::default());
    client.stop().await;
    client.stop().await;
    assert_eq!(client.state(), ClientState::Stopped);
    assert!(!client.is_connected().await);
}

#[tokio::test]
async fn test_send_without_connection_reports_not_connected() {
    let client = LockClient::new(ClientConfig::default());
    let err = client.send_lock_request("lock", 0).await.unwrap_err();
    assert!(matches!(err, ClientError::NotConnected));
    assert!(err.is_send_failure());
}

// ============== Report Tests ==============

#[test]
fn test_cycle_report_is_clean() {
    let report = CycleReport {
        workers: 10,
        failures: Vec::new(),
    };
    assert!(report.is_clean());

    let report = CycleReport {
        workers: 10,
        failures: vec![WorkerFailure {
            worker: 4,
            phase: CyclePhase::Release,
            error: ClientError::ChannelClosed,
        }],
    };
    assert!(!report.is_clean());
    assert_eq!(report.failures[0].phase, CyclePhase::Release);
}

// ============== Listener Adapter Tests ==============

#[test]
fn test_fn_send_listener_counts_completions() {
    let completions = Arc::new(AtomicUsize::new(0));
    let counted = completions.clone();
    let listener = FnSendListener::new(move |_: &LockRequest, result: &lockmgr_client::Result<()>| {
        if result.is_ok() {
            counted.fetch_add(1, Ordering::SeqCst);
        }
    });

    listener.on_send_complete(&LockRequest::trylock("lock", "c-0"), &Ok(()));
    listener.on_send_complete(
        &LockRequest::unlock("lock", "c-0"),
        &Err(ClientError::ChannelClosed),
    );
    assert_eq!(completions.load(Ordering::SeqCst), 1);
}

#[test]
fn test_fn_response_handler_sees_status() {
    let granted = Arc::new(AtomicUsize::new(0));
    let counted = granted.clone();
    let handler = FnResponseHandler::new(move |response: &LockResponse| {
        if response.status == ResponseStatus::Granted {
            counted.fetch_add(1, Ordering::SeqCst);
        }
    });

    handler.on_response(&LockResponse::new("lock", "c-0", ResponseStatus::Granted));
    handler.on_response(&LockResponse::new("lock", "c-1", ResponseStatus::Denied));
    assert_eq!(granted.load(Ordering::SeqCst), 1);
}

// ============== Wire Model Sanity ==============

#[test]
fn test_request_kinds_cover_the_protocol() {
    assert_eq!(RequestKind::Lock.as_str(), "LOCK");
    assert_eq!(RequestKind::Trylock.as_str(), "TRYLOCK");
    assert_eq!(RequestKind::Unlock.as_str(), "UNLOCK");
}
