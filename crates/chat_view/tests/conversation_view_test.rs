//! Integration tests for the conversation view against a mock backend

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chat_client::{BackendClient, SessionError, TokenSource};
use chat_core::{Config, ConversationRef, CreationStatus, ResponseRecord};
use chat_view::{
    Alert, AlertChannel, ConversationView, FetchOutcome, FetchPhase, Navigator, Route, Severity,
    ViewContext, ViewStatus, UNABLE_TO_GET_RESPONSES,
};
use serde_json::json;
use tokio::sync::mpsc::UnboundedReceiver;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

struct Harness {
    ctx: ViewContext,
    alerts: UnboundedReceiver<Alert>,
    routes: UnboundedReceiver<Route>,
}

impl Harness {
    fn new(backend_url: String) -> Self {
        let config = Config {
            backend_url,
            ..Config::default()
        };
        let backend = BackendClient::new(&config).expect("client");
        let (alerts_tx, alerts) = AlertChannel::new();
        let (navigator, routes) = Navigator::new();
        Self {
            ctx: ViewContext::new(backend, alerts_tx, navigator),
            alerts,
            routes,
        }
    }

    fn drain_alerts(&mut self) -> Vec<Alert> {
        let mut out = Vec::new();
        while let Ok(alert) = self.alerts.try_recv() {
            out.push(alert);
        }
        out
    }

    fn drain_routes(&mut self) -> Vec<Route> {
        let mut out = Vec::new();
        while let Ok(route) = self.routes.try_recv() {
            out.push(route);
        }
        out
    }
}

fn records_json() -> serde_json::Value {
    json!([
        { "response_id": "r1", "choice_id": "c1", "conversation_id": "conv-1", "message": "hi" },
        { "response_id": "r2", "choice_id": "c2", "conversation_id": "conv-1", "message": "again" }
    ])
}

async fn fetch_count(server: &MockServer) -> usize {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|req| req.url.path() == "/response")
        .count()
}

struct StaticToken(Result<String, SessionError>, AtomicUsize);

#[async_trait]
impl TokenSource for StaticToken {
    async fn access_token(&self) -> Result<String, SessionError> {
        self.1.fetch_add(1, Ordering::SeqCst);
        self.0.clone()
    }
}

#[tokio::test]
async fn test_fetch_loads_and_replaces_responses() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/response"))
        .and(query_param("conversation_id", "conv-1"))
        .and(header("Authorization", "Bearer tok"))
        .respond_with(ResponseTemplate::new(200).set_body_json(records_json()))
        .expect(1)
        .mount(&server)
        .await;

    let mut h = Harness::new(server.uri());
    h.ctx
        .store
        .push_response(ResponseRecord::new("old", "stale", "stale"));
    let view = ConversationView::mount("conv-1", h.ctx.clone());
    assert_eq!(view.status(), ViewStatus::Loading);

    let outcome = view.fetch_once(Some("tok")).await;
    assert_eq!(outcome, FetchOutcome::Loaded { count: 2 });
    assert_eq!(view.fetch_phase(), FetchPhase::Done);
    assert_eq!(view.status(), ViewStatus::Ready);

    let ids: Vec<_> = h
        .ctx
        .store
        .responses()
        .into_iter()
        .map(|r| r.response_id)
        .collect();
    assert_eq!(ids, ["r1", "r2"]);
    assert!(h.drain_alerts().is_empty());
}

#[tokio::test]
async fn test_fetch_runs_at_most_once() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/response"))
        .respond_with(ResponseTemplate::new(200).set_body_json(records_json()))
        .expect(1)
        .mount(&server)
        .await;

    let h = Harness::new(server.uri());
    let view = ConversationView::mount("conv-1", h.ctx.clone());

    assert_eq!(view.fetch_once(None).await, FetchOutcome::AwaitingToken);
    assert!(matches!(
        view.fetch_once(Some("tok")).await,
        FetchOutcome::Loaded { .. }
    ));
    // New token, changed state: still no second fetch.
    h.ctx.store.add_conversation(ConversationRef::new("conv-1", "Hello"));
    assert_eq!(
        view.fetch_once(Some("tok-2")).await,
        FetchOutcome::AlreadyStarted
    );
    assert_eq!(fetch_count(&server).await, 1);
}

#[tokio::test]
async fn test_concurrent_fetches_issue_one_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/response"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(records_json())
                .set_delay(Duration::from_millis(100)),
        )
        .mount(&server)
        .await;

    let h = Harness::new(server.uri());
    let view = ConversationView::mount("conv-1", h.ctx.clone());

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let view = Arc::clone(&view);
            tokio::spawn(async move { view.fetch_once(Some("tok")).await })
        })
        .collect();

    let mut loaded = 0;
    for handle in handles {
        match handle.await.expect("join") {
            FetchOutcome::Loaded { .. } => loaded += 1,
            FetchOutcome::AlreadyStarted => {}
            other => panic!("unexpected outcome {other:?}"),
        }
    }
    assert_eq!(loaded, 1);
    assert_eq!(fetch_count(&server).await, 1);
}

#[tokio::test]
async fn test_conversation_being_created_is_not_fetched() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/response"))
        .respond_with(ResponseTemplate::new(200).set_body_json(records_json()))
        .expect(0)
        .mount(&server)
        .await;

    let h = Harness::new(server.uri());
    h.ctx
        .store
        .set_create_status(CreationStatus::creating("conv-1", "Generating..."));
    let view = ConversationView::mount("conv-1", h.ctx.clone());

    assert_eq!(
        view.fetch_once(Some("tok")).await,
        FetchOutcome::SkippedCreating
    );
    assert_eq!(view.fetch_phase(), FetchPhase::Done);
    assert_eq!(
        view.status(),
        ViewStatus::Creating {
            message: "Generating...".to_string()
        }
    );

    // Creation finishing later does not trigger a fetch either.
    h.ctx.store.clear_create_status();
    assert_eq!(
        view.fetch_once(Some("tok")).await,
        FetchOutcome::AlreadyStarted
    );
    assert_eq!(view.status(), ViewStatus::Ready);
}

#[tokio::test]
async fn test_server_error_raises_single_alert() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/response"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({ "detail": "boom" })))
        .mount(&server)
        .await;

    let mut h = Harness::new(server.uri());
    let view = ConversationView::mount("conv-1", h.ctx.clone());

    assert_eq!(
        view.fetch_once(Some("tok")).await,
        FetchOutcome::Degraded { applied: false }
    );
    assert_eq!(view.fetch_phase(), FetchPhase::Done);
    assert_eq!(
        h.drain_alerts(),
        vec![Alert {
            severity: Severity::Error,
            message: UNABLE_TO_GET_RESPONSES.to_string(),
        }]
    );
    assert!(h.drain_routes().is_empty());
    assert!(h.ctx.store.responses().is_empty());
}

#[tokio::test]
async fn test_error_status_with_response_list_still_applies_it() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/response"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!([])))
        .mount(&server)
        .await;

    let mut h = Harness::new(server.uri());
    h.ctx
        .store
        .push_response(ResponseRecord::new("other", "r9", "c9"));
    let view = ConversationView::mount("conv-1", h.ctx.clone());

    assert_eq!(
        view.fetch_once(Some("tok")).await,
        FetchOutcome::Degraded { applied: true }
    );
    assert!(h.ctx.store.responses().is_empty());
    assert_eq!(h.drain_alerts().len(), 1);
}

#[tokio::test]
async fn test_unreadable_success_body_alerts() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/response"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
        .mount(&server)
        .await;

    let mut h = Harness::new(server.uri());
    let view = ConversationView::mount("conv-1", h.ctx.clone());

    assert_eq!(
        view.fetch_once(Some("tok")).await,
        FetchOutcome::Degraded { applied: false }
    );
    let alerts = h.drain_alerts();
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].message, UNABLE_TO_GET_RESPONSES);
}

#[tokio::test]
async fn test_transport_failure_navigates_to_list() {
    let mut h = Harness::new("http://127.0.0.1:9".to_string());
    let view = ConversationView::mount("conv-1", h.ctx.clone());

    assert_eq!(view.fetch_once(Some("tok")).await, FetchOutcome::Failed);
    assert_eq!(view.fetch_phase(), FetchPhase::Abandoned);
    assert_eq!(view.status(), ViewStatus::Loading);

    let alerts = h.drain_alerts();
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].severity, Severity::Error);
    assert_eq!(h.drain_routes(), vec![Route::ConversationList]);
}

#[tokio::test]
async fn test_unmount_discards_in_flight_result() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/response"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(records_json())
                .set_delay(Duration::from_millis(200)),
        )
        .mount(&server)
        .await;

    let mut h = Harness::new(server.uri());
    let view = ConversationView::mount("conv-1", h.ctx.clone());

    let fetch = {
        let view = Arc::clone(&view);
        tokio::spawn(async move { view.fetch_once(Some("tok")).await })
    };
    tokio::time::sleep(Duration::from_millis(50)).await;
    view.unmount();

    assert_eq!(fetch.await.expect("join"), FetchOutcome::Discarded);
    assert!(h.ctx.store.responses().is_empty());
    assert!(h.drain_alerts().is_empty());
    assert!(h.drain_routes().is_empty());
}

#[tokio::test]
async fn test_pointer_follows_store_changes() {
    let h = Harness::new("http://127.0.0.1:9".to_string());
    let view = ConversationView::mount("conv-1", h.ctx.clone());
    let mut pointer = h.ctx.store.subscribe_current_response();
    let sync = view.spawn_pointer_sync();

    // Responses without the conversation in the list: nothing derived.
    h.ctx
        .store
        .push_response(ResponseRecord::new("conv-1", "r1", "c1"));
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(h.ctx.store.current_response().is_none());

    h.ctx.store.add_conversation(ConversationRef::new("conv-1", "Rust"));
    tokio::time::timeout(Duration::from_secs(1), pointer.changed())
        .await
        .expect("pointer update")
        .expect("sender alive");
    assert_eq!(
        h.ctx.store.current_response().map(|p| p.response_id),
        Some("r1".to_string())
    );
    assert_eq!(view.display_title().as_deref(), Some("Chat: Rust"));

    h.ctx
        .store
        .push_response(ResponseRecord::new("conv-1", "r2", "c2"));
    tokio::time::timeout(Duration::from_secs(1), pointer.changed())
        .await
        .expect("pointer update")
        .expect("sender alive");
    assert_eq!(
        h.ctx.store.current_response().map(|p| p.response_id),
        Some("r2".to_string())
    );

    view.unmount();
    tokio::time::timeout(Duration::from_secs(1), sync)
        .await
        .expect("sync stops")
        .expect("join");
}

#[tokio::test]
async fn test_pointer_ignores_previous_conversation_records() {
    let h = Harness::new("http://127.0.0.1:9".to_string());
    h.ctx.store.set_conversations(vec![
        ConversationRef::new("conv-a", "First"),
        ConversationRef::new("conv-b", "Second"),
    ]);
    // Left behind by a view of conv-a sharing the same store.
    h.ctx
        .store
        .set_responses(vec![ResponseRecord::new("conv-a", "rA", "cA")]);

    let view = ConversationView::mount("conv-b", h.ctx.clone());
    assert!(!view.sync_pointer());
    assert!(h.ctx.store.current_response().is_none());
    assert_eq!(view.display_title(), None);

    h.ctx
        .store
        .push_response(ResponseRecord::new("conv-b", "rB", "cB"));
    assert!(view.sync_pointer());
    let pointer = h.ctx.store.current_response().expect("pointer");
    assert_eq!(pointer.conversation_id, "conv-b");
    assert_eq!(pointer.response_id, "rB");
}

#[tokio::test]
async fn test_load_uses_session_token() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/response"))
        .and(header("Authorization", "Bearer from-session"))
        .respond_with(ResponseTemplate::new(200).set_body_json(records_json()))
        .expect(1)
        .mount(&server)
        .await;

    let h = Harness::new(server.uri());
    let view = ConversationView::mount("conv-1", h.ctx.clone());
    let session = StaticToken(Ok("from-session".to_string()), AtomicUsize::new(0));

    assert_eq!(view.load(&session).await, FetchOutcome::Loaded { count: 2 });
    // A finished view does not ask the session again.
    assert_eq!(view.load(&session).await, FetchOutcome::AlreadyStarted);
    assert_eq!(session.1.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_load_with_expired_session_redirects_to_login() {
    let server = MockServer::start().await;
    let mut h = Harness::new(server.uri());
    let view = ConversationView::mount("conv-1", h.ctx.clone());
    let session = StaticToken(Err(SessionError::SessionExpired), AtomicUsize::new(0));

    assert_eq!(view.load(&session).await, FetchOutcome::SignInRequired);
    assert_eq!(h.drain_routes(), vec![Route::Login]);
    let alerts = h.drain_alerts();
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].message, "Session expired, please sign in again");
    assert_eq!(fetch_count(&server).await, 0);
}
