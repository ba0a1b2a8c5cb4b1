use std::sync::Arc;
use std::time::Duration;

use reqwest::StatusCode;
use serde_json::json;
use tokio_util::sync::CancellationToken;

use k6svc_api::app::{build_app, services::AppServices};
use k6svc_core::ServiceConfig;
use k6svc_events::{FinishedEventData, InMemoryEventSender, Status, TaskResult};

const FIXTURE: &str = include_str!("../../../test-events/test.triggered.json");

struct TestServer {
    base_url: String,
    sender: Arc<InMemoryEventSender>,
    shutdown: CancellationToken,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn(sender: InMemoryEventSender, action_duration: Duration) -> Self {
        let config = ServiceConfig::default()
            .with_path("/")
            .with_action_duration(action_duration);
        let sender = Arc::new(sender);
        let shutdown = CancellationToken::new();

        let services = AppServices::with_sender(&config, sender.clone(), shutdown.clone())
            .expect("failed to wire services");
        // Same router as prod, bound to an ephemeral port.
        let app = build_app(&config, Arc::new(services));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{addr}"),
            sender,
            shutdown,
            handle,
        }
    }

    async fn quick() -> Self {
        Self::spawn(InMemoryEventSender::new(), Duration::from_millis(10)).await
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn trigger(event_type: &str, strategy: &str) -> serde_json::Value {
    json!({
        "specversion": "1.0",
        "id": "evt-1",
        "source": "shipyard-controller",
        "type": event_type,
        "shkeptncontext": "ctx-1",
        "data": { "project": "sockshop", "test": { "teststrategy": strategy } }
    })
}

async fn post_structured(server: &TestServer, body: &serde_json::Value) -> reqwest::Response {
    reqwest::Client::new()
        .post(format!("{}/", server.base_url))
        .header("content-type", "application/cloudevents+json")
        .body(serde_json::to_vec(body).unwrap())
        .send()
        .await
        .unwrap()
}

#[tokio::test]
async fn health_and_ready() {
    let server = TestServer::quick().await;
    let client = reqwest::Client::new();

    for path in ["health", "ready"] {
        let res = client.get(format!("{}/{path}", server.base_url)).send().await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let body: serde_json::Value = res.json().await.unwrap();
        assert_eq!(body, json!({ "status": "OK" }));
    }

    let res = client.get(format!("{}/metrics", server.base_url)).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body, json!({ "status": "NOT FOUND" }));
}

#[tokio::test]
async fn functional_trigger_emits_started_and_finished() {
    let server = TestServer::quick().await;

    let res = post_structured(&server, &trigger("sh.keptn.event.test.triggered", "functional")).await;
    assert_eq!(res.status(), StatusCode::ACCEPTED);

    let sent = server.sender.sent();
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[0].event_type(), "sh.keptn.event.test.started");
    assert_eq!(sent[1].event_type(), "sh.keptn.event.test.finished");
    for e in &sent {
        assert_eq!(e.context().map(|c| c.as_str()), Some("ctx-1"));
        assert_eq!(e.triggered_id().map(|id| id.as_str()), Some("evt-1"));
    }

    let finished: FinishedEventData = sent[1].data_as().unwrap();
    assert_eq!(finished.status, Status::Succeeded);
    assert_eq!(finished.result, TaskResult::Pass);
}

#[tokio::test]
async fn fixture_event_is_accepted() {
    let server = TestServer::quick().await;

    let res = reqwest::Client::new()
        .post(format!("{}/", server.base_url))
        .header("content-type", "application/cloudevents+json")
        .body(FIXTURE)
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::ACCEPTED);
    assert_eq!(server.sender.len(), 2);
}

#[tokio::test]
async fn binary_mode_other_strategy_is_skipped() {
    let server = TestServer::quick().await;

    let res = reqwest::Client::new()
        .post(format!("{}/", server.base_url))
        .header("content-type", "application/json")
        .header("ce-specversion", "1.0")
        .header("ce-id", "evt-2")
        .header("ce-source", "shipyard-controller")
        .header("ce-type", "sh.keptn.event.test.triggered")
        .header("ce-shkeptncontext", "ctx-2")
        .body(r#"{ "test": { "teststrategy": "performance" } }"#)
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::ACCEPTED);
    assert!(server.sender.is_empty());
}

#[tokio::test]
async fn unknown_type_is_rejected_without_notifications() {
    let server = TestServer::quick().await;

    let res = post_structured(&server, &trigger("unknown.type", "functional")).await;

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "unhandled_event_type");
    assert!(body["message"].as_str().unwrap().contains("unknown.type"));
    assert!(server.sender.is_empty());
}

#[tokio::test]
async fn malformed_and_mismatched_bodies_are_rejected() {
    let server = TestServer::quick().await;

    let res = reqwest::Client::new()
        .post(format!("{}/", server.base_url))
        .header("content-type", "application/cloudevents+json")
        .body("{ definitely not json")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "decode_error");

    let mut mismatched = trigger("sh.keptn.event.test.triggered", "functional");
    mismatched["data"] = json!({ "project": "sockshop" });
    let res = post_structured(&server, &mismatched).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "schema_error");

    assert!(server.sender.is_empty());
}

#[tokio::test]
async fn send_failure_is_a_bad_gateway() {
    let server = TestServer::spawn(InMemoryEventSender::failing(), Duration::from_millis(10)).await;

    let res = post_structured(&server, &trigger("sh.keptn.event.test.triggered", "functional")).await;

    assert_eq!(res.status(), StatusCode::BAD_GATEWAY);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "send_error");
}

#[tokio::test]
async fn shutdown_cancels_running_action() {
    let server = TestServer::spawn(InMemoryEventSender::new(), Duration::from_secs(60)).await;

    let shutdown = server.shutdown.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        shutdown.cancel();
    });

    let res = post_structured(&server, &trigger("sh.keptn.event.test.triggered", "functional")).await;

    assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "task_cancelled");

    let sent = server.sender.sent();
    assert_eq!(sent.len(), 2);
    let finished: FinishedEventData = sent[1].data_as().unwrap();
    assert_eq!(finished.status, Status::Errored);
    assert_eq!(finished.result, TaskResult::Failed);
}

#[tokio::test]
async fn client_disconnect_cancels_running_action() {
    let server = TestServer::spawn(InMemoryEventSender::new(), Duration::from_secs(60)).await;

    let client = reqwest::Client::builder()
        .timeout(Duration::from_millis(200))
        .build()
        .unwrap();
    let res = client
        .post(format!("{}/", server.base_url))
        .header("content-type", "application/cloudevents+json")
        .body(serde_json::to_vec(&trigger("sh.keptn.event.test.triggered", "functional")).unwrap())
        .send()
        .await;
    assert!(res.unwrap_err().is_timeout());

    // The receiver only notices the dropped connection asynchronously.
    for _ in 0..50 {
        if server.sender.len() >= 2 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }

    assert!(!server.shutdown.is_cancelled());
    assert_eq!(
        server.sender.sent_types(),
        vec!["sh.keptn.event.test.started", "sh.keptn.event.test.finished"]
    );
    let finished: FinishedEventData = server.sender.sent()[1].data_as().unwrap();
    assert_eq!(finished.status, Status::Errored);
    assert_eq!(finished.result, TaskResult::Failed);
    assert_eq!(finished.message, "action cancelled");
}
