// Run loop integration tests: register, cycle, shutdown (wiremock backend)

mod common;

use std::time::Duration;

use collector::backend::BackendClient;
use collector::error::CollectorError;
use collector::runner::{RunState, Runner};
use collector::sampler::Sampler;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const REGISTER_PATH: &str = "/api/servers/register";
const METRICS_PATH: &str = "/api/metrics";

async fn mount_register_ok(mock_server: &MockServer, id: i64) {
    Mock::given(method("POST"))
        .and(path(REGISTER_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "success": true,
            "data": {"id": id}
        })))
        .mount(mock_server)
        .await;
}

#[tokio::test]
async fn test_registration_refused_never_enters_running() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(REGISTER_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "success": false,
            "error": "registration disabled"
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = common::agent_config(&mock_server.uri(), 1, 2, 0);
    let backend = BackendClient::new(&config.backend.url).unwrap();
    let sampler = Sampler::with_cpu_window(Duration::from_millis(250));
    let (_shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();
    let mut runner = Runner::new(&config, backend, sampler, shutdown_rx);

    let err = runner.run().await.unwrap_err();
    assert!(matches!(err, CollectorError::RegistrationFailed(_)));
    assert_eq!(runner.state(), RunState::Stopped);

    // No metric was ever posted
    let metric_posts = mock_server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .filter(|r| r.url.path() == METRICS_PATH)
        .count();
    assert_eq!(metric_posts, 0);
}

#[tokio::test]
async fn test_end_to_end_delivers_registered_id_each_cycle() {
    let mock_server = MockServer::start().await;
    mount_register_ok(&mock_server, 42).await;
    Mock::given(method("POST"))
        .and(path(METRICS_PATH))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({"success": true})),
        )
        .mount(&mock_server)
        .await;

    // interval 1s, 2 attempts, no retry delay; short CPU window keeps cycles fast
    let config = common::agent_config(&mock_server.uri(), 1, 2, 0);
    let backend = BackendClient::new(&config.backend.url).unwrap();
    let sampler = Sampler::with_cpu_window(Duration::from_millis(250));
    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();
    let mut runner = Runner::new(&config, backend, sampler, shutdown_rx);

    let handle = tokio::spawn(async move {
        let result = runner.run().await;
        (result, runner.state())
    });

    tokio::time::sleep(Duration::from_millis(4200)).await;
    let _ = shutdown_tx.send(());
    let (result, state) = handle.await.unwrap();
    result.expect("clean stop");
    assert_eq!(state, RunState::Stopped);

    let requests = mock_server.received_requests().await.unwrap();
    let metric_posts: Vec<_> = requests
        .iter()
        .filter(|r| r.url.path() == METRICS_PATH)
        .collect();
    assert!(
        metric_posts.len() >= 3,
        "expected >= 3 deliveries, got {}",
        metric_posts.len()
    );
    for request in metric_posts {
        let body: serde_json::Value = serde_json::from_slice(&request.body).unwrap();
        assert_eq!(body["server_id"], 42);
    }
}

#[tokio::test]
async fn test_delivery_failures_do_not_stop_the_loop() {
    let mock_server = MockServer::start().await;
    mount_register_ok(&mock_server, 7).await;
    Mock::given(method("POST"))
        .and(path(METRICS_PATH))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let config = common::agent_config(&mock_server.uri(), 1, 2, 0);
    let backend = BackendClient::new(&config.backend.url).unwrap();
    let sampler = Sampler::with_cpu_window(Duration::from_millis(250));
    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();
    let mut runner = Runner::new(&config, backend, sampler, shutdown_rx);

    let handle = tokio::spawn(async move {
        let result = runner.run().await;
        (result, runner.state())
    });

    tokio::time::sleep(Duration::from_millis(3000)).await;
    let _ = shutdown_tx.send(());
    let (result, state) = handle.await.unwrap();

    // Exhausted retries every cycle, yet the run ended cleanly on shutdown
    result.expect("delivery failures are non-fatal");
    assert_eq!(state, RunState::Stopped);

    let metric_posts = mock_server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .filter(|r| r.url.path() == METRICS_PATH)
        .count();
    // 2 attempts per cycle, at least 2 cycles in 3s
    assert!(metric_posts >= 4, "expected >= 4 attempts, got {metric_posts}");
}
