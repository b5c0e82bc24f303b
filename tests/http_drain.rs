//! End-to-end tests for the HTTP request processor and the coordinator.

use std::net::SocketAddr;
use std::sync::atomic::Ordering;
use std::time::{Duration, Instant};

use axum::routing::get;
use axum::Router;
use demo_app::config::AppConfig;
use demo_app::http::HttpServer;
use demo_app::lifecycle::{
    Coordinator, GracePeriod, LifecycleState, RequestProcessor, ShutdownError, SignalListener,
    TerminationSignal, EXIT_STARTUP_FAILURE,
};
use tokio::sync::mpsc;

mod common;

fn config_for(bind_address: &str) -> AppConfig {
    let mut config = AppConfig::default();
    config.listener.bind_address = bind_address.to_string();
    config.app.environment = "test".to_string();
    config
}

fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .no_proxy()
        .timeout(Duration::from_secs(10))
        .build()
        .unwrap()
}

fn slow_route(delay: Duration) -> Router {
    Router::new().route(
        "/slow",
        get(move || async move {
            tokio::time::sleep(delay).await;
            "done"
        }),
    )
}

async fn wait_until_healthy(client: &reqwest::Client, addr: SocketAddr) {
    for _ in 0..50 {
        if let Ok(res) = client.get(format!("http://{}/health", addr)).send().await {
            if res.status().is_success() {
                return;
            }
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    panic!("server at {} never became healthy", addr);
}

#[tokio::test]
async fn serves_routes_then_drains() {
    let server = HttpServer::new(config_for("127.0.0.1:0"));
    let handle = server.start().await.unwrap();
    let addr = handle.local_addr();
    let client = client();

    let res = client.get(format!("http://{}/health", addr)).send().await.unwrap();
    assert_eq!(res.status(), 200);
    assert!(res.headers().contains_key("x-request-id"));
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["status"], "healthy");
    assert!(body["timestamp"].is_string());

    let res = client.get(format!("http://{}/api/info", addr)).send().await.unwrap();
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["application"], "demo-app");
    assert_eq!(body["environment"], "test");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));

    let page = client
        .get(format!("http://{}/", addr))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(page.contains("Available Endpoints"));

    server.drain(handle).await.unwrap();

    let after = client.get(format!("http://{}/health", addr)).send().await;
    assert!(after.is_err(), "listener should be closed after drain");
}

#[tokio::test]
async fn client_request_id_is_echoed() {
    let server = HttpServer::new(config_for("127.0.0.1:0"));
    let handle = server.start().await.unwrap();

    let res = client()
        .get(format!("http://{}/health", handle.local_addr()))
        .header("x-request-id", "trace-abc-123")
        .send()
        .await
        .unwrap();
    assert_eq!(res.headers()["x-request-id"], "trace-abc-123");

    server.drain(handle).await.unwrap();
}

#[tokio::test]
async fn drain_waits_for_in_flight_requests() {
    let server = HttpServer::new(config_for("127.0.0.1:0")).merge(slow_route(Duration::from_millis(400)));
    let handle = server.start().await.unwrap();
    let url = format!("http://{}/slow", handle.local_addr());

    let request = tokio::spawn(async move {
        let res = client().get(url).send().await.unwrap();
        res.text().await.unwrap()
    });

    let in_flight = server.in_flight();
    for _ in 0..20 {
        if in_flight.active_count() == 1 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(in_flight.active_count(), 1);

    let start = Instant::now();
    server.drain(handle).await.unwrap();
    assert!(start.elapsed() >= Duration::from_millis(100));

    assert_eq!(request.await.unwrap(), "done");
    assert_eq!(in_flight.active_count(), 0);
}

#[tokio::test]
async fn coordinator_stops_server_on_signal() {
    let addr: SocketAddr = "127.0.0.1:28491".parse().unwrap();
    let (tx, rx) = mpsc::channel(1);
    let (kills, action) = common::kill_counter();

    let coordinator = Coordinator::new(
        HttpServer::new(config_for(&addr.to_string())),
        SignalListener::from_channel(rx),
        GracePeriod::from_secs(5).unwrap(),
    )
    .with_timeout_action(action);
    let lifecycle = coordinator.lifecycle();
    let run = tokio::spawn(coordinator.run());

    let client = client();
    wait_until_healthy(&client, addr).await;
    assert_eq!(lifecycle.state(), LifecycleState::Running);

    tx.send(TerminationSignal::Terminate).await.unwrap();
    let report = run.await.unwrap().unwrap();

    assert_eq!(report.state, LifecycleState::Stopped);
    assert_eq!(report.signal, Some(TerminationSignal::Terminate));
    assert!(report.elapsed < Duration::from_secs(5));
    assert_eq!(kills.load(Ordering::SeqCst), 0);
    assert!(client.get(format!("http://{}/health", addr)).send().await.is_err());
}

#[tokio::test]
async fn slow_request_past_grace_is_force_killed() {
    let addr: SocketAddr = "127.0.0.1:28492".parse().unwrap();
    let (tx, rx) = mpsc::channel(1);
    let (kills, action) = common::kill_counter();

    let server = HttpServer::new(config_for(&addr.to_string())).merge(slow_route(Duration::from_secs(10)));
    let in_flight = server.in_flight();
    let coordinator = Coordinator::new(
        server,
        SignalListener::from_channel(rx),
        GracePeriod::from_secs(1).unwrap(),
    )
    .with_timeout_action(action);
    let lifecycle = coordinator.lifecycle();
    let run = tokio::spawn(coordinator.run());

    let client = client();
    wait_until_healthy(&client, addr).await;
    let slow = client.get(format!("http://{}/slow", addr)).send();
    let _request = tokio::spawn(slow);

    for _ in 0..20 {
        if in_flight.active_count() == 1 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    let start = Instant::now();
    tx.send(TerminationSignal::Interrupt).await.unwrap();
    let err = run.await.unwrap().unwrap_err();
    let elapsed = start.elapsed();

    assert!(matches!(err, ShutdownError::Timeout(_)));
    assert!(elapsed >= Duration::from_millis(900), "took {:?}", elapsed);
    assert!(elapsed < Duration::from_secs(3), "took {:?}", elapsed);
    assert_eq!(lifecycle.state(), LifecycleState::ForceKilled);
    assert_eq!(kills.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn bind_failure_is_startup_failure() {
    let taken = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = taken.local_addr().unwrap();
    let (kills, action) = common::kill_counter();

    let coordinator = Coordinator::new(
        HttpServer::new(config_for(&addr.to_string())),
        common::signalled(&[TerminationSignal::Terminate]),
        GracePeriod::from_secs(1).unwrap(),
    )
    .with_timeout_action(action);
    let lifecycle = coordinator.lifecycle();

    let err = coordinator.run().await.unwrap_err();

    assert!(matches!(err, ShutdownError::Startup(_)));
    assert_eq!(err.exit_code(), EXIT_STARTUP_FAILURE);
    assert_eq!(lifecycle.state(), LifecycleState::Running);
    assert_eq!(kills.load(Ordering::SeqCst), 0);
}
