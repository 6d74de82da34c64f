//! Container smoke workflow against a scripted engine.
//!
//! The "container" is an axum app on 127.0.0.1; the fake engine only records
//! what the workflow asked of it and answers from its script.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use axum::routing::get;
use tokio::net::TcpListener;

use dockwait::config::{Config, SmokeConfig};
use dockwait::container::{
    ContainerEngine, ContainerError, ContainerHandle, ContainerSpec, Result,
};
use dockwait::readiness::PollPolicy;
use dockwait::smoke::SmokeSuite;
use dockwait::workflow::{Workflow, WorkflowOptions, WorkflowStatus};

// ---------------------------------------------------------------------------
// Fake engine
// ---------------------------------------------------------------------------

struct FakeEngine {
    reachable: bool,
    image_present: AtomicBool,
    running: AtomicBool,
    /// Port reported by `host_port`, for specs that ask the engine to pick.
    assigned_port: Option<u16>,
    logs: Vec<String>,
    pull_delay: Duration,
    pulls: AtomicU32,
    runs: AtomicU32,
    removes: AtomicU32,
    log_requests: AtomicU32,
}

impl FakeEngine {
    fn new() -> Self {
        Self {
            reachable: true,
            image_present: AtomicBool::new(true),
            running: AtomicBool::new(true),
            assigned_port: None,
            logs: vec![
                "starting server".to_string(),
                "listening on :80".to_string(),
            ],
            pull_delay: Duration::ZERO,
            pulls: AtomicU32::new(0),
            runs: AtomicU32::new(0),
            removes: AtomicU32::new(0),
            log_requests: AtomicU32::new(0),
        }
    }

    fn unreachable() -> Self {
        Self {
            reachable: false,
            ..Self::new()
        }
    }

    fn without_image(self) -> Self {
        self.image_present.store(false, Ordering::Relaxed);
        self
    }

    fn pulling_for(mut self, delay: Duration) -> Self {
        self.pull_delay = delay;
        self
    }

    fn assigning_port(mut self, port: u16) -> Self {
        self.assigned_port = Some(port);
        self
    }

    fn count(counter: &AtomicU32) -> u32 {
        counter.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl ContainerEngine for FakeEngine {
    async fn ping(&self) -> Result<()> {
        if self.reachable {
            Ok(())
        } else {
            Err(ContainerError::EngineNotAvailable {
                reason: "no socket".to_string(),
            })
        }
    }

    async fn image_present(&self, _image: &str) -> Result<bool> {
        Ok(self.image_present.load(Ordering::Relaxed))
    }

    async fn pull_image(&self, _image: &str) -> Result<()> {
        self.pulls.fetch_add(1, Ordering::Relaxed);
        if !self.pull_delay.is_zero() {
            tokio::time::sleep(self.pull_delay).await;
        }
        self.image_present.store(true, Ordering::Relaxed);
        Ok(())
    }

    async fn run(&self, spec: &ContainerSpec) -> Result<ContainerHandle> {
        self.runs.fetch_add(1, Ordering::Relaxed);
        Ok(ContainerHandle {
            id: "0123456789abcdef0123".to_string(),
            name: spec.name.clone(),
        })
    }

    async fn is_running(&self, _id: &str) -> Result<bool> {
        Ok(self.running.load(Ordering::Relaxed))
    }

    async fn host_port(&self, _id: &str, _container_port: u16) -> Result<Option<u16>> {
        Ok(self.assigned_port)
    }

    async fn logs(&self, _id: &str, tail: usize) -> Result<Vec<String>> {
        self.log_requests.fetch_add(1, Ordering::Relaxed);
        let skip = self.logs.len().saturating_sub(tail);
        Ok(self.logs[skip..].to_vec())
    }

    async fn remove(&self, _id: &str) -> Result<()> {
        self.removes.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn spawn_app() -> u16 {
    let app = Router::new().route("/", get(|| async { "<h1>Hello from the app</h1>" }));
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    port
}

/// App that answers its first request, then stops answering.
async fn spawn_app_that_stalls() -> u16 {
    let hits = Arc::new(AtomicU32::new(0));
    let app = Router::new().route(
        "/",
        get(move || {
            let hits = hits.clone();
            async move {
                if hits.fetch_add(1, Ordering::Relaxed) > 0 {
                    tokio::time::sleep(Duration::from_secs(3600)).await;
                }
                "Hello"
            }
        }),
    );
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    port
}

async fn closed_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap().port()
}

fn spec(host_port: u16) -> ContainerSpec {
    ContainerSpec {
        name: "smoke-app".to_string(),
        image: "smoke-app:test".to_string(),
        host_port,
        container_port: 80,
        env: Vec::new(),
    }
}

fn options(total: Duration) -> WorkflowOptions {
    WorkflowOptions {
        policy: PollPolicy::new(
            total,
            Duration::from_millis(100),
            Duration::from_millis(500),
            Duration::from_millis(500),
        )
        .unwrap(),
        require_2xx: false,
        path: "/".to_string(),
        auto_pull: true,
        keep_container: false,
        log_tail: 50,
    }
}

fn smoke(marker: Option<&str>) -> SmokeSuite {
    let config = SmokeConfig {
        marker: marker.map(str::to_string),
        ..Default::default()
    };
    SmokeSuite::from_config(&config, Duration::from_secs(2))
}

fn workflow(engine: FakeEngine, spec: ContainerSpec, options: WorkflowOptions) -> Workflow<FakeEngine> {
    Workflow::new(engine, spec, options, smoke(Some("Hello")))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[tokio::test]
async fn healthy_container_passes_and_is_removed() {
    let port = spawn_app().await;
    let workflow = workflow(FakeEngine::new(), spec(port), options(Duration::from_secs(5)));

    let report = workflow.run().await;

    assert_eq!(report.status, WorkflowStatus::Passed, "{report}");
    assert_eq!(report.host_port, Some(port));
    assert_eq!(report.smoke.len(), 3);
    assert!(report.smoke.iter().all(|r| r.passed));
    assert!(report.readiness.as_ref().is_some_and(|r| r.is_ready()));
    assert!(report.logs.is_empty());
    assert!(report.error.is_none());

    let engine = workflow.engine();
    assert_eq!(FakeEngine::count(&engine.runs), 1);
    assert_eq!(FakeEngine::count(&engine.pulls), 0);
    assert_eq!(FakeEngine::count(&engine.removes), 1);
    assert_eq!(FakeEngine::count(&engine.log_requests), 0);
}

#[tokio::test]
async fn unreachable_service_is_not_ready_and_logs_are_collected() {
    let port = closed_port().await;
    let workflow = workflow(FakeEngine::new(), spec(port), options(Duration::from_millis(500)));

    let report = workflow.run().await;

    assert_eq!(report.status, WorkflowStatus::NotReady);
    assert!(report.readiness.as_ref().is_some_and(|r| !r.is_ready()));
    assert!(report.smoke.is_empty());
    assert_eq!(report.logs, vec!["starting server", "listening on :80"]);
    assert_eq!(FakeEngine::count(&workflow.engine().removes), 1);
}

#[tokio::test]
async fn missing_marker_fails_smoke_checks() {
    let port = spawn_app().await;
    let workflow = Workflow::new(
        FakeEngine::new(),
        spec(port),
        options(Duration::from_secs(5)),
        smoke(Some("Goodbye")),
    );

    let report = workflow.run().await;

    assert_eq!(report.status, WorkflowStatus::SmokeFailed);
    let failed: Vec<&str> = report
        .smoke
        .iter()
        .filter(|r| !r.passed)
        .map(|r| r.name.as_str())
        .collect();
    assert_eq!(failed, vec!["body contains \"Goodbye\""]);
    assert!(!report.logs.is_empty());
}

#[tokio::test]
async fn stopped_container_fails_smoke_checks() {
    let port = spawn_app().await;
    let engine = FakeEngine::new();
    engine.running.store(false, Ordering::Relaxed);
    let workflow = workflow(engine, spec(port), options(Duration::from_secs(5)));

    let report = workflow.run().await;

    assert_eq!(report.status, WorkflowStatus::SmokeFailed);
    let running = report
        .smoke
        .iter()
        .find(|r| r.name == "container is running")
        .unwrap();
    assert!(!running.passed);
}

#[tokio::test]
async fn missing_image_without_pull_fails_before_running() {
    let mut opts = options(Duration::from_secs(1));
    opts.auto_pull = false;
    let workflow = workflow(FakeEngine::new().without_image(), spec(8080), opts);

    let report = workflow.run().await;

    assert_eq!(report.status, WorkflowStatus::Failed);
    assert!(report.error.as_deref().is_some_and(|e| e.contains("smoke-app:test")));
    assert!(report.container_id.is_none());
    let engine = workflow.engine();
    assert_eq!(FakeEngine::count(&engine.runs), 0);
    assert_eq!(FakeEngine::count(&engine.removes), 0);
}

#[tokio::test]
async fn missing_image_is_pulled() {
    let port = spawn_app().await;
    let workflow = workflow(
        FakeEngine::new().without_image(),
        spec(port),
        options(Duration::from_secs(5)),
    );

    let report = workflow.run().await;

    assert_eq!(report.status, WorkflowStatus::Passed, "{report}");
    assert_eq!(FakeEngine::count(&workflow.engine().pulls), 1);
}

#[tokio::test]
async fn unreachable_engine_stops_immediately() {
    let workflow = workflow(FakeEngine::unreachable(), spec(8080), options(Duration::from_secs(5)));

    let report = workflow.run().await;

    assert_eq!(report.status, WorkflowStatus::EngineUnavailable);
    assert!(report.error.as_deref().is_some_and(|e| e.contains("no socket")));
    assert!(report.readiness.is_none());
    assert_eq!(FakeEngine::count(&workflow.engine().runs), 0);
}

#[tokio::test]
async fn kept_container_is_not_removed() {
    let port = spawn_app().await;
    let mut opts = options(Duration::from_secs(5));
    opts.keep_container = true;
    let workflow = workflow(FakeEngine::new(), spec(port), opts);

    let report = workflow.run().await;

    assert_eq!(report.status, WorkflowStatus::Passed);
    assert!(report.kept);
    assert_eq!(FakeEngine::count(&workflow.engine().removes), 0);
}

#[tokio::test]
async fn engine_assigned_port_is_inspected() {
    let port = spawn_app().await;
    let workflow = workflow(
        FakeEngine::new().assigning_port(port),
        spec(0),
        options(Duration::from_secs(5)),
    );

    let report = workflow.run().await;

    assert_eq!(report.status, WorkflowStatus::Passed, "{report}");
    assert_eq!(report.host_port, Some(port));
}

#[tokio::test]
async fn missing_port_binding_fails_and_cleans_up() {
    let workflow = workflow(FakeEngine::new(), spec(0), options(Duration::from_secs(5)));

    let report = workflow.run().await;

    assert_eq!(report.status, WorkflowStatus::Failed);
    assert!(report.error.as_deref().is_some_and(|e| e.contains("80/tcp")));
    assert_eq!(FakeEngine::count(&workflow.engine().removes), 1);
}

#[tokio::test]
async fn shutdown_during_wait_cancels_and_cleans_up() {
    let port = closed_port().await;
    let workflow = workflow(FakeEngine::new(), spec(port), options(Duration::from_secs(30)));

    let started = std::time::Instant::now();
    let report = workflow
        .run_until(tokio::time::sleep(Duration::from_millis(300)))
        .await;

    assert_eq!(report.status, WorkflowStatus::Cancelled);
    assert!(report.readiness.is_none());
    assert!(started.elapsed() < Duration::from_secs(5));
    assert_eq!(FakeEngine::count(&workflow.engine().removes), 1);
}

#[tokio::test]
async fn shutdown_during_pull_cancels_before_running() {
    let workflow = workflow(
        FakeEngine::new()
            .without_image()
            .pulling_for(Duration::from_secs(3600)),
        spec(8080),
        options(Duration::from_secs(5)),
    );

    let report = tokio::time::timeout(
        Duration::from_secs(5),
        workflow.run_until(tokio::time::sleep(Duration::from_millis(200))),
    )
    .await
    .expect("shutdown must interrupt the pull");

    assert_eq!(report.status, WorkflowStatus::Cancelled);
    assert!(report.container_id.is_none());
    let engine = workflow.engine();
    assert_eq!(FakeEngine::count(&engine.pulls), 1);
    assert_eq!(FakeEngine::count(&engine.runs), 0);
    assert_eq!(FakeEngine::count(&engine.removes), 0);
}

#[tokio::test]
async fn shutdown_during_smoke_checks_cancels_and_cleans_up() {
    let port = spawn_app_that_stalls().await;
    let workflow = workflow(FakeEngine::new(), spec(port), options(Duration::from_secs(5)));

    let started = std::time::Instant::now();
    let report = workflow
        .run_until(tokio::time::sleep(Duration::from_millis(500)))
        .await;

    // Smoke requests time out after 2s, so finishing earlier means shutdown won.
    assert!(started.elapsed() < Duration::from_millis(1500));
    assert_eq!(report.status, WorkflowStatus::Cancelled, "{report}");
    assert!(report.readiness.as_ref().is_some_and(|r| r.is_ready()));
    assert!(report.smoke.is_empty());
    assert!(
        report
            .error
            .as_deref()
            .is_some_and(|e| e.contains("smoke checks"))
    );
    assert_eq!(FakeEngine::count(&workflow.engine().removes), 1);
}

#[tokio::test]
async fn built_from_config() {
    let port = spawn_app().await;
    let mut config = Config::default();
    config.readiness.timeout_secs = 5;
    config.readiness.interval_ms = 100;
    config.container.image = Some("smoke-app:test".to_string());
    config.container.host_port = port;
    config.smoke.marker = Some("Hello".to_string());

    let workflow = Workflow::from_config(FakeEngine::new(), &config).unwrap();
    let report = workflow.run().await;

    assert_eq!(report.status, WorkflowStatus::Passed, "{report}");
    assert_eq!(report.container, "dockwait-app");
    assert_eq!(report.image, "smoke-app:test");
}

#[test]
fn config_without_image_is_rejected() {
    let err = match Workflow::from_config(FakeEngine::new(), &Config::default()) {
        Ok(_) => panic!("expected a missing image error"),
        Err(e) => e,
    };
    assert!(err.to_string().contains("APP_IMAGE"));
}
