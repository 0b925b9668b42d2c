use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use parley_correlation::PollOutcome;
use parley_render::{
    JobStatus, RenderClient, RenderConfig, RenderError, RenderTool, ReportStatus, WorkflowTemplate,
};
use parley_types::RequestId;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;

/// Stand-in rendering service. Jobs complete after `checks_until_done`
/// history lookups.
#[derive(Clone, Default)]
struct FakeRenderer {
    submitted: Arc<Mutex<Vec<Value>>>,
    checks: Arc<AtomicUsize>,
    checks_until_done: usize,
    omit_prompt_id: bool,
}

async fn prompt(State(fake): State<FakeRenderer>, Json(body): Json<Value>) -> Json<Value> {
    fake.submitted.lock().unwrap().push(body);
    if fake.omit_prompt_id {
        Json(json!({"number": 1}))
    } else {
        Json(json!({"prompt_id": "job-1", "number": 1, "node_errors": {}}))
    }
}

async fn history(State(fake): State<FakeRenderer>, Path(id): Path<String>) -> Json<Value> {
    let seen = fake.checks.fetch_add(1, Ordering::SeqCst) + 1;
    if id != "job-1" || seen < fake.checks_until_done {
        return Json(json!({}));
    }
    Json(json!({
        id: {
            "outputs": {
                "80": {"videos": [{"filename": "wan2_2_00001.mp4", "subfolder": "video", "type": "output"}]}
            },
            "status": {"status_str": "success", "completed": true}
        }
    }))
}

async fn serve(router: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

async fn start_renderer(fake: FakeRenderer) -> RenderConfig {
    let router = Router::new()
        .route("/prompt", post(prompt))
        .route("/history/{id}", get(history))
        .with_state(fake);
    let host = serve(router).await;
    RenderConfig {
        host,
        poll_interval_secs: 1,
        max_wait_secs: 10,
        request_timeout_secs: 5,
        ..RenderConfig::default()
    }
}

fn client(config: &RenderConfig) -> RenderClient {
    RenderClient::new(reqwest::Client::new(), config)
}

#[tokio::test]
async fn submit_wraps_workflow_and_returns_prompt_id() {
    let fake = FakeRenderer::default();
    let config = start_renderer(fake.clone()).await;
    let client = client(&config);

    let workflow = json!({"1": {"inputs": {"text": "fox"}}});
    let prompt_id = client.submit(&workflow).await.unwrap();
    assert_eq!(prompt_id, "job-1");

    let submitted = fake.submitted.lock().unwrap().clone();
    assert_eq!(submitted, vec![json!({"prompt": workflow})]);
}

#[tokio::test]
async fn submit_without_prompt_id_is_an_error() {
    let fake = FakeRenderer {
        omit_prompt_id: true,
        ..FakeRenderer::default()
    };
    let config = start_renderer(fake).await;
    let err = client(&config).submit(&json!({})).await.unwrap_err();
    assert!(matches!(err, RenderError::MissingPromptId));
}

#[tokio::test]
async fn service_errors_surface_as_status() {
    let router = Router::new()
        .route("/prompt", post(|| async { StatusCode::BAD_REQUEST }))
        .route("/history/{id}", get(|| async { StatusCode::INTERNAL_SERVER_ERROR }));
    let host = serve(router).await;
    let client = client(&RenderConfig {
        host,
        ..RenderConfig::default()
    });

    assert!(matches!(
        client.submit(&json!({})).await,
        Err(RenderError::Status(400))
    ));
    assert!(matches!(client.check("job-1").await, Err(RenderError::Status(500))));
}

#[tokio::test]
async fn check_reports_processing_then_completed() {
    let fake = FakeRenderer {
        checks_until_done: 2,
        ..FakeRenderer::default()
    };
    let config = start_renderer(fake).await;
    let client = client(&config);

    assert_eq!(client.check("job-1").await.unwrap(), JobStatus::Processing);
    let expected = format!(
        "{}/view?filename=wan2_2_00001.mp4&subfolder=video",
        config.host
    );
    assert_eq!(
        client.check("job-1").await.unwrap(),
        JobStatus::Completed {
            download_url: Some(expected)
        }
    );
}

#[tokio::test]
async fn wait_polls_until_job_completes() {
    let fake = FakeRenderer {
        checks_until_done: 3,
        ..FakeRenderer::default()
    };
    let config = start_renderer(fake.clone()).await;
    let client = client(&config);

    let id = RequestId::parse("job-1").unwrap();
    match client.wait(&id).await {
        PollOutcome::Ready { value, attempts } => {
            assert_eq!(attempts, 3);
            assert!(value.unwrap().ends_with("filename=wan2_2_00001.mp4&subfolder=video"));
        }
        other => panic!("expected completion, got {other:?}"),
    }
    assert_eq!(fake.checks.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn wait_gives_up_at_max_wait() {
    let fake = FakeRenderer {
        checks_until_done: usize::MAX,
        ..FakeRenderer::default()
    };
    let mut config = start_renderer(fake).await;
    config.max_wait_secs = 2;
    let client = client(&config);

    let outcome = client.wait(&RequestId::parse("job-1").unwrap()).await;
    assert!(matches!(outcome, PollOutcome::TimedOut { attempts } if (2..=3).contains(&attempts)));
}

#[tokio::test]
async fn tool_submits_prompts_and_checks_jobs() {
    let fake = FakeRenderer::default();
    let config = start_renderer(fake.clone()).await;
    let tool = RenderTool::new(
        client(&config),
        WorkflowTemplate::text_to_video().unwrap(),
        config.default_duration_seconds,
    );

    let report = tool.run("  a lighthouse at dusk ", None, Some(4)).await;
    assert_eq!(report.status, ReportStatus::Submitted);
    assert_eq!(report.prompt_id.as_deref(), Some("job-1"));
    assert_eq!(
        report.message.as_deref(),
        Some("Submitted successfully. Use `check job-1`.")
    );

    let submitted = fake.submitted.lock().unwrap().clone();
    let workflow = &submitted[0]["prompt"];
    assert_eq!(workflow["89"]["inputs"]["text"], "a lighthouse at dusk");
    assert_eq!(workflow["74"]["inputs"]["length"], 32);

    let report = tool.run("Check job-1", None, None).await;
    assert_eq!(report.status, ReportStatus::Completed);
    assert!(report.download_url.is_some());
}

#[tokio::test]
async fn tool_reports_unreachable_service_as_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let config = RenderConfig {
        host: format!("http://{}", addr),
        ..RenderConfig::default()
    };
    let tool = RenderTool::new(
        client(&config),
        WorkflowTemplate::text_to_video().unwrap(),
        10,
    );

    let report = tool.run("a cat", None, None).await;
    assert_eq!(report.status, ReportStatus::Error);
    assert!(report.prompt_id.is_none());

    let report = tool.run("check job-9", None, None).await;
    assert_eq!(report.status, ReportStatus::Error);
    assert_eq!(report.prompt_id.as_deref(), Some("job-9"));
}

#[test]
fn template_loads_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("workflow.json");
    std::fs::write(
        &path,
        r#"{"5": {"inputs": {"text": "{{positive_prompt}}", "frames": "{{frames}}"}}}"#,
    )
    .unwrap();

    let template = WorkflowTemplate::load(&path).unwrap();
    let workflow = template.instantiate(&parley_render::RenderRequest::new("x"), 2);
    assert_eq!(workflow["5"]["inputs"]["frames"], 16);

    std::fs::write(&path, "{not json").unwrap();
    assert!(matches!(
        WorkflowTemplate::load(&path),
        Err(RenderError::Template(_))
    ));
}

#[test]
fn render_config_parses_from_toml() {
    let config: RenderConfig = toml::from_str(
        r#"
        host = "http://gpu-box:8188"
        max_wait_secs = 60
        "#,
    )
    .unwrap();
    assert_eq!(config.host, "http://gpu-box:8188");
    assert_eq!(config.max_wait_secs, 60);
    assert_eq!(config.poll_interval_secs, 5);
    assert!(config.workflow_path.is_none());
}
