//! Integration tests for the relay pipeline
//!
//! These tests use wiremock to serve listing pages and to stand in for the
//! ingestion API, and drive full cycles through the scheduler.

use async_trait::async_trait;
use event_relay::config::{
    Config, DeliveryGuarantee, IngestConfig, RenderConfig, ScheduleConfig, SourcesConfig,
    StateConfig,
};
use event_relay::crawler::{
    Extractor, RenderedDocument, Renderer, Scheduler, SourceWorker, WorkerSettings,
};
use event_relay::output::HttpPublisher;
use event_relay::state::{ProcessState, SourceState};
use event_relay::RenderError;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn row(title: &str, venue: &str) -> String {
    format!(
        r#"<tr class="box deep-shadow">
            <td><img class="rounded-3" src="/img/{title}.png"></td>
            <td>
                <div class="fw-bold"><a href="/e/{title}">{title}</a></div>
                <div class="eventTime" data-start-date="15/03/2025" data-end-date="16/03/2025">15 - 16 Mar 2025</div>
                <span class="fw-600">{venue}</span>
                <span class="badge">Conference</span>
            </td>
        </tr>"#,
        title = title,
        venue = venue
    )
}

fn listing(rows: &[String]) -> String {
    format!(
        "<html><body><table><tbody>{}</tbody></table></body></html>",
        rows.concat()
    )
}

/// Creates a test configuration pointing at the given sources and ingest endpoint
fn create_test_config(sources: Vec<String>, endpoint: String) -> Config {
    Config {
        sources: SourcesConfig { urls: sources },
        ingest: IngestConfig {
            endpoint,
            token: "test-token".to_string(),
            timeout_secs: 5,
            delivery: DeliveryGuarantee::AtMostOnce,
        },
        schedule: ScheduleConfig {
            interval_hours: 1,
            max_records: 4,
        },
        render: RenderConfig {
            readiness_timeout_secs: 2,
            user_agent: "Mozilla/5.0 (RelayTest)".to_string(),
            poll_interval_ms: 50,
        },
        state: None,
    }
}

async fn mount_page(server: &MockServer, page_path: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(page_path))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(body)
                .insert_header("content-type", "text/html"),
        )
        .mount(server)
        .await;
}

async fn mount_ingest(server: &MockServer, status: u16) {
    Mock::given(method("POST"))
        .and(path("/events"))
        .respond_with(ResponseTemplate::new(status))
        .mount(server)
        .await;
}

/// Titles of every record the ingestion API received, in arrival order
async fn delivered_titles(ingest: &MockServer) -> Vec<String> {
    ingest
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .map(|request| {
            let body: serde_json::Value =
                serde_json::from_slice(&request.body).expect("payload is JSON");
            body["title"].as_str().unwrap_or_default().to_string()
        })
        .collect()
}

/// Fingerprint set as it would look after a prior cycle saw `rows`
fn seen_from(rows: &[String], url: &str) -> SourceState {
    Extractor::new()
        .unwrap()
        .extract(&listing(rows), url, 10)
        .iter()
        .map(|c| c.fingerprint())
        .collect()
}

#[tokio::test]
async fn test_two_sources_deliver_only_new_records() {
    let pages = MockServer::start().await;
    let ingest = MockServer::start().await;
    mount_ingest(&ingest, 201).await;

    let a_url = format!("{}/bengaluru-in", pages.uri());
    let b_url = format!("{}/mumbai-in", pages.uri());

    let a_old = row("Old Bengaluru Expo", "BIEC");
    let a_new = row("New Bengaluru Summit", "NIMHANS");
    let b_old = row("Old Mumbai Fair", "NESCO");
    let b_new = row("New Mumbai Forum", "Jio World");

    mount_page(&pages, "/bengaluru-in", listing(&[a_old.clone(), a_new])).await;
    mount_page(&pages, "/mumbai-in", listing(&[b_old.clone(), b_new])).await;

    let mut state = ProcessState::new();
    state.merge(&a_url, seen_from(&[a_old], &a_url));
    state.merge(&b_url, seen_from(&[b_old], &b_url));

    let config = create_test_config(
        vec![a_url.clone(), b_url.clone()],
        format!("{}/events", ingest.uri()),
    );
    let scheduler = Scheduler::from_config(&config).expect("Failed to build scheduler");

    let (state, report) = scheduler.run_cycle(state).await;

    let mut titles = delivered_titles(&ingest).await;
    titles.sort();
    assert_eq!(titles, vec!["New Bengaluru Summit", "New Mumbai Forum"]);

    assert_eq!(report.delivered, 2);
    assert_eq!(state.get(&a_url).unwrap().len(), 2);
    assert_eq!(state.get(&b_url).unwrap().len(), 2);
}

#[tokio::test]
async fn test_payload_and_credential() {
    let pages = MockServer::start().await;
    let ingest = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/events"))
        .and(wiremock::matchers::header(
            "authorization",
            "Bearer test-token",
        ))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&ingest)
        .await;

    mount_page(&pages, "/events", listing(&[row("Tech Expo", "BIEC")])).await;

    let source = format!("{}/events", pages.uri());
    let config = create_test_config(vec![source], format!("{}/events", ingest.uri()));
    let scheduler = Scheduler::from_config(&config).unwrap();
    scheduler.run_cycle(ProcessState::new()).await;

    let requests = ingest.received_requests().await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();

    assert_eq!(body["title"], "Tech Expo");
    assert_eq!(body["startDate"], "15-03-2025T00:00:00Z");
    assert_eq!(body["endDate"], "16-03-2025T00:00:00Z");
    assert_eq!(body["location"], "BIEC");
    assert_eq!(body["tags"], serde_json::json!(["Conference"]));
    assert_eq!(body["status"], "upcoming");
    assert_eq!(body["eventId"].as_str().unwrap().len(), 64);
    assert_eq!(body["description"], "N/A");
}

#[tokio::test]
async fn test_repeated_cycles_never_reoffer() {
    let pages = MockServer::start().await;
    let ingest = MockServer::start().await;
    mount_ingest(&ingest, 200).await;

    mount_page(
        &pages,
        "/events",
        listing(&[row("Steady Event", "Hall 1"), row("Other Event", "Hall 2")]),
    )
    .await;

    let source = format!("{}/events", pages.uri());
    let config = create_test_config(vec![source.clone()], format!("{}/events", ingest.uri()));
    let scheduler = Scheduler::from_config(&config).unwrap();

    let mut state = ProcessState::new();
    for _ in 0..3 {
        let (next, _) = scheduler.run_cycle(state).await;
        state = next;
    }

    assert_eq!(delivered_titles(&ingest).await.len(), 2);
    assert_eq!(state.get(&source).unwrap().len(), 2);
}

#[tokio::test]
async fn test_render_failure_does_not_block_other_source() {
    let pages = MockServer::start().await;
    let ingest = MockServer::start().await;
    mount_ingest(&ingest, 200).await;

    Mock::given(method("GET"))
        .and(path("/broken"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&pages)
        .await;
    mount_page(&pages, "/healthy", listing(&[row("Healthy Event", "Hall")])).await;

    let broken = format!("{}/broken", pages.uri());
    let healthy = format!("{}/healthy", pages.uri());

    let mut state = ProcessState::new();
    state.merge(&broken, seen_from(&[row("Earlier", "Hall")], &broken));
    let before = state.snapshot(&broken);

    let config = create_test_config(
        vec![broken.clone(), healthy.clone()],
        format!("{}/events", ingest.uri()),
    );
    let scheduler = Scheduler::from_config(&config).unwrap();
    let (state, report) = scheduler.run_cycle(state).await;

    assert_eq!(report.failed_sources, 1);
    assert_eq!(delivered_titles(&ingest).await, vec!["Healthy Event"]);
    assert_eq!(state.snapshot(&broken), before);
    assert_eq!(state.get(&healthy).unwrap().len(), 1);
}

#[tokio::test]
async fn test_delivery_failure_does_not_stop_siblings() {
    let pages = MockServer::start().await;
    let ingest = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_string("ingest down"))
        .up_to_n_times(1)
        .mount(&ingest)
        .await;
    mount_ingest(&ingest, 200).await;

    mount_page(
        &pages,
        "/events",
        listing(&[row("First", "A"), row("Second", "B"), row("Third", "C")]),
    )
    .await;

    let source = format!("{}/events", pages.uri());
    let config = create_test_config(vec![source.clone()], format!("{}/events", ingest.uri()));
    let scheduler = Scheduler::from_config(&config).unwrap();
    let (state, report) = scheduler.run_cycle(ProcessState::new()).await;

    assert_eq!(delivered_titles(&ingest).await, vec!["First", "Second", "Third"]);
    assert_eq!(report.failed_deliveries, 1);
    assert_eq!(report.delivered, 2);
    // At-most-once: the failed record is still marked seen
    assert_eq!(state.get(&source).unwrap().len(), 3);
}

#[tokio::test]
async fn test_at_least_once_retries_failed_delivery_next_cycle() {
    let pages = MockServer::start().await;
    let ingest = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(1)
        .mount(&ingest)
        .await;
    mount_ingest(&ingest, 200).await;

    mount_page(&pages, "/events", listing(&[row("Flaky", "Hall")])).await;

    let source = format!("{}/events", pages.uri());
    let mut config = create_test_config(vec![source.clone()], format!("{}/events", ingest.uri()));
    config.ingest.delivery = DeliveryGuarantee::AtLeastOnce;
    let scheduler = Scheduler::from_config(&config).unwrap();

    let (state, first) = scheduler.run_cycle(ProcessState::new()).await;
    assert_eq!(first.failed_deliveries, 1);
    assert!(state.get(&source).unwrap().is_empty());

    let (state, second) = scheduler.run_cycle(state).await;
    assert_eq!(second.delivered, 1);
    assert_eq!(state.get(&source).unwrap().len(), 1);
    assert_eq!(delivered_titles(&ingest).await, vec!["Flaky", "Flaky"]);
}

/// Serves a page whose markup no longer has event rows
struct RedesignedRenderer;

#[async_trait]
impl Renderer for RedesignedRenderer {
    async fn render(
        &self,
        url: &str,
        _readiness_selector: &str,
        _timeout: Duration,
    ) -> Result<RenderedDocument, RenderError> {
        Ok(RenderedDocument {
            url: url.to_string(),
            html: "<html><body><div class='event-card'>New layout</div></body></html>"
                .to_string(),
        })
    }
}

#[tokio::test]
async fn test_structural_drift_completes_cycle() {
    let ingest = MockServer::start().await;
    mount_ingest(&ingest, 200).await;

    let config = create_test_config(
        vec!["https://10times.com/bengaluru-in".to_string()],
        format!("{}/events", ingest.uri()),
    );
    let worker = SourceWorker::new(
        Arc::new(RedesignedRenderer),
        Arc::new(HttpPublisher::new(&config.ingest).unwrap()),
        Arc::new(Extractor::new().unwrap()),
        WorkerSettings {
            max_records: 4,
            readiness_timeout: Duration::from_secs(1),
            delivery: DeliveryGuarantee::AtMostOnce,
        },
    );
    let scheduler = Scheduler::new(
        config.sources.urls.clone(),
        worker,
        Duration::from_secs(3600),
    );

    let (state, report) = scheduler.run_cycle(ProcessState::new()).await;

    assert_eq!(report.failed_sources, 0);
    assert_eq!(report.extracted, 0);
    assert_eq!(state.total_fingerprints(), 0);
    assert!(delivered_titles(&ingest).await.is_empty());
}

#[tokio::test]
async fn test_durable_state_survives_restart() {
    let pages = MockServer::start().await;
    let ingest = MockServer::start().await;
    mount_ingest(&ingest, 200).await;
    mount_page(&pages, "/events", listing(&[row("Persisted", "Hall")])).await;

    let dir = tempfile::tempdir().unwrap();
    let source = format!("{}/events", pages.uri());
    let mut config = create_test_config(vec![source.clone()], format!("{}/events", ingest.uri()));
    config.state = Some(StateConfig {
        path: dir.path().join("relay.db").display().to_string(),
    });

    {
        let mut scheduler = Scheduler::from_config(&config).unwrap();
        let state = scheduler.initial_state().unwrap();
        scheduler.run_once(state).await;
    }

    // A fresh process loads the checkpoint and sends nothing new
    let mut scheduler = Scheduler::from_config(&config).unwrap();
    let state = scheduler.initial_state().unwrap();
    assert_eq!(state.get(&source).unwrap().len(), 1);

    scheduler.run_once(state).await;
    assert_eq!(delivered_titles(&ingest).await, vec!["Persisted"]);
}
