mod common;

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use common::{MockTransport, ok_json};
use relkit_core::RunnerScope;
use relkit_github::reaper::{ReaperError, run_reaper};
use relkit_github::transport::{ApiResponse, Method};
use relkit_github::GithubClient;
use secrecy::ExposeSecret;
use serde_json::json;

fn repo_scope() -> RunnerScope {
    RunnerScope::from_url("https://github.com/acme/api").unwrap()
}

fn is_list(req: &relkit_github::ApiRequest) -> bool {
    req.method == Method::Get && req.url.contains("/actions/runners?")
}

#[tokio::test]
async fn reap_deletes_only_offline_runners() {
    let mut mock = MockTransport::new();
    mock.expect_send()
        .withf(|req| is_list(req) && req.url.starts_with("repos/acme/api/"))
        .returning(|_| {
            ok_json(
                200,
                json!({
                    "total_count": 2,
                    "runners": [
                        { "id": 1, "name": "runner-a", "status": "online", "busy": false },
                        { "id": 2, "name": "runner-b", "status": "offline", "busy": false }
                    ]
                }),
            )
        });
    mock.expect_send()
        .withf(|req| req.method == Method::Delete && req.url == "repos/acme/api/actions/runners/2")
        .times(1)
        .returning(|_| Ok(ApiResponse::new(204, "")));

    let client = GithubClient::with_transport(mock);
    let report = client.runners().reap(&repo_scope()).await.unwrap();

    assert_eq!(report.deleted, vec![2]);
    assert_eq!(report.deleted_count(), 1);
    assert!(report.failed.is_empty());
}

#[tokio::test]
async fn organization_scope_uses_orgs_api() {
    let mut mock = MockTransport::new();
    mock.expect_send()
        .withf(|req| req.url.starts_with("orgs/acme/actions/runners?per_page=100&page=1"))
        .returning(|_| ok_json(200, json!({ "total_count": 0, "runners": [] })));

    let client = GithubClient::with_transport(mock);
    let scope = RunnerScope::from_url("https://github.com/acme").unwrap();
    let report = client.runners().reap(&scope).await.unwrap();

    assert_eq!(report.deleted_count(), 0);
}

#[tokio::test]
async fn failed_delete_does_not_abort_batch() {
    let mut mock = MockTransport::new();
    mock.expect_send().withf(is_list).returning(|_| {
        ok_json(
            200,
            json!({
                "total_count": 3,
                "runners": [
                    { "id": 10, "status": "offline" },
                    { "id": 11, "status": "offline" },
                    { "id": 12, "status": "offline" }
                ]
            }),
        )
    });
    mock.expect_send()
        .withf(|req| req.method == Method::Delete && req.url.ends_with("/11"))
        .returning(|_| Ok(ApiResponse::new(422, "runner is busy")));
    mock.expect_send()
        .withf(|req| {
            req.method == Method::Delete && (req.url.ends_with("/10") || req.url.ends_with("/12"))
        })
        .times(2)
        .returning(|_| Ok(ApiResponse::new(204, "")));

    let client = GithubClient::with_transport(mock);
    let report = client.runners().reap(&repo_scope()).await.unwrap();

    assert_eq!(report.deleted, vec![10, 12]);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].0, 11);
    assert!(report.failed[0].1.contains("422"));
}

#[tokio::test]
async fn list_failure_fails_the_cycle() {
    let mut mock = MockTransport::new();
    mock.expect_send()
        .returning(|_| Ok(ApiResponse::new(401, "Bad credentials")));

    let client = GithubClient::with_transport(mock);
    let result = client.runners().reap(&repo_scope()).await;

    assert!(matches!(
        result,
        Err(ReaperError::UnexpectedStatus { status: 401, .. })
    ));
}

#[tokio::test]
async fn listing_follows_pages() {
    let mut mock = MockTransport::new();
    mock.expect_send()
        .withf(|req| req.url.ends_with("&page=1"))
        .times(1)
        .returning(|_| {
            let runners: Vec<_> = (1..=100)
                .map(|id| json!({ "id": id, "status": "online" }))
                .collect();
            ok_json(200, json!({ "total_count": 101, "runners": runners }))
        });
    mock.expect_send()
        .withf(|req| req.url.ends_with("&page=2"))
        .times(1)
        .returning(|_| {
            ok_json(
                200,
                json!({ "total_count": 101, "runners": [{ "id": 101, "status": "offline" }] }),
            )
        });

    let client = GithubClient::with_transport(mock);
    let runners = client.runners().list_runners(&repo_scope()).await.unwrap();
    assert_eq!(runners.len(), 101);

    let offline: Vec<u64> = runners
        .iter()
        .filter(|r| r.is_offline())
        .map(|r| r.id)
        .collect();
    assert_eq!(offline, vec![101]);
}

#[tokio::test]
async fn registration_token_is_returned() {
    let mut mock = MockTransport::new();
    mock.expect_send()
        .withf(|req| {
            req.method == Method::Post
                && req.url == "orgs/acme/actions/runners/registration-token"
        })
        .returning(|_| {
            ok_json(
                201,
                json!({ "token": "AABF3JGZDX", "expires_at": "2026-10-19T12:00:00Z" }),
            )
        });

    let client = GithubClient::with_transport(mock);
    let scope = RunnerScope::Organization("acme".to_owned());
    let token = client.runners().registration_token(&scope).await.unwrap();

    assert_eq!(token.token.expose_secret(), "AABF3JGZDX");
    assert_eq!(token.expires_at.as_deref(), Some("2026-10-19T12:00:00Z"));
}

// ── Schedule ──

#[tokio::test(start_paused = true)]
async fn reaper_runs_immediately_then_on_interval() {
    let lists = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&lists);

    let mut mock = MockTransport::new();
    mock.expect_send().returning(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
        ok_json(200, json!({ "total_count": 0, "runners": [] }))
    });

    let client = GithubClient::with_transport(mock);
    let reaper = client.runners();
    let shutdown = tokio::time::sleep(Duration::from_secs(650));

    let cycles = run_reaper(&reaper, &repo_scope(), Duration::from_secs(300), shutdown).await;

    // t=0, t=300, t=600
    assert_eq!(cycles, 3);
    assert_eq!(lists.load(Ordering::SeqCst), 3);
}

#[tokio::test(start_paused = true)]
async fn failed_cycles_do_not_stop_the_reaper() {
    let mut mock = MockTransport::new();
    mock.expect_send()
        .returning(|_| Ok(ApiResponse::new(502, "Bad Gateway")));

    let client = GithubClient::with_transport(mock);
    let reaper = client.runners();
    let shutdown = tokio::time::sleep(Duration::from_secs(950));

    let cycles = run_reaper(&reaper, &repo_scope(), Duration::from_secs(300), shutdown).await;

    assert_eq!(cycles, 4);
}

#[tokio::test]
async fn resolved_shutdown_skips_the_first_cycle() {
    let mut mock = MockTransport::new();
    mock.expect_send().never();

    let client = GithubClient::with_transport(mock);
    let reaper = client.runners();

    let cycles = run_reaper(
        &reaper,
        &repo_scope(),
        Duration::from_secs(300),
        std::future::ready(()),
    )
    .await;

    assert_eq!(cycles, 0);
}

#[tokio::test]
async fn shutdown_channel_stops_the_loop() {
    let (tx, rx) = tokio::sync::oneshot::channel::<()>();

    let mut mock = MockTransport::new();
    let mut tx = Some(tx);
    mock.expect_send().returning(move |_| {
        if let Some(tx) = tx.take() {
            tx.send(()).unwrap();
        }
        ok_json(200, json!({ "total_count": 0, "runners": [] }))
    });

    let client = GithubClient::with_transport(mock);
    let reaper = client.runners();
    let shutdown = async {
        rx.await.unwrap();
    };

    let cycles = run_reaper(&reaper, &repo_scope(), Duration::from_secs(3600), shutdown).await;

    assert_eq!(cycles, 1);
}
