//! Integration tests for the bulk downloader against a mock API and object store

#[path = "common/mod.rs"]
mod common;

use common::*;
use datalake_fetch::downloader::{
    bulk_file_download, bulk_file_download_with_config, resolve_presigned_url, RetryClient,
};
use datalake_fetch::errors::AppError;
use serde_json::json;
use std::time::{Duration, Instant};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_two_files_come_back_in_order() {
    let server = MockServer::start().await;
    mount_file(&server, "A", b"1").await;
    mount_file(&server, "B", b"2").await;

    let files = bulk_file_download(&ids(&["A", "B"]), &auth_for(&server), 1)
        .await
        .unwrap();

    assert_eq!(files, vec![b"1".to_vec(), b"2".to_vec()]);
}

#[tokio::test]
async fn test_order_is_kept_when_later_files_finish_first() {
    let server = MockServer::start().await;
    let names = ["f0", "f1", "f2", "f3", "f4"];
    for (i, name) in names.iter().enumerate() {
        mount_resolve(&server, name).await;
        // First id is the slowest, last id the fastest.
        let delay = Duration::from_millis(40 * (names.len() - i) as u64);
        mount_object(&server, name, name.as_bytes(), delay).await;
    }

    let files =
        bulk_file_download_with_config(&ids(&names), &auth_for(&server), &fast_config(5), None)
            .await
            .unwrap();

    let expected: Vec<Vec<u8>> = names.iter().map(|n| n.as_bytes().to_vec()).collect();
    assert_eq!(files, expected);
}

#[tokio::test]
async fn test_empty_input_makes_no_requests() {
    let server = MockServer::start().await;

    let files = bulk_file_download(&[], &auth_for(&server), 4).await.unwrap();

    assert!(files.is_empty());
    assert_eq!(server.received_requests().await.unwrap().len(), 0);
}

#[tokio::test]
async fn test_duplicate_ids_are_fetched_independently() {
    let server = MockServer::start().await;
    mount_file(&server, "A", b"same").await;

    let files = bulk_file_download(&ids(&["A", "A", "A"]), &auth_for(&server), 2)
        .await
        .unwrap();

    assert_eq!(files.len(), 3);
    assert!(files.iter().all(|f| f == b"same"));
    assert_eq!(requests_to(&server, "/datalake/retrieve").await, 3);
    assert_eq!(requests_to(&server, &object_path("A")).await, 3);
}

#[tokio::test]
async fn test_zero_concurrency_is_rejected() {
    let server = MockServer::start().await;

    let result = bulk_file_download(&ids(&["A"]), &auth_for(&server), 0).await;

    assert!(matches!(result, Err(AppError::InvalidInput(_))));
}

#[tokio::test]
async fn test_concurrency_one_serializes_fetches() {
    let server = MockServer::start().await;
    let names = ["s0", "s1", "s2"];
    for name in names {
        mount_resolve(&server, name).await;
        mount_object(&server, name, b"x", Duration::from_millis(150)).await;
    }

    let started = Instant::now();
    bulk_file_download_with_config(&ids(&names), &auth_for(&server), &fast_config(1), None)
        .await
        .unwrap();

    // Each object response takes 150 ms; one at a time they cannot overlap.
    assert!(started.elapsed() >= Duration::from_millis(450));
}

#[tokio::test]
async fn test_higher_concurrency_overlaps_fetches() {
    let server = MockServer::start().await;
    let names = ["p0", "p1", "p2", "p3", "p4", "p5"];
    for name in names {
        mount_resolve(&server, name).await;
        mount_object(&server, name, b"x", Duration::from_millis(150)).await;
    }

    let started = Instant::now();
    bulk_file_download_with_config(&ids(&names), &auth_for(&server), &fast_config(6), None)
        .await
        .unwrap();

    assert!(started.elapsed() < Duration::from_millis(900));
}

#[tokio::test]
async fn test_missing_url_field_fails_the_batch() {
    let server = MockServer::start().await;
    mount_file(&server, "good", b"ok").await;
    Mock::given(method("GET"))
        .and(path("/datalake/retrieve"))
        .and(wiremock::matchers::query_param("fileId", "bad"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "link": "nope" })))
        .mount(&server)
        .await;

    let result = bulk_file_download(&ids(&["good", "bad"]), &auth_for(&server), 1).await;

    match result {
        Err(AppError::ResolutionError { file_id, reason }) => {
            assert_eq!(file_id, "bad");
            assert!(reason.contains("'url'"));
        }
        other => panic!("expected resolution error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_transient_502_on_fetch_is_retried() {
    let server = MockServer::start().await;
    mount_resolve(&server, "A").await;
    Mock::given(method("GET"))
        .and(path(object_path("A")))
        .respond_with(ResponseTemplate::new(502))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    mount_object(&server, "A", b"recovered", Duration::ZERO).await;

    let files =
        bulk_file_download_with_config(&ids(&["A"]), &auth_for(&server), &fast_config(1), None)
            .await
            .unwrap();

    assert_eq!(files, vec![b"recovered".to_vec()]);
    assert_eq!(requests_to(&server, &object_path("A")).await, 3);
}

#[tokio::test]
async fn test_persistent_502_fails_after_three_attempts() {
    let server = MockServer::start().await;
    mount_resolve(&server, "A").await;
    Mock::given(method("GET"))
        .and(path(object_path("A")))
        .respond_with(ResponseTemplate::new(502))
        .mount(&server)
        .await;

    let result =
        bulk_file_download_with_config(&ids(&["A"]), &auth_for(&server), &fast_config(1), None)
            .await;

    match result {
        Err(AppError::RetriesExhausted {
            url,
            attempts,
            status,
        }) => {
            assert_eq!(attempts, 3);
            assert_eq!(status, 502);
            // The signature in the query string stays out of the error.
            assert!(!url.contains("X-Amz-Signature"));
        }
        other => panic!("expected exhausted retries, got {other:?}"),
    }
    assert_eq!(requests_to(&server, &object_path("A")).await, 3);
}

#[tokio::test]
async fn test_other_error_statuses_are_not_retried() {
    let server = MockServer::start().await;
    mount_resolve(&server, "A").await;
    Mock::given(method("GET"))
        .and(path(object_path("A")))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let result =
        bulk_file_download_with_config(&ids(&["A"]), &auth_for(&server), &fast_config(1), None)
            .await;

    assert!(matches!(
        result,
        Err(AppError::HttpStatus { status: 503, .. })
    ));
    assert_eq!(requests_to(&server, &object_path("A")).await, 1);
}

#[tokio::test]
async fn test_persistent_502_on_retrieve_is_a_resolution_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/datalake/retrieve"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&server)
        .await;

    let result =
        bulk_file_download_with_config(&ids(&["A"]), &auth_for(&server), &fast_config(1), None)
            .await;

    match result {
        Err(AppError::ResolutionError { file_id, reason }) => {
            assert_eq!(file_id, "A");
            assert!(reason.contains("502"));
        }
        other => panic!("expected resolution error, got {other:?}"),
    }
    assert_eq!(requests_to(&server, "/datalake/retrieve").await, 3);
}

#[tokio::test]
async fn test_first_failure_cancels_slow_tasks() {
    let server = MockServer::start().await;
    mount_resolve(&server, "slow").await;
    mount_object(&server, "slow", b"late", Duration::from_secs(5)).await;
    Mock::given(method("GET"))
        .and(path("/datalake/retrieve"))
        .and(wiremock::matchers::query_param("fileId", "broken"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let started = Instant::now();
    let result = bulk_file_download_with_config(
        &ids(&["slow", "broken"]),
        &auth_for(&server),
        &fast_config(2),
        None,
    )
    .await;

    assert!(matches!(result, Err(AppError::ResolutionError { .. })));
    assert!(started.elapsed() < Duration::from_secs(4));
}

#[tokio::test]
async fn test_credentials_go_to_api_only() {
    let server = MockServer::start().await;
    mount_file(&server, "A", b"1").await;

    bulk_file_download(&ids(&["A"]), &auth_for(&server), 1)
        .await
        .unwrap();

    let requests = server.received_requests().await.unwrap();
    let retrieve = requests
        .iter()
        .find(|r| r.url.path() == "/datalake/retrieve")
        .unwrap();
    assert_eq!(retrieve.headers.get("ts-auth-token").unwrap(), TOKEN);

    let object = requests
        .iter()
        .find(|r| r.url.path() == object_path("A"))
        .unwrap();
    assert!(object.headers.get("ts-auth-token").is_none());
    assert!(object.headers.get("x-org-slug").is_none());
}

#[tokio::test]
async fn test_resolve_returns_presigned_url() {
    let server = MockServer::start().await;
    mount_resolve(&server, "A").await;
    let auth = auth_for(&server);
    let client = RetryClient::new(
        1,
        fast_config(1).retry_policy(),
        Duration::from_secs(5),
    )
    .unwrap();

    let url = resolve_presigned_url(&client, &auth, &auth.headers().unwrap(), "A")
        .await
        .unwrap();

    assert_eq!(
        url,
        format!("{}/bucket/A?X-Amz-Signature=sig-A", server.uri())
    );
}
