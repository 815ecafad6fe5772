//! Common test utilities for integration tests

use datalake_fetch::config::FetchConfig;
use datalake_fetch::models::AuthContext;
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const ORG: &str = "acme";
pub const TOKEN: &str = "test-token";

/// Auth context pointing at the mock server.
#[allow(dead_code)]
pub fn auth_for(server: &MockServer) -> AuthContext {
    AuthContext::new(format!("{}/", server.uri()), ORG, TOKEN)
}

/// Fetch settings with millisecond backoff so retry tests run fast.
#[allow(dead_code)]
pub fn fast_config(concurrency: usize) -> FetchConfig {
    FetchConfig {
        concurrency,
        retry_min_delay_ms: 1,
        retry_max_delay_ms: 5,
        ..FetchConfig::default()
    }
}

#[allow(dead_code)]
pub fn ids(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

/// Path the mock server serves the bytes of `file_id` under.
#[allow(dead_code)]
pub fn object_path(file_id: &str) -> String {
    format!("/bucket/{file_id}")
}

/// Mounts a retrieve response pointing `file_id` at its object path.
#[allow(dead_code)]
pub async fn mount_resolve(server: &MockServer, file_id: &str) {
    let presigned = format!(
        "{}{}?X-Amz-Signature=sig-{file_id}",
        server.uri(),
        object_path(file_id)
    );
    Mock::given(method("GET"))
        .and(path("/datalake/retrieve"))
        .and(query_param("fileId", file_id))
        .and(query_param("getPresigned", "True"))
        .and(header("x-org-slug", ORG))
        .and(header("ts-auth-token", TOKEN))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "url": presigned })))
        .mount(server)
        .await;
}

/// Mounts the object bytes for `file_id`, optionally delayed.
#[allow(dead_code)]
pub async fn mount_object(server: &MockServer, file_id: &str, body: &[u8], delay: Duration) {
    Mock::given(method("GET"))
        .and(path(object_path(file_id)))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(body.to_vec())
                .set_delay(delay),
        )
        .mount(server)
        .await;
}

/// Mounts both the retrieve response and the object for `file_id`.
#[allow(dead_code)]
pub async fn mount_file(server: &MockServer, file_id: &str, body: &[u8]) {
    mount_resolve(server, file_id).await;
    mount_object(server, file_id, body, Duration::ZERO).await;
}

/// Counts requests the server received for `request_path`.
#[allow(dead_code)]
pub async fn requests_to(server: &MockServer, request_path: &str) -> usize {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|r| r.url.path() == request_path)
        .count()
}
