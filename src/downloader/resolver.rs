use super::client::RetryClient;
use crate::constants::{
    FILE_ID_PARAM, PRESIGNED_PARAM, PRESIGNED_URL_FIELD, PRESIGNED_VALUE, RETRIEVE_PATH,
};
use crate::errors::{AppError, AppResult};
use crate::models::AuthContext;
use reqwest::header::HeaderMap;
use serde_json::Value;
use tracing::debug;

/// Asks the retrieve endpoint for a pre-signed URL to the bytes of `file_id`.
///
/// Sends `GET {base_url}datalake/retrieve?fileId=<id>&getPresigned=True` with the
/// credential headers and reads the `url` field of the JSON response. Transient
/// statuses are retried by `client`; nothing else is.
///
/// # Errors
///
/// Network and status errors from the client are wrapped in `ResolutionError`
/// along with malformed bodies and a missing or non-string `url` field.
pub async fn resolve_presigned_url(
    client: &RetryClient,
    auth: &AuthContext,
    headers: &HeaderMap,
    file_id: &str,
) -> AppResult<String> {
    let endpoint = format!("{}{RETRIEVE_PATH}", auth.base_url);

    let body = client
        .get_body(&endpoint, |http| {
            http.get(&endpoint)
                .headers(headers.clone())
                .query(&[(FILE_ID_PARAM, file_id), (PRESIGNED_PARAM, PRESIGNED_VALUE)])
        })
        .await
        .map_err(|e| AppError::ResolutionError {
            file_id: file_id.to_string(),
            reason: e.to_string(),
        })?;

    let url = parse_presigned_url(&body).map_err(|reason| AppError::ResolutionError {
        file_id: file_id.to_string(),
        reason,
    })?;

    debug!(file_id, "Resolved pre-signed URL");
    Ok(url)
}

/// Extracts the pre-signed URL from a retrieve response body.
pub fn parse_presigned_url(body: &[u8]) -> Result<String, String> {
    let value: Value =
        serde_json::from_slice(body).map_err(|e| format!("response is not valid JSON: {e}"))?;

    match value.get(PRESIGNED_URL_FIELD) {
        Some(Value::String(url)) if !url.is_empty() => Ok(url.clone()),
        Some(Value::String(_)) => Err(format!(
            "response has an empty '{PRESIGNED_URL_FIELD}' field"
        )),
        Some(_) => Err(format!(
            "response field '{PRESIGNED_URL_FIELD}' is not a string"
        )),
        None => Err(format!("response has no '{PRESIGNED_URL_FIELD}' field")),
    }
}
