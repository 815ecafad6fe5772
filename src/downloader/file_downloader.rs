use super::client::RetryClient;
use super::resolver::resolve_presigned_url;
use crate::config::FetchConfig;
use crate::errors::{AppError, AppResult};
use crate::models::AuthContext;
use indicatif::ProgressBar;
use reqwest::header::HeaderMap;
use std::sync::Arc;
use std::time::Instant;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

/// Outcome of a single fetch task: input position, identifier, file bytes.
type FetchTaskResult = (usize, String, AppResult<Vec<u8>>);

/// Downloads one file: resolves its pre-signed URL, then fetches the bytes.
///
/// Credential headers go to the retrieve endpoint only; the pre-signed URL
/// already carries its own authorization.
pub async fn download_task(
    client: &RetryClient,
    auth: &AuthContext,
    headers: &HeaderMap,
    file_id: &str,
) -> AppResult<Vec<u8>> {
    let url = resolve_presigned_url(client, auth, headers, file_id).await?;
    let bytes = client.get_body(&url, |http| http.get(&url)).await?;
    debug!(file_id, bytes = bytes.len(), "Downloaded file");
    Ok(bytes)
}

/// Downloads a collection of files with at most `concurrency` requests in flight.
///
/// Uses the default retry policy (3 attempts, retry on 502, 100 ms to 3 s
/// random backoff). See [`bulk_file_download_with_config`] for the details.
///
/// # Example
///
/// ```no_run
/// use datalake_fetch::downloader::bulk_file_download;
/// use datalake_fetch::models::AuthContext;
///
/// # async fn example() -> datalake_fetch::errors::AppResult<()> {
/// let auth = AuthContext::new("https://api.example.com/v1/", "my-org", "token");
/// let ids = vec!["d51abcdc-04fd-40f8-9556-27a7add9a342".to_string()];
/// let files = bulk_file_download(&ids, &auth, 4).await?;
/// assert_eq!(files.len(), ids.len());
/// # Ok(())
/// # }
/// ```
pub async fn bulk_file_download(
    file_ids: &[String],
    auth: &AuthContext,
    concurrency: usize,
) -> AppResult<Vec<Vec<u8>>> {
    let config = FetchConfig {
        concurrency,
        ..FetchConfig::default()
    };
    bulk_file_download_with_config(file_ids, auth, &config, None).await
}

/// Downloads a collection of files using explicit fetch settings.
///
/// # Behavior
///
/// - **One shared client**: every request goes through a single connection pool
///   gated to `config.concurrency` simultaneous requests.
/// - **Ordered results**: the returned vector has one entry per identifier, in
///   input order, whatever order the downloads finish in.
/// - **No de-duplication**: repeated identifiers are fetched once per occurrence.
/// - **All or nothing**: the first task that fails irrecoverably fails the whole
///   batch, and every task still running is aborted.
///
/// # Errors
///
/// Returns `InvalidInput` for invalid settings, otherwise the error of the first
/// failed task (`ResolutionError`, `NetworkError`, `HttpStatus`,
/// `RetriesExhausted`) or `TaskError` if a task panicked.
pub async fn bulk_file_download_with_config(
    file_ids: &[String],
    auth: &AuthContext,
    config: &FetchConfig,
    progress: Option<&ProgressBar>,
) -> AppResult<Vec<Vec<u8>>> {
    config.validate()?;

    if file_ids.is_empty() {
        info!("No file ids given, nothing to download");
        return Ok(Vec::new());
    }

    let client = RetryClient::new(
        config.concurrency,
        config.retry_policy(),
        config.connect_timeout(),
    )?;
    let headers = Arc::new(auth.headers()?);
    let auth = Arc::new(auth.clone());

    info!(
        files = file_ids.len(),
        concurrency = config.concurrency,
        "Starting bulk download"
    );
    let started = Instant::now();

    let mut tasks: JoinSet<FetchTaskResult> = JoinSet::new();
    for (index, file_id) in file_ids.iter().enumerate() {
        let client = client.clone();
        let auth = Arc::clone(&auth);
        let headers = Arc::clone(&headers);
        let file_id = file_id.clone();

        tasks.spawn(async move {
            let outcome = download_task(&client, &auth, &headers, &file_id).await;
            (index, file_id, outcome)
        });
    }

    let mut results: Vec<Option<Vec<u8>>> = vec![None; file_ids.len()];
    while let Some(joined) = tasks.join_next().await {
        let (index, file_id, outcome) = match joined {
            Ok(done) => done,
            Err(e) => {
                tasks.abort_all();
                return Err(e.into());
            }
        };

        match outcome {
            Ok(bytes) => {
                if let Some(pb) = progress {
                    pb.inc(1);
                    pb.set_message(format!("Downloaded {file_id}"));
                }
                results[index] = Some(bytes);
            }
            Err(e) => {
                warn!(
                    file_id = file_id.as_str(),
                    error = %e,
                    pending = tasks.len(),
                    "Download failed, cancelling remaining tasks"
                );
                tasks.abort_all();
                return Err(e);
            }
        }
    }

    let files = results
        .into_iter()
        .zip(file_ids)
        .map(|(bytes, file_id)| {
            bytes.ok_or_else(|| AppError::TaskError(format!("No result recorded for {file_id}")))
        })
        .collect::<AppResult<Vec<_>>>()?;

    info!(
        files = files.len(),
        bytes = files.iter().map(Vec::len).sum::<usize>(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Bulk download completed"
    );

    Ok(files)
}
