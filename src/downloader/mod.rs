//! Resolve-then-fetch downloads from the data lake.
//!
//! Every identifier is first exchanged for a pre-signed URL at the retrieve
//! endpoint, then the bytes are fetched from that URL. All requests share one
//! [`RetryClient`]. The main entry points are [`bulk_file_download`] and
//! [`bulk_file_download_with_config`].

mod client;
mod file_downloader;
mod file_ids;
mod file_writer;
mod gate;
mod resolver;
mod retry;

// Re-export public API
pub use client::{redact_url, RetryClient};
pub use file_downloader::{bulk_file_download, bulk_file_download_with_config, download_task};
pub use file_ids::{collect_file_ids, parse_file_ids, read_file_ids};
pub use file_writer::save_files;
pub use gate::ConnectionGate;
pub use resolver::{parse_presigned_url, resolve_presigned_url};
pub use retry::RetryPolicy;
