//! datalake-fetch library
//!
//! This crate provides the core functionality for the `datalake-fetch` binary.
//! The crate root only declares modules; implementation and tests live in the modules.
//!
//! ## Overview
//!
//! Files in the data lake are downloaded in two steps: the API's retrieve
//! endpoint hands out a short-lived pre-signed URL for a file id, and the bytes
//! are then fetched from that URL. The library is organized as follows:
//!
//! - [`downloader`] - Pre-signed URL resolution, the shared retrying client and the bulk
//!   fetch orchestrator
//! - [`models`] - The authentication context sent with every API request
//! - [`config`] - Fetch settings and TOML run files
//! - [`cli`] - Command-line interface wiring the pieces together
//! - [`errors`] - Error types used throughout the application
//!
//! ## Example Usage
//!
//! ```no_run
//! use datalake_fetch::{downloader, errors::AppResult, models::AuthContext};
//! use std::path::Path;
//!
//! # async fn example() -> AppResult<()> {
//! let auth = AuthContext::from_json_file(Path::new("auth.json"))?;
//! let ids = vec![
//!     "d51abcdc-04fd-40f8-9556-27a7add9a342".to_string(),
//!     "ff807173-587d-40c6-88e7-7ca31522b71b".to_string(),
//! ];
//!
//! // Results come back in the same order as `ids`.
//! let files = downloader::bulk_file_download(&ids, &auth, 1).await?;
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod config;
pub mod constants;
pub mod downloader;
pub mod errors;
pub mod models;
pub mod ui;
pub mod utils;
