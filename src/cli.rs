use crate::config::{FetchConfig, RunFile};
use crate::constants::DEFAULT_AUTH_FILE;
use crate::downloader::{bulk_file_download_with_config, collect_file_ids, save_files};
use crate::errors::{AppError, AppResult};
use crate::models::{validate_file_id, AuthContext};
use crate::ui;
use crate::utils::{format_duration, mb_from_bytes, total_bytes};
use clap::{Arg, ArgAction, ArgMatches, Command};
use std::path::PathBuf;
use std::time::Instant;
use tracing::info;

// CLI metadata constants
const APP_VERSION: &str = env!("CARGO_PKG_VERSION");
const APP_AUTHOR: &str = env!("CARGO_PKG_AUTHORS");
const APP_ABOUT: &str = env!("CARGO_PKG_DESCRIPTION");

/// Everything a single run needs, however it was specified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOptions {
    pub auth_path: PathBuf,
    pub file_ids: Vec<String>,
    pub output_dir: Option<PathBuf>,
    pub fetch: FetchConfig,
}

pub fn build_command() -> Command<'static> {
    Command::new("datalake-fetch")
        .version(APP_VERSION)
        .author(APP_AUTHOR)
        .about(APP_ABOUT)
        .subcommand(
            Command::new("cli")
                .about("Download files by id using command-line options")
                .after_help(
                    "Example:\n  datalake-fetch cli --auth auth.json -c 4 -o downloads <ID> <ID>",
                )
                .arg(
                    Arg::new("auth")
                        .short('a')
                        .long("auth")
                        .help("Path to the auth JSON file (org, auth_token, api_url)")
                        .default_value(DEFAULT_AUTH_FILE)
                        .value_parser(clap::value_parser!(PathBuf))
                        .action(ArgAction::Set),
                )
                .arg(
                    Arg::new("concurrency")
                        .short('c')
                        .long("concurrency")
                        .help("Maximum number of simultaneous connections")
                        .default_value("1")
                        .value_parser(clap::value_parser!(usize))
                        .action(ArgAction::Set),
                )
                .arg(
                    Arg::new("ids_file")
                        .short('i')
                        .long("ids-file")
                        .help("File with one file id per line")
                        .value_parser(clap::value_parser!(PathBuf))
                        .action(ArgAction::Set),
                )
                .arg(
                    Arg::new("output_dir")
                        .short('o')
                        .long("output-dir")
                        .help("Directory to write downloaded files to, named by id")
                        .value_parser(clap::value_parser!(PathBuf))
                        .action(ArgAction::Set),
                )
                .arg(
                    Arg::new("ids")
                        .help("File ids to download")
                        .value_parser(clap::value_parser!(String))
                        .multiple_values(true)
                        .action(ArgAction::Set),
                ),
        )
        .subcommand(
            Command::new("toml")
                .about("Run using a TOML run file")
                .arg(
                    Arg::new("config")
                        .help("Path to the TOML run file")
                        .required(true)
                        .value_parser(clap::value_parser!(PathBuf)),
                ),
        )
}

/// Turns the `cli` subcommand's matches into run options.
pub fn options_from_cli_matches(sub: &ArgMatches) -> AppResult<RunOptions> {
    let auth_path = sub
        .get_one::<PathBuf>("auth")
        .cloned()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_AUTH_FILE));
    let inline_ids: Vec<String> = sub
        .get_many::<String>("ids")
        .map(|values| values.cloned().collect())
        .unwrap_or_default();
    let ids_file = sub.get_one::<PathBuf>("ids_file");

    let mut fetch = FetchConfig::default();
    if let Some(&concurrency) = sub.get_one::<usize>("concurrency") {
        fetch.concurrency = concurrency;
    }

    Ok(RunOptions {
        auth_path,
        file_ids: collect_file_ids(inline_ids, ids_file.map(PathBuf::as_path))?,
        output_dir: sub.get_one::<PathBuf>("output_dir").cloned(),
        fetch,
    })
}

impl From<RunFile> for RunOptions {
    fn from(run: RunFile) -> Self {
        Self {
            auth_path: run.auth,
            file_ids: run.ids,
            output_dir: run.output_dir,
            fetch: run.fetch,
        }
    }
}

/// Parses command-line arguments and executes the download.
///
/// This function handles two subcommands:
/// - `cli`: ids and settings given as options
/// - `toml`: everything read from a TOML run file
///
/// Both load the auth file, download every id through the shared
/// retrying client, and optionally write the files to an output directory.
pub async fn cli() -> AppResult<()> {
    let cmd = build_command();
    let mut cmd_for_help = cmd.clone();
    let matches = cmd.get_matches();

    let options = match matches.subcommand() {
        Some(("cli", sub)) => options_from_cli_matches(sub)?,
        Some(("toml", sub)) => {
            let config_path = sub
                .get_one::<PathBuf>("config")
                .ok_or_else(|| AppError::InvalidInput("Missing run file path".into()))?;
            RunFile::from_toml_file(config_path)?.into()
        }
        _ => {
            cmd_for_help
                .print_help()
                .map_err(|e| AppError::IoError(format!("Failed to print help: {e}")))?;
            return Ok(());
        }
    };

    run_workflow(&options).await
}

/// Loads credentials, downloads every id, and saves the results if asked to.
pub async fn run_workflow(options: &RunOptions) -> AppResult<()> {
    options.fetch.validate()?;
    if options.output_dir.is_some() {
        // Fail before any network traffic rather than after downloading.
        for file_id in &options.file_ids {
            validate_file_id(file_id)?;
        }
    }

    let auth = AuthContext::from_json_file(&options.auth_path)?;
    print_download_info(&auth, options);

    let started = Instant::now();
    let pb = ui::create_progress_bar(options.file_ids.len() as u64)?;
    let files =
        match bulk_file_download_with_config(&options.file_ids, &auth, &options.fetch, Some(&pb))
            .await
        {
            Ok(files) => files,
            Err(e) => {
                pb.abandon_with_message("Download failed");
                return Err(e);
            }
        };
    pb.finish_with_message(format!("Downloaded {} file(s)", files.len()));

    if let Some(dir) = options.output_dir.as_deref() {
        save_files(dir, &options.file_ids, &files).await?;
    }

    info!(
        files = files.len(),
        size_mb = mb_from_bytes(total_bytes(&files)),
        elapsed = %format_duration(started.elapsed()),
        "All downloads completed successfully"
    );
    Ok(())
}

fn print_download_info(auth: &AuthContext, options: &RunOptions) {
    let output = options
        .output_dir
        .as_deref()
        .map(|dir| dir.display().to_string())
        .unwrap_or_else(|| "none (discarded)".to_string());
    info!(
        api_url = auth.base_url.as_str(),
        org = auth.org_slug.as_str(),
        files = options.file_ids.len(),
        concurrency = options.fetch.concurrency,
        output_dir = output.as_str(),
        "Starting download"
    );
}
