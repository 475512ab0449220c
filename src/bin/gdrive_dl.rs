//! gdrive-dl CLI Binary
//!
//! Command-line front end for downloading public Google Drive files and folders.
//! Without a link (or with `--interactive`) it prompts for the link, the proxy
//! and the output directory.

use clap::Parser;
use dialoguer::Input;
use gdrive_dl::config::DEFAULT_PROXY;
use gdrive_dl::utils::parse_link;
use gdrive_dl::{Config, DriveDownloader, Error, Event, FolderTarget, Result};
use std::path::PathBuf;
use std::process;
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;
use tracing_subscriber::EnvFilter;

/// Download public Google Drive files and folder trees without an API key
#[derive(Parser, Debug)]
#[command(name = "gdrive-dl", version)]
struct Cli {
    /// Google Drive link (file or folder) or a bare folder id
    #[arg(short, long)]
    url: Option<String>,

    /// Folder id (alternative to --url)
    #[arg(long)]
    id: Option<String>,

    /// Output directory (default: current directory; a trailing separator appends the folder name)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Proxy URL prefix (default: the built-in relay; empty string for none)
    #[arg(short, long)]
    proxy: Option<String>,

    /// Connect directly, without any proxy
    #[arg(long, conflicts_with = "proxy")]
    no_proxy: bool,

    /// Prompt for link, proxy and output directory
    #[arg(short, long)]
    interactive: bool,

    /// Do not warn about folders at the child-count limit
    #[arg(long)]
    remaining_ok: bool,

    /// Skip TLS certificate verification
    #[arg(long)]
    no_verify: bool,

    /// Suppress discovery progress and the listing preview
    #[arg(short, long)]
    quiet: bool,

    /// Per-request timeout in seconds (default: none)
    #[arg(long)]
    timeout: Option<u64>,

    /// JSON configuration file (flags override its values)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error, off); RUST_LOG takes precedence
    #[arg(long, default_value = "warn")]
    log_level: String,
}

/// What the user asked to download, after prompts and flag checks
struct Request {
    link: Option<String>,
    folder_id: Option<String>,
    output: Option<PathBuf>,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    // The summary itself is printed from the Finished event
    if let Err(e) = run(cli).await {
        eprintln!("Error [{}]: {}", e.code(), e);
        process::exit(1);
    }
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run(mut cli: Cli) -> Result<Vec<PathBuf>> {
    let mut config = match &cli.config {
        Some(path) => Config::from_json_file(path)?,
        None => Config::default(),
    };

    let request = if cli.interactive || (cli.url.is_none() && cli.id.is_none()) {
        prompt_request(&mut cli)?
    } else {
        Request {
            link: cli.url.take(),
            folder_id: cli.id.take(),
            output: cli.output.take(),
        }
    };
    apply_overrides(&mut config, &cli);

    let downloader = DriveDownloader::new(config)?;
    let printer = tokio::spawn(print_events(downloader.subscribe()));

    let result = match (request.link, request.folder_id) {
        (Some(link), None) => {
            downloader
                .download_link(&link, request.output.as_deref())
                .await
        }
        (link, id) => {
            let target = FolderTarget::from_parts(link, id)?;
            downloader
                .download_folder(&target, request.output.as_deref())
                .await
        }
    };

    // Closing the channel lets the printer drain and exit
    drop(downloader);
    printer.await.ok();
    result
}

/// Interactive mode: ask for link, proxy and output directory
fn prompt_request(cli: &mut Cli) -> Result<Request> {
    println!("{}", "=".repeat(50));
    println!("Google Drive downloader - interactive mode");
    println!("{}", "=".repeat(50));

    let link: String = Input::new()
        .with_prompt("Google Drive link (file or folder)")
        .validate_with(|input: &String| -> std::result::Result<(), String> {
            parse_link(input)
                .map(|_| ())
                .map_err(|_| "must be a Google Drive file or folder link".to_string())
        })
        .interact_text()
        .map_err(prompt_error)?;

    if !cli.no_proxy && cli.proxy.is_none() {
        println!("Default proxy: {}", DEFAULT_PROXY);
        let proxy: String = Input::new()
            .with_prompt("Proxy (Enter for the default, 'n' for none)")
            .allow_empty(true)
            .interact_text()
            .map_err(prompt_error)?;
        let proxy = proxy.trim();
        if proxy.eq_ignore_ascii_case("n") {
            cli.no_proxy = true;
        } else if !proxy.is_empty() {
            cli.proxy = Some(proxy.to_string());
        }
    }

    let output = match cli.output.take() {
        Some(output) => Some(output),
        None => {
            let output: String = Input::new()
                .with_prompt("Output directory (Enter for the current directory)")
                .allow_empty(true)
                .interact_text()
                .map_err(prompt_error)?;
            let output = output.trim();
            (!output.is_empty()).then(|| PathBuf::from(output))
        }
    };

    Ok(Request {
        link: Some(link.trim().to_string()),
        folder_id: None,
        output,
    })
}

fn prompt_error(e: dialoguer::Error) -> Error {
    Error::InvalidInput(format!("failed to read input: {}", e))
}

/// Flags win over the configuration file
fn apply_overrides(config: &mut Config, cli: &Cli) {
    if let Some(proxy) = &cli.proxy {
        config.proxy.prefix = (!proxy.trim().is_empty()).then(|| proxy.clone());
    }
    if cli.no_proxy {
        config.proxy.prefix = None;
    }
    if cli.remaining_ok {
        config.resolver.allow_unbounded_children = true;
    }
    if cli.no_verify {
        config.http.verify_tls = false;
    }
    if cli.quiet {
        config.resolver.quiet = true;
    }
    if let Some(secs) = cli.timeout {
        config.http.timeout = Some(Duration::from_secs(secs));
    }
}

async fn print_events(mut events: tokio::sync::broadcast::Receiver<Event>) {
    loop {
        match events.recv().await {
            Ok(event) => print_event(&event),
            Err(RecvError::Lagged(skipped)) => {
                tracing::debug!(skipped, "event printer lagged");
            }
            Err(RecvError::Closed) => break,
        }
    }
}

fn print_event(event: &Event) {
    match event {
        Event::FolderDiscovered { id, name } => println!("Folder: {} {}", id, name),
        Event::FileDiscovered { id, name } => println!("File: {} {}", id, name),
        Event::ChildLimitReached { count, .. } => {
            println!("Warning: folder has {} entries, the listing may be incomplete", count)
        }
        Event::Listing { entries } => {
            println!("{}", "-".repeat(50));
            for entry in entries {
                if entry.is_folder() {
                    println!("{}", entry.display_path());
                } else {
                    println!("[file] {}", entry.display_path());
                }
            }
            println!("{}", "-".repeat(50));
        }
        Event::DownloadStarted { path, .. } => println!("Downloading: {}", path.display()),
        Event::DownloadCompleted { bytes, .. } => println!("  ok ({} bytes)", bytes),
        Event::DownloadFailed { error, .. } => println!("  failed: {}", error),
        Event::Finished { downloaded, total } => {
            println!("{} of {} file(s) downloaded", downloaded, total)
        }
    }
}
