//! # gdrive-dl
//!
//! Download publicly shared Google Drive folders without API credentials.
//!
//! ## How it works
//!
//! A shared folder's web page embeds the folder listing in a script literal.
//! gdrive-dl fetches that page, decodes the listing, recurses into subfolders,
//! and then downloads every file through the public content endpoint, mirroring
//! the folder structure on disk.
//!
//! - **Sequential** - One request at a time, in listing order
//! - **Proxy-aware** - Every request can go through a URL-prefix relay
//! - **Event-driven** - Consumers subscribe to progress events, no polling required
//! - **Fault-isolating** - A failed file is reported and skipped; a failed
//!   folder listing aborts before anything is written
//!
//! ## Quick Start
//!
//! ```no_run
//! use gdrive_dl::{Config, DriveDownloader, FolderTarget};
//! use std::path::Path;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let downloader = DriveDownloader::new(Config::default())?;
//!
//!     // Subscribe to events
//!     let mut events = downloader.subscribe();
//!     tokio::spawn(async move {
//!         while let Ok(event) = events.recv().await {
//!             println!("Event: {:?}", event);
//!         }
//!     });
//!
//!     let target = FolderTarget::Url(
//!         "https://drive.google.com/drive/folders/1AbCdEfGhIjKlMnOp".to_string(),
//!     );
//!     let written = downloader
//!         .download_folder(&target, Some(Path::new("downloads/")))
//!         .await?;
//!     println!("{} files downloaded", written.len());
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Configuration types
pub mod config;
/// Downloader: HTTP session, file downloads and folder orchestration
pub mod downloader;
/// Error types
pub mod error;
/// Tree flattening into ordered local paths
pub mod flatten;
/// Folder-tree resolution and page extraction
pub mod resolver;
/// Core types and events
pub mod types;
/// Utility functions
pub mod utils;

// Re-export commonly used types
pub use config::{Config, DownloadConfig, HttpConfig, ProxyConfig, ResolverConfig};
pub use downloader::DriveDownloader;
pub use error::{DownloadError, Error, ResolveError, Result};
pub use flatten::flatten;
pub use resolver::page::{ChildRecord, FolderPage, parse_folder_page};
pub use types::{Event, FolderTarget, Link, PathEntry, RemoteId, RemoteNode};
