//! Core downloader implementation split into focused submodules.
//!
//! The `DriveDownloader` struct and its methods are organized by domain:
//! - [`file`] - Single file content download (streamed to disk)
//! - [`folder`] - Folder orchestration (resolve, flatten, download each file)
//!
//! Folder-tree resolution lives in [`crate::resolver`] and is also exposed as
//! a method on `DriveDownloader`, since it shares the HTTP client and the
//! event channel.

mod file;
mod folder;


use crate::config::Config;
use crate::error::Result;
use crate::types::Event;
use std::sync::Arc;

/// Capacity of the event broadcast channel
const EVENT_CHANNEL_CAPACITY: usize = 1000;

/// Main downloader instance (cloneable - the client and config are shared)
///
/// One instance corresponds to one HTTP session: every request it issues goes
/// through the same connection pool with the same headers.
#[derive(Clone)]
pub struct DriveDownloader {
    /// HTTP client shared by folder page fetches and file downloads
    pub(crate) client: reqwest::Client,
    /// Configuration (wrapped in Arc for cheap clones)
    pub(crate) config: Arc<Config>,
    /// Normalized proxy prefix, empty for direct connections
    pub(crate) proxy_prefix: String,
    /// Event broadcast channel sender (multiple subscribers supported)
    pub(crate) event_tx: tokio::sync::broadcast::Sender<Event>,
}

impl DriveDownloader {
    /// Create a downloader from a validated configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the HTTP client
    /// cannot be built (e.g. the TLS backend fails to initialize).
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;

        let mut builder = reqwest::Client::builder()
            .user_agent(config.http.user_agent.clone())
            .connect_timeout(config.http.connect_timeout)
            .danger_accept_invalid_certs(!config.http.verify_tls);
        if let Some(timeout) = config.http.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build()?;

        if !config.http.verify_tls {
            tracing::warn!("TLS certificate verification is disabled");
        }

        let proxy_prefix = config.proxy.prefix();
        let (event_tx, _rx) = tokio::sync::broadcast::channel(EVENT_CHANNEL_CAPACITY);

        Ok(Self {
            client,
            config: Arc::new(config),
            proxy_prefix,
            event_tx,
        })
    }

    /// Subscribe to progress events
    ///
    /// Events sent before subscribing are not replayed.
    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<Event> {
        self.event_tx.subscribe()
    }

    /// Active configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Proxy prefix prepended to outbound URLs (empty when disabled)
    pub fn proxy_prefix(&self) -> &str {
        &self.proxy_prefix
    }

    pub(crate) fn emit_event(&self, event: Event) {
        // No subscribers is fine
        self.event_tx.send(event).ok();
    }

    /// Emit an event that quiet mode suppresses
    pub(crate) fn emit_progress(&self, event: Event) {
        if !self.config.resolver.quiet {
            self.emit_event(event);
        }
    }
}
