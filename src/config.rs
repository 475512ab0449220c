//! Configuration types for gdrive-dl

use crate::error::{Error, Result};
use crate::utils::normalize_proxy;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Proxy used when the caller does not pick one explicitly.
///
/// Every outbound URL is appended to this prefix, so the proxy must accept the
/// full target URL as its path.
pub const DEFAULT_PROXY: &str = "https://c.map987.dpdns.org/";

/// MIME type the service reports for folders
pub const FOLDER_MIME_TYPE: &str = "application/vnd.google-apps.folder";

/// HTTP client settings shared by every request of an invocation
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Browser-identifying User-Agent sent with every request
    ///
    /// The service serves a reduced page to clients it does not recognize as a
    /// browser, so this should look like a real desktop browser.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Total per-request timeout in seconds (None = no timeout, the default)
    ///
    /// Applies to the whole request including the body stream, so keep it
    /// generous when downloading large files.
    #[serde(default, with = "option_duration_serde")]
    pub timeout: Option<Duration>,

    /// Connection establishment timeout (default: 30 seconds)
    #[serde(default = "default_connect_timeout", with = "duration_serde")]
    pub connect_timeout: Duration,

    /// Validate TLS certificates of the proxy and the remote service (default: true)
    #[serde(default = "default_true")]
    pub verify_tls: bool,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            timeout: None,
            connect_timeout: default_connect_timeout(),
            verify_tls: true,
        }
    }
}

/// Proxy prefix configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProxyConfig {
    /// URL prefix prepended to every outbound request (None = direct connection)
    #[serde(default = "default_proxy")]
    pub prefix: Option<String>,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            prefix: default_proxy(),
        }
    }
}

impl ProxyConfig {
    /// Direct connection, no proxy
    pub fn disabled() -> Self {
        Self { prefix: None }
    }

    /// Normalized prefix to prepend to outbound URLs (empty when disabled)
    pub fn prefix(&self) -> String {
        normalize_proxy(self.prefix.as_deref().unwrap_or(""))
    }
}

/// Folder-tree resolution settings
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ResolverConfig {
    /// Child count per folder at which a warning is emitted (default: 50000)
    ///
    /// The service stops listing at this many children, so a folder that hits
    /// it exactly is probably truncated.
    #[serde(default = "default_max_children")]
    pub max_children: usize,

    /// Do not warn when a folder reaches `max_children` (default: false)
    #[serde(default)]
    pub allow_unbounded_children: bool,

    /// Maximum folder nesting depth below the root (default: 64)
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,

    /// Suppress progress events during resolution and listing (default: false)
    #[serde(default)]
    pub quiet: bool,

    /// Base URL a folder id is appended to
    #[serde(default = "default_folder_url_base")]
    pub folder_url_base: String,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            max_children: default_max_children(),
            allow_unbounded_children: false,
            max_depth: default_max_depth(),
            quiet: false,
            folder_url_base: default_folder_url_base(),
        }
    }
}

/// File content download settings
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DownloadConfig {
    /// Content-fetch endpoint; the file id is passed as the `id` query parameter
    #[serde(default = "default_download_endpoint")]
    pub download_endpoint: String,

    /// Size of the write buffer used while streaming file bodies (default: 1024 bytes)
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            download_endpoint: default_download_endpoint(),
            chunk_size: default_chunk_size(),
        }
    }
}

/// Main configuration for DriveDownloader
///
/// Fields are organized into sub-configs:
/// - [`http`](HttpConfig) — user agent, timeouts, TLS verification
/// - [`proxy`](ProxyConfig) — outbound URL prefix
/// - [`resolver`](ResolverConfig) — folder limits, quiet mode, folder URL base
/// - [`download`](DownloadConfig) — content endpoint and write chunk size
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Config {
    /// HTTP client settings
    #[serde(default)]
    pub http: HttpConfig,

    /// Proxy prefix
    #[serde(default)]
    pub proxy: ProxyConfig,

    /// Folder-tree resolution settings
    #[serde(default)]
    pub resolver: ResolverConfig,

    /// File download settings
    #[serde(default)]
    pub download: DownloadConfig,
}

impl Config {
    /// Load a configuration from a JSON file and validate it
    ///
    /// Missing fields take their defaults, so `{}` is a valid file.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::Config {
            message: format!("failed to read config file '{}': {}", path.display(), e),
            key: None,
        })?;
        let config: Config = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check settings that would otherwise fail later in confusing ways
    pub fn validate(&self) -> Result<()> {
        if self.download.chunk_size == 0 {
            return Err(Error::Config {
                message: "chunk_size must be greater than zero".to_string(),
                key: Some("download.chunk_size".to_string()),
            });
        }
        if self.resolver.max_depth == 0 {
            return Err(Error::Config {
                message: "max_depth must be greater than zero".to_string(),
                key: Some("resolver.max_depth".to_string()),
            });
        }
        if self.http.timeout.is_some_and(|t| t.is_zero()) {
            return Err(Error::Config {
                message: "timeout must be greater than zero (omit it to disable)".to_string(),
                key: Some("http.timeout".to_string()),
            });
        }
        for (key, value) in [
            ("resolver.folder_url_base", &self.resolver.folder_url_base),
            ("download.download_endpoint", &self.download.download_endpoint),
        ] {
            url::Url::parse(value).map_err(|e| Error::Config {
                message: format!("'{}' is not a valid URL: {}", value, e),
                key: Some(key.to_string()),
            })?;
        }
        Ok(())
    }
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/98.0.4758.102 Safari/537.36".to_string()
}

fn default_connect_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_true() -> bool {
    true
}

fn default_proxy() -> Option<String> {
    Some(DEFAULT_PROXY.to_string())
}

fn default_max_children() -> usize {
    50_000
}

fn default_max_depth() -> usize {
    64
}

fn default_folder_url_base() -> String {
    "https://drive.google.com/drive/folders/".to_string()
}

fn default_download_endpoint() -> String {
    "https://drive.usercontent.google.com/download".to_string()
}

fn default_chunk_size() -> usize {
    1024
}

mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}

mod option_duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match duration {
            Some(d) => serializer.serialize_some(&d.as_secs()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = Option::<u64>::deserialize(deserializer)?;
        Ok(secs.map(Duration::from_secs))
    }
}
