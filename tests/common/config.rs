//! Test configuration helpers: downloaders wired to a mock Drive server

use gdrive_dl::{Config, DriveDownloader, ProxyConfig};
use tempfile::TempDir;
use wiremock::MockServer;

/// Config that sends folder and file requests to `server`, without a proxy
pub fn mock_config(server: &MockServer) -> Config {
    let mut config = Config::default();
    config.proxy = ProxyConfig::disabled();
    config.resolver.folder_url_base = format!("{}/drive/folders/", server.uri());
    config.download.download_endpoint = format!("{}/download", server.uri());
    config
}

/// Create a DriveDownloader against `server` plus a fresh output directory
///
/// Returns the downloader and temp directory (keep temp_dir alive for test duration)
pub fn create_mock_downloader(server: &MockServer) -> (DriveDownloader, TempDir) {
    let downloader =
        DriveDownloader::new(mock_config(server)).expect("mock config should be valid");
    let temp_dir = tempfile::tempdir().expect("failed to create temp dir");
    (downloader, temp_dir)
}
