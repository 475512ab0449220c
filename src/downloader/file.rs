//! Single file content download.

use crate::error::{DownloadError, Error, Result};
use crate::types::{Event, RemoteId};
use crate::utils::{extract_filename_from_response, with_proxy};
use futures::StreamExt;
use std::path::{Path, PathBuf};
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::{debug, info, warn};

use super::DriveDownloader;

impl DriveDownloader {
    /// Content-fetch URL for a file id, including the proxy prefix
    ///
    /// The endpoint is asked for a forced download (`export=download`) with the
    /// large-file confirmation pre-accepted (`confirm=t`).
    pub fn download_url(&self, id: &RemoteId) -> Result<String> {
        let url = url::Url::parse_with_params(
            &self.config.download.download_endpoint,
            &[
                ("id", id.as_str()),
                ("export", "download"),
                ("confirm", "t"),
            ],
        )
        .map_err(|e| Error::Config {
            message: format!("invalid download endpoint: {}", e),
            key: Some("download.download_endpoint".to_string()),
        })?;
        Ok(with_proxy(&self.proxy_prefix, url.as_str()))
    }

    /// Download one file to `output_root/relative_path`
    ///
    /// Missing parent directories are created first. The body is streamed to
    /// disk through a buffer of `download.chunk_size` bytes. Never retries.
    ///
    /// # Returns
    ///
    /// `true` if the file was written. Non-200 responses and transport or disk
    /// errors are logged, published as [`Event::DownloadFailed`], and reported
    /// as `false`; they never propagate.
    pub async fn download_file(
        &self,
        id: &RemoteId,
        relative_path: &Path,
        output_root: &Path,
    ) -> bool {
        let target = output_root.join(relative_path);
        self.emit_event(Event::DownloadStarted {
            id: id.clone(),
            path: target.clone(),
        });

        let result = async {
            create_parent_dirs(&target).await?;
            let response = self.fetch_content(id).await?;
            self.write_body(id, response, &target).await
        }
        .await;

        self.report_outcome(id, &target, &result);
        result.is_ok()
    }

    /// Download a file linked directly (no folder context)
    ///
    /// The local name comes from the response's Content-Disposition header,
    /// falling back to the file id. Unlike [`download_file`](Self::download_file)
    /// this returns the error, since there is nothing else to continue with.
    ///
    /// When the request itself fails the real name is never learned, so the
    /// started and failed events carry the id-named fallback path.
    pub async fn download_single_file(&self, id: &RemoteId, output_dir: &Path) -> Result<PathBuf> {
        let response = match self.fetch_content(id).await {
            Ok(response) => response,
            Err(e) => {
                let fallback = output_dir.join(id.as_str());
                self.emit_event(Event::DownloadStarted {
                    id: id.clone(),
                    path: fallback.clone(),
                });
                let result = Err(e);
                self.report_outcome(id, &fallback, &result);
                return result.map(|_| fallback);
            }
        };

        let name =
            extract_filename_from_response(&response).unwrap_or_else(|| id.as_str().to_string());
        let target = output_dir.join(name);
        self.emit_event(Event::DownloadStarted {
            id: id.clone(),
            path: target.clone(),
        });

        let result = async {
            create_parent_dirs(&target).await?;
            self.write_body(id, response, &target).await
        }
        .await;

        self.report_outcome(id, &target, &result);
        result.map(|_| target)
    }

    /// Issue the streamed GET and require a 200 answer
    async fn fetch_content(&self, id: &RemoteId) -> Result<reqwest::Response> {
        let url = self.download_url(id)?;
        debug!(file_id = %id, url = %url, "requesting file content");

        let response = self.client.get(&url).send().await.map_err(|e| {
            DownloadError::Transport {
                id: id.to_string(),
                reason: e.to_string(),
            }
        })?;

        if response.status() != reqwest::StatusCode::OK {
            return Err(DownloadError::HttpStatus {
                id: id.to_string(),
                status: response.status().as_u16(),
            }
            .into());
        }
        Ok(response)
    }

    /// Stream the response body into `target`, returning the byte count
    async fn write_body(
        &self,
        id: &RemoteId,
        response: reqwest::Response,
        target: &Path,
    ) -> Result<u64> {
        let write_error = |e: std::io::Error| DownloadError::Write {
            path: target.to_path_buf(),
            reason: e.to_string(),
        };

        let file = tokio::fs::File::create(target).await.map_err(write_error)?;
        let mut writer = BufWriter::with_capacity(self.config.download.chunk_size, file);
        let mut stream = response.bytes_stream();
        let mut written = 0u64;

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| DownloadError::Transport {
                id: id.to_string(),
                reason: e.to_string(),
            })?;
            writer.write_all(&chunk).await.map_err(write_error)?;
            written += chunk.len() as u64;
        }
        writer.flush().await.map_err(write_error)?;

        Ok(written)
    }

    /// Log and publish the outcome of one file download
    fn report_outcome(&self, id: &RemoteId, target: &Path, result: &Result<u64>) {
        match result {
            Ok(bytes) => {
                let bytes = *bytes;
                info!(file_id = %id, path = %target.display(), bytes, "file downloaded");
                self.emit_event(Event::DownloadCompleted {
                    id: id.clone(),
                    path: target.to_path_buf(),
                    bytes,
                });
            }
            Err(e) => {
                warn!(file_id = %id, path = %target.display(), error = %e, "file download failed");
                self.emit_event(Event::DownloadFailed {
                    id: id.clone(),
                    path: target.to_path_buf(),
                    error: e.to_string(),
                });
            }
        }
    }
}

async fn create_parent_dirs(target: &Path) -> Result<()> {
    if let Some(parent) = target.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| DownloadError::Write {
                path: parent.to_path_buf(),
                reason: e.to_string(),
            })?;
    }
    Ok(())
}
