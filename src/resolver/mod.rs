//! Folder-tree resolution.
//!
//! Each folder listing is one page fetch. Subfolders are resolved depth-first
//! with an explicit stack, one at a time, so the resulting tree keeps the
//! order in which the service listed every folder's children. Any failure
//! aborts the whole resolution; there is no partial tree.

pub mod page;

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;

use crate::downloader::DriveDownloader;
use crate::error::{ResolveError, Result};
use crate::types::{Event, RemoteId, RemoteNode};
use crate::utils::{last_path_segment, with_proxy};
use page::{ChildRecord, parse_folder_page};
use tracing::{debug, info, warn};

pub use page::{FolderPage, PAYLOAD_MARKER};

/// A folder whose page has been parsed but whose children are not all placed yet
struct PendingFolder {
    node: RemoteNode,
    remaining: std::vec::IntoIter<ChildRecord>,
}

impl DriveDownloader {
    /// Resolve the folder at `folder_url` into a tree of [`RemoteNode`]s
    ///
    /// The proxy prefix, the child-count warning threshold, the depth guard and
    /// quiet mode all come from the downloader's configuration.
    ///
    /// # Errors
    ///
    /// - [`Error::Network`](crate::Error::Network) if a page fetch fails
    /// - [`ResolveError::DataNotFound`] if a page has no embedded listing
    /// - [`ResolveError::TitleParse`] if a page title is not "<name> - <service>"
    /// - [`ResolveError::DepthExceeded`] if nesting exceeds `resolver.max_depth`
    pub async fn resolve_folder(&self, folder_url: &str) -> Result<RemoteNode> {
        info!(url = %folder_url, "resolving folder tree");
        let root = self.open_folder(folder_url, None).await?;
        let mut stack = vec![root];

        loop {
            let depth = stack.len();
            let Some(current) = stack.last_mut() else {
                return Err(crate::Error::Other("folder stack unexpectedly empty".to_string()));
            };

            let Some(child) = current.remaining.next() else {
                let Some(done) = stack.pop() else {
                    return Err(crate::Error::Other("folder stack unexpectedly empty".to_string()));
                };
                self.check_child_limit(&done.node);
                match stack.last_mut() {
                    Some(parent) => parent.node.children.push(done.node),
                    None => {
                        info!(
                            folder_id = %done.node.id,
                            name = %done.node.name,
                            files = done.node.file_count(),
                            "folder tree resolved"
                        );
                        return Ok(done.node);
                    }
                }
                continue;
            };

            if !child.is_folder() {
                self.emit_progress(Event::FileDiscovered {
                    id: child.id.clone(),
                    name: child.name.clone(),
                });
                current
                    .node
                    .children
                    .push(RemoteNode::file(child.id, child.name, child.mime_type));
                continue;
            }

            self.emit_progress(Event::FolderDiscovered {
                id: child.id.clone(),
                name: child.name.clone(),
            });
            if depth > self.config.resolver.max_depth {
                return Err(ResolveError::DepthExceeded {
                    folder_id: child.id.to_string(),
                    max_depth: self.config.resolver.max_depth,
                }
                .into());
            }

            let url = format!("{}{}", self.config.resolver.folder_url_base, child.id);
            stack.push(self.open_folder(&url, Some(child.id)).await?);
        }
    }

    /// Fetch and parse one folder page
    ///
    /// The root folder's id is taken from the canonical URL; subfolders keep
    /// the id they were listed with.
    async fn open_folder(&self, folder_url: &str, id: Option<RemoteId>) -> Result<PendingFolder> {
        let (canonical_url, html) = self.fetch_folder_page(folder_url).await?;
        let FolderPage { name, children } = parse_folder_page(&canonical_url, &html)?;

        let id = id.unwrap_or_else(|| RemoteId(last_path_segment(&canonical_url)));
        debug!(folder_id = %id, name = %name, children = children.len(), "parsed folder page");

        Ok(PendingFolder {
            node: RemoteNode::folder(id, name),
            remaining: children.into_iter(),
        })
    }

    /// GET a folder page through the proxy, returning (canonical URL, body)
    ///
    /// When redirects land somewhere other than the requested URL, the final
    /// location is fetched once more: the first answer after a redirect can be
    /// an interstitial rather than the listing.
    async fn fetch_folder_page(&self, folder_url: &str) -> Result<(String, String)> {
        let requested = with_proxy(&self.proxy_prefix, folder_url);
        let response = self.client.get(&requested).send().await?;
        debug!(url = %requested, status = %response.status(), "fetched folder page");

        let redirected = reqwest::Url::parse(&requested)
            .map(|url| url != *response.url())
            .unwrap_or(true);
        if !redirected {
            let body = response.text().await?;
            return Ok((requested, body));
        }

        let final_url = response.url().to_string();
        debug!(from = %requested, to = %final_url, "redirected, fetching final location again");
        let response = self.client.get(&final_url).send().await?;
        let canonical = response.url().to_string();
        let body = response.text().await?;
        Ok((canonical, body))
    }

    fn check_child_limit(&self, folder: &RemoteNode) {
        let resolver = &self.config.resolver;
        if !resolver.allow_unbounded_children && folder.children.len() == resolver.max_children {
            warn!(
                folder_id = %folder.id,
                name = %folder.name,
                count = folder.children.len(),
                "folder reached the maximum number of listed children; the listing may be truncated"
            );
            self.emit_event(Event::ChildLimitReached {
                folder_id: folder.id.clone(),
                count: folder.children.len(),
            });
        }
    }
}

impl ChildRecord {
    /// Whether the record describes a folder
    pub fn is_folder(&self) -> bool {
        self.mime_type == crate::config::FOLDER_MIME_TYPE
    }
}
