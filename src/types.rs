//! Core types for gdrive-dl

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::config::FOLDER_MIME_TYPE;
use crate::error::{Error, Result};

/// Opaque identifier the remote service assigns to a file or folder
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RemoteId(pub String);

impl RemoteId {
    /// Create a new RemoteId
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the inner string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for RemoteId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for RemoteId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl PartialEq<&str> for RemoteId {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

impl std::fmt::Display for RemoteId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// One file or folder in the remote hierarchy
///
/// Folders own their children in the order the service listed them. Leaf
/// files always have an empty `children` list.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteNode {
    /// Remote identifier
    pub id: RemoteId,
    /// Display name as reported by the service (not yet sanitized)
    pub name: String,
    /// MIME type reported by the service
    pub mime_type: String,
    /// Children in listing order (empty for files)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<RemoteNode>,
}

impl RemoteNode {
    /// Create an empty folder node
    pub fn folder(id: impl Into<RemoteId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            mime_type: FOLDER_MIME_TYPE.to_string(),
            children: Vec::new(),
        }
    }

    /// Create a leaf file node
    pub fn file(
        id: impl Into<RemoteId>,
        name: impl Into<String>,
        mime_type: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            mime_type: mime_type.into(),
            children: Vec::new(),
        }
    }

    /// Attach a child and return self (builder style, mostly for tests)
    pub fn with_child(mut self, child: RemoteNode) -> Self {
        self.children.push(child);
        self
    }

    /// Whether the service reports this node as a folder
    pub fn is_folder(&self) -> bool {
        self.mime_type == FOLDER_MIME_TYPE
    }

    /// Number of leaf files anywhere below this node
    pub fn file_count(&self) -> usize {
        self.children
            .iter()
            .map(|c| if c.is_folder() { c.file_count() } else { 1 })
            .sum()
    }
}

/// One step of a flattened tree, in creation order
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathEntry {
    /// Remote id for files, None for folder markers
    pub remote_id: Option<RemoteId>,
    /// Sanitized name segments below the output root
    pub relative_path: Vec<String>,
}

impl PathEntry {
    /// Folder marker entry
    pub fn folder(relative_path: Vec<String>) -> Self {
        Self {
            remote_id: None,
            relative_path,
        }
    }

    /// File entry
    pub fn file(remote_id: RemoteId, relative_path: Vec<String>) -> Self {
        Self {
            remote_id: Some(remote_id),
            relative_path,
        }
    }

    /// Whether this entry is a folder marker
    pub fn is_folder(&self) -> bool {
        self.remote_id.is_none()
    }

    /// Relative path as a platform path
    pub fn path(&self) -> PathBuf {
        self.relative_path.iter().collect()
    }

    /// Relative path joined with `/`, independent of platform
    pub fn display_path(&self) -> String {
        self.relative_path.join("/")
    }
}

/// Which folder to download: exactly one of a URL or a bare id
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FolderTarget {
    /// Full folder URL (`.../drive/folders/<id>`)
    Url(String),
    /// Bare folder id
    Id(RemoteId),
}

impl FolderTarget {
    /// Build a target from optional parts, requiring exactly one of them
    pub fn from_parts(url: Option<String>, id: Option<String>) -> Result<Self> {
        match (url, id) {
            (Some(url), None) => Ok(FolderTarget::Url(url)),
            (None, Some(id)) => Ok(FolderTarget::Id(RemoteId(id))),
            (Some(_), Some(_)) => Err(Error::InvalidInput(
                "specify either a folder URL or a folder id, not both".to_string(),
            )),
            (None, None) => Err(Error::InvalidInput(
                "a folder URL or a folder id is required".to_string(),
            )),
        }
    }

    /// Folder URL for this target, building it from `folder_url_base` for ids
    pub fn to_url(&self, folder_url_base: &str) -> String {
        match self {
            FolderTarget::Url(url) => url.clone(),
            FolderTarget::Id(id) => format!("{}{}", folder_url_base, id),
        }
    }
}

/// A classified user-supplied link
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Link {
    /// Single file (`/file/d/<id>/...`)
    File(RemoteId),
    /// Folder, by URL or bare id
    Folder(FolderTarget),
}

/// Event emitted while resolving and downloading
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// A folder was found in a listing and is about to be resolved
    FolderDiscovered {
        /// Folder id
        id: RemoteId,
        /// Folder name as listed
        name: String,
    },

    /// A file was found in a listing
    FileDiscovered {
        /// File id
        id: RemoteId,
        /// File name as listed
        name: String,
    },

    /// A folder has exactly the configured maximum number of children
    ChildLimitReached {
        /// Folder id
        folder_id: RemoteId,
        /// Number of children listed
        count: usize,
    },

    /// The flattened tree, published before any file is downloaded
    Listing {
        /// Entries in creation order
        entries: Vec<PathEntry>,
    },

    /// A file download started
    DownloadStarted {
        /// File id
        id: RemoteId,
        /// Local destination
        path: PathBuf,
    },

    /// A file was written to disk
    DownloadCompleted {
        /// File id
        id: RemoteId,
        /// Local destination
        path: PathBuf,
        /// Bytes written
        bytes: u64,
    },

    /// A file could not be downloaded (the run continues)
    DownloadFailed {
        /// File id
        id: RemoteId,
        /// Local destination
        path: PathBuf,
        /// Error message
        error: String,
    },

    /// The download pass is over
    Finished {
        /// Files written successfully
        downloaded: usize,
        /// Files attempted
        total: usize,
    },
}
