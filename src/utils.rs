//! Utility functions for link parsing, proxy handling and path manipulation

use crate::error::{Error, Result};
use crate::types::{FolderTarget, Link, RemoteId};
use regex::Regex;
use std::path::{MAIN_SEPARATOR, Path, PathBuf};
use std::sync::LazyLock;

/// Path segment that marks a single-file link
const FILE_LINK_MARKER: &str = "/file/d/";
/// Path segment that marks a folder link
const FOLDER_LINK_MARKER: &str = "/drive/folders/";

// Literal patterns; compilation cannot fail.
#[allow(clippy::expect_used)]
static FILE_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/file/d/([^/?#]+)").expect("valid file id pattern"));
#[allow(clippy::expect_used)]
static BARE_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]{10,}$").expect("valid bare id pattern"));

/// Replace path separators in a remote name so it stays a single path segment
///
/// Both `/` and the platform separator are replaced, so a remote name can
/// never create nested directories. The special segments `.` and `..` become
/// `_` and `__`, and an empty name becomes `_`, so no name can resolve to the
/// parent directory or the directory itself. Applying it twice gives the same
/// result as applying it once.
///
/// # Examples
///
/// ```
/// use gdrive_dl::utils::sanitize_name;
///
/// assert_eq!(sanitize_name("a/b.txt"), "a_b.txt");
/// assert_eq!(sanitize_name(&sanitize_name("a/b.txt")), "a_b.txt");
/// assert_eq!(sanitize_name(".."), "__");
/// ```
#[must_use]
pub fn sanitize_name(name: &str) -> String {
    match name {
        "" | "." => "_".to_string(),
        ".." => "__".to_string(),
        _ => name
            .chars()
            .map(|c| if c == '/' || c == MAIN_SEPARATOR { '_' } else { c })
            .collect(),
    }
}

/// Normalize a proxy prefix: trimmed, with a trailing `/` unless empty
///
/// # Examples
///
/// ```
/// use gdrive_dl::utils::normalize_proxy;
///
/// assert_eq!(normalize_proxy("https://relay.example.com"), "https://relay.example.com/");
/// assert_eq!(normalize_proxy("  "), "");
/// ```
#[must_use]
pub fn normalize_proxy(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed.ends_with('/') {
        trimmed.to_string()
    } else {
        format!("{}/", trimmed)
    }
}

/// Prepend a (normalized) proxy prefix to a target URL
#[must_use]
pub fn with_proxy(prefix: &str, url: &str) -> String {
    format!("{}{}", prefix, url)
}

/// Classify a user-supplied link or id
///
/// Recognizes `/file/d/<id>` links, `/drive/folders/<id>` links and bare ids
/// (treated as folder ids).
///
/// # Errors
///
/// Returns [`Error::InvalidInput`] for anything else.
pub fn parse_link(input: &str) -> Result<Link> {
    let input = input.trim();
    if input.contains(FILE_LINK_MARKER) {
        let id = FILE_ID_RE
            .captures(input)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().to_string())
            .ok_or_else(|| Error::InvalidInput(format!("no file id in link '{}'", input)))?;
        return Ok(Link::File(RemoteId(id)));
    }
    if input.contains(FOLDER_LINK_MARKER) {
        return Ok(Link::Folder(FolderTarget::Url(input.to_string())));
    }
    if BARE_ID_RE.is_match(input) {
        return Ok(Link::Folder(FolderTarget::Id(RemoteId(input.to_string()))));
    }
    Err(Error::InvalidInput(format!(
        "'{}' is neither a Google Drive file link, a folder link nor an id",
        input
    )))
}

/// Last non-empty path segment of a URL, without query or fragment
///
/// Used to recover the folder id from the canonical URL of a folder page.
#[must_use]
pub fn last_path_segment(url: &str) -> String {
    if let Ok(parsed) = url::Url::parse(url)
        && let Some(segment) = parsed
            .path_segments()
            .and_then(|mut segments| segments.rfind(|s| !s.is_empty()))
    {
        return segment.to_string();
    }
    url.split(['?', '#'])
        .next()
        .unwrap_or("")
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or("")
        .to_string()
}

/// Pick the local directory a folder download writes into
///
/// - No output given: the current working directory
/// - Output ending with a path separator: the folder's sanitized name is appended
/// - Otherwise: the output as given
pub fn resolve_output_dir(output: Option<&Path>, folder_name: &str) -> Result<PathBuf> {
    match output {
        None => Ok(std::env::current_dir()?),
        Some(dir) => {
            let raw = dir.as_os_str().to_string_lossy();
            if raw.ends_with('/') || raw.ends_with(MAIN_SEPARATOR) {
                Ok(dir.join(sanitize_name(folder_name)))
            } else {
                Ok(dir.to_path_buf())
            }
        }
    }
}

/// Extract the filename from an HTTP response's Content-Disposition header
///
/// Handles both `filename="..."` and RFC 5987 `filename*=charset'lang'value`.
/// The extended form wins when both are present. The result is sanitized.
///
/// # Examples
///
/// ```ignore
/// let response = client.get(url).send().await?;
/// let name = extract_filename_from_response(&response);
/// // Some("report.pdf")
/// ```
pub fn extract_filename_from_response(response: &reqwest::Response) -> Option<String> {
    let value = response.headers().get("content-disposition")?.to_str().ok()?;
    filename_from_content_disposition(value)
}

/// Parse a Content-Disposition header value (see [`extract_filename_from_response`])
pub fn filename_from_content_disposition(value: &str) -> Option<String> {
    let mut plain = None;
    for part in value.split(';') {
        let part = part.trim();
        if let Some(encoded) = part.strip_prefix("filename*=") {
            // Format is: charset'lang'encoded-filename
            if let Some(idx) = encoded.rfind('\'')
                && let Ok(decoded) = urlencoding::decode(&encoded[idx + 1..])
                && !decoded.is_empty()
            {
                return Some(sanitize_name(&decoded));
            }
        } else if let Some(name) = part.strip_prefix("filename=") {
            let name = name.trim_matches('"');
            if !name.is_empty() {
                plain = Some(sanitize_name(name));
            }
        }
    }
    plain
}
