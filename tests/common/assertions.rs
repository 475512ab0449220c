//! Custom test assertions for integration tests

use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// All paths below `root`, relative and `/`-joined, directories suffixed with `/`
///
/// Sorted, so trees can be compared independently of filesystem order.
pub fn tree_listing(root: &Path) -> Vec<String> {
    let mut listing: Vec<String> = WalkDir::new(root)
        .min_depth(1)
        .into_iter()
        .map(|entry| entry.expect("walkdir entry"))
        .map(|entry| {
            let relative: PathBuf = entry
                .path()
                .strip_prefix(root)
                .expect("entry below root")
                .to_path_buf();
            let joined = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect::<Vec<_>>()
                .join("/");
            if entry.file_type().is_dir() {
                format!("{}/", joined)
            } else {
                joined
            }
        })
        .collect();
    listing.sort();
    listing
}

/// Assert that `path` exists and holds exactly `expected`
pub fn assert_file_content(path: &Path, expected: &[u8]) {
    let actual = std::fs::read(path)
        .unwrap_or_else(|e| panic!("expected file {} to exist: {}", path.display(), e));
    assert_eq!(actual, expected, "content mismatch for {}", path.display());
}
