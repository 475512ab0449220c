//! Turning a resolved tree into an ordered list of local paths.

use crate::types::{PathEntry, RemoteNode};
use crate::utils::sanitize_name;

/// Flatten a resolved folder into path entries below the output root
///
/// The root itself is not listed; its contents map directly onto the output
/// directory. Entries come in pre-order: a folder's marker precedes everything
/// inside it, and siblings keep their listing order. Creating directories and
/// writing files in this order therefore never touches a path whose parent
/// does not exist yet.
///
/// Every name segment is passed through [`sanitize_name`].
///
/// # Examples
///
/// ```
/// use gdrive_dl::flatten::flatten;
/// use gdrive_dl::types::RemoteNode;
///
/// let root = RemoteNode::folder("root", "Root")
///     .with_child(RemoteNode::folder("a", "A").with_child(RemoteNode::file("x", "x.txt", "text/plain")))
///     .with_child(RemoteNode::file("y", "y.txt", "text/plain"));
///
/// let paths: Vec<String> = flatten(&root).iter().map(|e| e.display_path()).collect();
/// assert_eq!(paths, ["A", "A/x.txt", "y.txt"]);
/// ```
#[must_use]
pub fn flatten(root: &RemoteNode) -> Vec<PathEntry> {
    let mut entries = Vec::new();
    let mut prefix = Vec::new();
    flatten_into(root, &mut prefix, &mut entries);
    entries
}

// Recursion depth is bounded by the resolver's depth guard.
fn flatten_into(folder: &RemoteNode, prefix: &mut Vec<String>, out: &mut Vec<PathEntry>) {
    for child in &folder.children {
        prefix.push(sanitize_name(&child.name));
        if child.is_folder() {
            out.push(PathEntry::folder(prefix.clone()));
            flatten_into(child, prefix, out);
        } else {
            out.push(PathEntry::file(child.id.clone(), prefix.clone()));
        }
        prefix.pop();
    }
}
