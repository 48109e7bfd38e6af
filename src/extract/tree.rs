//! Path navigation in the document tree

use crate::types::DocumentNode;

/// Walk `path` down from `root`, one child name per segment
///
/// Stops at the deepest node reached: if a segment has no matching child the node
/// found so far is returned unchanged. Callers must check that the node they want
/// actually exists below the result.
#[must_use]
pub fn resolve_path<'a, S: AsRef<str>>(root: &'a DocumentNode, path: &[S]) -> &'a DocumentNode {
    let Some((first, rest)) = path.split_first() else {
        return root;
    };
    match root.child(first.as_ref()) {
        Some(child) => resolve_path(child, rest),
        None => root,
    }
}
