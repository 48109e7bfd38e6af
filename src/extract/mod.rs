//! Icon selection from a fetched document
//!
//! - [`tree`] - path navigation through nested frames and groups
//! - [`dedup`] - renaming of colliding icon names

pub mod dedup;
pub mod tree;

pub use dedup::{DUPLICATE_SUFFIX, dedupe_by_key};
pub use tree::resolve_path;

use crate::config::{ExportSelector, PageSelector};
use crate::error::{Error, Result};
use crate::types::{DocumentNode, IconRef};
use tracing::debug;

/// Icons selected for export plus the names that had to be renamed
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ExtractedIcons {
    /// Icons in selector order, then layer order
    pub icons: Vec<IconRef>,
    /// Original names that collided within their page
    pub duplicates: Vec<String>,
}

/// Collect the icons of every selected page
///
/// Pages are processed in selector order and their icons concatenated. Names are
/// deduplicated per page, so the same name on two different pages is kept as is.
///
/// # Errors
///
/// Returns `Error::PageNotFound` or `Error::FrameNotFound` for the first selector
/// that does not match the document; no icons are returned in that case.
pub fn extract_icons(document: &DocumentNode, selector: &ExportSelector) -> Result<ExtractedIcons> {
    let mut extracted = ExtractedIcons::default();

    for page in selector.pages() {
        let mut icons = page_icons(document, page)?;
        let duplicates = dedupe_by_key(&mut icons, |icon| &mut icon.name);
        debug!(
            page = %page.name,
            icons = icons.len(),
            duplicates = duplicates.len(),
            "extracted page icons"
        );
        extracted.icons.append(&mut icons);
        extracted.duplicates.extend(duplicates);
    }

    Ok(extracted)
}

/// Candidate icons of a single page, before deduplication
fn page_icons(document: &DocumentNode, selector: &PageSelector) -> Result<Vec<IconRef>> {
    let page = document
        .child(&selector.name)
        .ok_or_else(|| Error::PageNotFound {
            page: selector.name.clone(),
        })?;

    let frame_path = selector.frame.as_ref().and_then(|f| f.path());
    let candidates = match frame_path {
        None => &page.children,
        Some(path) => &find_frame(page, path)?.children,
    };

    Ok(candidates.iter().map(IconRef::from).collect())
}

/// Locate the frame named by the last segment of `path`, below the node the
/// remaining segments resolve to
fn find_frame<'a>(page: &'a DocumentNode, path: &str) -> Result<&'a DocumentNode> {
    let mut segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    let not_found = |frame: &str| Error::FrameNotFound {
        frame: frame.to_string(),
        page: page.name.clone(),
    };

    let frame_name = segments.pop().ok_or_else(|| not_found(path))?;
    let parent = resolve_path(page, &segments);
    parent.child(frame_name).ok_or_else(|| not_found(frame_name))
}
