//! Core types: document tree, icon references, download results and events

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// A node in the design document tree (document, page, frame, group or leaf)
///
/// Only the fields the export needs are decoded; everything else in the API
/// response is ignored.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentNode {
    /// Node ID (e.g. "12:34")
    pub id: String,
    /// Node name as shown in the layers panel
    #[serde(default)]
    pub name: String,
    /// Child nodes in layer order
    #[serde(default)]
    pub children: Vec<DocumentNode>,
}

impl DocumentNode {
    /// Create a leaf node
    pub fn leaf(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            children: Vec::new(),
        }
    }

    /// Create a container node
    pub fn container(
        id: impl Into<String>,
        name: impl Into<String>,
        children: Vec<DocumentNode>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            children,
        }
    }

    /// First direct child with exactly this name
    #[must_use]
    pub fn child(&self, name: &str) -> Option<&DocumentNode> {
        self.children.iter().find(|c| c.name == name)
    }
}

/// Response body of `GET /files/{fileId}`
#[derive(Clone, Debug, Deserialize)]
pub struct FileResponse {
    /// Root document node; its children are the pages
    pub document: DocumentNode,
}

/// Response body of `GET /images/{fileId}`
#[derive(Clone, Debug, Default, Deserialize)]
pub struct ImagesResponse {
    /// Error message, set when rendering failed
    #[serde(default)]
    pub err: Option<String>,
    /// Node ID to rendered image URL; `null` when a node could not be rendered
    #[serde(default)]
    pub images: std::collections::HashMap<String, Option<String>>,
}

/// An icon selected for export
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IconRef {
    /// Node ID
    pub id: String,
    /// Slash-delimited name, usually `Group/Style/Name`
    pub name: String,
    /// Rendered image URL, set by the image resolver
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl IconRef {
    /// Create an icon reference without a resolved image
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            image: None,
        }
    }
}

impl From<&DocumentNode> for IconRef {
    fn from(node: &DocumentNode) -> Self {
        Self::new(node.id.clone(), node.name.clone())
    }
}

/// A file written by the download engine
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadResult {
    /// Export name with the format appended (`Group/Style/plus.svg`)
    pub name: String,
    /// Size in bytes, read back from disk
    pub size: u64,
}

/// Image format requested from the render endpoint
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    /// Scalable vector graphics
    #[default]
    Svg,
    /// Portable network graphics
    Png,
    /// JPEG
    Jpg,
    /// PDF
    Pdf,
}

impl ImageFormat {
    /// File extension and API query value
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ImageFormat::Svg => "svg",
            ImageFormat::Png => "png",
            ImageFormat::Jpg => "jpg",
            ImageFormat::Pdf => "pdf",
        }
    }
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ImageFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "svg" => Ok(ImageFormat::Svg),
            "png" => Ok(ImageFormat::Png),
            "jpg" | "jpeg" => Ok(ImageFormat::Jpg),
            "pdf" => Ok(ImageFormat::Pdf),
            other => Err(format!("unsupported image format '{other}'")),
        }
    }
}

/// Event emitted during an export run
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// Document tree fetched from the API
    DocumentFetched {
        /// Time spent fetching, in milliseconds
        elapsed_ms: u64,
    },

    /// A colliding icon name was renamed
    DuplicateName {
        /// The name that appeared more than once
        name: String,
    },

    /// Icons extracted from the selected pages and frames
    IconsExtracted {
        /// Number of icons
        count: usize,
    },

    /// Image URLs resolved
    UrlsResolved {
        /// Number of icons the API returned
        count: usize,
    },

    /// Stale output removed
    OutputCleared {
        /// Directory that was cleared
        path: PathBuf,
    },

    /// One icon written to disk
    IconDownloaded {
        /// Export name with format suffix
        name: String,
        /// Bytes on disk
        size: u64,
    },

    /// One icon failed to download (the run will stop)
    DownloadFailed {
        /// Icon name
        name: String,
        /// Error message
        error: String,
    },

    /// Manifest written
    ManifestWritten {
        /// Path of `icons.json`
        path: PathBuf,
    },

    /// Manifest could not be written (the run still succeeds)
    ManifestFailed {
        /// Error message
        error: String,
    },

    /// All downloads finished
    Finished {
        /// Number of files written
        count: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_node_tolerates_missing_children_and_extra_fields() {
        let json = r#"{
            "id": "0:0",
            "name": "Document",
            "type": "DOCUMENT",
            "children": [
                { "id": "1:0", "name": "Icons", "type": "CANVAS",
                  "children": [ { "id": "1:1", "name": "Nav/Line/home", "type": "COMPONENT" } ] }
            ]
        }"#;
        let node: DocumentNode = serde_json::from_str(json).unwrap();
        assert_eq!(node.children.len(), 1);
        let page = node.child("Icons").unwrap();
        assert_eq!(page.children[0].name, "Nav/Line/home");
        assert!(page.children[0].children.is_empty());
    }

    #[test]
    fn images_response_accepts_null_urls() {
        let json = r#"{ "err": null, "images": { "1:1": "https://cdn/a.svg", "1:2": null } }"#;
        let resp: ImagesResponse = serde_json::from_str(json).unwrap();
        assert_eq!(
            resp.images.get("1:1").cloned().flatten().as_deref(),
            Some("https://cdn/a.svg")
        );
        assert_eq!(resp.images.get("1:2"), Some(&None));
        assert!(resp.err.is_none());
    }

    #[test]
    fn image_format_parses_case_insensitively() {
        assert_eq!("SVG".parse::<ImageFormat>().unwrap(), ImageFormat::Svg);
        assert_eq!("jpeg".parse::<ImageFormat>().unwrap(), ImageFormat::Jpg);
        assert!("gif".parse::<ImageFormat>().is_err());
        assert_eq!(ImageFormat::default().to_string(), "svg");
    }

    #[test]
    fn event_serializes_with_type_tag() {
        let event = Event::IconDownloaded {
            name: "a/b/c.svg".into(),
            size: 42,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "icon_downloaded");
        assert_eq!(json["size"], 42);
    }
}
