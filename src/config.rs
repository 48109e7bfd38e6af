//! Configuration types for figma-icon-export
//!
//! The configuration is read once from a JSON file (camelCase keys, compatible with
//! the `icons-config.json` files written by earlier tooling), optionally overridden
//! from the command line, validated, and then shared immutably with every stage of the
//! export through an `Arc`.

use crate::error::{Error, Result};
use crate::types::ImageFormat;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default config file name, looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "icons-config.json";

/// Default Figma REST API base URL
pub const DEFAULT_API_BASE_URL: &str = "https://api.figma.com/v1";

/// Main configuration for an export run
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Personal access token sent as `X-Figma-Token`
    #[serde(default)]
    pub figma_personal_token: Option<String>,

    /// Key of the design file (the part after `/file/` in its URL)
    #[serde(default)]
    pub file_id: String,

    /// Single page to export (used when `pages` is empty)
    #[serde(default)]
    pub page: Option<String>,

    /// Pages to export, in order; each may carry its own frame path
    #[serde(default)]
    pub pages: Vec<PageSelector>,

    /// Frame path applied to pages that do not set their own
    #[serde(default)]
    pub frame: Option<FrameSelector>,

    /// Directory icon files are written to
    #[serde(default)]
    pub icons_path: PathBuf,

    /// Directory `icons.json` is written to
    #[serde(default)]
    pub meta_path: PathBuf,

    /// Substring removed (first occurrence) from every icon name before saving
    #[serde(default)]
    pub remove_from_name: String,

    /// Render format for icon mode (default: svg)
    #[serde(default)]
    pub format: ImageFormat,

    /// API base URL (default: "https://api.figma.com/v1")
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Maximum concurrent downloads (None = every icon at once)
    #[serde(default)]
    pub max_concurrent_downloads: Option<usize>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            figma_personal_token: None,
            file_id: String::new(),
            page: None,
            pages: Vec::new(),
            frame: None,
            icons_path: PathBuf::new(),
            meta_path: PathBuf::new(),
            remove_from_name: String::new(),
            format: ImageFormat::default(),
            api_base_url: default_api_base_url(),
            max_concurrent_downloads: None,
        }
    }
}

fn default_api_base_url() -> String {
    DEFAULT_API_BASE_URL.to_string()
}

impl Config {
    /// Load configuration from a JSON file
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if the file is missing or is not valid JSON for this schema.
    pub async fn from_file(path: &Path) -> Result<Self> {
        let raw = tokio::fs::read_to_string(path).await.map_err(|e| Error::Config {
            message: format!("cannot read {}: {}", path.display(), e),
            key: None,
        })?;
        serde_json::from_str(&raw).map_err(|e| Error::Config {
            message: format!("invalid config file {}: {}", path.display(), e),
            key: None,
        })
    }

    /// Check that every setting the export needs is present
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` naming the first missing or invalid key.
    pub fn validate(&self) -> Result<()> {
        if self
            .figma_personal_token
            .as_deref()
            .is_none_or(|t| t.trim().is_empty())
        {
            return Err(Error::config(
                "figmaPersonalToken",
                "a personal access token is required (config file or FIGMA_TOKEN)",
            ));
        }
        if self.file_id.trim().is_empty() {
            return Err(Error::config("fileId", "fileId is required"));
        }
        if self.pages.is_empty() && self.page.as_deref().is_none_or(str::is_empty) {
            return Err(Error::config("page", "either page or pages must be set"));
        }
        if let Some(empty) = self.pages.iter().find(|p| p.name.is_empty()) {
            return Err(Error::config(
                "pages",
                format!("page entry with empty name (frame: {:?})", empty.frame),
            ));
        }
        if self.icons_path.as_os_str().is_empty() {
            return Err(Error::config("iconsPath", "iconsPath is required"));
        }
        if self.meta_path.as_os_str().is_empty() {
            return Err(Error::config("metaPath", "metaPath is required"));
        }
        if self.max_concurrent_downloads == Some(0) {
            return Err(Error::config(
                "maxConcurrentDownloads",
                "maxConcurrentDownloads must be at least 1",
            ));
        }
        url::Url::parse(&self.api_base_url)
            .map_err(|e| Error::config("apiBaseUrl", format!("invalid URL: {e}")))?;
        Ok(())
    }

    /// Pages to export, with the global frame applied where a page sets none
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if neither `page` nor `pages` is set.
    pub fn selector(&self) -> Result<ExportSelector> {
        if !self.pages.is_empty() {
            let pages = self
                .pages
                .iter()
                .map(|p| PageSelector {
                    name: p.name.clone(),
                    frame: p.frame.clone().or_else(|| self.frame.clone()),
                })
                .collect();
            return Ok(ExportSelector::Pages(pages));
        }
        match self.page.as_deref() {
            Some(name) if !name.is_empty() => Ok(ExportSelector::Page(PageSelector {
                name: name.to_string(),
                frame: self.frame.clone(),
            })),
            _ => Err(Error::config("page", "either page or pages must be set")),
        }
    }

    /// Path of the manifest file (`<metaPath>/icons.json`)
    #[must_use]
    pub fn manifest_path(&self) -> PathBuf {
        self.meta_path.join(crate::manifest::MANIFEST_FILE_NAME)
    }
}

/// Which pages (and frames) to export
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ExportSelector {
    /// A single page
    Page(PageSelector),
    /// Several pages, exported in this order
    Pages(Vec<PageSelector>),
}

impl ExportSelector {
    /// The selected pages in export order
    #[must_use]
    pub fn pages(&self) -> &[PageSelector] {
        match self {
            ExportSelector::Page(page) => std::slice::from_ref(page),
            ExportSelector::Pages(pages) => pages,
        }
    }
}

/// One page to export, optionally narrowed to a frame
///
/// Deserializes from either a bare page name (`"Icons"`) or an object
/// (`{ "name": "Icons", "frame": "Library/Outline" }`).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawPageSelector")]
pub struct PageSelector {
    /// Exact page name
    pub name: String,
    /// Optional frame path inside the page
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frame: Option<FrameSelector>,
}

impl PageSelector {
    /// Page without a frame filter
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            frame: None,
        }
    }

    /// Page narrowed to the given frame path
    pub fn with_frame(name: impl Into<String>, frame: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            frame: Some(FrameSelector(frame.into())),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawPageSelector {
    Name(String),
    Detailed {
        name: String,
        #[serde(default)]
        frame: Option<FrameSelector>,
    },
}

impl From<RawPageSelector> for PageSelector {
    fn from(raw: RawPageSelector) -> Self {
        match raw {
            RawPageSelector::Name(name) => PageSelector { name, frame: None },
            RawPageSelector::Detailed { name, frame } => PageSelector { name, frame },
        }
    }
}

/// Frame selector as written in the config
///
/// Older config files store `-1` (or another number) to mean "no frame"; numbers are
/// kept in their textual form so [`FrameSelector::path`] can apply that convention.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawFrameSelector", into = "String")]
pub struct FrameSelector(pub String);

#[derive(Deserialize)]
#[serde(untagged)]
enum RawFrameSelector {
    Int(i64),
    Float(f64),
    Text(String),
}

impl From<RawFrameSelector> for FrameSelector {
    fn from(raw: RawFrameSelector) -> Self {
        match raw {
            RawFrameSelector::Int(n) => FrameSelector(n.to_string()),
            RawFrameSelector::Float(n) => FrameSelector(n.to_string()),
            RawFrameSelector::Text(s) => FrameSelector(s),
        }
    }
}

impl From<FrameSelector> for String {
    fn from(frame: FrameSelector) -> Self {
        frame.0
    }
}

impl FrameSelector {
    /// The frame path, or `None` when the selector means "no frame filter"
    ///
    /// Numeric selectors and blank strings disable the filter; anything else is a
    /// slash-delimited path. "Numeric" follows JavaScript number syntax: `-1`, `3`,
    /// `2.5`, `1e3`, `.5`, `Infinity`, `-Infinity` and unsigned `0x`/`0o`/`0b`
    /// literals all count, while `inf`, `NaN` and `-0x10` are paths.
    #[must_use]
    pub fn path(&self) -> Option<&str> {
        if is_js_number(self.0.trim()) {
            return None;
        }
        Some(&self.0)
    }
}

fn is_js_number(text: &str) -> bool {
    if text.is_empty() {
        return true;
    }
    let unsigned = text.strip_prefix(['+', '-']).unwrap_or(text);
    if unsigned == "Infinity" {
        return true;
    }
    // radix literals take no sign
    if unsigned.len() == text.len() {
        for (prefix, radix) in [("0x", 16), ("0X", 16), ("0o", 8), ("0O", 8), ("0b", 2), ("0B", 2)] {
            if let Some(digits) = text.strip_prefix(prefix) {
                return !digits.is_empty() && digits.chars().all(|c| c.is_digit(radix));
            }
        }
    }
    // rules out Rust-only spellings such as "inf" and "nan"
    unsigned.starts_with(|c: char| c.is_ascii_digit() || c == '.') && text.parse::<f64>().is_ok()
}
