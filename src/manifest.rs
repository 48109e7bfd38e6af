//! Grouped manifest of exported icons (`icons.json`)
//!
//! ```json
//! {"Arrows":{"Line":["left","right"]},"Nav":{"Solid":["home"]}}
//! ```
//!
//! Groups are sorted by name. Styles and icons keep the order the downloads were
//! processed in.

use crate::error::Result;
use crate::types::{DownloadResult, ImageFormat};
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::debug;

/// File name of the manifest inside `metaPath`
pub const MANIFEST_FILE_NAME: &str = "icons.json";

/// `group → style → icons`
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Manifest {
    groups: BTreeMap<String, StyleMap>,
}

/// Styles of one group, in insertion order
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StyleMap {
    entries: Vec<(String, Vec<String>)>,
}

impl StyleMap {
    fn push(&mut self, style: &str, icon: String) {
        match self.entries.iter_mut().find(|(name, _)| name == style) {
            Some((_, icons)) => icons.push(icon),
            None => self.entries.push((style.to_string(), vec![icon])),
        }
    }

    /// Icons of `style`, if any were added
    #[must_use]
    pub fn get(&self, style: &str) -> Option<&[String]> {
        self.entries
            .iter()
            .find(|(name, _)| name == style)
            .map(|(_, icons)| icons.as_slice())
    }

    /// Style names in insertion order
    pub fn styles(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }
}

impl Serialize for StyleMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (style, icons) in &self.entries {
            map.serialize_entry(style, icons)?;
        }
        map.end()
    }
}

impl Serialize for Manifest {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.groups.serialize(serializer)
    }
}

impl Manifest {
    /// Build the manifest from download results
    ///
    /// Only names of the form `group/style/icon` are included; anything else was
    /// downloaded but is left out here. The icon part loses its `.<format>` suffix,
    /// spaces become `-` and it is lowercased.
    #[must_use]
    pub fn build(results: &[DownloadResult], format: ImageFormat) -> Self {
        let suffix = format!(".{format}");
        let mut manifest = Manifest::default();

        for result in results {
            let segments: Vec<&str> = result.name.split('/').collect();
            let [group, style, icon] = segments.as_slice() else {
                debug!(icon = %result.name, "not a group/style/icon name, left out of manifest");
                continue;
            };
            let icon = icon.strip_suffix(suffix.as_str()).unwrap_or(*icon);
            let icon = icon.trim().replace([' ', '\\'], "-").to_lowercase();

            manifest
                .groups
                .entry((*group).to_string())
                .or_default()
                .push(style, icon);
        }

        manifest
    }

    /// Styles of `group`
    #[must_use]
    pub fn group(&self, group: &str) -> Option<&StyleMap> {
        self.groups.get(group)
    }

    /// Group names, sorted
    pub fn groups(&self) -> impl Iterator<Item = &str> {
        self.groups.keys().map(String::as_str)
    }

    /// Whether no result made it into the manifest
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Compact JSON document
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Write the manifest to `path`, creating its directory if needed
    pub async fn write(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(path, self.to_json()?).await?;
        debug!(?path, groups = self.groups.len(), "wrote manifest");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(name: &str) -> DownloadResult {
        DownloadResult {
            name: name.to_string(),
            size: 1,
        }
    }

    #[test]
    fn three_segment_names_are_grouped() {
        let manifest = Manifest::build(&[result("a/b/c.svg")], ImageFormat::Svg);
        assert_eq!(manifest.group("a").unwrap().get("b").unwrap(), ["c"]);
    }

    #[test]
    fn other_segment_counts_are_left_out() {
        let manifest = Manifest::build(
            &[result("a/c.svg"), result("plain.svg"), result("a/b/c/d.svg")],
            ImageFormat::Svg,
        );
        assert!(manifest.is_empty());
    }

    #[test]
    fn groups_are_sorted_and_styles_keep_insertion_order() {
        let manifest = Manifest::build(
            &[
                result("zeta/Solid/one.svg"),
                result("alpha/Solid/two.svg"),
                result("alpha/Line/three.svg"),
                result("alpha/Solid/four.svg"),
            ],
            ImageFormat::Svg,
        );
        assert_eq!(
            manifest.to_json().unwrap(),
            r#"{"alpha":{"Solid":["two","four"],"Line":["three"]},"zeta":{"Solid":["one"]}}"#
        );
        let styles: Vec<_> = manifest.group("alpha").unwrap().styles().collect();
        assert_eq!(styles, ["Solid", "Line"]);
    }

    #[test]
    fn icon_names_are_normalized() {
        let manifest = Manifest::build(
            &[
                result("Nav/Line/Home Icon.svg"),
                result("Nav/Line/plus-duplicate-name.svg"),
            ],
            ImageFormat::Svg,
        );
        assert_eq!(
            manifest.group("Nav").unwrap().get("Line").unwrap(),
            ["home-icon", "plus-duplicate-name"]
        );
    }

    #[test]
    fn only_the_requested_format_suffix_is_stripped() {
        let manifest = Manifest::build(&[result("G/S/logo.svg.png")], ImageFormat::Png);
        assert_eq!(manifest.group("G").unwrap().get("S").unwrap(), ["logo.svg"]);
    }

    #[tokio::test]
    async fn write_creates_directory_and_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("meta").join(MANIFEST_FILE_NAME);
        let manifest = Manifest::build(&[result("g/s/i.svg")], ImageFormat::Svg);

        manifest.write(&path).await.unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(written, r#"{"g":{"s":["i"]}}"#);
    }
}
