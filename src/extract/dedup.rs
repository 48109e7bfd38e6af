//! Renaming of colliding icon names

use std::collections::HashSet;
use tracing::warn;

/// Suffix appended to every repeated name
pub const DUPLICATE_SUFFIX: &str = "-duplicate-name";

/// Rename every repeated key after its first occurrence
///
/// Length and order of `items` are preserved. A key is a duplicate when it equals a
/// key already emitted (including renamed ones), so a third `plus` becomes
/// `plus-duplicate-name` again rather than getting a second suffix.
///
/// Returns the original keys that collided, one entry per renamed item.
pub fn dedupe_by_key<T, F>(items: &mut [T], mut key: F) -> Vec<String>
where
    F: FnMut(&mut T) -> &mut String,
{
    let mut seen: HashSet<String> = HashSet::with_capacity(items.len());
    let mut duplicates = Vec::new();

    for item in items.iter_mut() {
        let name = key(item);
        if seen.contains(name.as_str()) {
            warn!(name = %name, "duplicate icon name, please fix the design file");
            duplicates.push(name.clone());
            name.push_str(DUPLICATE_SUFFIX);
        }
        seen.insert(name.clone());
    }

    duplicates
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::IconRef;

    fn names(icons: &[IconRef]) -> Vec<&str> {
        icons.iter().map(|i| i.name.as_str()).collect()
    }

    #[test]
    fn unique_names_are_untouched() {
        let mut icons = vec![IconRef::new("1", "a/b/c"), IconRef::new("2", "a/b/d")];
        let dups = dedupe_by_key(&mut icons, |i| &mut i.name);
        assert!(dups.is_empty());
        assert_eq!(names(&icons), ["a/b/c", "a/b/d"]);
    }

    #[test]
    fn all_but_first_occurrence_get_suffix() {
        let mut icons = vec![
            IconRef::new("1", "plus"),
            IconRef::new("2", "minus"),
            IconRef::new("3", "plus"),
            IconRef::new("4", "plus"),
        ];
        let dups = dedupe_by_key(&mut icons, |i| &mut i.name);

        assert_eq!(dups, ["plus", "plus"]);
        assert_eq!(
            names(&icons),
            ["plus", "minus", "plus-duplicate-name", "plus-duplicate-name"]
        );
        // ids keep their positions
        let ids: Vec<_> = icons.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, ["1", "2", "3", "4"]);
    }

    #[test]
    fn renamed_value_collides_with_later_literal() {
        let mut icons = vec![
            IconRef::new("1", "x"),
            IconRef::new("2", "x"),
            IconRef::new("3", "x-duplicate-name"),
        ];
        dedupe_by_key(&mut icons, |i| &mut i.name);
        assert_eq!(
            names(&icons),
            ["x", "x-duplicate-name", "x-duplicate-name-duplicate-name"]
        );
    }

    #[test]
    fn empty_input() {
        let mut icons: Vec<IconRef> = Vec::new();
        assert!(dedupe_by_key(&mut icons, |i| &mut i.name).is_empty());
    }
}
