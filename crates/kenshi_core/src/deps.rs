//! Comma-joined dependency and reference lists.
//!
//! Mod filenames may themselves contain commas, so fragments are accumulated
//! until they form a complete `.mod`/`.base` filename.

use crate::types::{BASE_EXTENSION, MOD_EXTENSION};

/// Whether `name` ends in `.mod` or `.base` with a non-blank stem before it.
pub fn is_complete_mod_filename(name: &str) -> bool {
    let stem = name
        .strip_suffix(MOD_EXTENSION)
        .or_else(|| name.strip_suffix(BASE_EXTENSION));
    match stem {
        // Only the final path component counts as the stem.
        Some(stem) => {
            let file_stem = stem.rsplit(['/', '\\']).next().unwrap_or(stem);
            !file_stem.trim().is_empty()
        }
        None => false,
    }
}

/// Splits a stored list into entries. Blank fragments are skipped, an
/// unterminated trailing fragment is kept as its own entry, and duplicates
/// are dropped keeping the first occurrence.
pub fn split_mod_list(list: Option<&str>) -> Vec<String> {
    let Some(list) = list else {
        return Vec::new();
    };

    let mut entries: Vec<String> = Vec::new();
    let mut current = String::new();
    for fragment in list.split(',').map(str::trim).filter(|f| !f.is_empty()) {
        if !current.is_empty() {
            current.push(',');
        }
        current.push_str(fragment);
        if is_complete_mod_filename(&current) {
            entries.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        entries.push(current);
    }

    let mut unique: Vec<String> = Vec::with_capacity(entries.len());
    for entry in entries {
        if !unique.contains(&entry) {
            unique.push(entry);
        }
    }
    unique
}

/// Appends `mod_name` to the stored list unless it is already present.
/// Membership is case-sensitive. A blank name returns the list unchanged.
pub fn add_mod_to_list(list: Option<&str>, mod_name: &str) -> String {
    if mod_name.trim().is_empty() {
        return list.unwrap_or_default().to_string();
    }
    let mut entries = split_mod_list(list);
    if !entries.iter().any(|e| e == mod_name) {
        entries.push(mod_name.to_string());
    }
    entries.join(",")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn comma_inside_filename_is_rejoined() {
        assert_eq!(
            split_mod_list(Some("1-Foo.mod,2-Bar,Baz.mod")),
            vec!["1-Foo.mod", "2-Bar,Baz.mod"]
        );
    }

    #[test]
    fn bare_extension_is_not_complete() {
        assert!(!is_complete_mod_filename(".mod"));
        assert!(!is_complete_mod_filename(" .base"));
        assert!(is_complete_mod_filename("a.base"));
        assert_eq!(split_mod_list(Some("x, .mod")), vec!["x,.mod"]);
    }

    #[test]
    fn blank_and_duplicate_entries_are_dropped() {
        assert_eq!(
            split_mod_list(Some(" a.mod ,, a.mod,b.mod ")),
            vec!["a.mod", "b.mod"]
        );
        assert!(split_mod_list(Some("  ")).is_empty());
        assert!(split_mod_list(None).is_empty());
    }

    #[test]
    fn add_is_idempotent_and_case_sensitive() {
        let once = add_mod_to_list(Some("a.mod"), "b.mod");
        assert_eq!(once, "a.mod,b.mod");
        assert_eq!(add_mod_to_list(Some(&once), "b.mod"), once);
        assert_eq!(add_mod_to_list(Some(&once), "B.mod"), "a.mod,b.mod,B.mod");
        assert_eq!(add_mod_to_list(None, "   "), "");
    }
}
