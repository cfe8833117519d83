//! Filename globbing for unquoted `*` patterns.
//!
//! Only the last path segment is matched. `*` matches any run of characters except
//! the path separator, everything else matches itself. A pattern that names a missing
//! directory or matches nothing expands to itself.

use regex::Regex;
use std::fs;
use std::path::Path;

/// One character of a word being globbed; `Star` is a live wildcard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GlobChar {
    Char(char),
    Star,
}

/// The pattern as plain text, wildcards rendered as `*`.
pub fn pattern_text(pattern: &[GlobChar]) -> String {
    pattern
        .iter()
        .map(|c| match c {
            GlobChar::Char(c) => *c,
            GlobChar::Star => '*',
        })
        .collect()
}

/// Expand `pattern` against the directory tree rooted at `current_dir`.
///
/// Returns the sorted matches, each prefixed with the directory part of the pattern
/// exactly as written, or the pattern text itself when nothing matches.
pub fn expand(pattern: &[GlobChar], current_dir: &Path) -> Vec<String> {
    let literal = pattern_text(pattern);
    let split = pattern
        .iter()
        .rposition(|c| *c == GlobChar::Char('/'))
        .map_or(0, |i| i + 1);
    let (dir_part, name_part) = pattern.split_at(split);
    let prefix = pattern_text(dir_part);

    let Some(re) = segment_regex(name_part) else {
        return vec![literal];
    };

    let search_dir = if prefix.is_empty() {
        current_dir.to_path_buf()
    } else {
        current_dir.join(&prefix)
    };
    let entries = match fs::read_dir(&search_dir) {
        Ok(entries) => entries,
        Err(e) => {
            log::trace!("glob {}: cannot list {}: {}", literal, search_dir.display(), e);
            return vec![literal];
        }
    };

    let mut names: Vec<String> = entries
        .filter_map(|entry| entry.ok())
        .filter_map(|entry| entry.file_name().into_string().ok())
        .filter(|name| !name.starts_with('.') && re.is_match(name))
        .collect();
    names.sort();
    log::trace!("glob {} matched {} entries", literal, names.len());

    if names.is_empty() {
        vec![literal]
    } else {
        names.into_iter().map(|name| format!("{prefix}{name}")).collect()
    }
}

fn segment_regex(segment: &[GlobChar]) -> Option<Regex> {
    let mut source = String::from("^");
    for c in segment {
        match c {
            GlobChar::Star => source.push_str("[^/]*"),
            GlobChar::Char(c) => source.push_str(&regex::escape(c.encode_utf8(&mut [0; 4]))),
        }
    }
    source.push('$');
    Regex::new(&source).ok()
}
