//! Conflict-marker normalization.
//!
//! External merge tools emit their own conflict delimiters, sometimes of
//! a non-standard width (dpkg-mergechangelogs uses six characters where
//! git and friends use seven). Any line consisting solely of repeated
//! `<`, `=` or `>` is rewritten to the configured width so merged output
//! looks the same no matter which tool produced it. Marker lines are
//! never valid content in the formats we merge, so a false positive at
//! worst standardizes a marker that was already in the file.

use regex_lite::Regex;

/// A bare conflict-delimiter line: three or more repetitions of a single
/// marker character and nothing else.
const MARKER_PATTERN: &str = r"^(?:<{3,}|={3,}|>{3,})$";

/// Rewrite bare conflict-marker lines to exactly `conflictlen` repetitions
/// of the same character, preserving line endings.
pub fn normalize_conflict_markers(chunks: &[String], conflictlen: usize) -> Vec<String> {
    let marker = Regex::new(MARKER_PATTERN).expect("marker pattern is valid");

    chunks
        .iter()
        .map(|chunk| {
            let content = chunk.trim_end_matches('\n');
            if marker.is_match(content) {
                let ending = &chunk[content.len()..];
                let ch = content.chars().next().unwrap_or('=');
                format!("{}{}", ch.to_string().repeat(conflictlen), ending)
            } else {
                chunk.clone()
            }
        })
        .collect()
}
