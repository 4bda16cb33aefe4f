//! GNU-format ChangeLog merging.
//!
//! A ChangeLog is an ordered list of entries, newest first. Merging at
//! the entry level keeps whole records intact where a line merge would
//! interleave them:
//!
//! * new entries from the incoming side float to the top of the file
//! * additions, deletions and edits to older entries are preserved
//! * an edit at the top of the incoming side looks like an unrelated
//!   add + delete pair; [`guess_edits`] reclassifies the pair as a
//!   single edit when the old and new text are similar enough.
//!
//! If an edit targets an entry the local side has itself changed or
//! removed, the whole file is declined and merging falls back to the
//! next strategy.

use similar::TextDiff;
use tracing::debug;

use crate::errors::ResolveError;
use crate::merge::groups::{merge_groups, MergeGroup};
use crate::resolvers::{matches_any, MergeOutcome, Resolver};

/// Similarity above which an (added, deleted) pair counts as an edit.
const SIMILARITY_CUTOFF: f32 = 0.8;

// ---------------------------------------------------------------------------
// Entries
// ---------------------------------------------------------------------------

/// One changelog record: an entry-starting chunk plus its continuation
/// chunks. Compared by content only.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Entry {
    chunks: Vec<String>,
}

impl Entry {
    fn new(chunks: Vec<String>) -> Self {
        Self { chunks }
    }

    /// The chunks making up this entry.
    pub fn chunks(&self) -> &[String] {
        &self.chunks
    }

    /// The entry's full text, used for similarity scoring.
    pub fn text(&self) -> String {
        self.chunks.concat()
    }
}

/// Split chunks into changelog entries.
///
/// A chunk whose first character is not a space, tab or newline starts a
/// new entry; continuation and blank chunks belong to the entry above.
/// Leading continuation chunks before the first real entry open a
/// synthetic entry, so every chunk ends up in exactly one entry and
/// `entries_to_chunks(changelog_entries(chunks)) == chunks`.
pub fn changelog_entries(chunks: &[String]) -> Vec<Entry> {
    let mut entries: Vec<Vec<String>> = Vec::new();
    for chunk in chunks {
        let continuation = matches!(chunk.chars().next(), Some(' ') | Some('\t') | Some('\n') | None);
        if continuation {
            match entries.last_mut() {
                Some(entry) => entry.push(chunk.clone()),
                // Cope with leading blank lines.
                None => entries.push(vec![chunk.clone()]),
            }
        } else {
            entries.push(vec![chunk.clone()]);
        }
    }
    entries.into_iter().map(Entry::new).collect()
}

/// Flatten entries back into a chunk sequence.
pub fn entries_to_chunks(entries: &[Entry]) -> Vec<String> {
    entries
        .iter()
        .flat_map(|entry| entry.chunks.iter().cloned())
        .collect()
}

// ---------------------------------------------------------------------------
// Edit disambiguation
// ---------------------------------------------------------------------------

/// Character-level similarity ratio between two entries, in `[0, 1]`.
fn entry_similarity(a: &str, b: &str) -> f32 {
    TextDiff::from_chars(a, b).ratio()
}

/// Reclassify correlated (added, deleted) pairs as edits.
///
/// Greedily and repeatedly picks the remaining pair with the highest
/// similarity strictly above [`SIMILARITY_CUTOFF`], removes both sides
/// from further consideration, and records the pair as an edit
/// `(old, new)`. Intentionally greedy rather than globally optimal;
/// ties resolve to the first pair encountered. Unmatched entries stay
/// plain additions and deletions.
///
/// This does O(n^2) similarity calls per accepted edit, which is fine
/// for the handful of entries a changelog conflict spans.
fn guess_edits(
    mut added: Vec<Entry>,
    mut deleted: Vec<Entry>,
) -> (Vec<Entry>, Vec<Entry>, Vec<(Entry, Entry)>) {
    let mut added_text: Vec<String> = added.iter().map(Entry::text).collect();
    let mut deleted_text: Vec<String> = deleted.iter().map(Entry::text).collect();
    let mut edits = Vec::new();

    loop {
        let mut best: Option<(usize, usize)> = None;
        let mut best_score = SIMILARITY_CUTOFF;
        for (i, new_text) in added_text.iter().enumerate() {
            for (j, old_text) in deleted_text.iter().enumerate() {
                let score = entry_similarity(new_text, old_text);
                if score > best_score {
                    best = Some((i, j));
                    best_score = score;
                }
            }
        }

        match best {
            Some((i, j)) => {
                edits.push((deleted.remove(j), added.remove(i)));
                added_text.remove(i);
                deleted_text.remove(j);
            }
            None => break,
        }
    }

    (added, deleted, edits)
}

// ---------------------------------------------------------------------------
// Entry-level merge
// ---------------------------------------------------------------------------

/// Merge changelog entries given base, local and incoming versions.
///
/// Edit disambiguation only runs while `at_top` holds, i.e. for a
/// conflict in the very first group of the file; the flag clears after
/// the first group of any kind. Changes below the top are preserved
/// verbatim as additions and deletions.
pub fn merge_entries(
    base: &[Entry],
    this: &[Entry],
    other: &[Entry],
) -> Result<Vec<Entry>, ResolveError> {
    let mut result: Vec<Entry> = Vec::new();
    let mut at_top = true;

    for group in merge_groups(base, this, other) {
        match group {
            MergeGroup::Conflict { base, this, other } => {
                let added: Vec<Entry> =
                    other.iter().filter(|e| !base.contains(e)).cloned().collect();
                let deleted: Vec<Entry> =
                    base.iter().filter(|e| !other.contains(e)).cloned().collect();

                let (added, deleted, edits) = if at_top && !deleted.is_empty() {
                    guess_edits(added, deleted)
                } else {
                    (added, deleted, Vec::new())
                };
                debug!(
                    at_top,
                    added = added.len(),
                    deleted = deleted.len(),
                    edits = edits.len(),
                    "resolving changelog conflict group"
                );

                let mut updated_this: Vec<Entry> =
                    this.iter().filter(|e| !deleted.contains(e)).cloned().collect();
                for (old, new) in edits {
                    let index = updated_this
                        .iter()
                        .position(|e| *e == old)
                        .ok_or(ResolveError::UnresolvableEdit)?;
                    updated_this[index] = new;
                }

                if at_top {
                    // New incoming entries float to the top of the file.
                    result.splice(0..0, added);
                } else {
                    result.extend(added);
                }
                result.extend(updated_this);
            }
            group => {
                if let Some(records) = group.resolved() {
                    result.extend(records.iter().cloned());
                }
            }
        }
        at_top = false;
    }

    Ok(result)
}

// ---------------------------------------------------------------------------
// Resolver
// ---------------------------------------------------------------------------

/// Resolver for GNU-format ChangeLog files.
pub struct ChangelogResolver {
    files: Vec<String>,
}

impl ChangelogResolver {
    /// `files` are glob patterns matched against the file's base name or
    /// full relative path.
    pub fn new(files: Vec<String>) -> Self {
        Self { files }
    }
}

impl Resolver for ChangelogResolver {
    fn name(&self) -> &'static str {
        "gnu-changelog"
    }

    fn can_handle(&self, path: &str) -> bool {
        matches_any(&self.files, path)
    }

    fn resolve(
        &self,
        path: &str,
        base: &[String],
        this: &[String],
        other: &[String],
    ) -> Result<MergeOutcome, ResolveError> {
        let base_entries = changelog_entries(base);
        let this_entries = changelog_entries(this);
        let other_entries = changelog_entries(other);

        match merge_entries(&base_entries, &this_entries, &other_entries) {
            Ok(entries) => Ok(MergeOutcome::Success {
                chunks: entries_to_chunks(&entries),
            }),
            Err(ResolveError::UnresolvableEdit) => {
                debug!(path, "edited entry missing from local version, declining");
                Ok(MergeOutcome::NotApplicable)
            }
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunks::split_chunks;
    use proptest::prelude::*;

    fn entry(text: &str) -> Entry {
        Entry::new(split_chunks(text))
    }

    // -- segmentation -------------------------------------------------------

    #[test]
    fn test_entries_split_on_non_continuation_lines() {
        let chunks = split_chunks(
            "2024-05-02  Jane Doe  <jane@example.org>\n\
             \n\
             \t* parser.c: Fix length check.\n\
             \n\
             2024-04-30  Sam Roe  <sam@example.org>\n\
             \n\
             \t* lexer.c: New file.\n",
        );
        let entries = changelog_entries(&chunks);
        assert_eq!(entries.len(), 2);
        assert!(entries[0].text().starts_with("2024-05-02"));
        assert!(entries[1].text().starts_with("2024-04-30"));
    }

    #[test]
    fn test_leading_blank_lines_form_synthetic_entry() {
        let chunks = split_chunks("\n\tdangling continuation\nReal entry\n");
        let entries = changelog_entries(&chunks);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].text(), "\n\tdangling continuation\n");
        assert_eq!(entries[1].text(), "Real entry\n");
    }

    #[test]
    fn test_round_trip_exact() {
        for text in [
            "",
            "\n",
            "Entry\n",
            "Entry\n\tbody\n\n",
            "\n\nEntry1\n body\nEntry2\n",
            "no trailing newline",
        ] {
            let chunks = split_chunks(text);
            let entries = changelog_entries(&chunks);
            assert_eq!(entries_to_chunks(&entries), chunks, "round trip for {:?}", text);
        }
    }

    proptest! {
        #[test]
        fn test_round_trip_property(chunks in prop::collection::vec(r"[ \tA-Za-z0-9*.:]{0,10}\n", 0..24)) {
            let entries = changelog_entries(&chunks);
            prop_assert_eq!(entries_to_chunks(&entries), chunks);
        }
    }

    // -- edit guessing ------------------------------------------------------

    #[test]
    fn test_guess_edits_accepts_similar_pair() {
        let old = entry("\t* parser.c (parse_header): Fix off-by-one in length check.\n");
        let new = entry("\t* parser.c (parse_header): Fix off-by-one in the length check.\n");
        let (added, deleted, edits) = guess_edits(vec![new.clone()], vec![old.clone()]);
        assert!(added.is_empty());
        assert!(deleted.is_empty());
        assert_eq!(edits, vec![(old, new)]);
    }

    #[test]
    fn test_guess_edits_rejects_dissimilar_pair() {
        let old = entry("\t* parser.c: Fix length check.\n");
        let new = entry("Totally unrelated new entry about documentation.\n");
        let (added, deleted, edits) = guess_edits(vec![new.clone()], vec![old.clone()]);
        assert_eq!(added, vec![new]);
        assert_eq!(deleted, vec![old]);
        assert!(edits.is_empty());
    }

    #[test]
    fn test_guess_edits_pairs_each_entry_once() {
        let old_a = entry("\t* alpha.c (run): Handle empty input buffers.\n");
        let old_b = entry("\t* omega.c (stop): Release the worker pool.\n");
        let new_a = entry("\t* alpha.c (run): Handle empty input buffers too.\n");
        let new_b = entry("\t* omega.c (stop): Release the worker pool early.\n");

        let (added, deleted, edits) = guess_edits(
            vec![new_a.clone(), new_b.clone()],
            vec![old_a.clone(), old_b.clone()],
        );
        assert!(added.is_empty());
        assert!(deleted.is_empty());
        assert_eq!(edits.len(), 2);
        assert!(edits.contains(&(old_a, new_a)));
        assert!(edits.contains(&(old_b, new_b)));
    }

    // -- entry merge --------------------------------------------------------

    #[test]
    fn test_merge_identical_versions() {
        let entries = vec![entry("Entry1\n\tbody\n"), entry("Entry2\n\tbody\n")];
        let merged = merge_entries(&entries, &entries, &entries).unwrap();
        assert_eq!(merged, entries);
    }

    #[test]
    fn test_new_incoming_entries_float_to_top() {
        // Both sides added a different entry at the top; incoming wins
        // the first position.
        let base = vec![entry("Old entry\n\tbody\n")];
        let this = vec![entry("Local entry\n\tbody\n"), entry("Old entry\n\tbody\n")];
        let other = vec![entry("Incoming entry\n\tbody\n"), entry("Old entry\n\tbody\n")];

        let merged = merge_entries(&base, &this, &other).unwrap();
        assert_eq!(
            merged,
            vec![
                entry("Incoming entry\n\tbody\n"),
                entry("Local entry\n\tbody\n"),
                entry("Old entry\n\tbody\n"),
            ]
        );
    }

    #[test]
    fn test_incoming_edit_when_local_unchanged() {
        let old = entry("\t* parser.c (parse_header): Fix off-by-one in length check.\n");
        let new = entry("\t* parser.c (parse_header): Fix off-by-one in the length check.\n");

        let base = vec![old.clone()];
        let this = vec![old.clone()];
        let other = vec![new.clone()];

        let merged = merge_entries(&base, &this, &other).unwrap();
        assert_eq!(merged, vec![new]);
    }

    #[test]
    fn test_edit_disambiguated_inside_top_conflict() {
        // Local added a fresh entry at the top while incoming edited the
        // previous top entry: the region is a genuine conflict, and the
        // incoming change must be recognized as an edit, not as an
        // unrelated add + delete.
        let old = entry("\t* parser.c (parse_header): Fix off-by-one in length check.\n");
        let new = entry("\t* parser.c (parse_header): Fix off-by-one in the length check.\n");
        let local = entry("Local entry\n\tbody\n");
        let keep = entry("Oldest entry\n\tbody\n");

        let base = vec![old.clone(), keep.clone()];
        let this = vec![local.clone(), old.clone(), keep.clone()];
        let other = vec![new.clone(), keep.clone()];

        let merged = merge_entries(&base, &this, &other).unwrap();
        assert_eq!(merged, vec![local, new, keep]);
    }

    #[test]
    fn test_dissimilar_replacement_is_add_plus_delete() {
        let old = entry("\t* parser.c: Fix length check.\n");
        let new = entry("Totally unrelated new entry about documentation.\n");

        let base = vec![old.clone()];
        let this = vec![old.clone()];
        let other = vec![new.clone()];

        let merged = merge_entries(&base, &this, &other).unwrap();
        // The new entry floats to the top; the deleted one is gone.
        assert_eq!(merged, vec![new]);
    }

    #[test]
    fn test_edit_to_locally_changed_entry_is_unresolvable() {
        let old = entry("\t* parser.c (parse_header): Fix off-by-one in length check.\n");
        let new = entry("\t* parser.c (parse_header): Fix off-by-one in the length check.\n");
        let local = entry("Rewritten locally beyond recognition\n");

        let base = vec![old];
        let this = vec![local];
        let other = vec![new];

        let result = merge_entries(&base, &this, &other);
        assert!(matches!(result, Err(ResolveError::UnresolvableEdit)));
    }

    #[test]
    fn test_one_sided_change_below_top_passes_through() {
        let top = entry("Top entry\n\tbody\n");
        let old = entry("\t* old line below\n");
        let new = entry("\t* new line below\n");

        let base = vec![top.clone(), old.clone()];
        let this = vec![top.clone(), old.clone()];
        let other = vec![top.clone(), new.clone()];

        let merged = merge_entries(&base, &this, &other).unwrap();
        assert_eq!(merged, vec![top, new]);
    }

    #[test]
    fn test_independent_changes_in_both_sides_below_top() {
        let top = entry("Shared top\n");
        let base = vec![top.clone(), entry("b\n")];
        let this = vec![top.clone(), entry("t\n")];
        let other = vec![top.clone(), entry("o\n")];

        let merged = merge_entries(&base, &this, &other).unwrap();
        // Incoming additions are appended in place, then the updated
        // local entries.
        assert_eq!(merged, vec![top, entry("o\n"), entry("t\n")]);
    }

    // -- resolver -----------------------------------------------------------

    #[test]
    fn test_resolver_matches_configured_names() {
        let resolver = ChangelogResolver::new(vec!["ChangeLog".into()]);
        assert!(resolver.can_handle("ChangeLog"));
        assert!(resolver.can_handle("src/ChangeLog"));
        assert!(!resolver.can_handle("NEWS"));
        assert!(!resolver.can_handle("ChangeLog.old"));
    }

    #[test]
    fn test_resolver_success() {
        let resolver = ChangelogResolver::new(vec!["ChangeLog".into()]);
        let base = split_chunks("Entry1\n\tbody\n");
        let other = split_chunks("Entry2\n\tbody\nEntry1\n\tbody\n");

        let outcome = resolver
            .resolve("ChangeLog", &base, &base, &other)
            .unwrap();
        assert_eq!(
            outcome,
            MergeOutcome::Success {
                chunks: split_chunks("Entry2\n\tbody\nEntry1\n\tbody\n")
            }
        );
    }

    #[test]
    fn test_resolver_declines_on_unresolvable_edit() {
        let resolver = ChangelogResolver::new(vec!["ChangeLog".into()]);
        let base = split_chunks("\t* parser.c (parse_header): Fix off-by-one in length check.\n");
        let this = split_chunks("Rewritten locally beyond recognition\n");
        let other =
            split_chunks("\t* parser.c (parse_header): Fix off-by-one in the length check.\n");

        let outcome = resolver.resolve("ChangeLog", &base, &this, &other).unwrap();
        assert_eq!(outcome, MergeOutcome::NotApplicable);
    }
}
