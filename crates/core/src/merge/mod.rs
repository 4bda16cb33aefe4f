//! Three-way merge engine.
//!
//! The engine is layered:
//! 1. **Grouping** -- classifying spans of three record sequences into
//!    unchanged / one-sided / same / conflicting groups.
//! 2. **Line fallback** -- the plain line-based merge used when no
//!    format-aware resolver claims a file.
//! 3. **Marker normalization** -- rewriting tool-specific conflict
//!    delimiters to a canonical width.

pub mod groups;
pub mod line_merge;
pub mod markers;

pub use groups::{merge_groups, MergeGroup};
pub use line_merge::merge_chunks;
pub use markers::normalize_conflict_markers;
