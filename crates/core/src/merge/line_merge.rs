//! Default line-based three-way merge.
//!
//! The final fallback for files no format-aware resolver claims. Uses
//! the `diffy` crate, which emits standard seven-character conflict
//! markers when both sides touch the same region.

use tracing::debug;

use crate::chunks::{join_chunks, split_chunks};
use crate::resolvers::MergeOutcome;

/// Merge three chunk sequences line by line.
///
/// Whole-file deletions are recognized first: if one side removed every
/// line while the other left the file untouched, the deletion wins and
/// no content is produced. Everything else goes through `diffy`; the
/// result is always terminal (`Success`, `Conflicted` or `Delete`),
/// never `NotApplicable`.
pub fn merge_chunks(base: &[String], this: &[String], other: &[String]) -> MergeOutcome {
    if other.is_empty() && !base.is_empty() && this == base {
        debug!("file deleted on the incoming side");
        return MergeOutcome::Delete;
    }
    if this.is_empty() && !base.is_empty() && other == base {
        debug!("file deleted on the local side");
        return MergeOutcome::Delete;
    }

    let base_text = join_chunks(base);
    let this_text = join_chunks(this);
    let other_text = join_chunks(other);

    match diffy::merge(&base_text, &this_text, &other_text) {
        Ok(merged) => MergeOutcome::Success {
            chunks: split_chunks(&merged),
        },
        Err(conflicted) => MergeOutcome::Conflicted {
            chunks: split_chunks(&conflicted),
        },
    }
}
