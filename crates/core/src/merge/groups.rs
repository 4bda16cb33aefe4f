//! Generic three-way grouping of comparable record sequences.
//!
//! Given a common ancestor and two descendant sequences, [`merge_groups`]
//! classifies every span of the document into one of five group kinds,
//! emitted in document order. The records can be anything comparable by
//! content: lines, changelog entries, NEWS blocks.
//!
//! The construction uses the `similar` crate's two-way diffs: equal runs
//! of `base↔this` and `base↔other` are intersected into regions where all
//! three versions agree, and the spans between those sync regions are
//! classified by content equality.

use std::hash::Hash;

use similar::{capture_diff_slices, Algorithm, DiffOp};

/// A classified span across the three versions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeGroup<T> {
    /// All three versions agree.
    Unchanged(Vec<T>),
    /// Both sides made the same change.
    Same(Vec<T>),
    /// Only the local side changed.
    This(Vec<T>),
    /// Only the incoming side changed.
    Other(Vec<T>),
    /// Both sides diverged from the ancestor; the three sub-sequences are
    /// the maximal spans between two adjacent points of three-way
    /// agreement.
    Conflict {
        base: Vec<T>,
        this: Vec<T>,
        other: Vec<T>,
    },
}

impl<T> MergeGroup<T> {
    /// The records an already-resolved group carries, `None` for conflicts.
    pub fn resolved(&self) -> Option<&[T]> {
        match self {
            Self::Unchanged(records)
            | Self::Same(records)
            | Self::This(records)
            | Self::Other(records) => Some(records),
            Self::Conflict { .. } => None,
        }
    }
}

/// Classify `this` and `other` against `base` into ordered merge groups.
pub fn merge_groups<T>(base: &[T], this: &[T], other: &[T]) -> Vec<MergeGroup<T>>
where
    T: Clone + Eq + Hash + Ord,
{
    let mut groups = Vec::new();
    let (mut iz, mut ia, mut ib) = (0, 0, 0);

    for [zmatch, zend, amatch, aend, bmatch, bend] in sync_regions(base, this, other) {
        // Span between the previous sync region and this one.
        if amatch > ia || bmatch > ib {
            let z_span = &base[iz..zmatch];
            let a_span = &this[ia..amatch];
            let b_span = &other[ib..bmatch];

            if a_span == b_span {
                groups.push(MergeGroup::Same(a_span.to_vec()));
            } else if a_span == z_span {
                groups.push(MergeGroup::Other(b_span.to_vec()));
            } else if b_span == z_span {
                groups.push(MergeGroup::This(a_span.to_vec()));
            } else {
                groups.push(MergeGroup::Conflict {
                    base: z_span.to_vec(),
                    this: a_span.to_vec(),
                    other: b_span.to_vec(),
                });
            }
        }

        if zend > zmatch {
            groups.push(MergeGroup::Unchanged(base[zmatch..zend].to_vec()));
        }

        iz = zend;
        ia = aend;
        ib = bend;
    }

    groups
}

/// Equal-run blocks of `old↔new` as `(old_start, new_start, len)`,
/// terminated by a zero-length sentinel block.
fn matching_blocks<T>(old: &[T], new: &[T]) -> Vec<(usize, usize, usize)>
where
    T: Eq + Hash + Ord,
{
    let mut blocks: Vec<(usize, usize, usize)> =
        capture_diff_slices(Algorithm::Myers, old, new)
            .iter()
            .filter_map(|op| match op {
                DiffOp::Equal {
                    old_index,
                    new_index,
                    len,
                } => Some((*old_index, *new_index, *len)),
                _ => None,
            })
            .collect();
    blocks.push((old.len(), new.len(), 0));
    blocks
}

/// Regions where base, this, and other all agree, as
/// `[base_start, base_end, this_start, this_end, other_start, other_end]`,
/// terminated by a zero-length sentinel region at the ends.
fn sync_regions<T>(base: &[T], this: &[T], other: &[T]) -> Vec<[usize; 6]>
where
    T: Eq + Hash + Ord,
{
    let amatches = matching_blocks(base, this);
    let bmatches = matching_blocks(base, other);

    let mut regions = Vec::new();
    let (mut ia, mut ib) = (0, 0);

    while ia < amatches.len() && ib < bmatches.len() {
        let (abase, amatch, alen) = amatches[ia];
        let (bbase, bmatch, blen) = bmatches[ib];

        // Intersect the two blocks on the base axis.
        let start = abase.max(bbase);
        let end = (abase + alen).min(bbase + blen);
        if end > start {
            let len = end - start;
            let asub = amatch + (start - abase);
            let bsub = bmatch + (start - bbase);
            regions.push([start, end, asub, asub + len, bsub, bsub + len]);
        }

        if abase + alen < bbase + blen {
            ia += 1;
        } else {
            ib += 1;
        }
    }

    regions.push([
        base.len(),
        base.len(),
        this.len(),
        this.len(),
        other.len(),
        other.len(),
    ]);
    regions
}
