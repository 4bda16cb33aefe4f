//! NEWS-file merging.
//!
//! A NEWS file is a stack of blocks separated by blank lines: headings,
//! release banners, section banners, and bullet points. Sections are
//! essentially ordered sets of bullets, so conflicting bullet regions
//! can be merged as sets: take the additions from both sides, drop the
//! deletions from both sides, sort, and reserialize. Conflicts touching
//! anything other than bullets are declined and left to the next
//! strategy.

use tracing::debug;

use crate::chunks::{join_chunks, split_chunks};
use crate::errors::ResolveError;
use crate::merge::groups::{merge_groups, MergeGroup};
use crate::resolvers::{matches_any, MergeOutcome, Resolver};

// ---------------------------------------------------------------------------
// Blocks
// ---------------------------------------------------------------------------

/// Classification of one double-newline-separated block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BlockKind {
    /// `###...` on the first line: top-level heading.
    Heading,
    /// `###...` on the last line: release banner.
    Release,
    /// `***...` on the last line: section banner.
    Section,
    /// `* ` bullet point.
    Bullet,
    /// Whitespace only.
    Empty,
    /// Anything else.
    Text,
}

/// One block of a NEWS file, with its separator-free text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Block {
    pub kind: BlockKind,
    pub text: String,
}

/// Split file content into classified blocks. Joining the block texts
/// with `\n\n` reproduces the input exactly.
pub fn parse_blocks(content: &str) -> Vec<Block> {
    content
        .split("\n\n")
        .map(|text| Block {
            kind: classify_block(text),
            text: text.to_string(),
        })
        .collect()
}

fn classify_block(text: &str) -> BlockKind {
    if text.starts_with("###") {
        return BlockKind::Heading;
    }
    let last_line = text.rsplit('\n').next().unwrap_or(text);
    if last_line.starts_with("###") {
        BlockKind::Release
    } else if last_line.starts_with("***") {
        BlockKind::Section
    } else if text.starts_with("* ") {
        BlockKind::Bullet
    } else if text.trim().is_empty() {
        BlockKind::Empty
    } else {
        BlockKind::Text
    }
}

/// Join block texts back into file content.
pub fn blocks_to_content(blocks: &[Block]) -> String {
    blocks
        .iter()
        .map(|b| b.text.as_str())
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Sort key for merged bullets: markup stripped, case folded.
fn sort_key(block: &Block) -> String {
    block.text.replace('`', "").to_lowercase()
}

// ---------------------------------------------------------------------------
// Block-level merge
// ---------------------------------------------------------------------------

/// Merge NEWS blocks; `Err(StructuralMismatch)` when a conflict spans
/// anything other than bullets.
fn merge_blocks(
    base: &[Block],
    this: &[Block],
    other: &[Block],
) -> Result<Vec<Block>, ResolveError> {
    let mut result: Vec<Block> = Vec::new();

    for group in merge_groups(base, this, other) {
        match group {
            MergeGroup::Conflict { base, this, other } => {
                let all_bullets = [&base, &this, &other]
                    .iter()
                    .all(|span| span.iter().all(|b| b.kind == BlockKind::Bullet));
                if !all_bullets {
                    return Err(ResolveError::StructuralMismatch);
                }

                // Additions from both sides, without duplicates.
                let mut merged: Vec<Block> = Vec::new();
                for block in this.iter().chain(other.iter()) {
                    if !base.contains(block) && !merged.contains(block) {
                        merged.push(block.clone());
                    }
                }
                // Drop anything either side deleted.
                merged.retain(|b| this.contains(b) || other.contains(b));
                merged.sort_by_key(sort_key);
                result.extend(merged);
            }
            group => {
                if let Some(records) = group.resolved() {
                    result.extend(records.iter().cloned());
                }
            }
        }
    }

    Ok(result)
}

// ---------------------------------------------------------------------------
// Resolver
// ---------------------------------------------------------------------------

/// Resolver for NEWS files with bullet-list sections.
pub struct NewsResolver {
    files: Vec<String>,
}

impl NewsResolver {
    /// `files` are glob patterns matched against the file's base name or
    /// full relative path. No patterns means the resolver never runs.
    pub fn new(files: Vec<String>) -> Self {
        Self { files }
    }
}

impl Resolver for NewsResolver {
    fn name(&self) -> &'static str {
        "news"
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
        let base_blocks = parse_blocks(&join_chunks(base));
        let this_blocks = parse_blocks(&join_chunks(this));
        let other_blocks = parse_blocks(&join_chunks(other));

        match merge_blocks(&base_blocks, &this_blocks, &other_blocks) {
            Ok(blocks) => Ok(MergeOutcome::Success {
                chunks: split_chunks(&blocks_to_content(&blocks)),
            }),
            Err(ResolveError::StructuralMismatch) => {
                debug!(path, "conflict spans non-bullet blocks, declining");
                Ok(MergeOutcome::NotApplicable)
            }
            Err(e) => Err(e),
        }
    }
}
