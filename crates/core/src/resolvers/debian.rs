//! Debian changelog merging via `dpkg-mergechangelogs`.
//!
//! The three versions are written into a temporary directory and handed
//! to the external tool, which understands the changelog's version
//! structure. Its conflict markers are six characters wide, so conflicted
//! output is normalized to the configured width before being returned.

use std::io::ErrorKind;
use std::process::Command;

use tracing::{debug, info, warn};

use crate::chunks::{join_chunks, split_chunks};
use crate::errors::ResolveError;
use crate::merge::markers::normalize_conflict_markers;
use crate::resolvers::{tool_on_path, MergeOutcome, Resolver};

const TOOL: &str = "dpkg-mergechangelogs";

/// Resolver for `debian/changelog` files.
pub struct DebianChangelogResolver {
    conflictlen: usize,
}

impl DebianChangelogResolver {
    pub fn new(conflictlen: usize) -> Self {
        Self { conflictlen }
    }
}

impl Resolver for DebianChangelogResolver {
    fn name(&self) -> &'static str {
        "debian-changelog"
    }

    fn can_handle(&self, path: &str) -> bool {
        path == "debian/changelog" || path.ends_with("/debian/changelog")
    }

    fn is_available(&self) -> bool {
        tool_on_path(TOOL)
    }

    fn resolve(
        &self,
        path: &str,
        base: &[String],
        this: &[String],
        other: &[String],
    ) -> Result<MergeOutcome, ResolveError> {
        // The temp dir is removed on every exit path, including errors.
        let tmpdir = tempfile::Builder::new()
            .prefix("deb-changelog-merge")
            .tempdir()?;
        let base_file = tmpdir.path().join("changelog.base");
        let this_file = tmpdir.path().join("changelog.this");
        let other_file = tmpdir.path().join("changelog.other");
        std::fs::write(&base_file, join_chunks(base))?;
        std::fs::write(&this_file, join_chunks(this))?;
        std::fs::write(&other_file, join_chunks(other))?;

        debug!(path, "running {}", TOOL);
        let output = match Command::new(TOOL)
            .arg(&base_file)
            .arg(&this_file)
            .arg(&other_file)
            .output()
        {
            Ok(output) => output,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!("{} is not installed", TOOL);
                return Ok(MergeOutcome::NotApplicable);
            }
            Err(e) => return Err(ResolveError::Io(e)),
        };

        // Relay tool warnings verbatim; they are already prefixed with
        // the tool name.
        if !output.stderr.is_empty() {
            warn!("{}", String::from_utf8_lossy(&output.stderr).trim_end());
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        match output.status.code() {
            Some(0) => Ok(MergeOutcome::Success {
                chunks: split_chunks(&stdout),
            }),
            Some(1) => {
                // Conflict. The tool's six-character markers are widened
                // to the canonical width.
                let chunks = normalize_conflict_markers(&split_chunks(&stdout), self.conflictlen);
                Ok(MergeOutcome::Conflicted { chunks })
            }
            status => {
                let status = status.unwrap_or(-1);
                warn!(status, "{} failed, declining", TOOL);
                Ok(MergeOutcome::NotApplicable)
            }
        }
    }
}
