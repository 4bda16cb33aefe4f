//! Gettext `.po` catalog merging via `msgmerge`.
//!
//! `.po` merges are reconciled against the `.pot` template that lives
//! beside the catalog in the working tree: instead of mixing the two
//! translations line by line, the incoming catalog is regenerated from
//! the template with the local catalog as a compendium, which cannot
//! produce conflicts. The command is a configurable argv template so
//! other reconciliation tools can be substituted.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::{debug, info, warn};

use crate::chunks::{join_chunks, split_chunks};
use crate::config::PoConfig;
use crate::errors::ResolveError;
use crate::resolvers::{tool_on_path, MergeOutcome, Resolver};

/// Resolver for `.po` files with a discoverable `.pot` template.
pub struct PoResolver {
    config: PoConfig,
}

impl PoResolver {
    pub fn new(config: PoConfig) -> Self {
        Self { config }
    }

    fn matches_po_dirs(&self, path: &str) -> bool {
        self.config.po_dirs.iter().any(|dir| {
            let pattern = format!("{}/{}", dir.trim_end_matches('/'), self.config.po_glob);
            glob_match::glob_match(&pattern, path)
        })
    }

    /// The `.pot` template next to `path` in the working tree, if any.
    fn find_pot_file(&self, path: &str) -> Option<PathBuf> {
        let dir = Path::new(path).parent()?;
        let entries = std::fs::read_dir(dir).ok()?;
        for entry in entries.flatten() {
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if glob_match::glob_match(&self.config.pot_glob, &name) {
                return Some(entry.path());
            }
        }
        None
    }
}

impl Resolver for PoResolver {
    fn name(&self) -> &'static str {
        "po"
    }

    fn can_handle(&self, path: &str) -> bool {
        self.matches_po_dirs(path) && self.find_pot_file(path).is_some()
    }

    fn is_available(&self) -> bool {
        self.config
            .command
            .first()
            .is_some_and(|tool| tool_on_path(tool))
    }

    fn resolve(
        &self,
        path: &str,
        _base: &[String],
        this: &[String],
        other: &[String],
    ) -> Result<MergeOutcome, ResolveError> {
        let Some(pot_file) = self.find_pot_file(path) else {
            debug!(path, "no .pot template found, declining");
            return Ok(MergeOutcome::NotApplicable);
        };

        let tmpdir = tempfile::Builder::new().prefix("po-merge").tempdir()?;
        let this_file = tmpdir.path().join("this.po");
        let other_file = tmpdir.path().join("other.po");
        let result_file = tmpdir.path().join("result.po");
        std::fs::write(&this_file, join_chunks(this))?;
        std::fs::write(&other_file, join_chunks(other))?;

        let argv: Vec<String> = self
            .config
            .command
            .iter()
            .map(|arg| {
                arg.replace("{this}", &this_file.to_string_lossy())
                    .replace("{other}", &other_file.to_string_lossy())
                    .replace("{pot_file}", &pot_file.to_string_lossy())
                    .replace("{result}", &result_file.to_string_lossy())
            })
            .collect();
        let (tool, args) = match argv.split_first() {
            Some(split) => split,
            None => return Ok(MergeOutcome::NotApplicable),
        };

        debug!(path, tool = %tool, "running po merge command");
        let output = match Command::new(tool).args(args).output() {
            Ok(output) => output,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!("{} is not installed", tool);
                return Ok(MergeOutcome::NotApplicable);
            }
            Err(e) => return Err(ResolveError::Io(e)),
        };

        if !output.stderr.is_empty() {
            warn!("{}", String::from_utf8_lossy(&output.stderr).trim_end());
        }
        if !output.status.success() {
            let status = output.status.code().unwrap_or(-1);
            warn!(status, tool = %tool, "po merge command failed, declining");
            return Ok(MergeOutcome::NotApplicable);
        }

        let merged = std::fs::read_to_string(&result_file)?;
        Ok(MergeOutcome::Success {
            chunks: split_chunks(&merged),
        })
    }
}
