//! Format-aware merge resolvers and the registry that dispatches to them.
//!
//! A [`Resolver`] knows how to merge one kind of structured file. The
//! [`ResolverRegistry`] holds resolvers in priority order and tries each
//! one whose availability check passes and whose path predicate matches;
//! the first terminal outcome wins. When every resolver declines, the
//! default line-based merge runs, so the registry always produces a
//! terminal result. A resolver failure is logged and skipped, never
//! propagated.

pub mod changelog;
pub mod debian;
pub mod news;
pub mod po;

use tracing::{debug, info, warn};

use crate::config::MergeConfig;
use crate::errors::ResolveError;
use crate::merge::line_merge::merge_chunks;

pub use changelog::ChangelogResolver;
pub use debian::DebianChangelogResolver;
pub use news::NewsResolver;
pub use po::PoResolver;

// ---------------------------------------------------------------------------
// Outcome
// ---------------------------------------------------------------------------

/// The terminal state of one merge attempt.
///
/// Content is carried only by `Success` and `Conflicted`; `Delete` and
/// `NotApplicable` never have any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeOutcome {
    /// The resolver does not know how to merge this file.
    NotApplicable,
    /// Clean merge; `chunks` is the resolved content.
    Success { chunks: Vec<String> },
    /// Merge with unresolved regions delimited by conflict markers.
    Conflicted { chunks: Vec<String> },
    /// The file was deleted on one side and untouched on the other.
    Delete,
}

impl MergeOutcome {
    /// The merged content, if this outcome carries any.
    pub fn chunks(&self) -> Option<&[String]> {
        match self {
            Self::Success { chunks } | Self::Conflicted { chunks } => Some(chunks),
            Self::NotApplicable | Self::Delete => None,
        }
    }

    /// Short label for logging.
    pub fn label(&self) -> &'static str {
        match self {
            Self::NotApplicable => "not_applicable",
            Self::Success { .. } => "success",
            Self::Conflicted { .. } => "conflicted",
            Self::Delete => "delete",
        }
    }
}

impl std::fmt::Display for MergeOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

// ---------------------------------------------------------------------------
// Resolver trait
// ---------------------------------------------------------------------------

/// A strategy for merging one kind of structured file.
pub trait Resolver {
    /// Stable identifier used in logs and `--list` output.
    fn name(&self) -> &'static str;

    /// Whether this resolver wants to try merging `path` (a
    /// forward-slash, repository-relative path).
    fn can_handle(&self, path: &str) -> bool;

    /// Whether the resolver's prerequisites (e.g. an external tool) are
    /// present. Unavailable resolvers are skipped silently.
    fn is_available(&self) -> bool {
        true
    }

    /// Attempt the merge. `Ok(MergeOutcome::NotApplicable)` means the
    /// resolver declined; an `Err` is treated the same way by the
    /// registry, with a warning.
    fn resolve(
        &self,
        path: &str,
        base: &[String],
        this: &[String],
        other: &[String],
    ) -> Result<MergeOutcome, ResolveError>;
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Ordered collection of resolvers plus the fallback line merge.
///
/// Built once at startup and read-only afterwards; tests construct their
/// own instances instead of sharing global state.
pub struct ResolverRegistry {
    resolvers: Vec<Box<dyn Resolver>>,
}

impl ResolverRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            resolvers: Vec::new(),
        }
    }

    /// Create a registry with the built-in resolvers in their standard
    /// priority order.
    pub fn with_defaults(config: &MergeConfig) -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(DebianChangelogResolver::new(config.conflictlen)));
        registry.register(Box::new(ChangelogResolver::new(config.changelog.files.clone())));
        registry.register(Box::new(NewsResolver::new(config.news.files.clone())));
        registry.register(Box::new(PoResolver::new(config.po.clone())));
        registry
    }

    /// Append a resolver at the lowest priority.
    pub fn register(&mut self, resolver: Box<dyn Resolver>) {
        debug!(resolver = resolver.name(), "registered resolver");
        self.resolvers.push(resolver);
    }

    /// Registered resolvers in priority order.
    pub fn resolvers(&self) -> impl Iterator<Item = &dyn Resolver> {
        self.resolvers.iter().map(|r| r.as_ref())
    }

    /// Merge one file, trying each matching resolver in priority order
    /// and falling back to the line-based merge.
    ///
    /// The returned outcome is always terminal: `Success`, `Conflicted`
    /// or `Delete`.
    pub fn merge(
        &self,
        path: &str,
        base: &[String],
        this: &[String],
        other: &[String],
    ) -> MergeOutcome {
        for resolver in &self.resolvers {
            if !resolver.can_handle(path) {
                continue;
            }
            if !resolver.is_available() {
                debug!(resolver = resolver.name(), path, "resolver unavailable, skipping");
                continue;
            }
            match resolver.resolve(path, base, this, other) {
                Ok(MergeOutcome::NotApplicable) => {
                    debug!(resolver = resolver.name(), path, "resolver declined");
                }
                Ok(outcome) => {
                    info!(
                        resolver = resolver.name(),
                        path,
                        outcome = outcome.label(),
                        "merged by format-aware resolver"
                    );
                    return outcome;
                }
                Err(e) => {
                    warn!(
                        resolver = resolver.name(),
                        path,
                        error = %e,
                        "resolver failed, trying next strategy"
                    );
                }
            }
        }

        info!(path, "falling back to line-based merge");
        merge_chunks(base, this, other)
    }
}

impl Default for ResolverRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Shared helpers
// ---------------------------------------------------------------------------

/// Whether an executable with the given name exists on `$PATH`.
pub(crate) fn tool_on_path(tool: &str) -> bool {
    let Some(paths) = std::env::var_os("PATH") else {
        return false;
    };
    std::env::split_paths(&paths).any(|dir| dir.join(tool).is_file())
}

/// The final path component of a forward-slash relative path.
pub(crate) fn file_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// Convenience for resolvers matching a path against config patterns:
/// a pattern matches if it globs the full path or just the file name.
pub(crate) fn matches_any(patterns: &[String], path: &str) -> bool {
    let name = file_name(path);
    patterns
        .iter()
        .any(|pat| glob_match::glob_match(pat, path) || glob_match::glob_match(pat, name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    /// Test resolver with scripted behavior and a shared invocation counter.
    struct ScriptedResolver {
        name: &'static str,
        handles: &'static str,
        available: bool,
        outcome: fn() -> Result<MergeOutcome, ResolveError>,
        calls: Rc<Cell<usize>>,
    }

    impl ScriptedResolver {
        fn new(
            name: &'static str,
            handles: &'static str,
            outcome: fn() -> Result<MergeOutcome, ResolveError>,
        ) -> Self {
            Self {
                name,
                handles,
                available: true,
                outcome,
                calls: Rc::new(Cell::new(0)),
            }
        }

        fn call_counter(&self) -> Rc<Cell<usize>> {
            Rc::clone(&self.calls)
        }
    }

    impl Resolver for ScriptedResolver {
        fn name(&self) -> &'static str {
            self.name
        }

        fn can_handle(&self, path: &str) -> bool {
            path == self.handles
        }

        fn is_available(&self) -> bool {
            self.available
        }

        fn resolve(
            &self,
            _path: &str,
            _base: &[String],
            _this: &[String],
            _other: &[String],
        ) -> Result<MergeOutcome, ResolveError> {
            self.calls.set(self.calls.get() + 1);
            (self.outcome)()
        }
    }

    fn success() -> Result<MergeOutcome, ResolveError> {
        Ok(MergeOutcome::Success {
            chunks: vec!["resolved\n".into()],
        })
    }

    fn not_applicable() -> Result<MergeOutcome, ResolveError> {
        Ok(MergeOutcome::NotApplicable)
    }

    fn internal_error() -> Result<MergeOutcome, ResolveError> {
        Err(ResolveError::StructuralMismatch)
    }

    fn chunks(text: &str) -> Vec<String> {
        crate::chunks::split_chunks(text)
    }

    #[test]
    fn test_first_matching_resolver_wins() {
        let first = ScriptedResolver::new("first", "file", success);
        let second = ScriptedResolver::new("second", "file", success);
        let first_calls = first.call_counter();
        let second_calls = second.call_counter();

        let mut registry = ResolverRegistry::new();
        registry.register(Box::new(first));
        registry.register(Box::new(second));

        let outcome = registry.merge("file", &[], &[], &[]);
        assert_eq!(
            outcome,
            MergeOutcome::Success {
                chunks: vec!["resolved\n".into()]
            }
        );
        assert_eq!(first_calls.get(), 1);
        assert_eq!(second_calls.get(), 0, "second resolver must not run");
    }

    #[test]
    fn test_non_matching_resolver_never_invoked() {
        let resolver = ScriptedResolver::new("other-format", "other-file", success);
        let calls = resolver.call_counter();

        let mut registry = ResolverRegistry::new();
        registry.register(Box::new(resolver));

        let base = chunks("a\n");
        registry.merge("file", &base, &base, &base);
        assert_eq!(calls.get(), 0);
    }

    #[test]
    fn test_declined_resolver_falls_through() {
        let mut registry = ResolverRegistry::new();
        registry.register(Box::new(ScriptedResolver::new(
            "decliner",
            "file",
            not_applicable,
        )));
        registry.register(Box::new(ScriptedResolver::new("second", "file", success)));

        let outcome = registry.merge("file", &[], &[], &[]);
        assert_eq!(
            outcome,
            MergeOutcome::Success {
                chunks: vec!["resolved\n".into()]
            }
        );
    }

    #[test]
    fn test_failing_resolver_is_skipped() {
        let mut registry = ResolverRegistry::new();
        registry.register(Box::new(ScriptedResolver::new(
            "broken",
            "file",
            internal_error,
        )));
        registry.register(Box::new(ScriptedResolver::new("second", "file", success)));

        let outcome = registry.merge("file", &[], &[], &[]);
        assert_eq!(
            outcome,
            MergeOutcome::Success {
                chunks: vec!["resolved\n".into()]
            }
        );
    }

    #[test]
    fn test_unavailable_resolver_is_skipped() {
        let mut unavailable = ScriptedResolver::new("gone", "file", success);
        unavailable.available = false;

        let mut registry = ResolverRegistry::new();
        registry.register(Box::new(unavailable));

        // Falls through to the line merge.
        let base = chunks("a\n");
        let outcome = registry.merge("file", &base, &base, &base);
        assert_eq!(outcome, MergeOutcome::Success { chunks: base });
    }

    #[test]
    fn test_fallback_matches_line_merge() {
        let registry = ResolverRegistry::new();
        let base = chunks("a\nb\n");
        let this = chunks("a\nB\n");
        let other = chunks("a\nb\n");

        let outcome = registry.merge("no/resolver/matches", &base, &this, &other);
        assert_eq!(outcome, merge_chunks(&base, &this, &other));
    }

    #[test]
    fn test_outcome_accessors() {
        let success = MergeOutcome::Success {
            chunks: vec!["x\n".into()],
        };
        assert_eq!(success.chunks(), Some(&["x\n".to_string()][..]));
        assert_eq!(success.label(), "success");
        assert_eq!(MergeOutcome::Delete.chunks(), None);
        assert_eq!(MergeOutcome::NotApplicable.to_string(), "not_applicable");
    }

    #[test]
    fn test_matches_any_full_path_and_basename() {
        let patterns = vec!["ChangeLog".to_string(), "doc/NEWS*".to_string()];
        assert!(matches_any(&patterns, "ChangeLog"));
        assert!(matches_any(&patterns, "src/lib/ChangeLog"));
        assert!(matches_any(&patterns, "doc/NEWS.md"));
        assert!(!matches_any(&patterns, "src/NEWS.md"));
        assert!(!matches_any(&patterns, "README"));
    }
}
