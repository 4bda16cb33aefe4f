//! recmerge core library.
//!
//! A record-aware three-way merge engine: files are segmented into
//! domain-meaningful records (changelog entries, NEWS blocks), changes
//! are classified with a three-way grouping primitive, and ambiguous
//! conflicts are disambiguated with a similarity heuristic before the
//! resolved file is reassembled. Format-aware resolvers are tried in
//! priority order; a plain line-based merge is the guaranteed fallback,
//! so a merge always completes with a terminal outcome.

pub mod chunks;
pub mod config;
pub mod errors;
pub mod merge;
pub mod resolvers;

// Re-exports for convenience.
pub use config::MergeConfig;
pub use errors::{ConfigError, CoreError, ResolveError};
pub use resolvers::{MergeOutcome, Resolver, ResolverRegistry};
