//! Error types for the recmerge core library.
//!
//! Each subsystem has its own error type derived with `thiserror`, and a
//! top-level [`CoreError`] enum unifies them for callers that want a
//! single error type.
//!
//! None of these errors is fatal to an overall merge: the resolver
//! registry maps every resolver failure to a skip and always falls back
//! to the default line-based merge.

use thiserror::Error;

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

/// Unified error type for the core library.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

// ---------------------------------------------------------------------------
// Resolver errors
// ---------------------------------------------------------------------------

/// Errors from format-aware resolvers.
///
/// Resolvers translate the errors they know how to recover from
/// (`UnresolvableEdit`, `StructuralMismatch`, `ExternalTool`) into a
/// `NotApplicable` outcome so the registry can try the next strategy.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// An edited entry could not be located in the local version at
    /// apply time (it was independently changed or removed).
    #[error("edited entry is no longer present in the local version")]
    UnresolvableEdit,

    /// Conflicting records are not of a kind the resolver reconciles.
    #[error("conflicting records are not of a kind this resolver reconciles")]
    StructuralMismatch,

    /// An external merge tool exited with an unexpected status.
    #[error("external tool '{tool}' exited with status {status}")]
    ExternalTool { tool: String, status: i32 },

    /// I/O failure while staging input for or reading output from a
    /// resolver (temp files, external process spawn).
    #[error("resolver I/O error: {0}")]
    Io(#[from] std::io::Error),
}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

/// Errors from configuration loading and validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file not found.
    #[error("configuration file not found: {0}")]
    FileNotFound(String),

    /// TOML parse error.
    #[error("configuration parse error: {0}")]
    ParseError(String),

    /// A config value is invalid.
    #[error("invalid configuration value for '{field}': {detail}")]
    InvalidValue { field: String, detail: String },

    /// Generic I/O error reading the config file.
    #[error("configuration I/O error: {0}")]
    IoError(#[from] std::io::Error),
}
