//! TOML-based configuration for recmerge.
//!
//! Configuration controls which files the format-aware resolvers claim
//! (glob patterns), the normalized conflict-marker width, and the
//! external command used for `.po` merges. Every field has a default, so
//! running without any config file gives sensible merge-driver behavior.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::errors::ConfigError;

/// Default width of normalized conflict-marker lines.
pub const DEFAULT_CONFLICT_LEN: usize = 7;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Top-level merge configuration loaded from a TOML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MergeConfig {
    /// Width of conflict-marker lines in merged output (default 7).
    #[serde(default = "default_conflictlen")]
    pub conflictlen: usize,

    /// GNU ChangeLog resolver settings.
    #[serde(default)]
    pub changelog: ChangelogConfig,

    /// NEWS-file resolver settings.
    #[serde(default)]
    pub news: NewsConfig,

    /// Gettext `.po` resolver settings.
    #[serde(default)]
    pub po: PoConfig,
}

fn default_conflictlen() -> usize {
    DEFAULT_CONFLICT_LEN
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            conflictlen: default_conflictlen(),
            changelog: ChangelogConfig::default(),
            news: NewsConfig::default(),
            po: PoConfig::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// ChangeLog
// ---------------------------------------------------------------------------

/// Which files the GNU ChangeLog resolver claims.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangelogConfig {
    /// File-name glob patterns, matched against the file's base name
    /// (so `ChangeLog` matches both `ChangeLog` and `docs/ChangeLog`).
    #[serde(default = "default_changelog_files")]
    pub files: Vec<String>,
}

fn default_changelog_files() -> Vec<String> {
    vec!["ChangeLog".into()]
}

impl Default for ChangelogConfig {
    fn default() -> Self {
        Self {
            files: default_changelog_files(),
        }
    }
}

// ---------------------------------------------------------------------------
// NEWS
// ---------------------------------------------------------------------------

/// Which files the NEWS resolver claims.
///
/// Empty by default: NEWS layouts vary between projects, so the resolver
/// only runs on explicitly configured paths.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewsConfig {
    /// Path glob patterns (e.g. `NEWS`, `doc/NEWS*`).
    #[serde(default)]
    pub files: Vec<String>,
}

// ---------------------------------------------------------------------------
// Po
// ---------------------------------------------------------------------------

/// Settings for the gettext `.po` resolver.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoConfig {
    /// Directories that contain `.po` files.
    #[serde(default = "default_po_dirs")]
    pub po_dirs: Vec<String>,

    /// Glob matching `.po` files inside one of `po_dirs`.
    #[serde(default = "default_po_glob")]
    pub po_glob: String,

    /// Glob matching the `.pot` template inside the same directory.
    #[serde(default = "default_pot_glob")]
    pub pot_glob: String,

    /// Command argv used to produce a conflict-free `.po` file. The
    /// placeholders `{this}`, `{other}`, `{pot_file}` and `{result}` are
    /// substituted with absolute paths before execution.
    #[serde(default = "default_po_command")]
    pub command: Vec<String>,
}

fn default_po_dirs() -> Vec<String> {
    vec!["po".into(), "debian/po".into()]
}

fn default_po_glob() -> String {
    "*.po".into()
}

fn default_pot_glob() -> String {
    "*.pot".into()
}

fn default_po_command() -> Vec<String> {
    vec![
        "msgmerge".into(),
        "-N".into(),
        "{other}".into(),
        "{pot_file}".into(),
        "-C".into(),
        "{this}".into(),
        "-o".into(),
        "{result}".into(),
    ]
}

impl Default for PoConfig {
    fn default() -> Self {
        Self {
            po_dirs: default_po_dirs(),
            po_glob: default_po_glob(),
            pot_glob: default_pot_glob(),
            command: default_po_command(),
        }
    }
}

// ---------------------------------------------------------------------------
// Loading & validation
// ---------------------------------------------------------------------------

impl MergeConfig {
    /// Load a [`MergeConfig`] from a TOML file at the given path.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        info!(path = %path.display(), "loading configuration");

        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.display().to_string()));
        }

        let contents = std::fs::read_to_string(path)?;
        let config: MergeConfig =
            toml::from_str(&contents).map_err(|e| ConfigError::ParseError(e.to_string()))?;

        debug!("configuration parsed successfully");
        Ok(config)
    }

    /// Locate and load the configuration: `./recmerge.toml` first, then
    /// `<config dir>/recmerge/config.toml`, else built-in defaults.
    ///
    /// A file that exists but fails to parse is reported as a warning and
    /// skipped rather than aborting the merge.
    pub fn discover() -> Self {
        let mut candidates = vec![std::path::PathBuf::from("recmerge.toml")];
        if let Some(config_dir) = dirs::config_dir() {
            candidates.push(config_dir.join("recmerge").join("config.toml"));
        }

        for candidate in candidates {
            if !candidate.exists() {
                continue;
            }
            match Self::load_from_file(&candidate) {
                Ok(config) => return config,
                Err(e) => {
                    warn!(path = %candidate.display(), error = %e, "ignoring unreadable config file");
                }
            }
        }

        debug!("no configuration file found, using defaults");
        Self::default()
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.conflictlen == 0 {
            return Err(ConfigError::InvalidValue {
                field: "conflictlen".into(),
                detail: "must be at least 1".into(),
            });
        }
        if self.po.command.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "po.command".into(),
                detail: "must name an executable".into(),
            });
        }
        Ok(())
    }
}
