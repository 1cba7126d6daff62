//! Configuration file loading and resolved run settings.
//!
//! Settings come from three layers, later ones winning: built-in defaults,
//! an optional TOML config file, and command-line flags. This module owns
//! the first two and the final [`Settings`] type; the CLI layer applies its
//! flags on top.
//!
//! # Configuration File Format
//!
//! ```toml
//! [organize]
//! dir = "~/Downloads"
//! mode = "year_extension"
//! days = 30
//! on_conflict = "rename"
//! organized_dir = "organized"
//!
//! [filters.exclude]
//! extensions = [".tmp", "part"]
//! patterns = ["**/node_modules/**"]
//! regex = ["^~\\$"]
//! ```

use chrono::{DateTime, Local};
use glob::Pattern;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;

use crate::classify::{InvalidMode, Mode};
use crate::filter::{AgeCutoff, ExclusionSet, InclusionFilter};
use crate::organizer::CollisionPolicy;

/// Name of the per-directory config file looked up in the working directory.
pub const LOCAL_CONFIG_FILE: &str = ".dlorganizerc.toml";

/// Default name of the organized root beneath the scanned directory.
pub const DEFAULT_ORGANIZED_DIR: &str = "organized";

/// Errors that can occur during configuration loading and validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Configuration file not found at the specified path.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// Invalid TOML syntax or structure.
    #[error("Invalid configuration in {}: {reason}", .path.display())]
    Invalid { path: PathBuf, reason: String },
    /// IO error while reading configuration.
    #[error("Failed to read configuration {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// Unrecognized organization mode.
    #[error(transparent)]
    InvalidMode(#[from] InvalidMode),
    /// Invalid glob pattern provided.
    #[error("Invalid glob pattern '{pattern}': {reason}")]
    InvalidGlobPattern { pattern: String, reason: String },
    /// Invalid regex pattern provided.
    #[error("Invalid regex pattern '{pattern}': {reason}")]
    InvalidRegexPattern { pattern: String, reason: String },
    /// The organized directory must be a plain relative path.
    #[error("Invalid organized directory '{0}': expected a relative path inside the scanned directory")]
    InvalidOrganizedDir(String),
    /// No directory given and no downloads or home directory could be determined.
    #[error("Could not determine a default directory; pass --dir")]
    NoDefaultDirectory,
}

/// Contents of a config file. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FileConfig {
    #[serde(default)]
    pub organize: OrganizeSection,
    #[serde(default)]
    pub filters: FilterSection,
}

/// `[organize]` table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrganizeSection {
    pub dir: Option<String>,
    /// Kept as a string so an unknown value surfaces as [`ConfigError::InvalidMode`].
    pub mode: Option<String>,
    pub days: Option<u32>,
    pub on_conflict: Option<CollisionPolicy>,
    pub organized_dir: Option<String>,
}

/// `[filters]` table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterSection {
    #[serde(default)]
    pub exclude: ExcludeRules,
}

/// `[filters.exclude]` table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExcludeRules {
    /// Extensions replacing the built-in exclusion defaults.
    #[serde(default)]
    pub extensions: Vec<String>,
    /// Glob patterns matched against the path relative to the scanned directory.
    #[serde(default)]
    pub patterns: Vec<String>,
    /// Regexes matched against the file name.
    #[serde(default)]
    pub regex: Vec<String>,
}

impl FileConfig {
    /// Load configuration, falling back to defaults.
    ///
    /// Lookup order:
    /// 1. `config_path`, if provided (must exist)
    /// 2. `.dlorganizerc.toml` in the current directory
    /// 3. `dlorganize/config.toml` in the user's config directory
    /// 4. defaults
    pub fn load(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = config_path {
            return Self::load_from_file(path);
        }

        let local_config = PathBuf::from(LOCAL_CONFIG_FILE);
        if local_config.exists() {
            return Self::load_from_file(&local_config);
        }

        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("dlorganize").join("config.toml");
            if user_config.exists() {
                return Self::load_from_file(&user_config);
            }
        }

        Ok(Self::default())
    }

    /// Load configuration from a specific file.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        Self::parse(&content).map_err(|reason| ConfigError::Invalid {
            path: path.to_path_buf(),
            reason,
        })
    }

    /// Parses TOML text, returning the parser's message on failure.
    pub fn parse(content: &str) -> Result<Self, String> {
        toml::from_str(content).map_err(|e| e.to_string())
    }

    /// The configured mode, validated.
    pub fn mode(&self) -> Result<Option<Mode>, ConfigError> {
        self.organize
            .mode
            .as_deref()
            .map(str::parse::<Mode>)
            .transpose()
            .map_err(ConfigError::from)
    }

    /// The configured exclusion list, or `None` to fall through to defaults.
    pub fn exclusions(&self) -> Option<ExclusionSet> {
        let extensions = &self.filters.exclude.extensions;
        if extensions.iter().all(|e| e.trim().is_empty()) {
            None
        } else {
            Some(ExclusionSet::from_extensions(extensions))
        }
    }

    /// Compiles the glob patterns, rejecting invalid ones.
    pub fn compile_patterns(&self) -> Result<Vec<Pattern>, ConfigError> {
        self.filters
            .exclude
            .patterns
            .iter()
            .map(|pattern| {
                Pattern::new(pattern).map_err(|e| ConfigError::InvalidGlobPattern {
                    pattern: pattern.clone(),
                    reason: e.to_string(),
                })
            })
            .collect()
    }

    /// Compiles the regexes, rejecting invalid ones.
    pub fn compile_regexes(&self) -> Result<Vec<Regex>, ConfigError> {
        self.filters
            .exclude
            .regex
            .iter()
            .map(|pattern| {
                Regex::new(pattern).map_err(|e| ConfigError::InvalidRegexPattern {
                    pattern: pattern.clone(),
                    reason: e.to_string(),
                })
            })
            .collect()
    }
}

/// Fully resolved, validated settings for one run.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Root of the walk.
    pub directory: PathBuf,
    pub mode: Mode,
    pub dry_run: bool,
    /// Only files modified within this many days are organized.
    pub max_age_days: Option<u32>,
    pub exclusions: ExclusionSet,
    pub on_conflict: CollisionPolicy,
    /// Organized root, relative to `directory`.
    pub organized_dir: PathBuf,
    /// Abort on the first relocation failure instead of continuing.
    pub fail_fast: bool,
    pub exclude_patterns: Vec<Pattern>,
    pub exclude_regexes: Vec<Regex>,
}

impl Settings {
    /// Settings for `directory` with every other option at its default.
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
            mode: Mode::default(),
            dry_run: false,
            max_age_days: None,
            exclusions: ExclusionSet::defaults(),
            on_conflict: CollisionPolicy::default(),
            organized_dir: PathBuf::from(DEFAULT_ORGANIZED_DIR),
            fail_fast: false,
            exclude_patterns: Vec::new(),
            exclude_regexes: Vec::new(),
        }
    }

    /// Absolute location of the organized root.
    pub fn organized_root(&self) -> PathBuf {
        self.directory.join(&self.organized_dir)
    }

    /// Builds the inclusion filter for a run starting at `now`.
    pub fn inclusion_filter(&self, now: DateTime<Local>) -> InclusionFilter {
        let cutoff = self
            .max_age_days
            .map(|days| AgeCutoff::days_before(now, days));
        InclusionFilter::new(self.exclusions.clone(), cutoff)
            .with_patterns(self.exclude_patterns.clone(), self.exclude_regexes.clone())
    }
}

/// Validates an organized directory name: relative, no `..`, not empty.
pub fn validate_organized_dir(raw: &str) -> Result<PathBuf, ConfigError> {
    let path = PathBuf::from(raw.trim());
    let plain = !path.as_os_str().is_empty()
        && path
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
        && path.components().any(|c| matches!(c, Component::Normal(_)));
    if plain {
        Ok(path)
    } else {
        Err(ConfigError::InvalidOrganizedDir(raw.to_string()))
    }
}

/// Expands a leading `~` to the home directory.
pub fn expand_home(raw: &str) -> PathBuf {
    let home = dirs::home_dir();
    match (raw, home) {
        ("~", Some(home)) => home,
        (path, Some(home)) if path.starts_with("~/") || path.starts_with("~\\") => {
            home.join(&path[2..])
        }
        (path, _) => PathBuf::from(path),
    }
}

/// The user's downloads directory, falling back to `~/Downloads`.
pub fn default_directory() -> Result<PathBuf, ConfigError> {
    dirs::download_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join("Downloads")))
        .ok_or(ConfigError::NoDefaultDirectory)
}
