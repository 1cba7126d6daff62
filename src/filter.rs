//! Inclusion filtering for scanned files.
//!
//! A file is organized only when it passes every predicate:
//! - its extension is not in the [`ExclusionSet`]
//! - it was modified at or after the [`AgeCutoff`], when one is configured
//! - it matches none of the extra glob or regex patterns from the config file
//!
//! # Examples
//!
//! ```
//! use dlorganize::filter::ExclusionSet;
//! use std::path::Path;
//!
//! let set = ExclusionSet::parse(Some("TMP,.part"));
//! assert!(set.matches(Path::new("video.part")));
//! assert!(set.matches(Path::new("scratch.tmp")));
//! assert!(!set.matches(Path::new("photo.jpg")));
//! ```

use chrono::{DateTime, Local, TimeDelta};
use glob::Pattern;
use regex::Regex;
use std::collections::BTreeSet;
use std::fmt;
use std::path::Path;

use crate::classify::file_extension;

/// Extensions of incomplete downloads and OS metadata, excluded unless overridden.
pub const DEFAULT_EXCLUDED_EXTENSIONS: &[&str] = &[".tmp", ".crdownload", ".part", ".ds_store"];

/// A set of normalized extensions: lower-case, always starting with `.`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExclusionSet {
    extensions: BTreeSet<String>,
}

impl ExclusionSet {
    /// Returns the built-in set of [`DEFAULT_EXCLUDED_EXTENSIONS`].
    pub fn defaults() -> Self {
        Self::from_extensions(DEFAULT_EXCLUDED_EXTENSIONS.iter().copied())
    }

    /// Builds a set from a comma-separated list such as `".tmp,part, LOG"`.
    ///
    /// An absent or blank list yields [`ExclusionSet::defaults`].
    pub fn parse(raw: Option<&str>) -> Self {
        match raw {
            Some(list) if !list.trim().is_empty() => Self::from_extensions(list.split(',')),
            _ => Self::defaults(),
        }
    }

    /// Builds a set from individual extension tokens, normalizing each one.
    ///
    /// Blank tokens are dropped; no other validation is done.
    pub fn from_extensions<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            extensions: tokens
                .into_iter()
                .filter_map(|token| Self::normalize(token.as_ref()))
                .collect(),
        }
    }

    /// Normalizes one token to the `.ext` lower-case form.
    pub fn normalize(token: &str) -> Option<String> {
        let token = token.trim();
        if token.is_empty() {
            return None;
        }
        let lower = token.to_lowercase();
        if lower.starts_with('.') {
            Some(lower)
        } else {
            Some(format!(".{}", lower))
        }
    }

    /// Exact-match membership test on an already normalized extension.
    pub fn contains(&self, extension: &str) -> bool {
        self.extensions.contains(extension)
    }

    /// Returns true if the file at `path` carries an excluded extension.
    ///
    /// Dotfiles without a further suffix (`.DS_Store`) are matched by their
    /// whole lower-cased name.
    pub fn matches(&self, path: &Path) -> bool {
        if let Some(ext) = file_extension(path) {
            return self.contains(&format!(".{}", ext));
        }
        path.file_name()
            .map(|name| name.to_string_lossy().to_lowercase())
            .is_some_and(|name| name.starts_with('.') && self.contains(&name))
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.extensions.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.extensions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.extensions.is_empty()
    }
}

impl Default for ExclusionSet {
    fn default() -> Self {
        Self::defaults()
    }
}

impl fmt::Display for ExclusionSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined: Vec<&str> = self.iter().collect();
        write!(f, "{{{}}}", joined.join(", "))
    }
}

/// Lower bound on modification time: files strictly older are excluded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AgeCutoff {
    oldest: Option<DateTime<Local>>,
}

impl AgeCutoff {
    /// Admits files modified within the last `days` days as seen from `now`.
    pub fn days_before(now: DateTime<Local>, days: u32) -> Self {
        let oldest = TimeDelta::try_days(i64::from(days)).and_then(|d| now.checked_sub_signed(d));
        Self { oldest }
    }

    /// The earliest admitted modification time, if representable.
    pub fn oldest(&self) -> Option<DateTime<Local>> {
        self.oldest
    }

    /// Inclusive: a file modified exactly at the boundary is admitted.
    pub fn admits(&self, modified: DateTime<Local>) -> bool {
        self.oldest.is_none_or(|oldest| modified >= oldest)
    }
}

/// Why a file was left out of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExcludeReason {
    /// The extension is in the exclusion set.
    Extension,
    /// Modified before the age cutoff.
    TooOld,
    /// Matched a glob pattern from the config file.
    Pattern(String),
    /// Matched a regex from the config file.
    Regex(String),
}

impl fmt::Display for ExcludeReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExcludeReason::Extension => write!(f, "excluded extension"),
            ExcludeReason::TooOld => write!(f, "older than the age cutoff"),
            ExcludeReason::Pattern(p) => write!(f, "matches pattern '{}'", p),
            ExcludeReason::Regex(r) => write!(f, "matches regex '{}'", r),
        }
    }
}

/// All inclusion predicates of a run, compiled once.
#[derive(Debug, Clone)]
pub struct InclusionFilter {
    exclusions: ExclusionSet,
    cutoff: Option<AgeCutoff>,
    patterns: Vec<Pattern>,
    regexes: Vec<Regex>,
}

impl InclusionFilter {
    pub fn new(exclusions: ExclusionSet, cutoff: Option<AgeCutoff>) -> Self {
        Self {
            exclusions,
            cutoff,
            patterns: Vec::new(),
            regexes: Vec::new(),
        }
    }

    /// Adds glob patterns (matched against the path relative to the scan root)
    /// and regexes (matched against the file name).
    pub fn with_patterns(mut self, patterns: Vec<Pattern>, regexes: Vec<Regex>) -> Self {
        self.patterns = patterns;
        self.regexes = regexes;
        self
    }

    pub fn exclusions(&self) -> &ExclusionSet {
        &self.exclusions
    }

    /// Returns the first failing predicate, or `None` if the file is included.
    ///
    /// Checks run in order: extension, age, glob patterns, regexes.
    pub fn exclusion_reason(
        &self,
        relative_path: &Path,
        modified: DateTime<Local>,
    ) -> Option<ExcludeReason> {
        if self.exclusions.matches(relative_path) {
            return Some(ExcludeReason::Extension);
        }

        if let Some(cutoff) = self.cutoff
            && !cutoff.admits(modified)
        {
            return Some(ExcludeReason::TooOld);
        }

        if let Some(pattern) = self
            .patterns
            .iter()
            .find(|pattern| pattern.matches_path(relative_path))
        {
            return Some(ExcludeReason::Pattern(pattern.as_str().to_string()));
        }

        let file_name = relative_path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_default();
        self.regexes
            .iter()
            .find(|regex| regex.is_match(&file_name))
            .map(|regex| ExcludeReason::Regex(regex.as_str().to_string()))
    }

    pub fn should_include(&self, relative_path: &Path, modified: DateTime<Local>) -> bool {
        self.exclusion_reason(relative_path, modified).is_none()
    }
}
