//! Command-line interface module for dlorganize.
//!
//! This module handles:
//! - Flag parsing and validation
//! - Merging flags with the config file into [`Settings`]
//! - The walk → filter → classify → relocate pipeline
//! - The closing summary

use chrono::Local;
use clap::Parser;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::classify::Mode;
use crate::config::{
    ConfigError, FileConfig, Settings, default_directory, expand_home, validate_organized_dir,
};
use crate::filter::ExclusionSet;
use crate::organizer::{CollisionPolicy, FileOrganizer, MoveOutcome, OrganizeError, Relocation};
use crate::report::{Reporter, summary_table};
use crate::walker::DirectoryWalker;

/// Organize files into year/month or year/extension folders.
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "dlorganize", author, version, about, long_about = None)]
pub struct Cli {
    /// Directory to organize (default: your Downloads folder)
    #[arg(long, value_name = "PATH")]
    pub dir: Option<String>,

    /// Organization mode
    #[arg(long, value_enum, value_name = "MODE")]
    pub mode: Option<Mode>,

    /// Simulate actions without moving files
    #[arg(long)]
    pub dry_run: bool,

    /// Only include files modified in the last N days
    #[arg(long, value_name = "N")]
    pub days: Option<u32>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Comma-separated list of file extensions to exclude (e.g. .tmp,.part)
    #[arg(long, value_name = "LIST")]
    pub exclude_exts: Option<String>,

    /// What to do when a file with the same name already exists at the destination
    #[arg(long, value_enum, value_name = "POLICY")]
    pub on_conflict: Option<CollisionPolicy>,

    /// Stop at the first file that cannot be moved
    #[arg(long)]
    pub fail_fast: bool,

    /// Path to a TOML configuration file
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Print the run summary as JSON
    #[arg(long)]
    pub json: bool,
}

impl Cli {
    /// Applies these flags on top of a loaded config file.
    ///
    /// Every value is validated here, before any file is touched.
    pub fn resolve(&self, file: &FileConfig) -> Result<Settings, ConfigError> {
        let directory = match self.dir.as_deref().or(file.organize.dir.as_deref()) {
            Some(raw) => expand_home(raw),
            None => default_directory()?,
        };

        let mode = match self.mode {
            Some(mode) => mode,
            None => file.mode()?.unwrap_or_default(),
        };

        let exclusions = match self.exclude_exts.as_deref() {
            Some(raw) if !raw.trim().is_empty() => ExclusionSet::parse(Some(raw)),
            _ => file.exclusions().unwrap_or_default(),
        };

        let organized_dir = match file.organize.organized_dir.as_deref() {
            Some(raw) => validate_organized_dir(raw)?,
            None => PathBuf::from(crate::config::DEFAULT_ORGANIZED_DIR),
        };

        Ok(Settings {
            directory,
            mode,
            dry_run: self.dry_run,
            max_age_days: self.days.or(file.organize.days),
            exclusions,
            on_conflict: self
                .on_conflict
                .or(file.organize.on_conflict)
                .unwrap_or_default(),
            organized_dir,
            fail_fast: self.fail_fast,
            exclude_patterns: file.compile_patterns()?,
            exclude_regexes: file.compile_regexes()?,
        })
    }
}

/// Errors that end a run.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("Directory not found: {}", .0.display())]
    DirectoryNotFound(PathBuf),
    #[error("Not a directory: {}", .0.display())]
    NotADirectory(PathBuf),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Organize(#[from] OrganizeError),
    #[error("Failed to serialize summary: {0}")]
    Summary(#[from] serde_json::Error),
}

/// Counts and relocations of a completed run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub dry_run: bool,
    /// Regular files found outside the organized root.
    pub scanned: usize,
    /// Files left alone by the inclusion filter.
    pub excluded: usize,
    pub moved: usize,
    /// Files a dry run would have moved.
    pub previewed: usize,
    /// Files left in place because the destination was occupied.
    pub skipped: usize,
    pub failed: usize,
    /// Entries the walk could not read.
    pub unreadable: usize,
    /// Moved or previewed files per destination subdirectory.
    pub by_destination: BTreeMap<String, usize>,
    pub relocations: Vec<Relocation>,
}

impl RunSummary {
    /// True when every included file was handled without error.
    pub fn is_success(&self) -> bool {
        self.failed == 0
    }
}

/// Loads the config, resolves settings, and runs the organizer.
///
/// # Examples
///
/// ```no_run
/// use clap::Parser;
/// use dlorganize::cli::{Cli, run_cli};
/// use dlorganize::report::ConsoleReporter;
///
/// let cli = Cli::parse_from(["dlorganize", "--dir", "~/Downloads", "--dry-run"]);
/// let reporter = ConsoleReporter::new(cli.verbose);
/// match run_cli(&cli, &reporter) {
///     Ok(summary) => println!("{} files previewed", summary.previewed),
///     Err(e) => eprintln!("Error: {}", e),
/// }
/// ```
pub fn run_cli(cli: &Cli, reporter: &dyn Reporter) -> Result<RunSummary, CliError> {
    let file_config = FileConfig::load(cli.config.as_deref())?;
    let settings = cli.resolve(&file_config)?;
    let summary = run_organize(&settings, reporter)?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    }

    Ok(summary)
}

/// Organizes `settings.directory` into its organized root.
///
/// This function:
/// 1. Validates that the directory exists
/// 2. Walks it recursively, skipping the organized root
/// 3. Applies the inclusion filter to every regular file
/// 4. Classifies each included file by the selected mode
/// 5. Moves it, or in a dry run only reports the move
///
/// A failed move is reported and counted, then the run continues unless
/// `settings.fail_fast` is set. Files moved before an abort stay moved.
pub fn run_organize(settings: &Settings, reporter: &dyn Reporter) -> Result<RunSummary, CliError> {
    let root = settings.directory.as_path();
    if !root.exists() {
        return Err(CliError::DirectoryNotFound(root.to_path_buf()));
    }
    if !root.is_dir() {
        return Err(CliError::NotADirectory(root.to_path_buf()));
    }

    let organized_root = settings.organized_root();
    let mut organizer = FileOrganizer::new(&organized_root, settings.on_conflict);
    let filter = settings.inclusion_filter(Local::now());

    reporter.info(&format!("Scanning directory: {}", root.display()));
    if filter.exclusions().is_empty() {
        reporter.debug("Excluded extensions: none");
    } else {
        reporter.debug(&format!("Excluded extensions: {}", filter.exclusions()));
    }
    reporter.debug(&format!(
        "Mode: {}, conflict policy: {:?}",
        settings.mode,
        organizer.policy()
    ));

    let scan = DirectoryWalker::new(root).skip_dir(&organized_root).scan();

    let mut summary = RunSummary {
        dry_run: settings.dry_run,
        ..RunSummary::default()
    };

    for error in &scan.errors {
        reporter.warn(&error.to_string());
        summary.unreadable += 1;
    }

    for entry in &scan.files {
        summary.scanned += 1;

        if let Some(reason) = filter.exclusion_reason(&entry.relative, entry.modified) {
            reporter.debug(&format!("Skipping {}: {}", entry.relative.display(), reason));
            summary.excluded += 1;
            continue;
        }

        let subdirectory = settings.mode.subdirectory(&entry.path, entry.modified);
        match relocate(&mut organizer, &entry.path, &subdirectory, settings.dry_run, reporter) {
            Ok((relocation, outcome)) => record(&mut summary, relocation, outcome, settings.dry_run),
            Err(e) if settings.fail_fast => return Err(e.into()),
            Err(e) => {
                reporter.error(&e.to_string());
                summary.failed += 1;
            }
        }
    }

    let title = if settings.dry_run {
        "DRY RUN SUMMARY (no files were modified)"
    } else {
        "SUMMARY"
    };
    summary_table(reporter, title, &summary.by_destination);
    if summary.skipped > 0 {
        reporter.warn(&format!(
            "{} file(s) left in place because the destination already exists",
            summary.skipped
        ));
    }
    if summary.failed > 0 {
        reporter.error(&format!(
            "{} file(s) could not be organized. Please review errors above.",
            summary.failed
        ));
    }

    Ok(summary)
}

/// Plans one file's move and performs it, or only reports it in a dry run.
fn relocate(
    organizer: &mut FileOrganizer,
    source: &Path,
    subdirectory: &Path,
    dry_run: bool,
    reporter: &dyn Reporter,
) -> Result<(Relocation, MoveOutcome), OrganizeError> {
    let relocation = organizer.plan(source, subdirectory)?;
    let name = relocation.file_name();

    let outcome = if dry_run {
        organizer.preview(&relocation)
    } else {
        organizer.execute(&relocation)?
    };

    match (&outcome, dry_run) {
        (MoveOutcome::Moved(target), true) => {
            reporter.info(&format!("[Dry run] Would move: {} → {}", name, target.display()));
        }
        (MoveOutcome::Moved(target), false) => {
            reporter.info(&format!("Moved: {} → {}", name, target.display()));
        }
        (MoveOutcome::Skipped(existing), true) => {
            reporter.warn(&format!(
                "[Dry run] Would skip: {} ({} already exists)",
                name,
                existing.display()
            ));
        }
        (MoveOutcome::Skipped(existing), false) => {
            reporter.warn(&format!(
                "Skipped: {} ({} already exists)",
                name,
                existing.display()
            ));
        }
    }

    Ok((relocation, outcome))
}

fn record(summary: &mut RunSummary, mut relocation: Relocation, outcome: MoveOutcome, dry_run: bool) {
    match outcome {
        MoveOutcome::Moved(target) => {
            if dry_run {
                summary.previewed += 1;
            } else {
                summary.moved += 1;
            }
            *summary
                .by_destination
                .entry(display_key(&relocation.subdirectory))
                .or_insert(0) += 1;
            relocation.destination = target;
            summary.relocations.push(relocation);
        }
        MoveOutcome::Skipped(_) => summary.skipped += 1,
    }
}

/// Joins path components with `/` for stable summary keys.
fn display_key(subdirectory: &Path) -> String {
    subdirectory
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
