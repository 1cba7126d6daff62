//! dlorganize - sort a downloads folder by date
//!
//! This library walks a directory tree, filters out incomplete downloads and
//! files outside an age window, and moves everything else into an
//! `organized/` tree laid out by year and month or by year and extension.
//! A dry run reports every planned move without touching the filesystem.

pub mod classify;
pub mod cli;
pub mod config;
pub mod filter;
pub mod organizer;
pub mod report;
pub mod walker;

pub use classify::Mode;
pub use cli::{Cli, CliError, RunSummary, run_cli, run_organize};
pub use config::{ConfigError, FileConfig, Settings};
pub use filter::{ExclusionSet, InclusionFilter};
pub use organizer::{CollisionPolicy, FileOrganizer, OrganizeError};
pub use report::{ConsoleReporter, MemoryReporter, Reporter};
