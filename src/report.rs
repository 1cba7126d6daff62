//! Reporting and styled output.
//!
//! All user-facing output goes through a [`Reporter`] handed to the pipeline,
//! so the organizing code never touches a process-wide logger. The console
//! implementation colors the level tag; the in-memory implementation records
//! every line for inspection in tests.

use colored::*;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;

/// Severity of a reported line, ordered from most to least verbose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Level {
    Debug,
    Info,
    Warn,
    Error,
}

impl Level {
    /// Returns the tag printed in front of every line at this level.
    pub fn tag(&self) -> &'static str {
        match self {
            Level::Debug => "DEBUG",
            Level::Info => "INFO",
            Level::Warn => "WARNING",
            Level::Error => "ERROR",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Sink for progress and outcome messages.
///
/// Implementors only decide where a line goes and which levels are shown;
/// the convenience methods route through [`Reporter::log`] after checking
/// [`Reporter::enabled`].
pub trait Reporter {
    /// Returns true if lines at `level` should be emitted.
    fn enabled(&self, level: Level) -> bool;

    /// Emits a single line. Called only for enabled levels.
    fn log(&self, level: Level, message: &str);

    fn debug(&self, message: &str) {
        if self.enabled(Level::Debug) {
            self.log(Level::Debug, message);
        }
    }

    fn info(&self, message: &str) {
        if self.enabled(Level::Info) {
            self.log(Level::Info, message);
        }
    }

    fn warn(&self, message: &str) {
        if self.enabled(Level::Warn) {
            self.log(Level::Warn, message);
        }
    }

    fn error(&self, message: &str) {
        if self.enabled(Level::Error) {
            self.log(Level::Error, message);
        }
    }
}

/// Writes `[LEVEL] message` lines to the terminal.
///
/// Debug and info lines go to stdout, warnings and errors to stderr.
#[derive(Debug, Clone, Copy)]
pub struct ConsoleReporter {
    min_level: Level,
}

impl ConsoleReporter {
    /// Creates a reporter showing debug lines when `verbose` is set, info and above otherwise.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use dlorganize::report::{ConsoleReporter, Reporter};
    /// let reporter = ConsoleReporter::new(false);
    /// reporter.info("Scanning directory: /home/user/Downloads");
    /// ```
    pub fn new(verbose: bool) -> Self {
        Self {
            min_level: if verbose { Level::Debug } else { Level::Info },
        }
    }

    fn styled_tag(level: Level) -> ColoredString {
        let tag = format!("[{}]", level.tag());
        match level {
            Level::Debug => tag.dimmed(),
            Level::Info => tag.cyan(),
            Level::Warn => tag.yellow(),
            Level::Error => tag.red().bold(),
        }
    }
}

impl Reporter for ConsoleReporter {
    fn enabled(&self, level: Level) -> bool {
        level >= self.min_level
    }

    fn log(&self, level: Level, message: &str) {
        let tag = Self::styled_tag(level);
        match level {
            Level::Debug | Level::Info => println!("{} {}", tag, message),
            Level::Warn | Level::Error => eprintln!("{} {}", tag, message),
        }
    }
}

/// Records every emitted line in memory.
#[derive(Debug)]
pub struct MemoryReporter {
    min_level: Level,
    lines: RefCell<Vec<(Level, String)>>,
}

impl MemoryReporter {
    pub fn new(verbose: bool) -> Self {
        Self {
            min_level: if verbose { Level::Debug } else { Level::Info },
            lines: RefCell::new(Vec::new()),
        }
    }

    /// Returns a copy of all recorded lines in emission order.
    pub fn lines(&self) -> Vec<(Level, String)> {
        self.lines.borrow().clone()
    }

    /// Returns the messages recorded at exactly `level`.
    pub fn messages(&self, level: Level) -> Vec<String> {
        self.lines
            .borrow()
            .iter()
            .filter(|(l, _)| *l == level)
            .map(|(_, m)| m.clone())
            .collect()
    }

    /// Returns all messages starting with `prefix`, regardless of level.
    pub fn messages_starting_with(&self, prefix: &str) -> Vec<String> {
        self.lines
            .borrow()
            .iter()
            .filter(|(_, m)| m.starts_with(prefix))
            .map(|(_, m)| m.clone())
            .collect()
    }
}

impl Default for MemoryReporter {
    fn default() -> Self {
        Self::new(false)
    }
}

impl Reporter for MemoryReporter {
    fn enabled(&self, level: Level) -> bool {
        level >= self.min_level
    }

    fn log(&self, level: Level, message: &str) {
        self.lines.borrow_mut().push((level, message.to_string()));
    }
}

/// Emits a summary table of file counts per destination subdirectory.
///
/// ```text
/// Destination | Files
/// -------------------
/// 2023/03     | 2 files
/// 2024/11     | 1 file
/// -------------------
/// Total       | 3 files
/// ```
pub fn summary_table(reporter: &dyn Reporter, title: &str, counts: &BTreeMap<String, usize>) {
    let total: usize = counts.values().sum();
    reporter.info(title);

    if counts.is_empty() {
        reporter.info("No files to organize.");
        return;
    }

    let width = counts
        .keys()
        .map(|name| name.len())
        .max()
        .unwrap_or(0)
        .max("Destination".len());

    reporter.info(&format!("{:<width$} | Files", "Destination", width = width));
    reporter.info(&"-".repeat(width + 10));
    for (destination, count) in counts {
        reporter.info(&format!(
            "{:<width$} | {} {}",
            destination,
            count,
            file_word(*count),
            width = width
        ));
    }
    reporter.info(&"-".repeat(width + 10));
    reporter.info(&format!(
        "{:<width$} | {} {}",
        "Total",
        total,
        file_word(total),
        width = width
    ));
}

fn file_word(count: usize) -> &'static str {
    if count == 1 { "file" } else { "files" }
}
