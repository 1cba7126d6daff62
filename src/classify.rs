//! Destination classification for files being organized.
//!
//! A [`Mode`] turns a file's modification time (and, for one mode, its
//! extension) into a relative subdirectory beneath the organized root.
//!
//! # Examples
//!
//! ```
//! use chrono::{Local, TimeZone};
//! use dlorganize::classify::Mode;
//! use std::path::{Path, PathBuf};
//!
//! let modified = Local.with_ymd_and_hms(2023, 3, 15, 12, 0, 0).unwrap();
//! assert_eq!(
//!     Mode::YearMonth.subdirectory(Path::new("notes.txt"), modified),
//!     PathBuf::from("2023").join("03")
//! );
//! assert_eq!(
//!     Mode::YearExtension.subdirectory(Path::new("report.PDF"), modified),
//!     PathBuf::from("2023").join("pdf")
//! );
//! ```

use chrono::{DateTime, Datelike, Local};
use clap::ValueEnum;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

/// Placeholder directory for files without an extension in year/extension mode.
pub const NO_EXTENSION: &str = "no_extension";

/// Strategy for deriving a destination subdirectory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, ValueEnum)]
pub enum Mode {
    /// `<year>/<two-digit month>`
    #[default]
    #[value(name = "year_month")]
    YearMonth,
    /// `<year>/<lower-cased extension>`
    #[value(name = "year_extension")]
    YearExtension,
}

/// Returned when a mode name is not one of the recognized values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid mode: {0} (expected year_month or year_extension)")]
pub struct InvalidMode(pub String);

impl Mode {
    /// Returns the name used on the command line and in config files.
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::YearMonth => "year_month",
            Mode::YearExtension => "year_extension",
        }
    }

    /// Computes the subdirectory, relative to the organized root, for a file.
    pub fn subdirectory(&self, path: &Path, modified: DateTime<Local>) -> PathBuf {
        let year = PathBuf::from(modified.year().to_string());
        match self {
            Mode::YearMonth => year.join(format!("{:02}", modified.month())),
            Mode::YearExtension => {
                let extension = file_extension(path);
                year.join(extension.as_deref().unwrap_or(NO_EXTENSION))
            }
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = InvalidMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "year_month" => Ok(Mode::YearMonth),
            "year_extension" => Ok(Mode::YearExtension),
            other => Err(InvalidMode(other.to_string())),
        }
    }
}

/// Returns the lower-cased extension of `path` without its leading dot.
///
/// Follows [`Path::extension`]: only the last suffix counts, and a leading
/// dot on a file name such as `.bashrc` is not an extension.
pub fn file_extension(path: &Path) -> Option<String> {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .filter(|ext| !ext.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(year: i32, month: u32, day: u32) -> DateTime<Local> {
        Local
            .with_ymd_and_hms(year, month, day, 12, 0, 0)
            .single()
            .expect("unambiguous local time")
    }

    #[test]
    fn test_year_month_zero_pads_month() {
        let dir = Mode::YearMonth.subdirectory(Path::new("a.txt"), at(2023, 3, 15));
        assert_eq!(dir, PathBuf::from("2023").join("03"));

        let dir = Mode::YearMonth.subdirectory(Path::new("a.txt"), at(2021, 12, 1));
        assert_eq!(dir, PathBuf::from("2021").join("12"));
    }

    #[test]
    fn test_year_extension_lowercases() {
        let dir = Mode::YearExtension.subdirectory(Path::new("report.PDF"), at(2022, 6, 1));
        assert_eq!(dir, PathBuf::from("2022").join("pdf"));
    }

    #[test]
    fn test_year_extension_placeholder_without_extension() {
        let dir = Mode::YearExtension.subdirectory(Path::new("Makefile"), at(2022, 6, 1));
        assert_eq!(dir, PathBuf::from("2022").join(NO_EXTENSION));

        // A leading dot alone is not an extension
        let dir = Mode::YearExtension.subdirectory(Path::new(".bashrc"), at(2022, 6, 1));
        assert_eq!(dir, PathBuf::from("2022").join(NO_EXTENSION));
    }

    #[test]
    fn test_year_extension_uses_last_suffix() {
        let dir = Mode::YearExtension.subdirectory(Path::new("backup.tar.GZ"), at(2020, 1, 9));
        assert_eq!(dir, PathBuf::from("2020").join("gz"));
    }

    #[test]
    fn test_mode_from_str() {
        assert_eq!("year_month".parse::<Mode>(), Ok(Mode::YearMonth));
        assert_eq!("year_extension".parse::<Mode>(), Ok(Mode::YearExtension));
        assert_eq!(
            "by_size".parse::<Mode>(),
            Err(InvalidMode("by_size".to_string()))
        );
    }

    #[test]
    fn test_mode_round_trips_through_name() {
        for mode in [Mode::YearMonth, Mode::YearExtension] {
            assert_eq!(mode.as_str().parse::<Mode>(), Ok(mode));
        }
        assert_eq!(Mode::default(), Mode::YearMonth);
    }

    #[test]
    fn test_file_extension() {
        assert_eq!(file_extension(Path::new("a.Txt")), Some("txt".to_string()));
        assert_eq!(file_extension(Path::new("README")), None);
        assert_eq!(file_extension(Path::new("trailing.")), None);
    }
}
