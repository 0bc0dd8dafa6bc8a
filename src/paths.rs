//! Project path functions - single source of truth for all file paths.
//!
//! Everything the server writes lives under the configured data directory
//! (`APP_DB_PATH`, default "data"):
//!
//! ```text
//! data/
//! ├── users.json        # users snapshot
//! ├── attendance.json   # attendance snapshot
//! ├── uploads/          # archived roster uploads
//! └── exports/          # transient export files
//! ```

use chrono::{DateTime, Local, NaiveDate};
use std::path::{Path, PathBuf};

/// Default data directory when none is configured
pub const DEFAULT_DATA_DIR: &str = "data";

/// Users snapshot file name (relative to the data directory)
pub const USERS_SNAPSHOT: &str = "users.json";

/// Attendance snapshot file name (relative to the data directory)
pub const ATTENDANCE_SNAPSHOT: &str = "attendance.json";

/// Static assets served under /css and /scripts - not under the data dir
pub const STATIC_DIR: &str = "static";

/// Archived roster uploads
pub fn uploads_dir(data_dir: &Path) -> PathBuf {
    data_dir.join("uploads")
}

/// Scratch space for export files
pub fn exports_dir(data_dir: &Path) -> PathBuf {
    data_dir.join("exports")
}

/// Timestamped archive path for a roster upload
pub fn roster_archive_path(data_dir: &Path, uploaded_at: DateTime<Local>) -> PathBuf {
    uploads_dir(data_dir).join(format!(
        "studentList_{}.csv",
        uploaded_at.format("%Y-%m-%d_%H-%M-%S")
    ))
}

/// Export file path for an inclusive date range
pub fn export_path(data_dir: &Path, from: NaiveDate, to: NaiveDate) -> PathBuf {
    exports_dir(data_dir).join(export_file_name(from, to))
}

/// Download name of an export
pub fn export_file_name(from: NaiveDate, to: NaiveDate) -> String {
    format!("attendance_{}_{}.csv", from, to)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_roster_archive_path_format() {
        let at = Local.with_ymd_and_hms(2024, 2, 3, 14, 5, 9).unwrap();
        let path = roster_archive_path(Path::new("data"), at);
        assert_eq!(path, Path::new("data/uploads/studentList_2024-02-03_14-05-09.csv"));
    }

    #[test]
    fn test_export_path_format() {
        let from = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let to = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        let path = export_path(Path::new("data"), from, to);
        assert_eq!(path, Path::new("data/exports/attendance_2024-01-01_2024-01-02.csv"));
    }
}
