//! Roster import and attendance export.
//!
//! ## Roster format
//! ```text
//! ID,First,Last
//! A1,Jane,Doe
//! ```
//! The whole upload is validated before any user is touched, so a rejected
//! file leaves the store unchanged.

pub mod csv;
pub mod export;

use chrono::{DateTime, Local};
use std::path::{Path, PathBuf};

use crate::error::{AppError, LogOnError};
use crate::paths;
use crate::store::{Store, Upsert, ADMIN_ID};

pub use export::{DateRange, DayReport, Exporter, ReportEntry};

/// Required header, compared case-sensitively after trimming
pub const ROSTER_HEADER: [&str; 3] = ["ID", "First", "Last"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RosterRow {
    pub id: String,
    pub first: String,
    pub last: String,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ImportSummary {
    pub created: usize,
    pub updated: usize,
    pub skipped: usize,
}

/// Validate an upload and turn it into roster rows
pub fn parse_roster(file_name: &str, bytes: &[u8]) -> Result<Vec<RosterRow>, AppError> {
    if !file_name.to_ascii_lowercase().ends_with(".csv") {
        return Err(AppError::BadRequest(
            "Invalid file format. Please upload a .csv file".into(),
        ));
    }

    let text = std::str::from_utf8(bytes)
        .map_err(|_| AppError::BadRequest("Roster file must be UTF-8 text".into()))?;
    let records = csv::parse(text)
        .map_err(|e| AppError::BadRequest(format!("Error processing CSV file ({})", e)))?;

    let mut records = records.into_iter();
    let header = records
        .next()
        .ok_or_else(|| AppError::BadRequest("Roster file is empty".into()))?;
    let header_ok = header.len() == ROSTER_HEADER.len()
        && header.iter().zip(ROSTER_HEADER).all(|(got, want)| got.trim() == want);
    if !header_ok {
        return Err(AppError::BadRequest(format!(
            "Roster header must be {}",
            ROSTER_HEADER.join(",")
        )));
    }

    records
        .enumerate()
        .map(|(i, record)| {
            // Row numbers as a spreadsheet shows them (header is row 1)
            let row_number = i + 2;
            match record.as_slice() {
                [id, first, last] if !id.trim().is_empty() => Ok(RosterRow {
                    id: id.trim().to_string(),
                    first: first.trim().to_string(),
                    last: last.trim().to_string(),
                }),
                [_, _, _] => Err(AppError::BadRequest(format!("Row {} has an empty ID", row_number))),
                _ => Err(AppError::BadRequest(format!(
                    "Row {} has {} columns, expected {}",
                    row_number,
                    record.len(),
                    ROSTER_HEADER.len()
                ))),
            }
        })
        .collect()
}

/// Upsert every row into the users mapping, then persist users.
pub fn apply_roster(store: &Store, rows: &[RosterRow]) -> Result<ImportSummary, AppError> {
    let mut summary = ImportSummary::default();
    for row in rows {
        if row.id == ADMIN_ID {
            tracing::warn!("Skipping reserved ID {:?} in roster", ADMIN_ID);
            summary.skipped += 1;
            continue;
        }
        match store.users.upsert_roster_entry(&row.id, &row.first, &row.last)? {
            Upsert::Created => summary.created += 1,
            Upsert::Updated => summary.updated += 1,
        }
    }

    store.flush_users().log_warn("Failed to write users snapshot");
    Ok(summary)
}

/// Keep a timestamped copy of the raw upload
pub fn archive_upload(
    data_dir: &Path,
    bytes: &[u8],
    uploaded_at: DateTime<Local>,
) -> std::io::Result<PathBuf> {
    std::fs::create_dir_all(paths::uploads_dir(data_dir))?;
    let path = paths::roster_archive_path(data_dir, uploaded_at);
    std::fs::write(&path, bytes)?;
    Ok(path)
}

/// Full import: validate, apply, then archive the upload.
///
/// The archive write is awaited but its failure is only logged.
pub async fn import_roster(
    store: &Store,
    data_dir: &Path,
    file_name: &str,
    bytes: Vec<u8>,
    uploaded_at: DateTime<Local>,
) -> Result<ImportSummary, AppError> {
    let rows = parse_roster(file_name, &bytes)?;
    let summary = apply_roster(store, &rows)?;
    tracing::info!(
        "Imported roster {}: {} created, {} updated, {} skipped",
        file_name,
        summary.created,
        summary.updated,
        summary.skipped
    );

    let data_dir = data_dir.to_path_buf();
    match tokio::task::spawn_blocking(move || archive_upload(&data_dir, &bytes, uploaded_at)).await {
        Ok(Ok(path)) => tracing::debug!("Archived roster upload to {}", path.display()),
        Ok(Err(e)) => tracing::warn!("Failed to archive roster upload: {}", e),
        Err(e) => tracing::warn!("Roster archive task failed: {}", e),
    }

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::TestEnv;
    use chrono::TimeZone;

    const ROSTER: &[u8] = b"ID,First,Last\nA1,Jane,Doe\nB2,John,Smith\n";

    #[test]
    fn test_parse_valid_roster() {
        let rows = parse_roster("students.csv", ROSTER).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(
            rows[0],
            RosterRow {
                id: "A1".into(),
                first: "Jane".into(),
                last: "Doe".into()
            }
        );
    }

    #[test]
    fn test_parse_rejects_extension() {
        let err = parse_roster("students.txt", ROSTER).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
        assert!(parse_roster("STUDENTS.CSV", ROSTER).is_ok());
    }

    #[test]
    fn test_parse_rejects_bad_header() {
        for body in [
            &b"Id,First,Last\nA1,Jane,Doe\n"[..],
            b"ID,First\nA1,Jane\n",
            b"ID,First,Last,Email\nA1,Jane,Doe,x\n",
            b"",
        ] {
            assert!(matches!(parse_roster("r.csv", body), Err(AppError::BadRequest(_))));
        }
    }

    #[test]
    fn test_parse_rejects_ragged_rows() {
        let err = parse_roster("r.csv", b"ID,First,Last\nA1,Jane\n").unwrap_err();
        assert!(matches!(err, AppError::BadRequest(ref m) if m.contains("Row 2")));
        let err = parse_roster("r.csv", b"ID,First,Last\n ,Jane,Doe\n").unwrap_err();
        assert!(matches!(err, AppError::BadRequest(ref m) if m.contains("empty ID")));
    }

    #[test]
    fn test_apply_creates_then_updates() {
        let env = TestEnv::new();
        let store = &env.state.store;

        let rows = parse_roster("r.csv", b"ID,First,Last\nA1,Jane,Doe\n").unwrap();
        let summary = apply_roster(store, &rows).unwrap();
        assert_eq!(summary.created, 1);
        let user = store.users.get("A1").unwrap().unwrap();
        assert_eq!(user.full_name(), "Jane Doe");
        assert!(user.password.is_empty());

        crate::auth::service::register(store, "A1", "pw").unwrap();
        let credential = store.users.get("A1").unwrap().unwrap().password;

        let rows = parse_roster("r.csv", b"ID,First,Last\nA1,Jane,Smith\n").unwrap();
        let summary = apply_roster(store, &rows).unwrap();
        assert_eq!(summary.updated, 1);
        let user = store.users.get("A1").unwrap().unwrap();
        assert_eq!(user.last, "Smith");
        assert_eq!(user.password, credential);
    }

    #[test]
    fn test_apply_skips_admin_row() {
        let env = TestEnv::new();
        let rows = parse_roster("r.csv", b"ID,First,Last\nadmin,Evil,Admin\n").unwrap();
        let summary = apply_roster(&env.state.store, &rows).unwrap();
        assert_eq!(summary.skipped, 1);
        let admin = env.state.store.users.get(ADMIN_ID).unwrap().unwrap();
        assert_eq!(admin.first, "admin");
    }

    #[tokio::test]
    async fn test_import_archives_upload() {
        let env = TestEnv::new();
        let at = Local.with_ymd_and_hms(2024, 5, 6, 7, 8, 9).unwrap();

        let summary = import_roster(&env.state.store, env.path(), "r.csv", ROSTER.to_vec(), at)
            .await
            .unwrap();

        assert_eq!(summary.created, 2);
        let archived = std::fs::read(paths::roster_archive_path(env.path(), at)).unwrap();
        assert_eq!(archived, ROSTER);
        assert!(env.path().join(paths::USERS_SNAPSHOT).exists());
    }

    #[tokio::test]
    async fn test_import_stands_when_snapshot_write_fails() {
        let env = TestEnv::new();
        std::fs::create_dir(env.path().join("users.json.tmp")).unwrap();

        let summary =
            import_roster(&env.state.store, env.path(), "r.csv", ROSTER.to_vec(), Local::now())
                .await
                .unwrap();

        assert_eq!(summary.created, 2);
        assert!(env.state.store.users.get("B2").unwrap().is_some());
        let on_disk = std::fs::read_to_string(env.path().join(paths::USERS_SNAPSHOT)).unwrap();
        assert!(!on_disk.contains("B2"));
    }

    #[tokio::test]
    async fn test_rejected_import_changes_nothing() {
        let env = TestEnv::new();
        let before = env.state.store.users.get_all().unwrap();

        let result =
            import_roster(&env.state.store, env.path(), "r.xlsx", ROSTER.to_vec(), Local::now()).await;

        assert!(matches!(result, Err(AppError::BadRequest(_))));
        assert_eq!(env.state.store.users.get_all().unwrap(), before);
        assert!(!paths::uploads_dir(env.path()).exists());
    }
}
