//! Per-day attendance reports and their CSV export.

use chrono::NaiveDate;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

use super::csv;
use crate::attendance::format_check_in_time;
use crate::error::AppError;
use crate::paths;
use crate::store::{Store, ADMIN_ID};

pub const EXPORT_HEADER: [&str; 4] = ["Date", "ID", "Name", "Check-in Time"];

/// Shown in every column but the date when nobody checked in that day
const PLACEHOLDER: &str = "-";

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Longest range a single report may span
pub const MAX_RANGE_DAYS: i64 = 5 * 366;

/// Inclusive range of days
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl DateRange {
    /// Parse two `YYYY-MM-DD` bounds. `from` must not be after `to`.
    pub fn parse(from: &str, to: &str) -> Result<Self, AppError> {
        let parse_day = |raw: &str, field: &str| {
            NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT)
                .map_err(|_| AppError::BadRequest(format!("Invalid {} date: {:?}", field, raw)))
        };
        let from = parse_day(from, "start")?;
        let to = parse_day(to, "end")?;
        if from > to {
            return Err(AppError::BadRequest(
                "Start date must not be after end date".into(),
            ));
        }
        if (to - from).num_days() >= MAX_RANGE_DAYS {
            return Err(AppError::BadRequest(format!(
                "Date range must not exceed {} days",
                MAX_RANGE_DAYS
            )));
        }
        Ok(Self { from, to })
    }

    pub fn days(self) -> impl Iterator<Item = NaiveDate> {
        let to = self.to;
        self.from.iter_days().take_while(move |d| *d <= to)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportEntry {
    pub id: String,
    pub name: String,
    pub checked_in_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayReport {
    pub date: NaiveDate,
    /// Sorted by user ID; empty when nobody checked in
    pub entries: Vec<ReportEntry>,
}

/// Collect check-ins of non-admin users for every day in `range`.
///
/// Users that have since left the roster still show up, by ID only.
pub fn build_report(store: &Store, range: DateRange) -> Result<Vec<DayReport>, AppError> {
    let users = store.users.get_all()?;

    range
        .days()
        .map(|date| -> Result<DayReport, AppError> {
            let records = store.attendance.get_day(date)?.unwrap_or_default();
            let mut entries: Vec<ReportEntry> = records
                .into_iter()
                .filter(|(id, _)| id != ADMIN_ID)
                .map(|(id, at)| ReportEntry {
                    name: users.get(&id).map(|u| u.full_name()).unwrap_or_default(),
                    checked_in_at: format_check_in_time(at),
                    id,
                })
                .collect();
            entries.sort_by(|a, b| a.id.cmp(&b.id));
            Ok(DayReport { date, entries })
        })
        .collect()
}

/// Flatten a report into CSV records, header first
pub fn export_rows(report: &[DayReport]) -> Vec<Vec<String>> {
    let mut rows = vec![EXPORT_HEADER.iter().map(|h| h.to_string()).collect()];
    for day in report {
        let date = day.date.format(DATE_FORMAT).to_string();
        if day.entries.is_empty() {
            rows.push(vec![
                date,
                PLACEHOLDER.into(),
                PLACEHOLDER.into(),
                PLACEHOLDER.into(),
            ]);
            continue;
        }
        for entry in &day.entries {
            rows.push(vec![
                date.clone(),
                entry.id.clone(),
                entry.name.clone(),
                entry.checked_in_at.clone(),
            ]);
        }
    }
    rows
}

/// Writes exports through a temp file under `<data>/exports`.
///
/// Exports for the same range share a file name, so the whole
/// write-read-delete sequence runs under one async lock.
pub struct Exporter {
    data_dir: PathBuf,
    lock: Mutex<()>,
}

impl Exporter {
    pub fn new<P: AsRef<Path>>(data_dir: P) -> Self {
        Self {
            data_dir: data_dir.as_ref().to_path_buf(),
            lock: Mutex::new(()),
        }
    }

    /// Build the CSV for `range`, returning the download name and bytes.
    pub async fn export(
        &self,
        store: &Store,
        range: DateRange,
    ) -> Result<(String, Vec<u8>), AppError> {
        let report = build_report(store, range)?;
        let body = csv::write(&export_rows(&report));
        let path = paths::export_path(&self.data_dir, range.from, range.to);

        let _guard = self.lock.lock().await;
        let bytes = write_read_delete(&path, body.as_bytes())
            .await
            .map_err(|e| AppError::Internal(format!("export {}: {}", path.display(), e)))?;

        tracing::info!(
            "Exported attendance {}..{} ({} days)",
            range.from,
            range.to,
            report.len()
        );
        Ok((paths::export_file_name(range.from, range.to), bytes))
    }
}

async fn write_read_delete(path: &Path, body: &[u8]) -> std::io::Result<Vec<u8>> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, body).await?;
    let bytes = tokio::fs::read(path).await?;
    if let Err(e) = tokio::fs::remove_file(path).await {
        tracing::warn!("Failed to remove export file {}: {}", path.display(), e);
    }
    Ok(bytes)
}
