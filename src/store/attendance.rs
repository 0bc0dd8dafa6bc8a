//! Attendance mapping (calendar day → identifier → check-in time).
//!
//! The day key is the local calendar date, i.e. the check-in time truncated
//! to local midnight. Entries are write-once: [`AttendanceLog::record`] never
//! overwrites an existing (day, user) pair.

use chrono::{DateTime, Local, NaiveDate};
use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

use super::{try_lock, StoreLockError};

/// Check-ins of a single day
pub type DayRecords = HashMap<String, DateTime<Local>>;

#[derive(Default)]
pub struct AttendanceLog {
    inner: Mutex<BTreeMap<NaiveDate, DayRecords>>,
}

impl AttendanceLog {
    pub fn from_map(map: BTreeMap<NaiveDate, DayRecords>) -> Self {
        Self {
            inner: Mutex::new(map),
        }
    }

    /// Copy of one day's records; callers never see the shared map
    pub fn get_day(&self, day: NaiveDate) -> Result<Option<DayRecords>, StoreLockError> {
        Ok(try_lock(&self.inner)?.get(&day).cloned())
    }

    pub fn get(&self, day: NaiveDate, user_id: &str) -> Result<Option<DateTime<Local>>, StoreLockError> {
        Ok(try_lock(&self.inner)?
            .get(&day)
            .and_then(|records| records.get(user_id))
            .copied())
    }

    /// Deep copy of the whole log
    pub fn get_all(&self) -> Result<BTreeMap<NaiveDate, DayRecords>, StoreLockError> {
        Ok(try_lock(&self.inner)?.clone())
    }

    pub fn is_checked_in(&self, day: NaiveDate, user_id: &str) -> Result<bool, StoreLockError> {
        Ok(self.get(day, user_id)?.is_some())
    }

    /// Record a check-in unless one already exists for (day, user).
    ///
    /// Returns `true` when the entry was written. The membership check and
    /// the insert run under the same lock.
    pub fn record(
        &self,
        day: NaiveDate,
        user_id: &str,
        at: DateTime<Local>,
    ) -> Result<bool, StoreLockError> {
        let mut log = try_lock(&self.inner)?;
        let records = log.entry(day).or_default();
        if records.contains_key(user_id) {
            return Ok(false);
        }
        records.insert(user_id.to_string(), at);
        Ok(true)
    }

    pub fn day_count(&self) -> Result<usize, StoreLockError> {
        Ok(try_lock(&self.inner)?.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::sync::{Arc, Barrier};
    use std::thread;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
    }

    fn at(hour: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 1, 1, hour, 0, 0).unwrap()
    }

    #[test]
    fn test_record_is_write_once() {
        let log = AttendanceLog::default();
        assert!(log.record(day(), "A1", at(9)).unwrap());
        assert!(!log.record(day(), "A1", at(10)).unwrap());

        assert_eq!(log.get(day(), "A1").unwrap(), Some(at(9)));
        assert_eq!(log.get_day(day()).unwrap().unwrap().len(), 1);
    }

    #[test]
    fn test_get_day_returns_copy() {
        let log = AttendanceLog::default();
        log.record(day(), "A1", at(9)).unwrap();

        let mut copy = log.get_day(day()).unwrap().unwrap();
        copy.insert("B2".into(), at(11));
        copy.remove("A1");

        assert!(log.is_checked_in(day(), "A1").unwrap());
        assert!(!log.is_checked_in(day(), "B2").unwrap());
    }

    #[test]
    fn test_missing_day() {
        let log = AttendanceLog::default();
        assert!(log.get_day(day()).unwrap().is_none());
        assert!(!log.is_checked_in(day(), "A1").unwrap());
    }

    #[test]
    fn test_concurrent_records_single_winner() {
        let log = Arc::new(AttendanceLog::default());
        let barrier = Arc::new(Barrier::new(8));

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let log = Arc::clone(&log);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    log.record(day(), "A1", at(8 + i)).unwrap()
                })
            })
            .collect();

        let wins = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|won| *won)
            .count();

        assert_eq!(wins, 1);
        assert_eq!(log.get_day(day()).unwrap().unwrap().len(), 1);
    }
}
