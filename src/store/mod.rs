//! Authoritative in-memory state: users, sessions and attendance.
//!
//! Each mapping sits behind its own mutex; there is no global lock. Users
//! and attendance are loaded from JSON snapshots at startup and written back
//! through [`SnapshotStore`] after mutations. Sessions are never persisted.

pub mod attendance;
pub mod sessions;
pub mod users;

use std::sync::{Mutex, MutexGuard, PoisonError};
use thiserror::Error;

use crate::paths;
use crate::persistence::{PersistenceError, SnapshotStore};

pub use attendance::{AttendanceLog, DayRecords};
pub use sessions::Sessions;
pub use users::{RegisterError, Upsert, User, Users, ADMIN_ID};

/// Error returned when a mapping lock cannot be acquired
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("state store unavailable")]
pub struct StoreLockError;

/// Try to acquire a mapping lock, returning an error if poisoned
pub(crate) fn try_lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>, StoreLockError> {
    mutex.lock().map_err(|_: PoisonError<_>| {
        tracing::error!("State mutex poisoned - a thread panicked while holding the lock");
        StoreLockError
    })
}

#[derive(Error, Debug)]
pub enum FlushError {
    #[error(transparent)]
    Lock(#[from] StoreLockError),

    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

pub struct Store {
    pub users: Users,
    pub sessions: Sessions,
    pub attendance: AttendanceLog,
    snapshots: SnapshotStore,
    // Serialize whole-file writes so an older snapshot never lands last.
    users_flush: Mutex<()>,
    attendance_flush: Mutex<()>,
}

impl Store {
    /// Empty store backed by `snapshots`
    pub fn new(snapshots: SnapshotStore) -> Self {
        Self::with_state(snapshots, Users::default(), AttendanceLog::default())
    }

    /// Load users and attendance from disk.
    ///
    /// Missing or empty snapshots start empty; a malformed snapshot is an error
    /// the caller must treat as fatal.
    pub fn load(snapshots: SnapshotStore) -> Result<Self, PersistenceError> {
        let users = snapshots
            .read(paths::USERS_SNAPSHOT)?
            .map(Users::from_map)
            .unwrap_or_default();
        let attendance = snapshots
            .read(paths::ATTENDANCE_SNAPSHOT)?
            .map(AttendanceLog::from_map)
            .unwrap_or_default();

        tracing::info!(
            "Loaded state from {}: {} users, {} attendance days",
            snapshots.root().display(),
            users.len().unwrap_or(0),
            attendance.day_count().unwrap_or(0),
        );

        Ok(Self::with_state(snapshots, users, attendance))
    }

    fn with_state(snapshots: SnapshotStore, users: Users, attendance: AttendanceLog) -> Self {
        Self {
            users,
            sessions: Sessions::default(),
            attendance,
            snapshots,
            users_flush: Mutex::new(()),
            attendance_flush: Mutex::new(()),
        }
    }

    /// Write the current users mapping to `users.json`
    pub fn flush_users(&self) -> Result<(), FlushError> {
        let _guard = try_lock(&self.users_flush)?;
        let snapshot = self.users.get_all()?;
        self.snapshots.write(paths::USERS_SNAPSHOT, &snapshot)?;
        tracing::debug!("Flushed {} users", snapshot.len());
        Ok(())
    }

    /// Write the current attendance mapping to `attendance.json`
    pub fn flush_attendance(&self) -> Result<(), FlushError> {
        let _guard = try_lock(&self.attendance_flush)?;
        let snapshot = self.attendance.get_all()?;
        self.snapshots.write(paths::ATTENDANCE_SNAPSHOT, &snapshot)?;
        tracing::debug!("Flushed attendance for {} days", snapshot.len());
        Ok(())
    }
}
