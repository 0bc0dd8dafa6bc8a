//! Users mapping (identifier → User).

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Mutex;
use thiserror::Error;

use super::{try_lock, StoreLockError};

/// Reserved identifier of the administrator account
pub const ADMIN_ID: &str = "admin";

/// A roster member.
///
/// `password` holds an argon2 PHC string; empty means the user was imported
/// from a roster but has not registered yet.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "ID")]
    pub id: String,
    #[serde(rename = "Password", default)]
    pub password: String,
    #[serde(rename = "First", default)]
    pub first: String,
    #[serde(rename = "Last", default)]
    pub last: String,
}

impl User {
    /// The user returned when a request carries no valid session
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn is_anonymous(&self) -> bool {
        self.id.is_empty()
    }

    pub fn is_admin(&self) -> bool {
        self.id == ADMIN_ID
    }

    pub fn is_registered(&self) -> bool {
        !self.password.is_empty()
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first, self.last)
    }
}

/// Result of a roster upsert
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upsert {
    Created,
    Updated,
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum RegisterError {
    #[error("Login ID not recognized.")]
    UnknownUser,

    #[error("Login ID already registered, try signing in instead.")]
    AlreadyRegistered,

    #[error(transparent)]
    Lock(#[from] StoreLockError),
}

#[derive(Default)]
pub struct Users {
    inner: Mutex<HashMap<String, User>>,
}

impl Users {
    pub fn from_map(map: HashMap<String, User>) -> Self {
        Self {
            inner: Mutex::new(map),
        }
    }

    pub fn get(&self, id: &str) -> Result<Option<User>, StoreLockError> {
        Ok(try_lock(&self.inner)?.get(id).cloned())
    }

    /// Copy of the whole mapping
    pub fn get_all(&self) -> Result<HashMap<String, User>, StoreLockError> {
        Ok(try_lock(&self.inner)?.clone())
    }

    pub fn set(&self, user: User) -> Result<(), StoreLockError> {
        try_lock(&self.inner)?.insert(user.id.clone(), user);
        Ok(())
    }

    pub fn len(&self) -> Result<usize, StoreLockError> {
        Ok(try_lock(&self.inner)?.len())
    }

    /// Insert a pending user, or refresh the names of an existing one.
    /// An existing credential is never touched.
    pub fn upsert_roster_entry(
        &self,
        id: &str,
        first: &str,
        last: &str,
    ) -> Result<Upsert, StoreLockError> {
        let mut users = try_lock(&self.inner)?;
        match users.get_mut(id) {
            Some(user) => {
                user.first = first.to_string();
                user.last = last.to_string();
                Ok(Upsert::Updated)
            }
            None => {
                users.insert(
                    id.to_string(),
                    User {
                        id: id.to_string(),
                        password: String::new(),
                        first: first.to_string(),
                        last: last.to_string(),
                    },
                );
                Ok(Upsert::Created)
            }
        }
    }

    /// Set the credential of a pending user. Check and write share one
    /// critical section, so only the first of two racing registrations wins.
    pub fn register_credential(&self, id: &str, password_hash: &str) -> Result<(), RegisterError> {
        let mut users = try_lock(&self.inner)?;
        let user = users.get_mut(id).ok_or(RegisterError::UnknownUser)?;
        if user.is_registered() {
            return Err(RegisterError::AlreadyRegistered);
        }
        user.password = password_hash.to_string();
        Ok(())
    }
}
