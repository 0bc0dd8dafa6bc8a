//! Sessions mapping (token → user identifier). Never persisted.

use std::collections::HashMap;
use std::sync::Mutex;

use super::{try_lock, StoreLockError};

#[derive(Default)]
pub struct Sessions {
    inner: Mutex<HashMap<String, String>>,
}

impl Sessions {
    pub fn get(&self, token: &str) -> Result<Option<String>, StoreLockError> {
        Ok(try_lock(&self.inner)?.get(token).cloned())
    }

    pub fn get_all(&self) -> Result<HashMap<String, String>, StoreLockError> {
        Ok(try_lock(&self.inner)?.clone())
    }

    pub fn set(&self, token: &str, user_id: &str) -> Result<(), StoreLockError> {
        try_lock(&self.inner)?.insert(token.to_string(), user_id.to_string());
        Ok(())
    }

    /// Drop a session, returning the identifier it belonged to
    pub fn remove(&self, token: &str) -> Result<Option<String>, StoreLockError> {
        Ok(try_lock(&self.inner)?.remove(token))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_get_remove() {
        let sessions = Sessions::default();
        sessions.set("t1", "A1").unwrap();
        assert_eq!(sessions.get("t1").unwrap().as_deref(), Some("A1"));

        assert_eq!(sessions.remove("t1").unwrap().as_deref(), Some("A1"));
        assert!(sessions.get("t1").unwrap().is_none());
        assert!(sessions.remove("t1").unwrap().is_none());
    }

    #[test]
    fn test_token_maps_to_one_user() {
        let sessions = Sessions::default();
        sessions.set("t1", "A1").unwrap();
        sessions.set("t1", "B2").unwrap();
        assert_eq!(sessions.get_all().unwrap().len(), 1);
        assert_eq!(sessions.get("t1").unwrap().as_deref(), Some("B2"));
    }
}
