//! Test utilities for state setup.
//!
//! Builds an [`AppState`] the same way startup does, backed by a temporary
//! data directory that is removed on drop.

use std::path::Path;
use tempfile::TempDir;

use crate::attendance::network::NetworkPolicy;
use crate::auth::password;
use crate::persistence::SnapshotStore;
use crate::state::{seed_admin, AppState};
use crate::store::{Store, User};

/// Admin password every test environment is seeded with
pub const TEST_ADMIN_PASSWORD: &str = "admin-pass";

/// Network prefix check-ins are accepted from in tests
pub const TEST_PREFIX: &str = "192.168";

pub struct TestEnv {
    /// Temporary data directory (kept alive for snapshot files)
    pub temp: TempDir,
    pub state: AppState,
}

impl TestEnv {
    /// Fresh state with only the seeded admin account.
    pub fn new() -> Self {
        let temp = TempDir::new().expect("create temp dir");
        let store = Store::new(SnapshotStore::new(temp.path()));
        seed_admin(&store, TEST_ADMIN_PASSWORD).expect("seed admin");

        let network = NetworkPolicy::new(Some(TEST_PREFIX.parse().expect("test prefix")));
        let state = AppState::new(store, network, temp.path().to_path_buf());

        Self { temp, state }
    }

    /// Get the data directory path.
    pub fn path(&self) -> &Path {
        self.temp.path()
    }

    /// Add a roster member who has not registered yet.
    pub fn pending_user(&self, id: &str, first: &str, last: &str) -> User {
        let user = User {
            id: id.to_string(),
            password: String::new(),
            first: first.to_string(),
            last: last.to_string(),
        };
        self.state.store.users.set(user.clone()).expect("insert user");
        user
    }

    /// Add a registered user with `plain` as password.
    pub fn registered_user(&self, id: &str, plain: &str) -> User {
        let user = User {
            id: id.to_string(),
            password: password::hash_password(plain).expect("hash password"),
            first: "Test".to_string(),
            last: id.to_string(),
        };
        self.state.store.users.set(user.clone()).expect("insert user");
        user
    }
}
