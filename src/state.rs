//! Application state shared by all handlers, and startup initialization.

use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

use crate::attendance::network::NetworkPolicy;
use crate::auth::password;
use crate::config::Config;
use crate::error::LogOnError;
use crate::persistence::{PersistenceError, SnapshotStore};
use crate::roster::Exporter;
use crate::store::{Store, StoreLockError, User, ADMIN_ID};

#[derive(Error, Debug)]
pub enum StartupError {
    #[error("failed to load state: {0}")]
    Load(#[from] PersistenceError),

    #[error("failed to hash admin password: {0}")]
    AdminHash(argon2::password_hash::Error),

    #[error("failed to seed admin account: {0}")]
    Seed(#[from] StoreLockError),
}

/// Application state passed to all handlers
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<Store>,
    pub network: Arc<NetworkPolicy>,
    pub exporter: Arc<Exporter>,
    /// Base path for snapshots, uploads and exports
    pub data_dir: PathBuf,
}

impl AppState {
    pub fn new(store: Store, network: NetworkPolicy, data_dir: PathBuf) -> Self {
        Self {
            store: Arc::new(store),
            network: Arc::new(network),
            exporter: Arc::new(Exporter::new(&data_dir)),
            data_dir,
        }
    }

    /// Load persisted state and seed the admin account.
    ///
    /// A malformed snapshot aborts startup; missing snapshots start empty.
    pub fn init(config: &Config) -> Result<Self, StartupError> {
        let store = Store::load(SnapshotStore::new(&config.data_dir))?;
        seed_admin(&store, &config.admin_password)?;

        let network = NetworkPolicy::new(config.allowed_prefix.clone());
        Ok(Self::new(store, network, config.data_dir.clone()))
    }
}

/// Overwrite the reserved admin account with the configured credential.
///
/// Only the in-memory record must succeed; the snapshot write is best-effort.
pub fn seed_admin(store: &Store, admin_password: &str) -> Result<(), StartupError> {
    let hash = password::hash_password(admin_password).map_err(StartupError::AdminHash)?;
    store.users.set(User {
        id: ADMIN_ID.to_string(),
        password: hash,
        first: ADMIN_ID.to_string(),
        last: ADMIN_ID.to_string(),
    })?;
    store.flush_users().log_warn("Failed to write users snapshot");
    tracing::info!("Seeded {} account", ADMIN_ID);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attendance::network::NetworkPrefix;
    use tempfile::TempDir;

    fn config_for(dir: &TempDir) -> Config {
        Config {
            admin_password: "secret".into(),
            allowed_prefix: Some("10.0".parse::<NetworkPrefix>().unwrap()),
            data_dir: dir.path().to_path_buf(),
            port: 0,
        }
    }

    #[test]
    fn test_init_seeds_admin() {
        let dir = TempDir::new().unwrap();
        let state = AppState::init(&config_for(&dir)).unwrap();

        let admin = state.store.users.get(ADMIN_ID).unwrap().unwrap();
        assert!(password::verify_password("secret", &admin.password));
        assert!(dir.path().join("users.json").exists());
    }

    #[test]
    fn test_init_keeps_roster_and_resets_admin() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("users.json"),
            r#"{
                "A1": {"ID": "A1", "Password": "", "First": "Jane", "Last": "Doe"},
                "admin": {"ID": "admin", "Password": "stale", "First": "x", "Last": "y"}
            }"#,
        )
        .unwrap();

        let state = AppState::init(&config_for(&dir)).unwrap();

        assert!(state.store.users.get("A1").unwrap().is_some());
        let admin = state.store.users.get(ADMIN_ID).unwrap().unwrap();
        assert_eq!(admin.first, "admin");
        assert_ne!(admin.password, "stale");
    }

    #[test]
    fn test_init_survives_unwritable_snapshot() {
        let dir = TempDir::new().unwrap();
        // A directory in place of the temp file makes every users write fail
        std::fs::create_dir(dir.path().join("users.json.tmp")).unwrap();

        let state = AppState::init(&config_for(&dir)).unwrap();

        let admin = state.store.users.get(ADMIN_ID).unwrap().unwrap();
        assert!(password::verify_password("secret", &admin.password));
        assert!(!dir.path().join("users.json").exists());
    }

    #[test]
    fn test_init_fails_on_malformed_snapshot() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("attendance.json"), "{ not json").unwrap();

        let result = AppState::init(&config_for(&dir));
        assert!(matches!(result, Err(StartupError::Load(_))));
    }
}
