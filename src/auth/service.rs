//! Login, logout, registration and session resolution over the state store.

use crate::error::{AppError, LogOnError};
use crate::store::{RegisterError, Store, User};

use super::password;
use super::session::generate_session_token;

/// Shared by both login failure modes so the message reveals nothing
pub const CREDENTIALS_MISMATCH: &str = "Login ID and/or password do not match";

/// Verify credentials and open a session, returning its token.
///
/// Unknown identifiers fail with `Unauthorized`, wrong passwords with
/// `Forbidden`; both carry the same message.
pub async fn login(store: &Store, login_id: &str, plain: &str) -> Result<String, AppError> {
    let user = store
        .users
        .get(login_id)?
        .ok_or_else(|| AppError::Unauthorized(CREDENTIALS_MISMATCH.into()))?;

    if !password::verify_password(plain, &user.password) {
        tracing::info!("Failed login for {}", login_id);
        return Err(AppError::Forbidden(CREDENTIALS_MISMATCH.into()));
    }

    // Token is produced off the request task; wait for it before recording
    let token = tokio::task::spawn_blocking(generate_session_token)
        .await
        .map_err(|e| AppError::Internal(format!("session token task failed: {}", e)))?;

    store.sessions.set(&token, &user.id)?;
    tracing::info!("{} logged in", user.id);
    Ok(token)
}

/// Drop the session behind `token`. Missing tokens are a no-op.
pub fn logout(store: &Store, token: Option<&str>) {
    let Some(token) = token else {
        return;
    };
    if let Some(Some(user_id)) = store.sessions.remove(token).log_warn("Failed to remove session") {
        tracing::info!("{} logged out", user_id);
    }
}

/// The user behind a session token, or the anonymous user.
///
/// Never fails: a missing cookie, a stale token, a vanished user or an
/// unavailable store all resolve to anonymous.
pub fn resolve_user(store: &Store, token: Option<&str>) -> User {
    let Some(token) = token else {
        return User::anonymous();
    };

    let user = store
        .sessions
        .get(token)
        .log_warn("Failed to read session")
        .flatten()
        .and_then(|user_id| store.users.get(&user_id).log_warn("Failed to read user").flatten());

    user.unwrap_or_else(User::anonymous)
}

/// Set the first credential of a roster member and persist users.
pub fn register(store: &Store, login_id: &str, plain: &str) -> Result<(), AppError> {
    if plain.is_empty() {
        return Err(AppError::BadRequest("Password is required.".into()));
    }

    // Fail fast before paying for a hash; register_credential re-checks atomically
    match store.users.get(login_id)? {
        None => return Err(register_error(RegisterError::UnknownUser)),
        Some(user) if user.is_registered() => {
            return Err(register_error(RegisterError::AlreadyRegistered));
        }
        Some(_) => {}
    }

    let hash = password::hash_password(plain)
        .map_err(|e| AppError::Internal(format!("password hashing failed: {}", e)))?;
    store
        .users
        .register_credential(login_id, &hash)
        .map_err(register_error)?;
    tracing::info!("{} registered", login_id);

    store.flush_users().log_warn("Failed to write users snapshot");
    Ok(())
}

fn register_error(err: RegisterError) -> AppError {
    match err {
        RegisterError::Lock(lock) => AppError::Lock(lock),
        other => AppError::Unauthorized(other.to_string()),
    }
}
