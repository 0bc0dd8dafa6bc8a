//! Authentication: credentials, sessions and the current-user protocol.

pub mod handlers;
pub mod middleware;
pub mod password;
pub mod service;
pub mod session;

pub use handlers::*;
pub use middleware::{AdminUser, CurrentUser, SignedIn};
pub use session::SESSION_COOKIE_NAME;
