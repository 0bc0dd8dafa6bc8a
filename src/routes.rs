//! Route table.

use axum::{
  routing::{get, post},
  Router,
};
use std::path::Path;
use tower_http::{catch_panic::CatchPanicLayer, services::ServeDir, trace::TraceLayer};

use crate::state::AppState;
use crate::{auth, handlers, paths};

pub fn router(state: AppState) -> Router {
  let static_dir = Path::new(paths::STATIC_DIR);

  Router::new()
    .route("/", get(handlers::index))
    // Auth
    .route("/auth/login", post(auth::login_submit))
    .route("/auth/logout", post(auth::logout))
    .route("/auth/register", get(auth::register_page).post(auth::register_submit))
    .route("/auth/success", get(auth::register_page))
    // Admin
    .route("/admin/upload", get(handlers::admin_page).post(handlers::upload_roster))
    .route("/admin/success", get(handlers::admin_page))
    .route("/admin/overview", get(handlers::admin_page))
    .route("/admin/export", post(handlers::export_attendance))
    // Users
    .route("/user/attendance", post(handlers::check_in))
    .route("/user/attendance/success", get(handlers::check_in_success))
    .nest_service("/css", ServeDir::new(static_dir.join("css")))
    .nest_service("/scripts", ServeDir::new(static_dir.join("scripts")))
    .fallback(handlers::not_found)
    .method_not_allowed_fallback(handlers::not_found)
    .layer(CatchPanicLayer::custom(handlers::recover_from_panic))
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}
