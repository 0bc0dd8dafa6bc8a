//! Page handlers and router-level fallbacks.

pub mod admin;
pub mod user;

use askama::Template;
use axum::{
  extract::{Query, State},
  http::{StatusCode, Uri},
  response::{Html, IntoResponse, Redirect, Response},
};
use chrono::Local;
use serde::Deserialize;
use std::any::Any;

use crate::attendance;
use crate::auth::CurrentUser;
use crate::error::LogOnError;
use crate::state::AppState;
use crate::store::User;

pub use admin::{admin_page, export_attendance, upload_roster};
pub use user::{check_in, check_in_success};

#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexTemplate {
  pub user: User,
  /// True right after a successful check-in
  pub success: bool,
  /// Formatted check-in time for today; empty when not checked in
  pub checked_in_at: String,
}

#[derive(Deserialize, Default)]
pub struct IndexQuery {
  #[serde(rename = "attendanceSuccess", default)]
  pub attendance_success: String,
}

/// Last path segment, used as the tab name of multi-route pages
pub fn last_segment(uri: &Uri) -> &str {
  uri.path().trim_end_matches('/').rsplit('/').next().unwrap_or_default()
}

/// GET / - Landing page
pub async fn index(
  State(state): State<AppState>,
  CurrentUser(user): CurrentUser,
  Query(query): Query<IndexQuery>,
) -> Response {
  if user.is_admin() {
    return Redirect::to("/admin/overview").into_response();
  }

  let checked_in_at = if user.is_anonymous() {
    None
  } else {
    attendance::checked_in_at(&state.store, &user.id, Local::now())
      .log_warn("Failed to read attendance")
      .flatten()
  };

  let success = query.attendance_success == "success";
  // Stale or forged success links go back to the plain page
  if success && checked_in_at.is_none() {
    return Redirect::to("/").into_response();
  }

  let template = IndexTemplate {
    user,
    success,
    checked_in_at: checked_in_at
      .map(attendance::format_check_in_time)
      .unwrap_or_default(),
  };
  Html(template.render().unwrap_or_default()).into_response()
}

/// Fallback for unknown paths and methods
pub async fn not_found() -> impl IntoResponse {
  (StatusCode::NOT_FOUND, "404 page not found")
}

/// Panic handler for the catch-panic layer: log and send the client home
pub fn recover_from_panic(err: Box<dyn Any + Send + 'static>) -> Response {
  let detail = if let Some(s) = err.downcast_ref::<String>() {
    s.clone()
  } else if let Some(s) = err.downcast_ref::<&str>() {
    s.to_string()
  } else {
    "unknown panic".to_string()
  };
  tracing::error!("Recovered from panic: {}", detail);
  Redirect::to("/").into_response()
}
