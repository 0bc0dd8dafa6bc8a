//! Admin pages: roster upload, attendance overview and export.

use askama::Template;
use axum::{
  extract::{Multipart, Query, State},
  http::{header, Uri},
  response::{Html, IntoResponse, Redirect, Response},
  Form,
};
use chrono::Local;
use serde::Deserialize;

use super::last_segment;
use crate::auth::AdminUser;
use crate::error::{AppError, LogOnError};
use crate::roster::{self, export, DateRange, DayReport};
use crate::state::AppState;
use crate::store::User;

/// Multipart field carrying the roster file
const ROSTER_FIELD: &str = "csvFile";

#[derive(Template)]
#[template(path = "admin/index.html")]
pub struct AdminTemplate {
  pub user: User,
  /// "upload", "success" or "overview"
  pub tab: String,
  pub date_from: String,
  pub date_to: String,
  pub days: Vec<DayReport>,
}

#[derive(Deserialize, Default)]
pub struct RangeForm {
  #[serde(rename = "dateFrom", default)]
  pub date_from: String,
  #[serde(rename = "dateTo", default)]
  pub date_to: String,
}

/// GET /admin/upload, /admin/success, /admin/overview
pub async fn admin_page(
  State(state): State<AppState>,
  AdminUser(user): AdminUser,
  uri: Uri,
  Query(range): Query<RangeForm>,
) -> Html<String> {
  // An incomplete or invalid range just renders an empty table
  let days = DateRange::parse(&range.date_from, &range.date_to)
    .ok()
    .and_then(|r| export::build_report(&state.store, r).log_warn("Failed to build overview"))
    .unwrap_or_default();

  let template = AdminTemplate {
    user,
    tab: last_segment(&uri).to_string(),
    date_from: range.date_from,
    date_to: range.date_to,
    days,
  };
  Html(template.render().unwrap_or_default())
}

/// POST /admin/upload - Import a roster file
pub async fn upload_roster(
  State(state): State<AppState>,
  AdminUser(_): AdminUser,
  mut multipart: Multipart,
) -> Response {
  let mut upload = None;
  loop {
    match multipart.next_field().await {
      Ok(Some(field)) if field.name() == Some(ROSTER_FIELD) => {
        let file_name = field.file_name().unwrap_or_default().to_string();
        match field.bytes().await {
          Ok(bytes) => upload = Some((file_name, bytes.to_vec())),
          Err(e) => return AppError::BadRequest(format!("Error reading upload: {}", e)).into_response(),
        }
      }
      Ok(Some(_)) => continue,
      Ok(None) => break,
      Err(e) => return AppError::BadRequest(format!("Error reading upload: {}", e)).into_response(),
    }
  }

  let Some((file_name, bytes)) = upload else {
    return AppError::BadRequest("No roster file uploaded".into()).into_response();
  };

  match roster::import_roster(&state.store, &state.data_dir, &file_name, bytes, Local::now()).await {
    Ok(_) => Redirect::to("/admin/success").into_response(),
    Err(e) => e.into_response(),
  }
}

/// POST /admin/export - Download attendance for a date range as CSV
pub async fn export_attendance(
  State(state): State<AppState>,
  AdminUser(_): AdminUser,
  Form(form): Form<RangeForm>,
) -> Response {
  let range = match DateRange::parse(&form.date_from, &form.date_to) {
    Ok(range) => range,
    Err(e) => return e.into_response(),
  };

  match state.exporter.export(&state.store, range).await {
    Ok((file_name, bytes)) => (
      [
        (header::CONTENT_TYPE, "text/csv".to_string()),
        (
          header::CONTENT_DISPOSITION,
          format!("attachment; filename=\"{}\"", file_name),
        ),
      ],
      bytes,
    )
      .into_response(),
    Err(e) => e.into_response(),
  }
}
