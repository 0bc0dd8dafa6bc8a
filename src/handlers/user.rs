//! Signed-in user routes.

use axum::{
  extract::State,
  response::{IntoResponse, Redirect, Response},
};
use chrono::Local;

use crate::attendance::{self, network::ClientIp};
use crate::auth::SignedIn;
use crate::state::AppState;

/// POST /user/attendance - Check in for today
pub async fn check_in(
  State(state): State<AppState>,
  SignedIn(user): SignedIn,
  ClientIp(client): ClientIp,
) -> Response {
  match attendance::check_in(&state.store, &state.network, &user, client, Local::now()) {
    Ok(_) => Redirect::to("/user/attendance/success").into_response(),
    Err(e) => e.into_response(),
  }
}

/// GET /user/attendance/success
pub async fn check_in_success(SignedIn(_): SignedIn) -> Redirect {
  Redirect::to("/?attendanceSuccess=success")
}
