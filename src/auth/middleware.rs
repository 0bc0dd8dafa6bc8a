//! Authentication extractors.

use axum::{
    extract::FromRequestParts,
    http::request::Parts,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::CookieJar;
use std::convert::Infallible;

use super::service;
use super::session::SESSION_COOKIE_NAME;
use crate::state::AppState;
use crate::store::User;

/// Session token presented by the request, if any
pub fn session_token(jar: &CookieJar) -> Option<String> {
    jar.get(SESSION_COOKIE_NAME)
        .map(|c| c.value().to_string())
        .filter(|v| !v.is_empty())
}

/// The requesting user; anonymous when there is no valid session.
pub struct CurrentUser(pub User);

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        let token = session_token(&jar);
        Ok(CurrentUser(service::resolve_user(&state.store, token.as_deref())))
    }
}

/// Requires a signed-in user. Redirects to / otherwise.
pub struct SignedIn(pub User);

impl FromRequestParts<AppState> for SignedIn {
    type Rejection = Response;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Ok(CurrentUser(user)) = CurrentUser::from_request_parts(parts, state).await;
        if user.is_anonymous() {
            return Err(Redirect::to("/").into_response());
        }
        Ok(SignedIn(user))
    }
}

/// Requires the admin account. Redirects to / otherwise.
pub struct AdminUser(pub User);

impl FromRequestParts<AppState> for AdminUser {
    type Rejection = Response;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let SignedIn(user) = SignedIn::from_request_parts(parts, state).await?;
        if !user.is_admin() {
            tracing::debug!("Non-admin {} denied admin route", user.id);
            return Err(Redirect::to("/").into_response());
        }
        Ok(AdminUser(user))
    }
}
