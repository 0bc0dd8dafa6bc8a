//! Authentication handlers for login, register, and logout.

use askama::Template;
use axum::{
    extract::State,
    http::Uri,
    response::{Html, IntoResponse, Redirect, Response},
    Form,
};
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;

use super::middleware::{session_token, CurrentUser};
use super::service;
use super::session::{cleared_session_cookie, session_cookie};
use crate::handlers::last_segment;
use crate::state::AppState;
use crate::store::User;

#[derive(Template)]
#[template(path = "auth/register.html")]
pub struct RegisterTemplate {
    pub user: User,
    /// "register" or "success"
    pub tab: String,
}

#[derive(Deserialize)]
pub struct CredentialsForm {
    #[serde(rename = "loginID", default)]
    pub login_id: String,
    #[serde(default)]
    pub password: String,
}

/// POST /auth/login - Process login
pub async fn login_submit(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<CredentialsForm>,
) -> Response {
    match service::login(&state.store, form.login_id.trim(), &form.password).await {
        // Cookie goes out with the redirect itself
        Ok(token) => (jar.add(session_cookie(token)), Redirect::to("/")).into_response(),
        Err(e) => e.into_response(),
    }
}

/// POST /auth/logout - Log out and clear session
pub async fn logout(State(state): State<AppState>, jar: CookieJar) -> impl IntoResponse {
    let token = session_token(&jar);
    service::logout(&state.store, token.as_deref());

    (jar.add(cleared_session_cookie()), Redirect::to("/"))
}

/// GET /auth/register, GET /auth/success - Show registration page
pub async fn register_page(CurrentUser(user): CurrentUser, uri: Uri) -> Html<String> {
    let template = RegisterTemplate {
        user,
        tab: last_segment(&uri).to_string(),
    };
    Html(template.render().unwrap_or_default())
}

/// POST /auth/register - Set the password of a roster member
pub async fn register_submit(
    State(state): State<AppState>,
    Form(form): Form<CredentialsForm>,
) -> Response {
    match service::register(&state.store, form.login_id.trim(), &form.password) {
        Ok(()) => Redirect::to("/auth/success").into_response(),
        Err(e) => e.into_response(),
    }
}
