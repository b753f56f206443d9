//! Login and logout

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::header::SET_COOKIE;
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::routing::{get, post};
use axum::{Form, Router};
use serde::Deserialize;

use claimdesk_core::pipeline::LOGIN_PATH;
use claimdesk_core::BackendError;

use crate::http::extractors::SessionToken;
use crate::http::server::AppState;
use crate::render;
use crate::session;

/// Where a successful login lands
pub const HOME_PATH: &str = "/protected";

#[derive(Deserialize)]
pub struct LoginQuery {
    pub error: Option<String>,
}

#[derive(Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

/// GET / - straight to the protected page (which redirects if signed out)
async fn index() -> Redirect {
    Redirect::to(HOME_PATH)
}

/// GET /login
async fn login_form(Query(query): Query<LoginQuery>) -> Html<String> {
    let message = match query.error.as_deref() {
        Some("invalid") => Some("Invalid email or password."),
        Some(_) => Some("Could not sign in right now. Please try again."),
        None => None,
    };
    Html(render::login_page(message))
}

/// POST /login - password sign-in, sets the session cookie
async fn login(State(state): State<Arc<AppState>>, Form(form): Form<LoginForm>) -> Response {
    match state.backend.sign_in(form.email.trim(), &form.password).await {
        Ok(session) => {
            tracing::info!(user = %session.user.id, "User signed in");
            let cookie = session::session_cookie(
                &session.access_token,
                session.expires_in,
                state.cookie_secure,
            );
            ([(SET_COOKIE, cookie)], Redirect::to(HOME_PATH)).into_response()
        }
        Err(BackendError::InvalidCredentials) => {
            tracing::info!("Rejected sign-in attempt");
            Redirect::to("/login?error=invalid").into_response()
        }
        Err(e) => {
            tracing::error!(error = %e, "Sign-in failed");
            Redirect::to("/login?error=unavailable").into_response()
        }
    }
}

/// POST /logout - end the remote session, drop drafts and the cookie
async fn logout(State(state): State<Arc<AppState>>, SessionToken(token): SessionToken) -> Response {
    if let Some(token) = token {
        if let Ok(Some(user)) = state.backend.get_user(&token).await {
            state.drafts.remove_user(&user.id).await;
        }
        if let Err(e) = state.backend.sign_out(&token).await {
            tracing::warn!(error = %e, "Remote sign-out failed");
        }
    }
    let cookie = session::clear_cookie(state.cookie_secure);
    ([(SET_COOKIE, cookie)], Redirect::to(LOGIN_PATH)).into_response()
}

/// Auth routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(index))
        .route("/login", get(login_form).post(login))
        .route("/logout", post(logout))
}
