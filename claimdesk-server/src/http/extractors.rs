//! Custom Axum extractors

use std::collections::HashMap;
use std::convert::Infallible;
use std::sync::Arc;

use axum::extract::{FromRequestParts, Path};
use axum::http::request::Parts;
use axum::response::Redirect;

use claimdesk_core::pipeline::{self, SessionCheck};
use claimdesk_core::{AccessToken, TableName, User};

use super::error::ApiError;
use super::server::AppState;
use crate::session;

/// Session token from the cookie, without checking it
pub struct SessionToken(pub Option<AccessToken>);

impl<S> FromRequestParts<S> for SessionToken
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(session::token_from_headers(&parts.headers)))
    }
}

/// Checked session for HTML routes; redirects to the login page otherwise.
pub struct PageSession {
    pub user: User,
    pub token: AccessToken,
}

impl FromRequestParts<Arc<AppState>> for PageSession {
    type Rejection = Redirect;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        match authenticate(parts, state).await {
            Ok((user, token)) => Ok(Self { user, token }),
            Err(to) => Err(Redirect::to(to)),
        }
    }
}

/// Checked session for JSON routes; 401 otherwise.
pub struct ApiSession {
    pub user: User,
    pub token: AccessToken,
}

impl FromRequestParts<Arc<AppState>> for ApiSession {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        authenticate(parts, state)
            .await
            .map(|(user, token)| Self { user, token })
            .map_err(|_| ApiError::Unauthorized)
    }
}

async fn authenticate(
    parts: &Parts,
    state: &Arc<AppState>,
) -> Result<(User, AccessToken), &'static str> {
    let token = session::token_from_headers(&parts.headers);
    match pipeline::check_session(state.backend.as_ref(), token.as_ref()).await {
        SessionCheck::Authenticated(user) => match token {
            Some(token) => Ok((user, token)),
            None => Err(pipeline::LOGIN_PATH),
        },
        SessionCheck::Redirect(to) => Err(to),
    }
}

/// Extract and validate the `{table}` path segment
pub struct ValidTable(pub TableName);

impl<S> FromRequestParts<S> for ValidTable
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(params): Path<HashMap<String, String>> = Path::from_request_parts(parts, state)
            .await
            .map_err(|_| ApiError::UnknownTable {
                name: String::new(),
            })?;

        let name = params.get("table").map(String::as_str).unwrap_or_default();
        let table = name.parse::<TableName>()?;
        Ok(Self(table))
    }
}
