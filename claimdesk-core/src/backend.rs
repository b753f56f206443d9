//! The hosted database/auth service, as seen by the page
//!
//! The page only ever needs "who is logged in", "give me every row" and
//! "upsert these rows". Sign-in and sign-out back the login form.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::BackendError;
use crate::table::{Row, TableName};

/// Bearer token of a signed-in user.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken(<redacted>)")
    }
}

/// Authenticated user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// Result of a successful sign-in
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub access_token: AccessToken,
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Lifetime of the access token in seconds
    #[serde(default)]
    pub expires_in: Option<u64>,
    pub user: User,
}

#[async_trait]
pub trait Backend: Send + Sync {
    /// User owning `token`, or `None` when the token is unknown or expired.
    async fn get_user(&self, token: &AccessToken) -> Result<Option<User>, BackendError>;

    /// Every row of `table`.
    async fn select_all(
        &self,
        token: &AccessToken,
        table: TableName,
    ) -> Result<Vec<Row>, BackendError>;

    /// Insert-or-update `rows` by primary key.
    async fn upsert(
        &self,
        token: &AccessToken,
        table: TableName,
        rows: &[Row],
    ) -> Result<(), BackendError>;

    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, BackendError>;

    async fn sign_out(&self, token: &AccessToken) -> Result<(), BackendError>;
}
