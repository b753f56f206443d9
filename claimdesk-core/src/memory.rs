//! In-process backend
//!
//! Stores both tables in memory and upserts by `id`. Used by `claimdesk serve
//! --demo` and by tests; failures can be switched on per operation.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use serde_json::json;
use tokio::sync::RwLock;

use crate::backend::{AccessToken, Backend, Session, User};
use crate::error::BackendError;
use crate::table::{Row, TableName};

struct Account {
    password: String,
    user: User,
}

/// One recorded upsert call
#[derive(Debug, Clone, PartialEq)]
pub struct UpsertCall {
    pub table: TableName,
    pub rows: Vec<Row>,
}

#[derive(Default)]
pub struct MemoryBackend {
    accounts: RwLock<HashMap<String, Account>>,
    sessions: RwLock<HashMap<AccessToken, User>>,
    tables: RwLock<HashMap<TableName, Vec<Row>>>,
    upserts: RwLock<Vec<UpsertCall>>,
    fail_get_user: AtomicBool,
    fail_select: AtomicBool,
    fail_upsert: AtomicBool,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Backend with one account (`demo@example.com` / `demo`) and a few rows.
    pub async fn demo() -> Self {
        let backend = Self::new();
        backend.add_account("demo@example.com", "demo").await;
        backend
            .set_rows(
                TableName::Claims,
                vec![
                    demo_row(json!({"id": 1, "claimant": "A. Lovelace", "status": "open", "amount": 1200})),
                    demo_row(json!({"id": 2, "claimant": "C. Babbage", "status": "review", "amount": 310.5})),
                ],
            )
            .await;
        backend
            .set_rows(
                TableName::UserProfiles,
                vec![demo_row(
                    json!({"id": "d3c1", "full_name": "Demo User", "role": "adjuster", "active": true}),
                )],
            )
            .await;
        backend
    }

    /// Register an account; returns its user.
    pub async fn add_account(&self, email: &str, password: &str) -> User {
        let user = User {
            id: format!("user-{}", self.accounts.read().await.len() + 1),
            email: Some(email.to_owned()),
        };
        self.accounts.write().await.insert(
            email.to_owned(),
            Account {
                password: password.to_owned(),
                user: user.clone(),
            },
        );
        user
    }

    /// Make `token` valid for `user` without going through sign-in.
    pub async fn add_session(&self, token: &AccessToken, user: User) {
        self.sessions.write().await.insert(token.clone(), user);
    }

    pub async fn set_rows(&self, table: TableName, rows: Vec<Row>) {
        self.tables.write().await.insert(table, rows);
    }

    pub async fn rows(&self, table: TableName) -> Vec<Row> {
        self.tables
            .read()
            .await
            .get(&table)
            .cloned()
            .unwrap_or_default()
    }

    /// Every upsert received so far, oldest first
    pub async fn upsert_calls(&self) -> Vec<UpsertCall> {
        self.upserts.read().await.clone()
    }

    pub fn fail_get_user(&self, fail: bool) {
        self.fail_get_user.store(fail, Ordering::SeqCst);
    }

    pub fn fail_select(&self, fail: bool) {
        self.fail_select.store(fail, Ordering::SeqCst);
    }

    pub fn fail_upsert(&self, fail: bool) {
        self.fail_upsert.store(fail, Ordering::SeqCst);
    }

    async fn require_session(&self, token: &AccessToken) -> Result<User, BackendError> {
        self.sessions
            .read()
            .await
            .get(token)
            .cloned()
            .ok_or_else(|| BackendError::status(401, "JWT expired or invalid"))
    }
}

fn demo_row(value: serde_json::Value) -> Row {
    match value {
        serde_json::Value::Object(map) => Row::from(map),
        _ => Row::new(),
    }
}

#[async_trait]
impl Backend for MemoryBackend {
    async fn get_user(&self, token: &AccessToken) -> Result<Option<User>, BackendError> {
        if self.fail_get_user.load(Ordering::SeqCst) {
            return Err(BackendError::Transport("auth service unreachable".into()));
        }
        Ok(self.sessions.read().await.get(token).cloned())
    }

    async fn select_all(
        &self,
        token: &AccessToken,
        table: TableName,
    ) -> Result<Vec<Row>, BackendError> {
        self.require_session(token).await?;
        if self.fail_select.load(Ordering::SeqCst) {
            return Err(BackendError::status(503, "service unavailable"));
        }
        Ok(self.rows(table).await)
    }

    async fn upsert(
        &self,
        token: &AccessToken,
        table: TableName,
        rows: &[Row],
    ) -> Result<(), BackendError> {
        self.require_session(token).await?;
        self.upserts.write().await.push(UpsertCall {
            table,
            rows: rows.to_vec(),
        });
        if self.fail_upsert.load(Ordering::SeqCst) {
            return Err(BackendError::status(409, "duplicate key value violates unique constraint"));
        }

        let mut tables = self.tables.write().await;
        let stored = tables.entry(table).or_default();
        for row in rows {
            let existing = row
                .id()
                .and_then(|id| stored.iter_mut().find(|r| r.id() == Some(id)));
            match existing {
                Some(slot) => *slot = row.clone(),
                None => stored.push(row.clone()),
            }
        }
        Ok(())
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, BackendError> {
        let user = {
            let accounts = self.accounts.read().await;
            match accounts.get(email) {
                Some(account) if account.password == password => account.user.clone(),
                _ => return Err(BackendError::InvalidCredentials),
            }
        };

        let sessions = self.sessions.read().await.len();
        let token = AccessToken::new(format!("memory-token-{}-{}", user.id, sessions + 1));
        self.sessions
            .write()
            .await
            .insert(token.clone(), user.clone());

        Ok(Session {
            access_token: token,
            refresh_token: None,
            expires_in: Some(3600),
            user,
        })
    }

    async fn sign_out(&self, token: &AccessToken) -> Result<(), BackendError> {
        self.sessions.write().await.remove(token);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(value: serde_json::Value) -> Row {
        serde_json::from_value(value).unwrap()
    }

    #[tokio::test]
    async fn sign_in_issues_usable_token() {
        let backend = MemoryBackend::new();
        let user = backend.add_account("ada@example.com", "pw").await;

        let session = backend.sign_in("ada@example.com", "pw").await.unwrap();
        assert_eq!(session.user, user);
        assert_eq!(
            backend.get_user(&session.access_token).await.unwrap(),
            Some(user)
        );

        backend.sign_out(&session.access_token).await.unwrap();
        assert_eq!(backend.get_user(&session.access_token).await.unwrap(), None);
    }

    #[tokio::test]
    async fn wrong_password_is_rejected() {
        let backend = MemoryBackend::new();
        backend.add_account("ada@example.com", "pw").await;

        let err = backend.sign_in("ada@example.com", "nope").await.unwrap_err();
        assert_eq!(err, BackendError::InvalidCredentials);
    }

    #[tokio::test]
    async fn upsert_replaces_by_id_and_inserts_new() {
        let backend = MemoryBackend::new();
        let token = AccessToken::new("t");
        backend
            .add_session(&token, User { id: "u".into(), email: None })
            .await;
        backend
            .set_rows(TableName::Claims, vec![row(json!({"id": 1, "title": "old"}))])
            .await;

        let rows = vec![
            row(json!({"id": 1, "title": "new"})),
            row(json!({"id": 2, "title": "added"})),
        ];
        backend.upsert(&token, TableName::Claims, &rows).await.unwrap();

        assert_eq!(backend.rows(TableName::Claims).await, rows);
        assert_eq!(backend.upsert_calls().await.len(), 1);
    }

    #[tokio::test]
    async fn select_requires_session() {
        let backend = MemoryBackend::demo().await;
        let err = backend
            .select_all(&AccessToken::new("nobody"), TableName::Claims)
            .await
            .unwrap_err();
        assert!(matches!(err, BackendError::Status { status: 401, .. }));
    }

    #[tokio::test]
    async fn injected_failures() {
        let backend = MemoryBackend::demo().await;
        let session = backend.sign_in("demo@example.com", "demo").await.unwrap();

        backend.fail_select(true);
        assert!(backend
            .select_all(&session.access_token, TableName::Claims)
            .await
            .is_err());

        backend.fail_upsert(true);
        let before = backend.rows(TableName::Claims).await;
        assert!(backend
            .upsert(&session.access_token, TableName::Claims, &[])
            .await
            .is_err());
        assert_eq!(backend.rows(TableName::Claims).await, before);

        backend.fail_get_user(true);
        assert!(matches!(
            backend.get_user(&session.access_token).await,
            Err(BackendError::Transport(_))
        ));
    }
}
