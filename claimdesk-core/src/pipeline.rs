//! Protected page pipeline
//!
//! Session check -> data fetch -> (render, edit elsewhere) -> bulk upsert.
//! Nothing here retries; failures are logged and reported as outcomes.

use tracing::{debug, error, info, warn};

use crate::backend::{AccessToken, Backend, User};
use crate::error::BackendError;
use crate::table::{Table, TableName, TableSet};

/// Where unauthenticated visitors are sent
pub const LOGIN_PATH: &str = "/login";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionCheck {
    Authenticated(User),
    Redirect(&'static str),
}

/// Outcome of loading the protected page
#[derive(Debug)]
pub enum PageLoad {
    Redirect(&'static str),
    Loaded { user: User, tables: TableSet },
    FetchFailed { user: User, error: FetchError },
}

/// A table could not be fetched
#[derive(Debug, Clone, thiserror::Error)]
#[error("failed to fetch {table}: {source}")]
pub struct FetchError {
    pub table: TableName,
    #[source]
    pub source: BackendError,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SaveOutcome {
    Saved { rows: usize },
    Failed(BackendError),
}

impl SaveOutcome {
    pub fn is_saved(&self) -> bool {
        matches!(self, Self::Saved { .. })
    }
}

/// Resolve the current user, or say where to send the visitor.
///
/// A missing token, an unknown token and an auth-service failure all end in a
/// redirect to the login page.
pub async fn check_session(backend: &dyn Backend, token: Option<&AccessToken>) -> SessionCheck {
    let Some(token) = token else {
        debug!("No session token, redirecting to {}", LOGIN_PATH);
        return SessionCheck::Redirect(LOGIN_PATH);
    };

    match backend.get_user(token).await {
        Ok(Some(user)) => SessionCheck::Authenticated(user),
        Ok(None) => {
            debug!("Session token not recognised, redirecting to {}", LOGIN_PATH);
            SessionCheck::Redirect(LOGIN_PATH)
        }
        Err(e) => {
            warn!(error = %e, "Session check failed, treating as signed out");
            SessionCheck::Redirect(LOGIN_PATH)
        }
    }
}

/// Fetch one table in full.
pub async fn load_table(
    backend: &dyn Backend,
    token: &AccessToken,
    table: TableName,
) -> Result<Table, FetchError> {
    let rows = backend
        .select_all(token, table)
        .await
        .map_err(|source| FetchError { table, source })?;
    debug!(table = %table, rows = rows.len(), "Fetched table");
    Ok(Table::new(table, rows))
}

/// Fetch claims, then user profiles. The first failure aborts the load.
pub async fn load_tables(backend: &dyn Backend, token: &AccessToken) -> Result<TableSet, FetchError> {
    let claims = load_table(backend, token, TableName::Claims).await?;
    let user_profiles = load_table(backend, token, TableName::UserProfiles).await?;
    Ok(TableSet {
        claims,
        user_profiles,
    })
}

/// Session check followed by the data fetch.
pub async fn load_page(backend: &dyn Backend, token: Option<&AccessToken>) -> PageLoad {
    let user = match check_session(backend, token).await {
        SessionCheck::Authenticated(user) => user,
        SessionCheck::Redirect(to) => return PageLoad::Redirect(to),
    };
    // check_session only authenticates when a token was present
    let Some(token) = token else {
        return PageLoad::Redirect(LOGIN_PATH);
    };

    match load_tables(backend, token).await {
        Ok(tables) => PageLoad::Loaded { user, tables },
        Err(error) => {
            error!(error = %error, "Error fetching data");
            PageLoad::FetchFailed { user, error }
        }
    }
}

/// Upsert the table's whole current row array.
pub async fn save_table(backend: &dyn Backend, token: &AccessToken, table: &Table) -> SaveOutcome {
    match backend.upsert(token, table.name, &table.rows).await {
        Ok(()) => {
            info!(table = %table.name, rows = table.rows.len(), "Saved {}", table.name.noun());
            SaveOutcome::Saved {
                rows: table.rows.len(),
            }
        }
        Err(e) => {
            error!(table = %table.name, error = %e, "Error saving {}", table.name.noun());
            SaveOutcome::Failed(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryBackend;

    async fn signed_in() -> (MemoryBackend, AccessToken) {
        let backend = MemoryBackend::demo().await;
        let session = backend.sign_in("demo@example.com", "demo").await.unwrap();
        (backend, session.access_token)
    }

    #[tokio::test]
    async fn missing_token_redirects() {
        let backend = MemoryBackend::demo().await;
        assert!(matches!(
            load_page(&backend, None).await,
            PageLoad::Redirect(LOGIN_PATH)
        ));
    }

    #[tokio::test]
    async fn unknown_token_redirects() {
        let backend = MemoryBackend::demo().await;
        let token = AccessToken::new("stale");
        assert_eq!(
            check_session(&backend, Some(&token)).await,
            SessionCheck::Redirect(LOGIN_PATH)
        );
    }

    #[tokio::test]
    async fn auth_service_failure_redirects() {
        let (backend, token) = signed_in().await;
        backend.fail_get_user(true);

        assert_eq!(
            check_session(&backend, Some(&token)).await,
            SessionCheck::Redirect(LOGIN_PATH)
        );
        assert!(matches!(
            load_page(&backend, Some(&token)).await,
            PageLoad::Redirect(LOGIN_PATH)
        ));
        assert!(backend.upsert_calls().await.is_empty());
    }

    #[tokio::test]
    async fn loads_both_tables() {
        let (backend, token) = signed_in().await;
        match load_page(&backend, Some(&token)).await {
            PageLoad::Loaded { user, tables } => {
                assert_eq!(user.email.as_deref(), Some("demo@example.com"));
                assert_eq!(tables.claims.len(), 2);
                assert_eq!(tables.user_profiles.len(), 1);
            }
            other => panic!("expected Loaded, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn fetch_failure_is_reported() {
        let (backend, token) = signed_in().await;
        backend.fail_select(true);
        match load_page(&backend, Some(&token)).await {
            PageLoad::FetchFailed { error, .. } => assert_eq!(error.table, TableName::Claims),
            other => panic!("expected FetchFailed, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn save_upserts_current_rows() {
        let (backend, token) = signed_in().await;
        let mut tables = load_tables(&backend, &token).await.unwrap();
        tables.claims.set_cell(0, "status", "closed").unwrap();

        let outcome = save_table(&backend, &token, &tables.claims).await;
        assert_eq!(outcome, SaveOutcome::Saved { rows: 2 });

        let calls = backend.upsert_calls().await;
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].table, TableName::Claims);
        assert_eq!(calls[0].rows, tables.claims.rows);
    }

    #[tokio::test]
    async fn save_failure_is_an_outcome() {
        let (backend, token) = signed_in().await;
        let tables = load_tables(&backend, &token).await.unwrap();
        backend.fail_upsert(true);

        let outcome = save_table(&backend, &token, &tables.user_profiles).await;
        assert!(!outcome.is_saved());
    }
}
