//! Per-user working copies of the tables
//!
//! A page load replaces the user's drafts with fresh rows; edits mutate the
//! draft; a save upserts it. Nothing here is persisted.
//!
//! Drafts of users who stop coming back (their cookie expired, they closed the
//! tab) are dropped once idle for longer than the idle timeout. The sweep runs
//! on every write.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::time::Instant;

use claimdesk_core::{Result, Row, Table, TableName, TableSet};

/// Default idle time after which a user's drafts are dropped
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(12 * 60 * 60);

struct UserDrafts {
    tables: HashMap<TableName, Table>,
    touched: Instant,
}

impl UserDrafts {
    fn new() -> Self {
        Self {
            tables: HashMap::new(),
            touched: Instant::now(),
        }
    }
}

#[derive(Clone)]
pub struct DraftStore {
    inner: Arc<RwLock<HashMap<String, UserDrafts>>>,
    idle_timeout: Duration,
}

impl Default for DraftStore {
    fn default() -> Self {
        Self::with_idle_timeout(DEFAULT_IDLE_TIMEOUT)
    }
}

impl DraftStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_idle_timeout(idle_timeout: Duration) -> Self {
        Self {
            inner: Arc::new(RwLock::new(HashMap::new())),
            idle_timeout,
        }
    }

    /// Drafts of `user_id`, created if absent; evicts idle users first.
    fn entry<'a>(
        &self,
        drafts: &'a mut HashMap<String, UserDrafts>,
        user_id: &str,
    ) -> &'a mut UserDrafts {
        let now = Instant::now();
        let before = drafts.len();
        drafts.retain(|owner, user| {
            owner == user_id || now.duration_since(user.touched) <= self.idle_timeout
        });
        if drafts.len() < before {
            tracing::debug!(evicted = before - drafts.len(), "Dropped idle drafts");
        }

        let user = drafts
            .entry(user_id.to_owned())
            .or_insert_with(UserDrafts::new);
        user.touched = now;
        user
    }

    /// Replace both drafts of a user with freshly loaded tables.
    pub async fn replace(&self, user_id: &str, tables: &TableSet) {
        let mut drafts = self.inner.write().await;
        let user = self.entry(&mut drafts, user_id);
        for table in tables.iter() {
            user.tables.insert(table.name, table.clone());
        }
    }

    pub async fn put(&self, user_id: &str, table: Table) {
        let mut drafts = self.inner.write().await;
        self.entry(&mut drafts, user_id)
            .tables
            .insert(table.name, table);
    }

    pub async fn table(&self, user_id: &str, name: TableName) -> Option<Table> {
        self.inner
            .read()
            .await
            .get(user_id)
            .and_then(|user| user.tables.get(&name))
            .cloned()
    }

    /// Tables the user has no draft of
    pub async fn missing(&self, user_id: &str) -> Vec<TableName> {
        let drafts = self.inner.read().await;
        let user = drafts.get(user_id);
        TableName::ALL
            .into_iter()
            .filter(|name| !user.is_some_and(|u| u.tables.contains_key(name)))
            .collect()
    }

    /// Both drafts; a table without a draft shows as empty.
    pub async fn tables(&self, user_id: &str) -> TableSet {
        let drafts = self.inner.read().await;
        let user = drafts.get(user_id);
        let pick = |name: TableName| {
            user.and_then(|u| u.tables.get(&name))
                .cloned()
                .unwrap_or_else(|| Table::empty(name))
        };
        TableSet {
            claims: pick(TableName::Claims),
            user_profiles: pick(TableName::UserProfiles),
        }
    }

    /// Edit one cell of an existing draft and return the edited row.
    ///
    /// `Ok(None)` when the user has no draft of that table.
    pub async fn edit_cell(
        &self,
        user_id: &str,
        name: TableName,
        index: usize,
        column: &str,
        text: &str,
    ) -> Result<Option<Row>> {
        let mut drafts = self.inner.write().await;
        if !drafts
            .get(user_id)
            .is_some_and(|user| user.tables.contains_key(&name))
        {
            return Ok(None);
        }
        let Some(table) = self.entry(&mut drafts, user_id).tables.get_mut(&name) else {
            return Ok(None);
        };
        table.set_cell(index, column, text)?;
        Ok(table.rows.get(index).cloned())
    }

    /// Forget everything held for a user (logout).
    pub async fn remove_user(&self, user_id: &str) {
        self.inner.write().await.remove(user_id);
    }

    /// Number of users holding drafts
    pub async fn user_count(&self) -> usize {
        self.inner.read().await.len()
    }
}
