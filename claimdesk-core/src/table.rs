//! Tables, rows and the pair of tables the page edits
//!
//! Rows are schemaless: a row is whatever JSON object the backend returned,
//! with its key order preserved. Columns are discovered from the first row.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::cell;
use crate::error::{DeskError, Result};

/// The tables this application manages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TableName {
    Claims,
    UserProfiles,
}

impl TableName {
    /// Page order
    pub const ALL: [TableName; 2] = [TableName::Claims, TableName::UserProfiles];

    /// Remote table name
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Claims => "claims",
            Self::UserProfiles => "user_profiles",
        }
    }

    pub fn heading(self) -> &'static str {
        match self {
            Self::Claims => "Claims Data",
            Self::UserProfiles => "User Profiles Data",
        }
    }

    pub fn save_label(self) -> &'static str {
        match self {
            Self::Claims => "Save Claims",
            Self::UserProfiles => "Save User Profiles",
        }
    }

    /// Noun used in log lines ("Error saving user profiles")
    pub fn noun(self) -> &'static str {
        match self {
            Self::Claims => "claims",
            Self::UserProfiles => "user profiles",
        }
    }
}

impl fmt::Display for TableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TableName {
    type Err = DeskError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "claims" => Ok(Self::Claims),
            "user_profiles" => Ok(Self::UserProfiles),
            other => Err(DeskError::unknown_table(other)),
        }
    }
}

/// One record: column name to scalar value, in backend order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Row(Map<String, Value>);

impl Row {
    pub fn new() -> Self {
        Self(Map::new())
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.0.get(column)
    }

    /// Cells in this row's own key order
    pub fn cells(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Set a raw value, appending the column if the row lacks it.
    pub fn insert(&mut self, column: impl Into<String>, value: Value) -> Option<Value> {
        self.0.insert(column.into(), value)
    }

    /// Implicit primary key
    pub fn id(&self) -> Option<&Value> {
        self.0.get("id")
    }

    pub fn into_inner(self) -> Map<String, Value> {
        self.0
    }
}

/// Parse a JSON array of row objects; `context` names the source in errors.
pub fn rows_from_json(text: &str, context: &str) -> Result<Vec<Row>> {
    serde_json::from_str(text).map_err(|e| DeskError::json(context, e))
}

impl From<Map<String, Value>> for Row {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl FromIterator<(String, Value)> for Row {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Rows of one table, as loaded and then edited.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
    pub name: TableName,
    pub rows: Vec<Row>,
}

impl Table {
    pub fn new(name: TableName, rows: Vec<Row>) -> Self {
        Self { name, rows }
    }

    pub fn empty(name: TableName) -> Self {
        Self::new(name, Vec::new())
    }

    /// Header columns: the keys of the first row.
    pub fn columns(&self) -> Vec<&str> {
        self.rows
            .first()
            .map(|row| row.columns().collect())
            .unwrap_or_default()
    }

    /// Stable key for rendering a row: its `id` when present, else its index.
    pub fn row_key(&self, index: usize) -> String {
        match self.rows.get(index).and_then(Row::id) {
            Some(id) => cell::display_text(id),
            None => index.to_string(),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Apply typed text to exactly one cell.
    ///
    /// Returns whether the stored value changed. Other cells and rows are
    /// never touched.
    pub fn set_cell(&mut self, index: usize, column: &str, text: &str) -> Result<bool> {
        let len = self.rows.len();
        let row = self.rows.get_mut(index).ok_or_else(|| DeskError::RowOutOfRange {
            table: self.name.as_str().to_owned(),
            index,
            len,
        })?;

        let previous = row.get(column);
        if previous.map(cell::display_text).as_deref() == Some(text) {
            return Ok(false);
        }

        let value = cell::coerce_input(previous, text);
        row.insert(column, value);
        Ok(true)
    }
}

/// Both tables shown on the protected page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableSet {
    pub claims: Table,
    pub user_profiles: Table,
}

impl TableSet {
    pub fn new(claims: Vec<Row>, user_profiles: Vec<Row>) -> Self {
        Self {
            claims: Table::new(TableName::Claims, claims),
            user_profiles: Table::new(TableName::UserProfiles, user_profiles),
        }
    }

    pub fn get(&self, name: TableName) -> &Table {
        match name {
            TableName::Claims => &self.claims,
            TableName::UserProfiles => &self.user_profiles,
        }
    }

    pub fn get_mut(&mut self, name: TableName) -> &mut Table {
        match name {
            TableName::Claims => &mut self.claims,
            TableName::UserProfiles => &mut self.user_profiles,
        }
    }

    /// Tables in page order
    pub fn iter(&self) -> impl Iterator<Item = &Table> {
        TableName::ALL.into_iter().map(|name| self.get(name))
    }
}
