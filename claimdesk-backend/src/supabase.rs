//! Supabase REST client
//!
//! GoTrue (`/auth/v1`) for sessions and PostgREST (`/rest/v1`) for rows.
//! Every request carries the project's anon key as `apikey`; user requests
//! add the access token as a bearer token so row-level security applies.

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::Serialize;
use serde_json::Value;
use tracing::debug;
use url::Url;

use claimdesk_core::{AccessToken, Backend, BackendError, DeskConfig, Row, Session, TableName, User};

/// PostgREST upsert preference: merge on primary key, no body back
pub const UPSERT_PREFER: &str = "resolution=merge-duplicates,return=minimal";

/// Longest error body quoted back in errors and logs
const MAX_ERROR_BODY: usize = 500;

#[derive(Debug, Serialize)]
struct PasswordGrant<'a> {
    email: &'a str,
    password: &'a str,
}

/// Supabase project client
#[derive(Clone)]
pub struct SupabaseClient {
    client: Client,
    base_url: Url,
    anon_key: String,
}

impl SupabaseClient {
    /// Create a client for the project at `base_url`
    pub fn new(base_url: Url, anon_key: impl Into<String>) -> Self {
        Self::with_client(Client::new(), base_url, anon_key)
    }

    pub fn with_client(client: Client, mut base_url: Url, anon_key: impl Into<String>) -> Self {
        // Url::join drops the last path segment unless it ends in '/'
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Self {
            client,
            base_url,
            anon_key: anon_key.into(),
        }
    }

    /// Create a client from validated configuration
    pub fn from_config(config: &DeskConfig) -> claimdesk_core::Result<Self> {
        let (url, key) = config.validate()?;
        Ok(Self::new(url, key))
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url, BackendError> {
        self.base_url
            .join(path)
            .map_err(|e| BackendError::Transport(format!("invalid endpoint {}: {}", path, e)))
    }

    /// `rest/v1/{table}`
    pub fn table_url(&self, table: TableName) -> Result<Url, BackendError> {
        self.endpoint(&format!("rest/v1/{}", table.as_str()))
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        self.client
            .request(method, url)
            .header("apikey", &self.anon_key)
    }

    fn authed(&self, method: Method, url: Url, token: &AccessToken) -> RequestBuilder {
        self.request(method, url).bearer_auth(token.as_str())
    }
}

/// `columns` parameter for a bulk upsert: every key of every row, quoted,
/// in first-seen order. Lets rows with differing keys go in one request.
pub fn upsert_columns(rows: &[Row]) -> Option<String> {
    let mut seen: Vec<&str> = Vec::new();
    for column in rows.iter().flat_map(Row::columns) {
        if !seen.contains(&column) {
            seen.push(column);
        }
    }
    if seen.is_empty() {
        return None;
    }
    Some(
        seen.iter()
            .map(|c| format!("\"{}\"", c))
            .collect::<Vec<_>>()
            .join(","),
    )
}

fn transport(e: reqwest::Error) -> BackendError {
    BackendError::Transport(e.to_string())
}

/// Pull a human message out of a GoTrue/PostgREST error body.
pub fn error_message(body: &str) -> String {
    if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(body) {
        for key in ["message", "msg", "error_description", "error"] {
            if let Some(Value::String(message)) = map.get(key) {
                return message.clone();
            }
        }
    }
    // Truncate to avoid echoing large or sensitive bodies into logs
    if body.len() > MAX_ERROR_BODY {
        let mut end = MAX_ERROR_BODY;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &body[..end])
    } else {
        body.to_owned()
    }
}

async fn fail(response: Response) -> BackendError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    BackendError::status(status, error_message(&body))
}

async fn decode<T: serde::de::DeserializeOwned>(response: Response) -> Result<T, BackendError> {
    let body = response.text().await.map_err(transport)?;
    serde_json::from_str(&body).map_err(|e| BackendError::Decode(e.to_string()))
}

#[async_trait]
impl Backend for SupabaseClient {
    async fn get_user(&self, token: &AccessToken) -> Result<Option<User>, BackendError> {
        let url = self.endpoint("auth/v1/user")?;
        let response = self
            .authed(Method::GET, url, token)
            .send()
            .await
            .map_err(transport)?;

        match response.status() {
            s if s.is_success() => decode(response).await.map(Some),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                debug!("Auth service rejected access token");
                Ok(None)
            }
            _ => Err(fail(response).await),
        }
    }

    async fn select_all(
        &self,
        token: &AccessToken,
        table: TableName,
    ) -> Result<Vec<Row>, BackendError> {
        let mut url = self.table_url(table)?;
        url.query_pairs_mut().append_pair("select", "*");

        let response = self
            .authed(Method::GET, url, token)
            .send()
            .await
            .map_err(transport)?;
        if !response.status().is_success() {
            return Err(fail(response).await);
        }
        decode(response).await
    }

    async fn upsert(
        &self,
        token: &AccessToken,
        table: TableName,
        rows: &[Row],
    ) -> Result<(), BackendError> {
        let mut url = self.table_url(table)?;
        if let Some(columns) = upsert_columns(rows) {
            url.query_pairs_mut().append_pair("columns", &columns);
        }

        debug!(table = %table, rows = rows.len(), "Upserting rows");
        let response = self
            .authed(Method::POST, url, token)
            .header("Prefer", UPSERT_PREFER)
            .json(rows)
            .send()
            .await
            .map_err(transport)?;
        if !response.status().is_success() {
            return Err(fail(response).await);
        }
        Ok(())
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, BackendError> {
        let mut url = self.endpoint("auth/v1/token")?;
        url.query_pairs_mut().append_pair("grant_type", "password");

        let response = self
            .request(Method::POST, url)
            .json(&PasswordGrant { email, password })
            .send()
            .await
            .map_err(transport)?;

        match response.status() {
            s if s.is_success() => decode(response).await,
            StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED => {
                Err(BackendError::InvalidCredentials)
            }
            _ => Err(fail(response).await),
        }
    }

    async fn sign_out(&self, token: &AccessToken) -> Result<(), BackendError> {
        let url = self.endpoint("auth/v1/logout")?;
        let response = self
            .authed(Method::POST, url, token)
            .send()
            .await
            .map_err(transport)?;
        // An already-expired token is as signed out as it gets
        if response.status().is_success() || response.status() == StatusCode::UNAUTHORIZED {
            return Ok(());
        }
        Err(fail(response).await)
    }
}
