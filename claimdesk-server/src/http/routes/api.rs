//! JSON API over the same drafts the page edits
//!
//! Lets a script or a richer front end edit one cell at a time and save
//! without posting the whole form.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use serde::Deserialize;

use claimdesk_core::pipeline::{self, SaveOutcome};
use claimdesk_core::{Row, Table, TableName, User};

use crate::http::error::ApiError;
use crate::http::extractors::{ApiSession, ValidTable};
use crate::http::server::AppState;

/// One cell edit
#[derive(Deserialize)]
pub struct CellEdit {
    pub column: String,
    pub value: String,
}

/// The user's draft of `name`, fetched and stored if there is none yet.
async fn draft_or_load(
    state: &AppState,
    user: &User,
    token: &claimdesk_core::AccessToken,
    name: TableName,
) -> Result<Table, ApiError> {
    if let Some(table) = state.drafts.table(&user.id, name).await {
        return Ok(table);
    }
    let table = pipeline::load_table(state.backend.as_ref(), token, name)
        .await
        .map_err(|e| ApiError::Backend(e.source))?;
    state.drafts.put(&user.id, table.clone()).await;
    Ok(table)
}

/// GET /api/tables/{table} - rows of the current draft
async fn list_rows(
    State(state): State<Arc<AppState>>,
    ApiSession { user, token }: ApiSession,
    ValidTable(name): ValidTable,
) -> Result<Json<Vec<Row>>, ApiError> {
    let table = draft_or_load(&state, &user, &token, name).await?;
    Ok(Json(table.rows))
}

/// PATCH /api/tables/{table}/rows/{index} - edit a single cell
async fn edit_cell(
    State(state): State<Arc<AppState>>,
    ApiSession { user, token }: ApiSession,
    ValidTable(name): ValidTable,
    Path((_, index)): Path<(String, usize)>,
    Json(edit): Json<CellEdit>,
) -> Result<Json<Row>, ApiError> {
    draft_or_load(&state, &user, &token, name).await?;
    let row = state
        .drafts
        .edit_cell(&user.id, name, index, &edit.column, &edit.value)
        .await?
        .ok_or_else(|| ApiError::NotFound {
            resource: "row",
            id: index.to_string(),
        })?;
    Ok(Json(row))
}

/// POST /api/tables/{table}/save - upsert the draft
async fn save(
    State(state): State<Arc<AppState>>,
    ApiSession { user, token }: ApiSession,
    ValidTable(name): ValidTable,
) -> Result<StatusCode, ApiError> {
    let table = draft_or_load(&state, &user, &token, name).await?;
    match pipeline::save_table(state.backend.as_ref(), &token, &table).await {
        SaveOutcome::Saved { .. } => Ok(StatusCode::NO_CONTENT),
        SaveOutcome::Failed(e) => Err(ApiError::Backend(e)),
    }
}

/// API routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/tables/{table}", get(list_rows))
        .route("/api/tables/{table}/rows/{index}", patch(edit_cell))
        .route("/api/tables/{table}/save", post(save))
}
