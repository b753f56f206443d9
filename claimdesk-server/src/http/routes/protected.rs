//! The protected page: both tables as editable grids

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::routing::{get, post};
use axum::{Form, Router};

use claimdesk_core::pipeline::{self, PageLoad};
use claimdesk_core::{DeskError, TableSet};

use crate::http::extractors::{PageSession, SessionToken, ValidTable};
use crate::http::server::AppState;
use crate::render;

/// GET /protected - session check, fetch, render
///
/// A page load always starts over from the backend's rows, discarding
/// unsaved edits.
async fn show(State(state): State<Arc<AppState>>, SessionToken(token): SessionToken) -> Response {
    match pipeline::load_page(state.backend.as_ref(), token.as_ref()).await {
        PageLoad::Redirect(to) => Redirect::to(to).into_response(),
        PageLoad::Loaded { user, tables } => {
            state.drafts.replace(&user.id, &tables).await;
            Html(render::protected_page(&user, &tables)).into_response()
        }
        PageLoad::FetchFailed { user, .. } => {
            (StatusCode::BAD_GATEWAY, Html(render::fetch_error_page(&user))).into_response()
        }
    }
}

/// Apply submitted cell values to the tables; returns how many cells changed.
///
/// Fields that are not cells, or point past the end of a table, are skipped.
pub fn apply_form(tables: &mut TableSet, fields: &[(String, String)]) -> usize {
    let mut changed = 0;
    for (name, value) in fields {
        let Some((table, index, column)) = render::parse_cell_field(name) else {
            continue;
        };
        match tables.get_mut(table).set_cell(index, column, value) {
            Ok(true) => changed += 1,
            Ok(false) => {}
            Err(DeskError::RowOutOfRange { index, len, .. }) => {
                tracing::warn!(table = %table, index, len, "Ignoring edit for missing row");
            }
            Err(e) => tracing::warn!(error = %e, "Ignoring edit"),
        }
    }
    changed
}

/// POST /protected/{table} - apply edits to the drafts and upsert one table
///
/// The form carries both tables, so edits to the other table are kept in its
/// draft without being saved. Either way the page is rendered from the drafts.
async fn save(
    State(state): State<Arc<AppState>>,
    PageSession { user, token }: PageSession,
    ValidTable(name): ValidTable,
    Form(fields): Form<Vec<(String, String)>>,
) -> Response {
    // No draft (server restarted, or drafts evicted since the page was loaded):
    // start from remote rows
    for missing in state.drafts.missing(&user.id).await {
        match pipeline::load_table(state.backend.as_ref(), &token, missing).await {
            Ok(table) => state.drafts.put(&user.id, table).await,
            Err(e) => {
                tracing::error!(error = %e, "Error fetching data");
                return (StatusCode::BAD_GATEWAY, Html(render::fetch_error_page(&user)))
                    .into_response();
            }
        }
    }

    let mut tables = state.drafts.tables(&user.id).await;
    let changed = apply_form(&mut tables, &fields);
    tracing::debug!(table = %name, changed, "Applied form edits");
    for table in tables.iter() {
        state.drafts.put(&user.id, table.clone()).await;
    }

    // Failure is logged by save_table; the unsaved edits stay on screen
    let outcome = pipeline::save_table(state.backend.as_ref(), &token, tables.get(name)).await;
    tracing::debug!(table = %name, saved = outcome.is_saved(), "Save finished");

    Html(render::protected_page(&user, &tables)).into_response()
}

/// Protected page routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/protected", get(show))
        .route("/protected/{table}", post(save))
}
