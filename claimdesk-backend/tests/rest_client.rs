//! SupabaseClient against a fake Supabase served by axum on an ephemeral port

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use url::Url;

use claimdesk_backend::{SupabaseClient, UPSERT_PREFER};
use claimdesk_core::{AccessToken, Backend, BackendError, Row, TableName};

#[derive(Debug, Clone)]
struct Recorded {
    path: String,
    query: HashMap<String, String>,
    apikey: Option<String>,
    authorization: Option<String>,
    prefer: Option<String>,
    body: Option<Value>,
}

type Log = Arc<Mutex<Vec<Recorded>>>;

fn header(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned)
}

fn record(log: &Log, path: String, query: HashMap<String, String>, headers: &HeaderMap, body: Option<Value>) {
    log.lock().unwrap().push(Recorded {
        path,
        query,
        apikey: header(headers, "apikey"),
        authorization: header(headers, "authorization"),
        prefer: header(headers, "prefer"),
        body,
    });
}

async fn user(headers: HeaderMap) -> (StatusCode, Json<Value>) {
    match header(&headers, "authorization").as_deref() {
        Some("Bearer good") => (
            StatusCode::OK,
            Json(json!({"id": "u-1", "email": "ada@example.com", "aud": "authenticated"})),
        ),
        _ => (StatusCode::UNAUTHORIZED, Json(json!({"msg": "invalid JWT"}))),
    }
}

async fn token(
    Query(query): Query<HashMap<String, String>>,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    if query.get("grant_type").map(String::as_str) != Some("password") {
        return (StatusCode::NOT_FOUND, Json(json!({})));
    }
    if body["password"] == "pw" {
        (
            StatusCode::OK,
            Json(json!({
                "access_token": "good",
                "token_type": "bearer",
                "expires_in": 3600,
                "refresh_token": "r",
                "user": {"id": "u-1", "email": body["email"]}
            })),
        )
    } else {
        (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "invalid_grant", "error_description": "Invalid login credentials"})),
        )
    }
}

async fn select(
    State(log): State<Log>,
    Path(table): Path<String>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> (StatusCode, Json<Value>) {
    record(&log, format!("/rest/v1/{}", table), query, &headers, None);
    match table.as_str() {
        "claims" => (
            StatusCode::OK,
            Json(json!([
                {"id": 7, "title": "Hail damage", "amount": 880},
                {"id": 8, "title": "Flood", "amount": null}
            ])),
        ),
        _ => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"code": "42P01", "message": "relation does not exist"})),
        ),
    }
}

async fn upsert(
    State(log): State<Log>,
    Path(table): Path<String>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> StatusCode {
    record(&log, format!("/rest/v1/{}", table), query, &headers, Some(body));
    StatusCode::CREATED
}

async fn spawn_fake() -> (SupabaseClient, Log) {
    let log: Log = Arc::default();
    let app = Router::new()
        .route("/auth/v1/user", get(user))
        .route("/auth/v1/token", post(token))
        .route("/auth/v1/logout", post(|| async { StatusCode::NO_CONTENT }))
        .route("/rest/v1/{table}", get(select).post(upsert))
        .with_state(log.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let url = Url::parse(&format!("http://{}", addr)).unwrap();
    (SupabaseClient::new(url, "anon-key"), log)
}

#[tokio::test]
async fn get_user_with_valid_and_invalid_tokens() {
    let (client, _) = spawn_fake().await;

    let user = client.get_user(&AccessToken::new("good")).await.unwrap();
    assert_eq!(user.map(|u| u.id), Some("u-1".to_string()));

    let none = client.get_user(&AccessToken::new("stale")).await.unwrap();
    assert!(none.is_none());
}

#[tokio::test]
async fn sign_in_maps_bad_password() {
    let (client, _) = spawn_fake().await;

    let session = client.sign_in("ada@example.com", "pw").await.unwrap();
    assert_eq!(session.access_token.as_str(), "good");
    assert_eq!(session.expires_in, Some(3600));

    let err = client.sign_in("ada@example.com", "nope").await.unwrap_err();
    assert_eq!(err, BackendError::InvalidCredentials);

    client.sign_out(&session.access_token).await.unwrap();
}

#[tokio::test]
async fn select_sends_keys_and_keeps_column_order() {
    let (client, log) = spawn_fake().await;

    let rows = client
        .select_all(&AccessToken::new("good"), TableName::Claims)
        .await
        .unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].columns().collect::<Vec<_>>(), vec!["id", "title", "amount"]);

    let seen = log.lock().unwrap()[0].clone();
    assert_eq!(seen.path, "/rest/v1/claims");
    assert_eq!(seen.query.get("select").map(String::as_str), Some("*"));
    assert_eq!(seen.apikey.as_deref(), Some("anon-key"));
    assert_eq!(seen.authorization.as_deref(), Some("Bearer good"));
}

#[tokio::test]
async fn select_error_carries_postgrest_message() {
    let (client, _) = spawn_fake().await;

    let err = client
        .select_all(&AccessToken::new("good"), TableName::UserProfiles)
        .await
        .unwrap_err();
    assert_eq!(
        err,
        BackendError::Status {
            status: 500,
            message: "relation does not exist".into()
        }
    );
}

#[tokio::test]
async fn upsert_posts_whole_array_with_merge_preference() {
    let (client, log) = spawn_fake().await;
    let rows: Vec<Row> = serde_json::from_value(json!([
        {"id": 7, "title": "Hail damage (roof)", "amount": 880},
        {"id": 8, "title": "Flood", "amount": null}
    ]))
    .unwrap();

    client
        .upsert(&AccessToken::new("good"), TableName::Claims, &rows)
        .await
        .unwrap();

    let seen = log.lock().unwrap()[0].clone();
    assert_eq!(seen.prefer.as_deref(), Some(UPSERT_PREFER));
    assert_eq!(
        seen.query.get("columns").map(String::as_str),
        Some(r#""id","title","amount""#)
    );
    assert_eq!(seen.body, Some(serde_json::to_value(&rows).unwrap()));
}
