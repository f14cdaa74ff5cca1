//! Test helpers for ChemEquip server integration tests
//!
//! Every test gets its own in-memory database (or a temp file when it needs
//! several connections) and drives the real router with `oneshot`.

#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, HeaderMap, Request, StatusCode},
    Router,
};
use chemequip_server::{
    api::create_router,
    config::{AuthConfig, Config, DatabaseConfig, IngestConfig},
    db, FeatureState,
};
use serde_json::{json, Value};
use sqlx::SqlitePool;
use tower::ServiceExt;

pub const HEADER: &str = "Equipment Name,Type,Flowrate,Pressure,Temperature";

pub const SAMPLE_CSV: &str = "Equipment Name,Type,Flowrate,Pressure,Temperature\n\
                              Pump-01,Pump,150.5,10.5,45.2\n\
                              Comp-02,Compressor,,8.0,60.0\n\
                              HX-03,heat exchanger,200.0,,\n";

const BOUNDARY: &str = "chemequip-test-boundary";

pub struct TestApp {
    pub router: Router,
    pub pool: SqlitePool,
    pub state: FeatureState,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_ingest(IngestConfig::default()).await
    }

    pub async fn with_ingest(ingest: IngestConfig) -> Self {
        let pool = db::create_memory_pool().await.expect("Failed to open memory database");
        db::migrate(&pool).await.expect("Failed to run migrations");
        Self::from_pool(pool, ingest)
    }

    /// File-backed database so concurrent requests use separate connections.
    pub async fn on_disk(dir: &tempfile::TempDir, ingest: IngestConfig) -> Self {
        let config = DatabaseConfig {
            url: format!("sqlite://{}", dir.path().join("test.db").display()),
            max_connections: 8,
            connect_timeout_secs: 10,
        };
        let pool = db::create_pool(&config).await.expect("Failed to open database");
        db::migrate(&pool).await.expect("Failed to run migrations");
        Self::from_pool(pool, ingest)
    }

    fn from_pool(pool: SqlitePool, ingest: IngestConfig) -> Self {
        let state = FeatureState::new(pool.clone(), ingest, AuthConfig::default());
        let router = create_router(state.clone(), &Config::default());
        Self { router, pool, state }
    }

    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Vec<u8>, HeaderMap) {
        let response = self.router.clone().oneshot(request).await.expect("Request failed");
        let status = response.status();
        let headers = response.headers().clone();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("Failed to read body");
        (status, body.to_vec(), headers)
    }

    pub async fn send_json(&self, request: Request<Body>) -> (StatusCode, Value) {
        let (status, body, _) = self.send(request).await;
        let value = if body.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body).expect("Response is not JSON")
        };
        (status, value)
    }

    pub async fn post_json(&self, uri: &str, body: Value, token: Option<&str>) -> (StatusCode, Value) {
        let mut builder = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Token {token}"));
        }
        self.send_json(builder.body(Body::from(body.to_string())).unwrap()).await
    }

    pub async fn get_json(&self, uri: &str, token: &str) -> (StatusCode, Value) {
        self.send_json(get_request(uri, token)).await
    }

    /// Register a user and return its token.
    pub async fn register(&self, username: &str) -> String {
        let (status, body) = self
            .post_json(
                "/api/v1/users/register",
                json!({ "username": username, "password": "correct horse battery" }),
                None,
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "register failed: {body}");
        body["data"]["token"].as_str().expect("token missing").to_string()
    }

    pub async fn upload(&self, token: &str, filename: &str, csv: &str) -> (StatusCode, Value) {
        self.send_json(upload_request(token, filename, "text/csv", csv.as_bytes())).await
    }

    /// Upload and return the new dataset id.
    pub async fn upload_ok(&self, token: &str, filename: &str, csv: &str) -> String {
        let (status, body) = self.upload(token, filename, csv).await;
        assert_eq!(status, StatusCode::CREATED, "upload failed: {body}");
        body["data"]["id"].as_str().expect("id missing").to_string()
    }

    pub async fn count(&self, table: &str) -> i64 {
        sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {table}"))
            .fetch_one(&self.pool)
            .await
            .expect("count failed")
    }
}

pub fn get_request(uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Token {token}"))
        .body(Body::empty())
        .unwrap()
}

pub fn multipart_body(filename: &str, content_type: &str, content: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
    body.extend_from_slice(
        format!("Content-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\n").as_bytes(),
    );
    body.extend_from_slice(format!("Content-Type: {content_type}\r\n\r\n").as_bytes());
    body.extend_from_slice(content);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
    body
}

pub fn upload_request(token: &str, filename: &str, content_type: &str, content: &[u8]) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/v1/datasets/upload")
        .header(header::AUTHORIZATION, format!("Token {token}"))
        .header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={BOUNDARY}"))
        .body(Body::from(multipart_body(filename, content_type, content)))
        .unwrap()
}

/// `n` valid rows named `<prefix>-<i>`.
pub fn csv_with_rows(prefix: &str, n: usize) -> String {
    let mut csv = format!("{HEADER}\n");
    for i in 0..n {
        csv.push_str(&format!("{prefix}-{i},Pump,{},5,40\n", 100 + i));
    }
    csv
}
