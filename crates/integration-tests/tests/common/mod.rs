//! Shared harness: the real router over an in-memory SQLite store, with a
//! fixed token table standing in for the identity service.

#![allow(dead_code)]

use std::sync::Arc;

use api_adapters::AppState;
use auth_adapters::StaticIdentityProvider;
use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use domains::{Actor, Role};
use serde_json::Value;
use storage_adapters::SqliteStore;
use tower::ServiceExt;

pub const ADMIN: &str = "token-admin";
pub const ALICE: &str = "token-alice";
pub const BOB: &str = "token-bob";
pub const LANDLORD: &str = "token-landlord";

pub const ADMIN_ID: i64 = 1;
pub const ALICE_ID: i64 = 10;
pub const BOB_ID: i64 = 11;
pub const LANDLORD_ID: i64 = 20;

pub struct TestApp {
    pub state: AppState,
    pub store: Arc<SqliteStore>,
    router: Router,
}

impl TestApp {
    pub async fn spawn() -> Self {
        let store = Arc::new(SqliteStore::in_memory().await.expect("in-memory sqlite"));
        let identity = StaticIdentityProvider::new()
            .with_token(ADMIN, Actor::new(ADMIN_ID, Role::Admin))
            .with_token(ALICE, Actor::new(ALICE_ID, Role::Student))
            .with_token(BOB, Actor::new(BOB_ID, Role::Student))
            .with_token(LANDLORD, Actor::new(LANDLORD_ID, Role::Landlord));
        let state = AppState::new(store.clone(), Arc::new(identity), 8);
        let router = api_adapters::router(state.clone());
        Self { state, store, router }
    }

    pub async fn call(&self, method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("request");

        let response = self.router.clone().oneshot(request).await.expect("infallible");
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, json)
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.call(Method::GET, uri, token, None).await
    }

    pub async fn post(&self, uri: &str, token: &str, body: Value) -> (StatusCode, Value) {
        self.call(Method::POST, uri, Some(token), Some(body)).await
    }

    pub async fn put(&self, uri: &str, token: &str, body: Value) -> (StatusCode, Value) {
        self.call(Method::PUT, uri, Some(token), Some(body)).await
    }

    pub async fn delete(&self, uri: &str, token: &str) -> (StatusCode, Value) {
        self.call(Method::DELETE, uri, Some(token), None).await
    }

    /// Runs a `SELECT COUNT(*)`-style query directly against the store.
    pub async fn count(&self, sql: &str) -> i64 {
        sqlx::query_scalar::<_, i64>(sql)
            .fetch_one(self.store.pool())
            .await
            .expect("count query")
    }

    pub async fn create_comment(&self, token: &str, property_id: i64, content: &str) -> i64 {
        let (status, body) = self
            .post(
                &format!("/property/{property_id}/comments"),
                token,
                serde_json::json!({ "content": content, "rating": 4 }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["comment"]["id"].as_i64().expect("comment id")
    }

    pub async fn create_reply(&self, token: &str, comment_id: i64, content: &str) -> i64 {
        let (status, body) = self
            .post(
                &format!("/comments/{comment_id}/replies"),
                token,
                serde_json::json!({ "content": content }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["reply"]["id"].as_i64().expect("reply id")
    }
}
