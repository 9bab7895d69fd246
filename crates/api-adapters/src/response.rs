//! The success envelope: `{"success": true, ...payload}`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use domains::Page;
use serde::Serialize;
use serde_json::{json, Map, Value};

pub struct Envelope {
    status: StatusCode,
    body: Map<String, Value>,
}

impl Envelope {
    pub fn ok() -> Self {
        Self::with_status(StatusCode::OK)
    }

    pub fn created() -> Self {
        Self::with_status(StatusCode::CREATED)
    }

    fn with_status(status: StatusCode) -> Self {
        let mut body = Map::new();
        body.insert("success".into(), Value::Bool(true));
        Self { status, body }
    }

    pub fn with(mut self, key: &str, value: impl Serialize) -> Self {
        self.body.insert(key.to_string(), json!(value));
        self
    }

    /// Merges the fields of a serialized object into the top level.
    pub fn flatten(mut self, value: impl Serialize) -> Self {
        if let Value::Object(fields) = json!(value) {
            self.body.extend(fields);
        }
        self
    }

    /// Items under `key`, pagination counters alongside.
    pub fn page<T: Serialize>(self, key: &str, page: Page<T>) -> Self {
        self.with(key, &page.items)
            .with("total", page.total)
            .with("pages", page.pages)
            .with("current_page", page.current_page)
            .with("per_page", page.per_page)
    }

    pub fn message(self, text: &str) -> Self {
        self.with("message", text)
    }
}

impl IntoResponse for Envelope {
    fn into_response(self) -> Response {
        (self.status, Json(Value::Object(self.body))).into_response()
    }
}
