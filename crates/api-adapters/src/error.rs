use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use domains::DomainError;
use serde_json::{json, Value};
use thiserror::Error;
use tracing::error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// The request never reached a use case (unreadable body, bad query string)
    #[error("bad request: {0}")]
    BadRequest(String),
}

pub type ApiResult<T> = Result<T, ApiError>;

/// Status code for a domain failure.
pub fn status_of(err: &DomainError) -> StatusCode {
    match err {
        DomainError::Validation(_)
        | DomainError::DuplicateConflict(_)
        | DomainError::DuplicateReport(_) => StatusCode::BAD_REQUEST,
        DomainError::AuthenticationRequired => StatusCode::UNAUTHORIZED,
        DomainError::AuthorizationDenied(_) => StatusCode::FORBIDDEN,
        DomainError::NotFound { .. } => StatusCode::NOT_FOUND,
        DomainError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// The text a client is allowed to see. Store failures are logged here
/// and replaced with a generic message.
pub fn client_message(err: &DomainError) -> String {
    match err {
        DomainError::Validation(msg) => msg.clone(),
        DomainError::Store(detail) => {
            error!(error = %detail, "store failure");
            "internal server error".to_string()
        }
        other => other.to_string(),
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, failure(msg)),
            ApiError::Domain(DomainError::DuplicateReport(report)) => {
                let mut body = failure("content already reported".to_string());
                body["report"] = json!(report);
                (StatusCode::BAD_REQUEST, body)
            }
            ApiError::Domain(err) => (status_of(&err), failure(client_message(&err))),
        };
        (status, Json(body)).into_response()
    }
}

fn failure(message: String) -> Value {
    json!({ "success": false, "error": message })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses_follow_the_taxonomy() {
        assert_eq!(status_of(&DomainError::validation("x")), StatusCode::BAD_REQUEST);
        assert_eq!(status_of(&DomainError::AuthenticationRequired), StatusCode::UNAUTHORIZED);
        assert_eq!(status_of(&DomainError::forbidden("x")), StatusCode::FORBIDDEN);
        assert_eq!(status_of(&DomainError::not_found("comment", 1)), StatusCode::NOT_FOUND);
        assert_eq!(status_of(&DomainError::store("disk")), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn store_details_never_reach_the_client() {
        let msg = client_message(&DomainError::store("UNIQUE constraint failed: secret_table"));
        assert_eq!(msg, "internal server error");
        assert_eq!(client_message(&DomainError::validation("content is required")), "content is required");
    }
}
