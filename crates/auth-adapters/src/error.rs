use domains::DomainError;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("token is malformed or its signature does not verify: {0}")]
    InvalidToken(String),

    #[error("token has expired")]
    Expired,

    #[error("subject '{0}' is not a user id")]
    BadSubject(String),

    #[error("unknown bearer token")]
    UnknownToken,

    #[error("could not sign token: {0}")]
    Signing(String),
}

/// Every credential problem surfaces to clients as a plain 401.
impl From<AuthError> for DomainError {
    fn from(err: AuthError) -> Self {
        debug!(error = %err, "bearer credential rejected");
        DomainError::AuthenticationRequired
    }
}
