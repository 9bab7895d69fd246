//! Request-scoped identity, as supplied by the identity collaborator.

use serde::{Deserialize, Serialize};

use crate::errors::{DomainError, Result};
use crate::models::UserId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Landlord,
    Admin,
    Superuser,
}

/// An authenticated user acting on the system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: UserId,
    pub role: Role,
}

impl Actor {
    pub fn new(id: UserId, role: Role) -> Self {
        Self { id, role }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self.role, Role::Admin | Role::Superuser)
    }

    pub fn is_superuser(&self) -> bool {
        self.role == Role::Superuser
    }
}

/// Built once per request and handed to every use case.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestContext {
    pub actor: Option<Actor>,
}

impl RequestContext {
    pub fn anonymous() -> Self {
        Self { actor: None }
    }

    pub fn authenticated(actor: Actor) -> Self {
        Self { actor: Some(actor) }
    }

    pub fn actor(&self) -> Option<&Actor> {
        self.actor.as_ref()
    }

    pub fn require_actor(&self) -> Result<Actor> {
        self.actor.ok_or(DomainError::AuthenticationRequired)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn superuser_counts_as_admin() {
        assert!(Actor::new(1, Role::Superuser).is_admin());
        assert!(Actor::new(1, Role::Admin).is_admin());
        assert!(!Actor::new(1, Role::Landlord).is_admin());
        assert!(!Actor::new(1, Role::Admin).is_superuser());
    }

    #[test]
    fn anonymous_context_requires_login() {
        let err = RequestContext::anonymous().require_actor().unwrap_err();
        assert!(matches!(err, DomainError::AuthenticationRequired));
    }
}
