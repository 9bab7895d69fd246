//! # Content authorization
//!
//! A stateless rule evaluator. Given who is acting, what they want to do and
//! who owns the target, it answers allow or deny. Rules are checked in this
//! order:
//!
//! 1. `Read` of public content is always allowed, even anonymously.
//! 2. Everything else needs an authenticated actor.
//! 3. `Create` is open to any authenticated actor.
//! 4. `Update` is owner-only. Admins get no override here.
//! 5. `Delete` is allowed for the owner or an admin.
//! 6. `Pin`, `ViewReports` and `TransitionReport` are admin-only.

use crate::errors::DomainError;
use crate::identity::Actor;
use crate::models::{Owned, UserId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Read,
    Create,
    Update,
    Delete,
    Pin,
    ViewReports,
    TransitionReport,
}

/// What is being acted on. Only ownership matters to the rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Target {
    owner_id: Option<UserId>,
}

impl Target {
    /// A node that does not exist yet, or whose owner is irrelevant.
    pub fn unowned() -> Self {
        Self { owner_id: None }
    }

    pub fn owned_by(owner_id: UserId) -> Self {
        Self {
            owner_id: Some(owner_id),
        }
    }

    pub fn of<T: Owned>(node: &T) -> Self {
        Self::owned_by(node.owner_id())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DenyReason {
    /// Maps to 401
    Unauthenticated,
    /// Maps to 403
    Forbidden(&'static str),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny(DenyReason),
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allow)
    }

    pub fn into_result(self) -> Result<(), DomainError> {
        match self {
            Self::Allow => Ok(()),
            Self::Deny(DenyReason::Unauthenticated) => Err(DomainError::AuthenticationRequired),
            Self::Deny(DenyReason::Forbidden(why)) => Err(DomainError::forbidden(why)),
        }
    }
}

pub fn authorize(actor: Option<&Actor>, action: Action, target: Target) -> Decision {
    if action == Action::Read {
        return Decision::Allow;
    }
    let Some(actor) = actor else {
        return Decision::Deny(DenyReason::Unauthenticated);
    };
    let is_owner = target.owner_id == Some(actor.id);

    match action {
        Action::Read | Action::Create => Decision::Allow,
        Action::Update if is_owner => Decision::Allow,
        Action::Update => Decision::Deny(DenyReason::Forbidden("only the author may edit this content")),
        Action::Delete if is_owner || actor.is_admin() => Decision::Allow,
        Action::Delete => Decision::Deny(DenyReason::Forbidden(
            "only the author or an administrator may delete this content",
        )),
        Action::Pin | Action::ViewReports | Action::TransitionReport if actor.is_admin() => {
            Decision::Allow
        }
        Action::Pin | Action::ViewReports | Action::TransitionReport => {
            Decision::Deny(DenyReason::Forbidden("administrator privileges required"))
        }
    }
}

/// Shorthand for `authorize(..).into_result()`.
pub fn ensure(actor: Option<&Actor>, action: Action, target: Target) -> Result<(), DomainError> {
    authorize(actor, action, target).into_result()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::Role;

    const OWNER: Actor = Actor { id: 1, role: Role::Student };
    const STRANGER: Actor = Actor { id: 2, role: Role::Landlord };
    const ADMIN: Actor = Actor { id: 3, role: Role::Admin };

    #[test]
    fn reads_are_public() {
        assert!(authorize(None, Action::Read, Target::owned_by(1)).is_allowed());
    }

    #[test]
    fn anonymous_writes_are_unauthenticated_not_forbidden() {
        for action in [Action::Create, Action::Update, Action::Delete, Action::Pin] {
            assert_eq!(
                authorize(None, action, Target::owned_by(1)),
                Decision::Deny(DenyReason::Unauthenticated)
            );
        }
    }

    #[test]
    fn update_is_owner_only_even_for_admins() {
        let target = Target::owned_by(OWNER.id);
        assert!(authorize(Some(&OWNER), Action::Update, target).is_allowed());
        assert!(!authorize(Some(&STRANGER), Action::Update, target).is_allowed());
        assert!(!authorize(Some(&ADMIN), Action::Update, target).is_allowed());
    }

    #[test]
    fn delete_allows_owner_and_admin() {
        let target = Target::owned_by(OWNER.id);
        assert!(authorize(Some(&OWNER), Action::Delete, target).is_allowed());
        assert!(authorize(Some(&ADMIN), Action::Delete, target).is_allowed());
        assert!(matches!(
            authorize(Some(&STRANGER), Action::Delete, target),
            Decision::Deny(DenyReason::Forbidden(_))
        ));
    }

    #[test]
    fn moderation_actions_need_admin() {
        for action in [Action::Pin, Action::ViewReports, Action::TransitionReport] {
            assert!(authorize(Some(&ADMIN), action, Target::unowned()).is_allowed());
            // owning the node grants nothing here
            assert!(!authorize(Some(&OWNER), action, Target::owned_by(OWNER.id)).is_allowed());
        }
    }

    #[test]
    fn deny_maps_to_distinct_error_kinds() {
        assert!(matches!(
            ensure(None, Action::Create, Target::unowned()),
            Err(DomainError::AuthenticationRequired)
        ));
        assert!(matches!(
            ensure(Some(&STRANGER), Action::Pin, Target::unowned()),
            Err(DomainError::AuthorizationDenied(_))
        ));
    }
}
