use std::collections::HashMap;

use domains::ports::IdentityProvider;
use domains::{Actor, Result};

use crate::AuthError;

/// Fixed token to actor table. For local development and tests only.
#[derive(Debug, Clone, Default)]
pub struct StaticIdentityProvider {
    tokens: HashMap<String, Actor>,
}

impl StaticIdentityProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(mut self, token: impl Into<String>, actor: Actor) -> Self {
        self.tokens.insert(token.into(), actor);
        self
    }
}

impl IdentityProvider for StaticIdentityProvider {
    fn resolve(&self, bearer: &str) -> Result<Actor> {
        self.tokens
            .get(bearer.trim())
            .copied()
            .ok_or_else(|| AuthError::UnknownToken.into())
    }
}

#[cfg(test)]
mod tests {
    use domains::{DomainError, Role};

    use super::*;

    #[test]
    fn known_tokens_resolve_and_others_are_unauthenticated() {
        let provider = StaticIdentityProvider::new().with_token("dev-admin", Actor::new(1, Role::Admin));
        assert_eq!(provider.resolve("dev-admin").unwrap().id, 1);
        assert!(matches!(provider.resolve("nope"), Err(DomainError::AuthenticationRequired)));
    }
}
