//! HS256 bearer tokens shared with the identity service.

use chrono::{Duration, Utc};
use domains::ports::IdentityProvider;
use domains::{Actor, Result, Role, UserId};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::AuthError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    /// User id, as a decimal string
    pub sub: String,
    pub role: Role,
    pub exp: i64,
    pub iat: i64,
}

pub struct JwtIdentityProvider {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl JwtIdentityProvider {
    pub fn new(secret: &SecretString, ttl: Duration) -> Self {
        let key = secret.expose_secret().as_bytes();
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        Self {
            encoding: EncodingKey::from_secret(key),
            decoding: DecodingKey::from_secret(key),
            validation,
            ttl,
        }
    }

    /// Signs a token for `actor` valid for the configured TTL.
    pub fn issue(&self, actor: &Actor) -> std::result::Result<String, AuthError> {
        let now = Utc::now();
        let claims = Claims {
            sub: actor.id.to_string(),
            role: actor.role,
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| AuthError::Signing(e.to_string()))
    }

    pub fn verify(&self, token: &str) -> std::result::Result<Actor, AuthError> {
        let data = decode::<Claims>(token, &self.decoding, &self.validation).map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => AuthError::Expired,
            _ => AuthError::InvalidToken(e.to_string()),
        })?;
        let id: UserId = data
            .claims
            .sub
            .parse()
            .map_err(|_| AuthError::BadSubject(data.claims.sub.clone()))?;
        Ok(Actor::new(id, data.claims.role))
    }
}

impl IdentityProvider for JwtIdentityProvider {
    fn resolve(&self, bearer: &str) -> Result<Actor> {
        Ok(self.verify(bearer.trim())?)
    }
}
