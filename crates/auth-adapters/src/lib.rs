//! offcampus/crates/auth-adapters/src/lib.rs
//!
//! Implementations of the `IdentityProvider` port. Sessions and passwords
//! live in the external identity service; these adapters only turn the
//! bearer credential it issued into an `Actor`.

mod error;
#[cfg(feature = "auth-jwt")]
pub mod jwt;
mod static_tokens;

pub use error::AuthError;
#[cfg(feature = "auth-jwt")]
pub use jwt::{Claims, JwtIdentityProvider};
pub use static_tokens::StaticIdentityProvider;
