//! Session and identity token infrastructure

mod id_token;
mod jwt;

pub use id_token::{IdTokenAlgorithm, IdTokenConfig, IdTokenVerifier, JwtIdTokenVerifier};
pub use jwt::{JwtClaims, JwtConfig, JwtGenerator, JwtService};
