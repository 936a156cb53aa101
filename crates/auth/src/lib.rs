//! `talentflow-auth`: token and role model for the back-office API.
//!
//! Decoupled from HTTP and storage; the API crate only sees [`JwtValidator`].

pub mod claims;
pub mod jwt;
pub mod roles;

pub use claims::{JwtClaims, TokenValidationError, validate_claims};
pub use jwt::{Hs256JwtValidator, JwtError, JwtValidator};
pub use roles::{Role, has_any_role};
