//! Bearer token authentication for the owner-facing API.
//!
//! Token issuance happens elsewhere; this server only verifies HS256 tokens
//! signed with `JWT_SECRET` whose `sub` is the user id.

pub mod jwt;
pub mod middleware;
pub mod models;

pub use jwt::{AuthOutcome, JwtService};
pub use models::{AuthUser, JwtClaims};
