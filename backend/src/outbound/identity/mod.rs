//! Bearer token identity adapters.

mod jwt_resolver;

pub use jwt_resolver::{AccessClaims, JwtIdentityResolver};
