//! Authentication and authorization for the Setu terminology server.
//!
//! Login issues an HS256 JWT; every request outside the public surface must
//! carry it as a bearer token. Role checks gate the admin surface.

pub mod jwt;
pub mod middleware;
pub mod password;
mod roles;

pub use jwt::{Claims, JwtError, JwtService};
pub use middleware::{AuthContext, AuthState, authentication_middleware, require_role};
pub use password::{hash_password, verify_password};
pub use roles::Role;
