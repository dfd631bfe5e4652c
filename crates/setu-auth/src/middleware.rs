//! Bearer-token authentication middleware.
//!
//! Applied to the whole router; paths on the public surface pass through
//! untouched, everything else must present a valid access token. The verified
//! identity is stored in request extensions as [`AuthContext`].

use axum::extract::{Request, State};
use axum::http::header;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use setu_api::ApiError;
use std::sync::Arc;

use crate::jwt::JwtService;
use crate::roles::Role;

/// Exact paths reachable without a token.
const PUBLIC_PATHS: &[&str] = &["/", "/healthz", "/readyz", "/fhir/metadata", "/favicon.ico"];

/// Path prefixes reachable without a token.
const PUBLIC_PREFIXES: &[&str] = &["/auth/"];

/// Shared state for the authentication layer.
#[derive(Clone)]
pub struct AuthState {
    pub jwt: Arc<JwtService>,
}

/// Verified identity of the requester, available to downstream handlers.
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub username: String,
    pub roles: Vec<String>,
}

impl AuthContext {
    #[must_use]
    pub fn has_role(&self, role: Role) -> bool {
        self.roles.iter().any(|r| r == role.as_str())
    }
}

fn is_public(path: &str) -> bool {
    PUBLIC_PATHS.contains(&path) || PUBLIC_PREFIXES.iter().any(|prefix| path.starts_with(prefix))
}

/// Rejects unauthenticated requests outside the public surface with 401.
pub async fn authentication_middleware(
    State(state): State<AuthState>,
    mut request: Request,
    next: Next,
) -> Response {
    if is_public(request.uri().path()) {
        return next.run(request).await;
    }

    let bearer = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "));

    let Some(token) = bearer else {
        return ApiError::unauthorized("Missing bearer token").into_response();
    };

    match state.jwt.verify(token) {
        Ok(claims) => {
            request.extensions_mut().insert(AuthContext {
                username: claims.sub,
                roles: claims.roles,
            });
            next.run(request).await
        }
        Err(err) => {
            tracing::debug!(error = %err, "Rejected bearer token");
            ApiError::unauthorized(err.to_string()).into_response()
        }
    }
}

/// Fails with 403 when the requester lacks the role.
pub fn require_role(ctx: &AuthContext, role: Role) -> Result<(), ApiError> {
    if ctx.has_role(role) {
        Ok(())
    } else {
        Err(ApiError::forbidden(format!("{role} role required")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context(roles: &[&str]) -> AuthContext {
        AuthContext {
            username: "alice".to_string(),
            roles: roles.iter().map(ToString::to_string).collect(),
        }
    }

    #[test]
    fn test_public_surface() {
        assert!(is_public("/"));
        assert!(is_public("/healthz"));
        assert!(is_public("/fhir/metadata"));
        assert!(is_public("/auth/login"));
        assert!(is_public("/auth/register"));
        assert!(!is_public("/fhir/ValueSet/$expand"));
        assert!(!is_public("/admin/stats"));
    }

    #[test]
    fn test_require_role() {
        let admin = context(&["ROLE_USER", "ROLE_ADMIN"]);
        assert!(require_role(&admin, Role::Admin).is_ok());

        let user = context(&["ROLE_USER"]);
        let err = require_role(&user, Role::Admin).unwrap_err();
        assert!(matches!(err, ApiError::Forbidden(_)));
    }

    #[test]
    fn test_has_role() {
        let ctx = context(&["ROLE_USER"]);
        assert!(ctx.has_role(Role::User));
        assert!(!ctx.has_role(Role::Admin));
    }
}
