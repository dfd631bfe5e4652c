//! JWT token generation and validation.
//!
//! Tokens are HS256-signed with a shared secret, carry the username as the
//! subject plus the account's roles, and expire after a configured lifetime.
//!
//! ```ignore
//! use setu_auth::jwt::JwtService;
//!
//! let jwt = JwtService::new("secret", "setu-terminology-service", 3600);
//! let token = jwt.issue("alice", &["ROLE_USER".to_string()])?;
//! let claims = jwt.verify(&token)?;
//! assert_eq!(claims.sub, "alice");
//! ```

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Errors that can occur during JWT operations.
#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    /// Failed to encode a token.
    #[error("Failed to encode token: {message}")]
    EncodingError {
        /// Description of the encoding error.
        message: String,
    },

    /// Failed to decode a token.
    #[error("Failed to decode token: {message}")]
    DecodingError {
        /// Description of the decoding error.
        message: String,
    },

    /// The token has expired.
    #[error("Token expired")]
    Expired,

    /// The token signature is invalid.
    #[error("Invalid signature")]
    InvalidSignature,

    /// The token claims are invalid.
    #[error("Invalid claims: {message}")]
    InvalidClaims {
        /// Description of why claims are invalid.
        message: String,
    },
}

impl JwtError {
    #[must_use]
    pub fn encoding_error(message: impl Into<String>) -> Self {
        Self::EncodingError {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn decoding_error(message: impl Into<String>) -> Self {
        Self::DecodingError {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn invalid_claims(message: impl Into<String>) -> Self {
        Self::InvalidClaims {
            message: message.into(),
        }
    }
}

impl From<jsonwebtoken::errors::Error> for JwtError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;

        match err.kind() {
            ErrorKind::ExpiredSignature => Self::Expired,
            ErrorKind::InvalidSignature => Self::InvalidSignature,
            ErrorKind::InvalidAudience
            | ErrorKind::InvalidIssuer
            | ErrorKind::InvalidSubject
            | ErrorKind::MissingRequiredClaim(_) => Self::invalid_claims(err.to_string()),
            _ => Self::decoding_error(err.to_string()),
        }
    }
}

/// Claims carried by an access token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Username of the authenticated account.
    pub sub: String,
    /// Issuing service identifier.
    pub iss: String,
    /// Issued-at, seconds since epoch.
    pub iat: i64,
    /// Expiry, seconds since epoch.
    pub exp: i64,
    /// Role names granted to the account.
    pub roles: Vec<String>,
}

/// Issues and validates HS256 access tokens.
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    issuer: String,
    expiration_secs: i64,
}

impl std::fmt::Debug for JwtService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtService")
            .field("issuer", &self.issuer)
            .field("expiration_secs", &self.expiration_secs)
            .finish_non_exhaustive()
    }
}

impl JwtService {
    #[must_use]
    pub fn new(secret: &str, issuer: impl Into<String>, expiration_secs: i64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            issuer: issuer.into(),
            expiration_secs,
        }
    }

    /// Issues a token for the given account.
    pub fn issue(&self, username: &str, roles: &[String]) -> Result<String, JwtError> {
        let now = OffsetDateTime::now_utc().unix_timestamp();
        let claims = Claims {
            sub: username.to_string(),
            iss: self.issuer.clone(),
            iat: now,
            exp: now + self.expiration_secs,
            roles: roles.to_vec(),
        };
        Ok(encode(&Header::default(), &claims, &self.encoding_key)?)
    }

    /// Validates a token and returns its claims.
    ///
    /// Rejects expired tokens, bad signatures, and tokens from another issuer.
    pub fn verify(&self, token: &str) -> Result<Claims, JwtError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&self.issuer]);
        let data = decode::<Claims>(token, &self.decoding_key, &validation)?;
        Ok(data.claims)
    }

    /// Token lifetime in seconds, surfaced in login responses.
    #[must_use]
    pub fn expiration_secs(&self) -> i64 {
        self.expiration_secs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> JwtService {
        JwtService::new("test-secret", "setu-terminology-service", 3600)
    }

    #[test]
    fn test_issue_and_verify_roundtrip() {
        let jwt = service();
        let token = jwt
            .issue("alice", &["ROLE_USER".to_string(), "ROLE_ADMIN".to_string()])
            .unwrap();

        let claims = jwt.verify(&token).unwrap();
        assert_eq!(claims.sub, "alice");
        assert_eq!(claims.iss, "setu-terminology-service");
        assert_eq!(claims.roles.len(), 2);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn test_verify_rejects_wrong_secret() {
        let token = service().issue("alice", &[]).unwrap();
        let other = JwtService::new("other-secret", "setu-terminology-service", 3600);

        let err = other.verify(&token).unwrap_err();
        assert!(matches!(err, JwtError::InvalidSignature));
    }

    #[test]
    fn test_verify_rejects_wrong_issuer() {
        let token = JwtService::new("test-secret", "someone-else", 3600)
            .issue("alice", &[])
            .unwrap();

        let err = service().verify(&token).unwrap_err();
        assert!(matches!(err, JwtError::InvalidClaims { .. }));
    }

    #[test]
    fn test_verify_rejects_expired_token() {
        // Lifetime far enough in the past to clear the default leeway.
        let jwt = JwtService::new("test-secret", "setu-terminology-service", -600);
        let token = jwt.issue("alice", &[]).unwrap();

        let err = jwt.verify(&token).unwrap_err();
        assert!(matches!(err, JwtError::Expired));
    }

    #[test]
    fn test_verify_rejects_garbage() {
        let err = service().verify("not.a.token").unwrap_err();
        assert!(matches!(err, JwtError::DecodingError { .. }));
    }
}
