use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use vigil_core::AppError;

use super::models::{AuthUser, JwtClaims};

/// Result of authenticating one request.
#[derive(Debug)]
pub enum AuthOutcome {
    Authenticated(AuthUser),
    /// The caller did not present valid credentials.
    Unauthenticated(String),
    /// Verification itself failed.
    Error(AppError),
}

pub struct JwtService {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtService {
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_required_spec_claims(&["exp", "sub"]);
        validation.leeway = 30;

        Self {
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    /// Authenticate the value of an `Authorization` header.
    pub fn authenticate(&self, authorization: Option<&str>) -> AuthOutcome {
        let Some(header) = authorization else {
            return AuthOutcome::Unauthenticated("Missing authorization header".to_string());
        };
        let Some(token) = header.strip_prefix("Bearer ") else {
            return AuthOutcome::Unauthenticated("Invalid authorization header format".to_string());
        };

        match decode::<JwtClaims>(token.trim(), &self.decoding_key, &self.validation) {
            Ok(data) => AuthOutcome::Authenticated(AuthUser {
                user_id: data.claims.sub,
            }),
            Err(e) => match e.kind() {
                ErrorKind::ExpiredSignature => {
                    AuthOutcome::Unauthenticated("Token has expired".to_string())
                }
                ErrorKind::Crypto(_) => {
                    AuthOutcome::Error(AppError::Internal(format!("Token verification failed: {}", e)))
                }
                _ => AuthOutcome::Unauthenticated("Invalid token".to_string()),
            },
        }
    }
}
