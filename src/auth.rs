//! Session-token authentication.
//!
//! The identity provider issues JWT session tokens; the `sub` claim is the user
//! id every job operation is scoped to.

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::http::StatusCode;
use axum::Json;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::app_state::AppState;
use crate::config::{AppConfig, ConfigError};

#[derive(Debug, Deserialize)]
struct Claims {
    sub: String,
}

/// Verifies bearer tokens against the configured key.
pub struct AuthVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl AuthVerifier {
    /// RS256 when a public key is configured, otherwise HS256.
    pub fn from_config(config: &AppConfig) -> Result<Self, ConfigError> {
        if let Some(pem) = config.auth_jwt_public_key.as_deref().filter(|s| !s.trim().is_empty()) {
            // Env files often carry the PEM with escaped newlines.
            let pem = pem.replace("\\n", "\n");
            let key = DecodingKey::from_rsa_pem(pem.as_bytes())
                .map_err(|e| ConfigError::AuthKey(e.to_string()))?;
            return Ok(Self::new(key, Algorithm::RS256));
        }

        match config.auth_jwt_secret.as_deref().filter(|s| !s.trim().is_empty()) {
            Some(secret) => Ok(Self::hs256(secret)),
            None => Err(ConfigError::Missing("AUTH_JWT_PUBLIC_KEY or AUTH_JWT_SECRET")),
        }
    }

    pub fn hs256(secret: &str) -> Self {
        Self::new(DecodingKey::from_secret(secret.as_bytes()), Algorithm::HS256)
    }

    fn new(key: DecodingKey, algorithm: Algorithm) -> Self {
        let mut validation = Validation::new(algorithm);
        validation.validate_aud = false;
        Self { key, validation }
    }

    /// Return the user id carried by a valid token.
    pub fn verify(&self, token: &str) -> Result<String, jsonwebtoken::errors::Error> {
        let data = decode::<Claims>(token, &self.key, &self.validation)?;
        Ok(data.claims.sub)
    }
}

/// Authenticated caller, extracted from `Authorization: Bearer <token>`.
#[derive(Debug, Clone, PartialEq)]
pub struct CurrentUser(pub String);

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = (StatusCode, Json<Value>);

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| unauthorized("User ID is required"))?;

        match state.auth.verify(token) {
            Ok(user_id) if !user_id.is_empty() => Ok(CurrentUser(user_id)),
            Ok(_) => Err(unauthorized("User ID is required")),
            Err(e) => {
                tracing::debug!(error = %e, "Rejected session token");
                Err(unauthorized("Invalid session token"))
            }
        }
    }
}

fn unauthorized(message: &str) -> (StatusCode, Json<Value>) {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({ "ok": false, "error": message })),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};
    use serde::Serialize;

    #[derive(Serialize)]
    struct TestClaims<'a> {
        sub: &'a str,
        exp: i64,
    }

    fn token(secret: &str, sub: &str, exp_offset_secs: i64) -> String {
        let claims = TestClaims {
            sub,
            exp: chrono::Utc::now().timestamp() + exp_offset_secs,
        };
        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    #[test]
    fn test_valid_token_yields_subject() {
        let verifier = AuthVerifier::hs256("s3cret");
        let user = verifier.verify(&token("s3cret", "user_2abc", 3600)).unwrap();
        assert_eq!(user, "user_2abc");
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let verifier = AuthVerifier::hs256("s3cret");
        assert!(verifier.verify(&token("other", "user_2abc", 3600)).is_err());
    }

    #[test]
    fn test_expired_token_rejected() {
        let verifier = AuthVerifier::hs256("s3cret");
        assert!(verifier.verify(&token("s3cret", "user_2abc", -3600)).is_err());
    }
}
