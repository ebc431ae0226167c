//! HS256 JWT verification.

use async_trait::async_trait;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::domain::{AuthenticatedUser, TokenVerifier, UserId};

/// Token claims. `sub` is the user id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: usize,
}

pub struct JwtTokenVerifier {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtTokenVerifier {
    pub fn new(secret: &str) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation: Validation::default(),
        }
    }

    /// Issue a token for `user_id` valid for `ttl`.
    ///
    /// Used by the dev tooling and tests; production tokens come from the
    /// identity provider sharing the secret.
    pub fn sign(&self, user_id: &UserId, ttl: chrono::Duration) -> Result<String, jsonwebtoken::errors::Error> {
        let claims = Claims {
            sub: user_id.to_string(),
            exp: (chrono::Utc::now() + ttl).timestamp().max(0) as usize,
        };
        encode(&Header::default(), &claims, &self.encoding_key)
    }
}

#[async_trait]
impl TokenVerifier for JwtTokenVerifier {
    async fn verify(&self, token: &str) -> Option<AuthenticatedUser> {
        let data = match decode::<Claims>(token, &self.decoding_key, &self.validation) {
            Ok(data) => data,
            Err(e) => {
                tracing::debug!("Rejected bearer token: {}", e);
                return None;
            }
        };
        let user_id = UserId::new(data.claims.sub).ok()?;
        Some(AuthenticatedUser { user_id })
    }
}
