//! JWT 身份校验
//!
//! HS256 对称签名，`sub` 声明即用户 id。

use async_trait::async_trait;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

use crate::domain::error::{JoydropError, JoydropResult};
use crate::domain::repository::IdentityVerifier;

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: usize,
}

pub struct JwtIdentityVerifier {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtIdentityVerifier {
    pub fn new(secret: &str) -> Self {
        Self {
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation: Validation::new(Algorithm::HS256),
        }
    }
}

#[async_trait]
impl IdentityVerifier for JwtIdentityVerifier {
    async fn verify_token(&self, token: &str) -> JoydropResult<String> {
        let data = decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map_err(|_| JoydropError::Unauthorized("Invalid or expired token".to_string()))?;
        Ok(data.claims.sub)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};

    fn mint(secret: &str, sub: &str, exp: usize) -> String {
        encode(
            &Header::default(),
            &Claims {
                sub: sub.to_string(),
                exp,
            },
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn valid_token_yields_subject() {
        let verifier = JwtIdentityVerifier::new("test-secret");
        let token = mint("test-secret", "user-1", 4_000_000_000);
        assert_eq!(verifier.verify_token(&token).await.unwrap(), "user-1");
    }

    #[tokio::test]
    async fn wrong_secret_is_rejected() {
        let verifier = JwtIdentityVerifier::new("test-secret");
        let token = mint("other-secret", "user-1", 4_000_000_000);
        let err = verifier.verify_token(&token).await.unwrap_err();
        assert!(matches!(err, JoydropError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn expired_token_is_rejected() {
        let verifier = JwtIdentityVerifier::new("test-secret");
        let token = mint("test-secret", "user-1", 1_000_000);
        let err = verifier.verify_token(&token).await.unwrap_err();
        assert!(matches!(err, JoydropError::Unauthorized(_)));
    }
}
