use crate::errors::{AppError, Result};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, TokenData, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Issued tokens live this long; there is no refresh endpoint.
pub const TOKEN_TTL_DAYS: i64 = 30;

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub name: String,
    pub email: String,
    pub exp: i64,
    pub iat: i64,
    pub jti: String,
}

pub struct JwtManager {
    secret: String,
}

impl JwtManager {
    pub fn new(secret: String) -> Self {
        Self { secret }
    }

    pub fn generate_token(&self, user_id: &Uuid, name: &str, email: &str) -> Result<String> {
        let now = Utc::now();
        let expiration = now + Duration::days(TOKEN_TTL_DAYS);
        let jti = Uuid::new_v4().to_string();

        let claims = Claims {
            sub: user_id.to_string(),
            name: name.to_string(),
            email: email.to_string(),
            exp: expiration.timestamp(),
            iat: now.timestamp(),
            jti,
        };

        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_ref()),
        )
        .map_err(|e| AppError::AuthenticationError(format!("Failed to generate token: {}", e)))?;

        Ok(token)
    }

    pub fn validate_token(&self, token: &str) -> Result<TokenData<Claims>> {
        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_ref()),
            &Validation::default(),
        )
        .map_err(|e| AppError::AuthenticationError(format!("Invalid token: {}", e)))?;

        Ok(token_data)
    }
}

#[derive(Debug)]
pub struct AuthenticatedUser {
    pub user_id: Uuid,
    pub name: String,
    pub email: String,
    pub token_id: String,
}

impl TryFrom<Claims> for AuthenticatedUser {
    type Error = AppError;

    fn try_from(claims: Claims) -> Result<Self> {
        let user_id = Uuid::parse_str(&claims.sub)
            .map_err(|e| AppError::ValidationError(format!("Invalid user ID in token: {}", e)))?;

        Ok(Self {
            user_id,
            name: claims.name,
            email: claims.email,
            token_id: claims.jti,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_tokens_validate_and_carry_claims() {
        let manager = JwtManager::new("test-secret".to_string());
        let user_id = Uuid::new_v4();

        let token = manager
            .generate_token(&user_id, "Asha Rao", "asha@example.com")
            .unwrap();
        let data = manager.validate_token(&token).unwrap();

        assert_eq!(data.claims.sub, user_id.to_string());
        assert_eq!(data.claims.email, "asha@example.com");
        assert!(!data.claims.jti.is_empty());

        let user = AuthenticatedUser::try_from(data.claims).unwrap();
        assert_eq!(user.user_id, user_id);
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let manager = JwtManager::new("secret-a".to_string());
        let other = JwtManager::new("secret-b".to_string());

        let token = manager
            .generate_token(&Uuid::new_v4(), "A", "a@example.com")
            .unwrap();
        assert!(other.validate_token(&token).is_err());
    }
}
