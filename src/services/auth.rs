use crate::database::sqlite::SqliteDatabase;
use crate::errors::{AppError, Result};
use crate::models::user::User;
use crate::services::google::GoogleProfile;
use crate::services::jwt::{AuthenticatedUser, JwtManager, TOKEN_TTL_DAYS};
use crate::utils::crypto::PasswordManager;
use crate::utils::validation::Validator;
use chrono::{Duration, Utc};
use sha2::{Digest, Sha256};
use std::sync::Arc;
use tracing::{info, warn};

pub struct AuthService {
    jwt_manager: JwtManager,
    database: Arc<SqliteDatabase>,
    admin_access_key: Option<String>,
}

impl AuthService {
    pub fn new(
        database: Arc<SqliteDatabase>,
        jwt_secret: String,
        admin_access_key: Option<String>,
    ) -> Self {
        Self {
            jwt_manager: JwtManager::new(jwt_secret),
            database,
            admin_access_key,
        }
    }

    /// Tokens cannot be issued or validated without a secret, so a missing
    /// `JWT_SECRET` is a configuration error, not a panic.
    pub fn from_env(database: Arc<SqliteDatabase>) -> Result<Self> {
        let jwt_secret = std::env::var("JWT_SECRET")
            .map_err(|_| AppError::ConfigError("JWT_SECRET is not set".to_string()))?;
        let admin_access_key = std::env::var("ADMIN_ACCESS_KEY").ok();
        Ok(Self::new(database, jwt_secret, admin_access_key))
    }

    pub async fn register(&self, name: &str, email: &str, password: &str) -> Result<(User, String)> {
        Validator::require("Name", name)?;
        Validator::require("Password", password)?;
        Validator::validate_email(email)?;

        if self.database.get_user_by_email(email).await?.is_some() {
            info!(action = "register_email_conflict", email = %email);
            return Err(AppError::Conflict("User already exists".to_string()));
        }

        let password_hash = PasswordManager::hash_password(password)?;
        let user = User::new(name.trim(), email.trim(), Some(password_hash));
        self.database.create_user(&user).await?;

        let token = self.issue_token(&user).await?;
        info!(action = "register_success", email = %user.email);
        Ok((user, token))
    }

    pub async fn login(
        &self,
        email: &str,
        password: &str,
        admin_key: Option<&str>,
    ) -> Result<(User, String)> {
        let mut user = self
            .database
            .get_user_by_email(email)
            .await?
            .ok_or_else(|| {
                AppError::AuthenticationError("Invalid email or password".to_string())
            })?;

        let hash = user.password_hash.as_deref().ok_or_else(|| {
            AppError::AuthenticationError("Invalid email or password".to_string())
        })?;
        if !PasswordManager::verify_password(password, hash)? {
            return Err(AppError::AuthenticationError(
                "Invalid email or password".to_string(),
            ));
        }

        // Promotion only against the operator-configured key; an arbitrary
        // adminKey value is inert. Every promotion leaves an audit event.
        if let (Some(supplied), Some(configured)) = (admin_key, self.admin_access_key.as_deref()) {
            if supplied == configured && !user.is_admin {
                self.database.set_user_admin(&user.id).await?;
                user.is_admin = true;
                warn!(action = "admin_promotion", user_id = %user.id, email = %user.email);
            }
        }

        let token = self.issue_token(&user).await?;
        info!(action = "login_success", email = %user.email);
        Ok((user, token))
    }

    /// Completes a Google sign-in for an already-verified profile. Returns
    /// the user, a token, and whether the account was created just now.
    pub async fn google_sign_in(&self, profile: &GoogleProfile) -> Result<(User, String, bool)> {
        if let Some(mut user) = self.database.get_user_by_email(&profile.email).await? {
            if user.google_id.is_none() {
                self.database
                    .link_google_account(&user.id, &profile.subject)
                    .await?;
                user.google_id = Some(profile.subject.clone());
            }
            let token = self.issue_token(&user).await?;
            info!(action = "google_login", email = %user.email);
            return Ok((user, token, false));
        }

        let password_hash = PasswordManager::hash_password(&PasswordManager::random_password())?;
        let mut user = User::new(&profile.name, &profile.email, Some(password_hash));
        user.google_id = Some(profile.subject.clone());
        user.avatar_url = profile.picture.clone();
        self.database.create_user(&user).await?;

        let token = self.issue_token(&user).await?;
        info!(action = "google_register", email = %user.email);
        Ok((user, token, true))
    }

    pub async fn validate_token(&self, token: &str) -> Result<AuthenticatedUser> {
        let token_data = self.jwt_manager.validate_token(token)?;
        let token_id = &token_data.claims.jti;

        if !self.database.is_token_valid(token_id).await? {
            return Err(AppError::AuthenticationError(
                "Token revoked or unknown".to_string(),
            ));
        }

        AuthenticatedUser::try_from(token_data.claims)
    }

    pub async fn logout(&self, token: &str) -> Result<()> {
        let token_data = self.jwt_manager.validate_token(token)?;
        self.database.revoke_token(&token_data.claims.jti).await?;
        info!(action = "logout", email = %token_data.claims.email);
        Ok(())
    }

    pub async fn logout_all_devices(&self, token: &str) -> Result<()> {
        let user = self.validate_token(token).await?;
        self.database.revoke_all_user_tokens(&user.user_id).await?;
        info!(action = "logout_all", email = %user.email);
        Ok(())
    }

    async fn issue_token(&self, user: &User) -> Result<String> {
        let token = self
            .jwt_manager
            .generate_token(&user.id, &user.name, &user.email)?;

        let token_data = self.jwt_manager.validate_token(&token)?;
        let token_id = &token_data.claims.jti;
        let token_hash = Self::hash_token(&token);
        let expires_at = Utc::now() + Duration::days(TOKEN_TTL_DAYS);

        self.database
            .store_user_token(&user.id, token_id, &token_hash, expires_at)
            .await?;
        let _ = self.database.cleanup_expired_tokens().await;

        Ok(token)
    }

    fn hash_token(token: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(token.as_bytes());
        format!("{:x}", hasher.finalize())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn service() -> (TempDir, AuthService) {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("auth.db");
        let db = Arc::new(
            SqliteDatabase::new(path.to_str().unwrap())
                .await
                .expect("db"),
        );
        let svc = AuthService::new(db, "test-secret".to_string(), Some("ops-key".to_string()));
        (dir, svc)
    }

    #[tokio::test]
    async fn second_registration_with_same_email_conflicts() {
        let (_dir, svc) = service().await;
        svc.register("Asha", "asha@example.com", "password1")
            .await
            .expect("first registration");

        let err = svc
            .register("Imposter", "asha@example.com", "password2")
            .await
            .expect_err("duplicate registration");
        assert!(matches!(err, AppError::Conflict(_)));

        let user = svc
            .database
            .get_user_by_email("asha@example.com")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(user.name, "Asha");
    }

    #[tokio::test]
    async fn wrong_password_issues_no_token() {
        let (_dir, svc) = service().await;
        let (user, _) = svc
            .register("Asha", "asha@example.com", "password1")
            .await
            .unwrap();
        let tokens_after_register = svc
            .database
            .count_active_user_tokens(&user.id)
            .await
            .unwrap();

        let err = svc
            .login("asha@example.com", "wrong-password", None)
            .await
            .expect_err("login");
        assert!(matches!(err, AppError::AuthenticationError(_)));

        let tokens_after_failure = svc
            .database
            .count_active_user_tokens(&user.id)
            .await
            .unwrap();
        assert_eq!(tokens_after_register, tokens_after_failure);
    }

    #[tokio::test]
    async fn unknown_email_is_unauthorized() {
        let (_dir, svc) = service().await;
        let err = svc
            .login("nobody@example.com", "whatever", None)
            .await
            .expect_err("login");
        assert!(matches!(err, AppError::AuthenticationError(_)));
    }

    #[tokio::test]
    async fn admin_promotion_requires_the_configured_key() {
        let (_dir, svc) = service().await;
        svc.register("Asha", "asha@example.com", "password1")
            .await
            .unwrap();

        let (user, _) = svc
            .login("asha@example.com", "password1", Some("101"))
            .await
            .unwrap();
        assert!(!user.is_admin);

        let (user, _) = svc
            .login("asha@example.com", "password1", Some("ops-key"))
            .await
            .unwrap();
        assert!(user.is_admin);

        let stored = svc
            .database
            .get_user_by_email("asha@example.com")
            .await
            .unwrap()
            .unwrap();
        assert!(stored.is_admin);
    }

    #[tokio::test]
    async fn logout_revokes_the_token() {
        let (_dir, svc) = service().await;
        let (_, token) = svc
            .register("Asha", "asha@example.com", "password1")
            .await
            .unwrap();

        assert!(svc.validate_token(&token).await.is_ok());
        svc.logout(&token).await.unwrap();
        assert!(svc.validate_token(&token).await.is_err());
    }

    #[tokio::test]
    async fn google_sign_in_links_then_creates() {
        let (_dir, svc) = service().await;
        svc.register("Asha", "asha@example.com", "password1")
            .await
            .unwrap();

        let profile = GoogleProfile {
            subject: "google-sub-1".to_string(),
            email: "asha@example.com".to_string(),
            name: "Asha Rao".to_string(),
            picture: None,
        };
        let (user, _, created) = svc.google_sign_in(&profile).await.unwrap();
        assert!(!created);
        assert_eq!(user.google_id.as_deref(), Some("google-sub-1"));

        let fresh = GoogleProfile {
            subject: "google-sub-2".to_string(),
            email: "new@example.com".to_string(),
            name: "New Person".to_string(),
            picture: Some("https://example.com/p.jpg".to_string()),
        };
        let (user, _, created) = svc.google_sign_in(&fresh).await.unwrap();
        assert!(created);
        assert!(user.password_hash.is_some());
        assert_eq!(user.avatar_url.as_deref(), Some("https://example.com/p.jpg"));
    }
}
