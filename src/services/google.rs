use crate::errors::{AppError, Result};
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;

const TOKENINFO_URL: &str = "https://oauth2.googleapis.com/tokeninfo";

/// The subset of a verified Google ID token the auth flow needs.
#[derive(Debug, Clone)]
pub struct GoogleProfile {
    pub subject: String,
    pub email: String,
    pub name: String,
    pub picture: Option<String>,
}

pub struct GoogleVerifier {
    client: Client,
    client_id: Option<String>,
    tokeninfo_url: String,
}

impl GoogleVerifier {
    pub fn new(client_id: Option<String>) -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(20))
                .build()
                .unwrap_or_default(),
            client_id,
            tokeninfo_url: TOKENINFO_URL.to_string(),
        }
    }

    pub fn from_env() -> Self {
        Self::new(std::env::var("GOOGLE_CLIENT_ID").ok())
    }

    /// Verifies the ID token against Google's tokeninfo endpoint and checks
    /// that it was minted for this application.
    pub async fn verify(&self, id_token: &str) -> Result<GoogleProfile> {
        let client_id = self.client_id.as_deref().ok_or_else(|| {
            AppError::ConfigError("Google sign-in is not configured".to_string())
        })?;

        let response = self
            .client
            .get(&self.tokeninfo_url)
            .query(&[("id_token", id_token)])
            .send()
            .await
            .map_err(|e| AppError::UpstreamError(format!("Token verification failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(AppError::AuthenticationError(
                "Invalid Google token".to_string(),
            ));
        }

        let payload: Value = response
            .json()
            .await
            .map_err(|e| AppError::UpstreamError(format!("Invalid tokeninfo response: {}", e)))?;

        if payload["aud"].as_str() != Some(client_id) {
            return Err(AppError::AuthenticationError(
                "Google token was issued for a different application".to_string(),
            ));
        }

        let subject = payload["sub"]
            .as_str()
            .ok_or_else(|| AppError::AuthenticationError("Google token has no subject".to_string()))?
            .to_string();
        let email = payload["email"]
            .as_str()
            .ok_or_else(|| AppError::AuthenticationError("Google token has no email".to_string()))?
            .to_string();
        let name = payload["name"]
            .as_str()
            .map(str::to_string)
            .unwrap_or_else(|| email.clone());
        let picture = payload["picture"].as_str().map(str::to_string);

        Ok(GoogleProfile {
            subject,
            email,
            name,
            picture,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unconfigured_verifier_reports_config_error() {
        let verifier = GoogleVerifier::new(None);
        let err = verifier.verify("some-token").await.expect_err("verify");
        assert!(matches!(err, AppError::ConfigError(_)));
    }
}
