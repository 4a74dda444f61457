use crate::errors::{AppError, Result};
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::info;

const APOLLO_BASE_URL: &str = "https://api.apollo.io/v1";
const SEARCH_PAGE_SIZE: u32 = 15;
const TEAM_PAGE_SIZE: u32 = 100;

/// Thin proxy to Apollo.io's search API. All three operations share one
/// failure contract: missing key is a configuration error, any upstream
/// failure surfaces as an upstream error. Nothing is silently empty.
pub struct ApolloService {
    base_url: String,
    api_key: Option<String>,
    client: Client,
}

impl ApolloService {
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            base_url: APOLLO_BASE_URL.to_string(),
            api_key,
            client: Client::builder()
                .timeout(Duration::from_secs(20))
                .build()
                .unwrap_or_default(),
        }
    }

    pub fn from_env() -> Self {
        Self::new(std::env::var("APOLLO_API_KEY").ok())
    }

    pub async fn search_people(&self, query: &str) -> Result<Vec<Value>> {
        info!(action = "apollo_people_search", query = %query);
        let body = json!({
            "api_key": self.api_key()?,
            "q_keywords": query,
            "page": 1,
            "per_page": SEARCH_PAGE_SIZE,
        });
        self.post_search("mixed_people/search", body, "people").await
    }

    pub async fn search_companies(&self, query: &str) -> Result<Vec<Value>> {
        info!(action = "apollo_company_search", query = %query);
        let body = json!({
            "api_key": self.api_key()?,
            "q_organization_name": query,
            "page": 1,
            "per_page": SEARCH_PAGE_SIZE,
        });
        self.post_search("mixed_companies/search", body, "organizations")
            .await
    }

    pub async fn list_team_users(&self) -> Result<Vec<Value>> {
        let url = format!("{}/users/search", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[
                ("api_key", self.api_key()?.to_string()),
                ("per_page", TEAM_PAGE_SIZE.to_string()),
            ])
            .send()
            .await
            .map_err(|e| AppError::UpstreamError(format!("Apollo request failed: {}", e)))?;

        Self::extract_list(response, "users").await
    }

    async fn post_search(&self, path: &str, body: Value, list_key: &str) -> Result<Vec<Value>> {
        let url = format!("{}/{}", self.base_url, path);
        let response = self
            .client
            .post(&url)
            .header("Cache-Control", "no-cache")
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::UpstreamError(format!("Apollo request failed: {}", e)))?;

        Self::extract_list(response, list_key).await
    }

    async fn extract_list(response: reqwest::Response, list_key: &str) -> Result<Vec<Value>> {
        let status = response.status();
        if !status.is_success() {
            return Err(AppError::UpstreamError(format!(
                "Apollo returned {}",
                status
            )));
        }

        let data: Value = response
            .json()
            .await
            .map_err(|e| AppError::UpstreamError(format!("Invalid Apollo response: {}", e)))?;

        let items = data[list_key]
            .as_array()
            .cloned()
            .unwrap_or_default();
        info!(action = "apollo_results", key = %list_key, count = items.len());
        Ok(items)
    }

    fn api_key(&self) -> Result<&str> {
        self.api_key
            .as_deref()
            .ok_or_else(|| AppError::ConfigError("Apollo API key is not configured".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_key_is_a_config_error_for_every_endpoint() {
        let svc = ApolloService::new(None);
        assert!(matches!(
            svc.search_people("marketing").await,
            Err(AppError::ConfigError(_))
        ));
        assert!(matches!(
            svc.search_companies("acme").await,
            Err(AppError::ConfigError(_))
        ));
        assert!(matches!(
            svc.list_team_users().await,
            Err(AppError::ConfigError(_))
        ));
    }
}
