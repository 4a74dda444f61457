use crate::models::contact::StatBucket;
use crate::models::user::User;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Deserialize, ToSchema)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
    #[serde(rename = "adminKey")]
    pub admin_key: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct GoogleAuthRequest {
    pub token: String,
}

/// Envelope shared by register, login and Google sign-in. Field presence
/// varies by flow, matching what the frontend stores per response.
#[derive(Debug, Serialize, ToSchema)]
pub struct AuthResponse {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    #[serde(rename = "isAdmin", skip_serializing_if = "Option::is_none")]
    pub is_admin: Option<bool>,
    pub token: String,
}

impl AuthResponse {
    pub fn registered(user: User, token: String) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            avatar: None,
            is_admin: None,
            token,
        }
    }

    pub fn logged_in(user: User, token: String) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            avatar: user.avatar_url,
            is_admin: Some(user.is_admin),
            token,
        }
    }

    pub fn google(user: User, token: String) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            avatar: user.avatar_url,
            is_admin: None,
            token,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct TokenRequest {
    pub token: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ValidateResponse {
    pub valid: bool,
    #[serde(rename = "userId", skip_serializing_if = "Option::is_none")]
    pub user_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(rename = "isAdmin", skip_serializing_if = "Option::is_none")]
    pub is_admin: Option<bool>,
}

impl ValidateResponse {
    pub fn invalid() -> Self {
        Self {
            valid: false,
            user_id: None,
            name: None,
            email: None,
            is_admin: None,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: &str) -> Self {
        Self {
            message: message.to_string(),
        }
    }
}

/// Contact-form fields arrive untrusted; presence is checked in the handler
/// so a missing field is a 400, not a deserialization rejection.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateContactRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub subject: Option<String>,
    pub message: Option<String>,
    pub city: Option<String>,
    pub region: Option<String>,
    #[serde(rename = "type")]
    pub inquiry_type: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ContactStatsResponse {
    #[serde(rename = "totalContacts")]
    pub total_contacts: i64,
    #[serde(rename = "typeStats")]
    pub type_stats: Vec<StatBucket>,
    #[serde(rename = "regionStats")]
    pub region_stats: Vec<StatBucket>,
    #[serde(rename = "cityStats")]
    pub city_stats: Vec<StatBucket>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SubscribeRequest {
    pub email: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UnsubscribeRequest {
    pub email: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct NewsletterActionResponse {
    pub success: bool,
    pub message: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SearchRequest {
    pub query: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ChatRequest {
    pub message: Option<String>,
    pub context: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ChatResponse {
    pub content: String,
    /// True when `content` is canned fallback text instead of a model
    /// completion.
    pub fallback: bool,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct GenerateRequest {
    #[serde(rename = "systemPrompt")]
    pub system_prompt: Option<String>,
    #[serde(rename = "userPrompt")]
    pub user_prompt: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct WelcomeResponse {
    pub message: String,
}
