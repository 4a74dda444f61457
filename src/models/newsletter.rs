use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Newsletter signup. Unsubscribing flips `is_active` rather than deleting
/// the row, so the address stays known to the duplicate check.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Subscriber {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub email: String,
    #[serde(rename = "isActive")]
    pub is_active: bool,
    #[serde(rename = "subscribedAt")]
    pub subscribed_at: DateTime<Utc>,
}

impl Subscriber {
    pub fn new(email: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            email: email.to_string(),
            is_active: true,
            subscribed_at: Utc::now(),
        }
    }
}
