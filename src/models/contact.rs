use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::errors::{AppError, Result};

/// Inquiry categories the admin dashboard groups by. Fixed enumeration; the
/// contact form may supply one explicitly, otherwise it is inferred from the
/// submission text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum InquiryType {
    Business,
    General,
    Support,
    Other,
}

impl InquiryType {
    pub fn as_str(&self) -> &'static str {
        match self {
            InquiryType::Business => "Business",
            InquiryType::General => "General",
            InquiryType::Support => "Support",
            InquiryType::Other => "Other",
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "Business" => Ok(InquiryType::Business),
            "General" => Ok(InquiryType::General),
            "Support" => Ok(InquiryType::Support),
            "Other" => Ok(InquiryType::Other),
            other => Err(AppError::ValidationError(format!(
                "Unknown inquiry type: {}",
                other
            ))),
        }
    }

    /// Keyword heuristic over the submission text. "business" wins over
    /// "support" when both appear.
    pub fn classify(subject: &str, message: &str) -> Self {
        let text = format!("{} {}", subject, message).to_lowercase();
        if text.contains("business") {
            InquiryType::Business
        } else if text.contains("support") {
            InquiryType::Support
        } else {
            InquiryType::General
        }
    }
}

/// One group-by bucket in the dashboard stats payload. Serialized with the
/// `_id` key the admin charts already consume.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct StatBucket {
    #[serde(rename = "_id")]
    pub key: String,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Contact {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
    pub city: String,
    pub region: String,
    #[serde(rename = "type")]
    pub inquiry_type: InquiryType,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn business_keyword_classifies_as_business() {
        let t = InquiryType::classify("Business partnership inquiry", "Let's talk.");
        assert_eq!(t, InquiryType::Business);
    }

    #[test]
    fn support_keyword_classifies_as_support() {
        let t = InquiryType::classify("Need support", "My campaign dashboard is down.");
        assert_eq!(t, InquiryType::Support);
    }

    #[test]
    fn keyword_in_message_body_counts_too() {
        let t = InquiryType::classify("Hello", "I have a BUSINESS proposal for you.");
        assert_eq!(t, InquiryType::Business);
    }

    #[test]
    fn no_keyword_defaults_to_general() {
        let t = InquiryType::classify("Hello there", "Just saying hi.");
        assert_eq!(t, InquiryType::General);
    }

    #[test]
    fn parse_rejects_unknown_types() {
        assert!(InquiryType::parse("Business").is_ok());
        assert!(InquiryType::parse("Spam").is_err());
    }
}
