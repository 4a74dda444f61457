use crate::errors::{AppError, Result};
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::error;

const CHAT_COMPLETIONS_URL: &str = "https://api.groq.com/openai/v1/chat/completions";
const CHAT_MODEL: &str = "llama-3.1-70b-versatile";
const TEMPERATURE: f64 = 0.7;
const MAX_TOKENS: u32 = 1024;

/// Canned text for /ai/generate when no API key is configured.
const GENERATE_FALLBACK_UNCONFIGURED: &str = "Strategy: Focus on decision-makers with budget authority in your target industry.\n\nKeywords: CEO, Marketing Director, VP Sales, Founder, Head of Growth";
/// Canned text for /ai/generate when the upstream call fails.
const GENERATE_FALLBACK_ERROR: &str = "Strategy: Target professionals in leadership roles within your specified industry.\n\nKeywords: Director, Manager, VP, C-Suite, Lead";

/// Where the chatbot widget is mounted; selects both the system prompt and
/// the canned fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatContext {
    Admin,
    Landing,
}

impl ChatContext {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "admin" => ChatContext::Admin,
            _ => ChatContext::Landing,
        }
    }

    pub fn system_prompt(&self) -> &'static str {
        match self {
            ChatContext::Admin => {
                "You are BT Buddy, the AI assistant inside the BrandTURN admin panel. \
                 Help the team draft emails, generate business ideas, and plan marketing \
                 strategies. Be concise and practical."
            }
            ChatContext::Landing => {
                "You are BT Buddy, BrandTURN's executive assistant on the public website. \
                 Explain the agency's services, offer marketing suggestions, and guide \
                 visitors to the right resources. Be warm and concise."
            }
        }
    }

    pub fn fallback_text(&self) -> &'static str {
        match self {
            ChatContext::Admin => {
                "I'm offline right now, but here are quick wins: segment your contact list \
                 by inquiry type, follow up on Business leads within 24 hours, and review \
                 this week's dashboard stats for regional trends."
            }
            ChatContext::Landing => {
                "Thanks for reaching out! I'm briefly unavailable, but you can explore our \
                 services above or send us a message through the contact form and the team \
                 will get back to you shortly."
            }
        }
    }
}

/// What a chat endpoint hands back. `fallback` is true whenever `content`
/// is canned text rather than a model completion, so callers can tell the
/// difference.
#[derive(Debug)]
pub struct ChatReply {
    pub content: String,
    pub fallback: bool,
}

pub struct AiService {
    api_key: Option<String>,
    client: Client,
    chat_url: String,
}

impl AiService {
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            api_key,
            client: Client::builder()
                .timeout(Duration::from_secs(20))
                .build()
                .unwrap_or_default(),
            chat_url: CHAT_COMPLETIONS_URL.to_string(),
        }
    }

    pub fn from_env() -> Self {
        Self::new(std::env::var("GROQ_API_KEY").ok())
    }

    pub async fn chat(&self, message: &str, context: ChatContext) -> ChatReply {
        match self.complete(context.system_prompt(), message).await {
            Ok(content) => ChatReply {
                content,
                fallback: false,
            },
            Err(e) => {
                error!(action = "ai_chat_degraded", error = %e);
                ChatReply {
                    content: context.fallback_text().to_string(),
                    fallback: true,
                }
            }
        }
    }

    pub async fn generate(&self, system_prompt: &str, user_prompt: &str) -> ChatReply {
        match self.complete(system_prompt, user_prompt).await {
            Ok(content) => ChatReply {
                content,
                fallback: false,
            },
            Err(AppError::ConfigError(_)) => ChatReply {
                content: GENERATE_FALLBACK_UNCONFIGURED.to_string(),
                fallback: true,
            },
            Err(e) => {
                error!(action = "ai_generate_degraded", error = %e);
                ChatReply {
                    content: GENERATE_FALLBACK_ERROR.to_string(),
                    fallback: true,
                }
            }
        }
    }

    async fn complete(&self, system_prompt: &str, user_prompt: &str) -> Result<String> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| AppError::ConfigError("Groq API key is not configured".to_string()))?;

        let body = json!({
            "model": CHAT_MODEL,
            "messages": [
                { "role": "system", "content": system_prompt },
                { "role": "user", "content": user_prompt },
            ],
            "temperature": TEMPERATURE,
            "max_tokens": MAX_TOKENS,
        });

        let response = self
            .client
            .post(&self.chat_url)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::UpstreamError(format!("Groq request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::UpstreamError(format!("Groq returned {}", status)));
        }

        let data: Value = response
            .json()
            .await
            .map_err(|e| AppError::UpstreamError(format!("Invalid Groq response: {}", e)))?;

        data["choices"][0]["message"]["content"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| AppError::UpstreamError("Empty completion".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_parses_with_landing_default() {
        assert_eq!(ChatContext::parse("admin"), ChatContext::Admin);
        assert_eq!(ChatContext::parse("landing"), ChatContext::Landing);
        assert_eq!(ChatContext::parse("anything-else"), ChatContext::Landing);
    }

    #[tokio::test]
    async fn chat_without_key_returns_context_fallback() {
        let svc = AiService::new(None);

        let reply = svc.chat("What services do you offer?", ChatContext::Landing).await;
        assert!(reply.fallback);
        assert_eq!(reply.content, ChatContext::Landing.fallback_text());

        let reply = svc.chat("Draft an email", ChatContext::Admin).await;
        assert!(reply.fallback);
        assert_eq!(reply.content, ChatContext::Admin.fallback_text());
    }

    #[tokio::test]
    async fn generate_without_key_returns_strategy_fallback() {
        let svc = AiService::new(None);
        let reply = svc.generate("You are a lead analyst.", "Find SaaS leads.").await;
        assert!(reply.fallback);
        assert_eq!(reply.content, GENERATE_FALLBACK_UNCONFIGURED);
    }
}
