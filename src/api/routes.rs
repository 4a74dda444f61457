use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::{header::AUTHORIZATION, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use chrono::Utc;
use serde_json::Value;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::api::types::*;
use crate::database::sqlite::{SqliteDatabase, GLOBAL_DB};
use crate::errors::{AppError, Result};
use crate::models::contact::{Contact, InquiryType};
use crate::models::newsletter::Subscriber;
use crate::models::user::User;
use crate::services::ai::{AiService, ChatContext};
use crate::services::apollo::ApolloService;
use crate::services::auth::AuthService;
use crate::services::google::GoogleVerifier;
use crate::utils::validation::Validator;

/// Bearer-token extractor for `Authorization: Bearer ...` headers.
pub struct AuthBearer(pub String);

#[axum::async_trait]
impl<S> FromRequestParts<S> for AuthBearer
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, String);
    async fn from_request_parts(parts: &mut Parts, _state: &S) -> std::result::Result<Self, Self::Rejection> {
        if let Some(auth) = parts.headers.get(AUTHORIZATION) {
            if let Ok(auth_str) = auth.to_str() {
                if let Some(token) = auth_str.strip_prefix("Bearer ") {
                    return Ok(AuthBearer(token.to_string()));
                }
            }
        }
        Err((
            StatusCode::UNAUTHORIZED,
            "Missing or invalid Authorization header".to_string(),
        ))
    }
}

fn database() -> Arc<SqliteDatabase> {
    GLOBAL_DB.get().expect("database not initialized").clone()
}

fn auth_service() -> Result<AuthService> {
    AuthService::from_env(database())
}

/// Resolves the bearer token to a user and requires the admin flag.
async fn admin_from_token(token: &str) -> Result<User> {
    let auth = auth_service()?;
    let authed = auth.validate_token(token).await?;
    let user = database()
        .get_user_by_id(&authed.user_id)
        .await?
        .ok_or_else(|| AppError::AuthenticationError("Account no longer exists".to_string()))?;
    if !user.is_admin {
        return Err(AppError::Forbidden("Admin access required".to_string()));
    }
    Ok(user)
}

fn required<'a>(field: &str, value: &'a Option<String>) -> Result<&'a str> {
    let value = value.as_deref().unwrap_or("");
    Validator::require(field, value)?;
    Ok(value)
}

// ----- routers -----

pub fn auth_router() -> Router {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/google", post(google_auth))
        .route("/validate", post(validate))
        .route("/logout", post(logout))
}

pub fn contacts_router() -> Router {
    Router::new()
        .route("/", post(create_contact).get(list_contacts))
        .route("/stats", get(contact_stats))
}

pub fn newsletter_router() -> Router {
    Router::new()
        .route("/subscribe", post(subscribe))
        .route("/subscribers", get(list_subscribers))
        .route("/unsubscribe", delete(unsubscribe))
}

pub fn integrations_router() -> Router {
    Router::new()
        .route("/apollo/search/people", post(apollo_search_people))
        .route("/apollo/search/companies", post(apollo_search_companies))
        .route("/apollo/users", get(apollo_team_users))
        .route("/ai/chat", post(ai_chat))
        .route("/ai/generate", post(ai_generate))
}

// ----- auth -----

#[utoipa::path(post, path = "/api/auth/register", request_body = RegisterRequest,
    responses((status = 201, body = AuthResponse), (status = 400, body = MessageResponse), (status = 409, body = MessageResponse)))]
pub async fn register(Json(req): Json<RegisterRequest>) -> Result<impl IntoResponse> {
    let auth = auth_service()?;
    let (user, token) = auth.register(&req.name, &req.email, &req.password).await?;
    Ok((
        StatusCode::CREATED,
        Json(AuthResponse::registered(user, token)),
    ))
}

#[utoipa::path(post, path = "/api/auth/login", request_body = LoginRequest,
    responses((status = 200, body = AuthResponse), (status = 401, body = MessageResponse)))]
pub async fn login(Json(req): Json<LoginRequest>) -> Result<impl IntoResponse> {
    let auth = auth_service()?;
    let (user, token) = auth
        .login(&req.email, &req.password, req.admin_key.as_deref())
        .await?;
    Ok(Json(AuthResponse::logged_in(user, token)))
}

#[utoipa::path(post, path = "/api/auth/google", request_body = GoogleAuthRequest,
    responses((status = 200, body = AuthResponse), (status = 201, body = AuthResponse), (status = 401, body = MessageResponse)))]
pub async fn google_auth(Json(req): Json<GoogleAuthRequest>) -> Result<impl IntoResponse> {
    let profile = GoogleVerifier::from_env().verify(&req.token).await?;
    let auth = auth_service()?;
    let (user, token, created) = auth.google_sign_in(&profile).await?;
    let status = if created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(AuthResponse::google(user, token))))
}

#[utoipa::path(post, path = "/api/auth/validate", request_body = TokenRequest,
    responses((status = 200, body = ValidateResponse), (status = 401, body = ValidateResponse)))]
pub async fn validate(Json(req): Json<TokenRequest>) -> impl IntoResponse {
    let auth = match auth_service() {
        Ok(auth) => auth,
        Err(_) => return (StatusCode::UNAUTHORIZED, Json(ValidateResponse::invalid())),
    };
    match auth.validate_token(&req.token).await {
        Ok(authed) => {
            let is_admin = database()
                .get_user_by_id(&authed.user_id)
                .await
                .ok()
                .flatten()
                .map(|u| u.is_admin);
            (
                StatusCode::OK,
                Json(ValidateResponse {
                    valid: true,
                    user_id: Some(authed.user_id),
                    name: Some(authed.name),
                    email: Some(authed.email),
                    is_admin,
                }),
            )
        }
        Err(_) => (StatusCode::UNAUTHORIZED, Json(ValidateResponse::invalid())),
    }
}

#[utoipa::path(post, path = "/api/auth/logout", request_body = TokenRequest,
    responses((status = 200, body = MessageResponse), (status = 401, body = MessageResponse)))]
pub async fn logout(Json(req): Json<TokenRequest>) -> Result<impl IntoResponse> {
    let auth = auth_service()?;
    auth.logout(&req.token).await?;
    Ok(Json(MessageResponse::new("Logged out successfully")))
}

// ----- contacts -----

#[utoipa::path(post, path = "/api/contacts", request_body = CreateContactRequest,
    responses((status = 201, body = Contact), (status = 400, body = MessageResponse)))]
pub async fn create_contact(Json(req): Json<CreateContactRequest>) -> Result<impl IntoResponse> {
    let name = required("Name", &req.name)?;
    let email = required("Email", &req.email)?;
    let subject = required("Subject", &req.subject)?;
    let message = required("Message", &req.message)?;
    Validator::validate_email(email)?;

    let inquiry_type = match req.inquiry_type.as_deref() {
        Some(explicit) => InquiryType::parse(explicit)?,
        None => InquiryType::classify(subject, message),
    };

    let contact = Contact {
        id: Uuid::new_v4(),
        name: name.to_string(),
        email: email.to_string(),
        subject: subject.to_string(),
        message: message.to_string(),
        city: req.city.filter(|c| !c.trim().is_empty()).unwrap_or_else(|| "Unknown".to_string()),
        region: req
            .region
            .filter(|r| !r.trim().is_empty())
            .unwrap_or_else(|| "Unknown".to_string()),
        inquiry_type,
        created_at: Utc::now(),
    };

    database().create_contact(&contact).await?;
    info!(action = "contact_created", inquiry_type = contact.inquiry_type.as_str(), region = %contact.region);
    Ok((StatusCode::CREATED, Json(contact)))
}

#[utoipa::path(get, path = "/api/contacts",
    responses((status = 200, body = [Contact]), (status = 401, body = MessageResponse), (status = 403, body = MessageResponse)))]
pub async fn list_contacts(AuthBearer(token): AuthBearer) -> Result<Json<Vec<Contact>>> {
    admin_from_token(&token).await?;
    let contacts = database().list_contacts().await?;
    Ok(Json(contacts))
}

#[utoipa::path(get, path = "/api/contacts/stats",
    responses((status = 200, body = ContactStatsResponse), (status = 401, body = MessageResponse), (status = 403, body = MessageResponse)))]
pub async fn contact_stats(AuthBearer(token): AuthBearer) -> Result<Json<ContactStatsResponse>> {
    admin_from_token(&token).await?;
    let db = database();
    let stats = ContactStatsResponse {
        total_contacts: db.count_contacts().await?,
        type_stats: db.contact_stats_by_type().await?,
        region_stats: db.contact_stats_by_region().await?,
        city_stats: db.contact_stats_by_city().await?,
    };
    Ok(Json(stats))
}

// ----- newsletter -----

#[utoipa::path(post, path = "/api/newsletter/subscribe", request_body = SubscribeRequest,
    responses((status = 201, body = NewsletterActionResponse), (status = 400, body = MessageResponse)))]
pub async fn subscribe(Json(req): Json<SubscribeRequest>) -> Result<impl IntoResponse> {
    let email = required("Email", &req.email)?;
    Validator::validate_email(email)?;

    let db = database();
    if db.get_subscriber_by_email(email).await?.is_some() {
        return Err(AppError::ValidationError(
            "Email already subscribed".to_string(),
        ));
    }

    db.create_subscriber(&Subscriber::new(email)).await?;
    info!(action = "newsletter_subscribe");
    Ok((
        StatusCode::CREATED,
        Json(NewsletterActionResponse {
            success: true,
            message: "Successfully subscribed to newsletter".to_string(),
        }),
    ))
}

#[utoipa::path(get, path = "/api/newsletter/subscribers",
    responses((status = 200, body = [Subscriber]), (status = 401, body = MessageResponse), (status = 403, body = MessageResponse)))]
pub async fn list_subscribers(AuthBearer(token): AuthBearer) -> Result<Json<Vec<Subscriber>>> {
    admin_from_token(&token).await?;
    let subscribers = database().list_active_subscribers().await?;
    Ok(Json(subscribers))
}

#[utoipa::path(delete, path = "/api/newsletter/unsubscribe", request_body = UnsubscribeRequest,
    responses((status = 200, body = NewsletterActionResponse), (status = 404, body = MessageResponse)))]
pub async fn unsubscribe(Json(req): Json<UnsubscribeRequest>) -> Result<impl IntoResponse> {
    let email = required("Email", &req.email)?;

    if !database().deactivate_subscriber(email).await? {
        return Err(AppError::NotFound("Email not found".to_string()));
    }

    info!(action = "newsletter_unsubscribe");
    Ok(Json(NewsletterActionResponse {
        success: true,
        message: "Successfully unsubscribed".to_string(),
    }))
}

// ----- integrations: Apollo -----

#[utoipa::path(post, path = "/api/integrations/apollo/search/people", request_body = SearchRequest,
    responses((status = 200, description = "People matching the query"), (status = 502, body = MessageResponse), (status = 503, body = MessageResponse)))]
pub async fn apollo_search_people(Json(req): Json<SearchRequest>) -> Result<Json<Vec<Value>>> {
    let query = req.query.as_deref().unwrap_or("");
    let people = ApolloService::from_env().search_people(query).await?;
    Ok(Json(people))
}

#[utoipa::path(post, path = "/api/integrations/apollo/search/companies", request_body = SearchRequest,
    responses((status = 200, description = "Organizations matching the query"), (status = 502, body = MessageResponse), (status = 503, body = MessageResponse)))]
pub async fn apollo_search_companies(Json(req): Json<SearchRequest>) -> Result<Json<Vec<Value>>> {
    let query = req.query.as_deref().unwrap_or("");
    let companies = ApolloService::from_env().search_companies(query).await?;
    Ok(Json(companies))
}

#[utoipa::path(get, path = "/api/integrations/apollo/users",
    responses((status = 200, description = "Workspace team members"), (status = 502, body = MessageResponse), (status = 503, body = MessageResponse)))]
pub async fn apollo_team_users() -> Result<Json<Vec<Value>>> {
    let users = ApolloService::from_env().list_team_users().await?;
    Ok(Json(users))
}

// ----- integrations: AI -----

#[utoipa::path(post, path = "/api/integrations/ai/chat", request_body = ChatRequest,
    responses((status = 200, body = ChatResponse), (status = 400, body = MessageResponse)))]
pub async fn ai_chat(Json(req): Json<ChatRequest>) -> Result<Json<ChatResponse>> {
    let message = required("Message", &req.message)?;
    let context = ChatContext::parse(req.context.as_deref().unwrap_or(""));

    let reply = AiService::from_env().chat(message, context).await;
    Ok(Json(ChatResponse {
        content: reply.content,
        fallback: reply.fallback,
    }))
}

#[utoipa::path(post, path = "/api/integrations/ai/generate", request_body = GenerateRequest,
    responses((status = 200, body = ChatResponse)))]
pub async fn ai_generate(Json(req): Json<GenerateRequest>) -> Result<Json<ChatResponse>> {
    let system_prompt = req.system_prompt.as_deref().unwrap_or("");
    let user_prompt = req.user_prompt.as_deref().unwrap_or("");

    let reply = AiService::from_env().generate(system_prompt, user_prompt).await;
    Ok(Json(ChatResponse {
        content: reply.content,
        fallback: reply.fallback,
    }))
}
