use axum::http::Method;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use serde_json::Value;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use utoipa::OpenApi;
use utoipa_redoc::{Redoc, Servable};
use utoipa_swagger_ui::SwaggerUi;

use crate::database::sqlite::{SqliteDatabase, GLOBAL_DB};
use crate::utils::middleware::{global_rate_limiter, request_id_middleware};

pub mod docs;
pub mod routes;
pub mod types;

#[derive(OpenApi)]
#[openapi(
    paths(
        routes::register,
        routes::login,
        routes::google_auth,
        routes::validate,
        routes::logout,
        routes::create_contact,
        routes::list_contacts,
        routes::contact_stats,
        routes::subscribe,
        routes::list_subscribers,
        routes::unsubscribe,
        routes::apollo_search_people,
        routes::apollo_search_companies,
        routes::apollo_team_users,
        routes::ai_chat,
        routes::ai_generate,
    ),
    components(
        schemas(
            types::RegisterRequest,
            types::LoginRequest,
            types::GoogleAuthRequest,
            types::AuthResponse,
            types::TokenRequest,
            types::ValidateResponse,
            types::MessageResponse,
            types::CreateContactRequest,
            types::ContactStatsResponse,
            types::SubscribeRequest,
            types::UnsubscribeRequest,
            types::NewsletterActionResponse,
            types::SearchRequest,
            types::ChatRequest,
            types::ChatResponse,
            types::GenerateRequest,
            types::HealthResponse,
            types::WelcomeResponse,
            crate::models::contact::Contact,
            crate::models::contact::InquiryType,
            crate::models::contact::StatBucket,
            crate::models::newsletter::Subscriber,
            crate::models::user::User,
        )
    ),
    tags(
        (name = "Auth", description = "Registration, login, Google sign-in and token lifecycle"),
        (name = "Contacts", description = "Contact form intake and admin dashboard reads"),
        (name = "Newsletter", description = "Newsletter signups"),
        (name = "Integrations", description = "Proxies to Apollo.io lead search and Groq chat completions")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

pub struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearerAuth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// Assembles the full application router. Assumes `GLOBAL_DB` is set.
pub fn build_router() -> Router {
    let openapi = ApiDoc::openapi();

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers(Any);

    Router::new()
        .route("/", get(root))
        .route("/api/health", get(health_check))
        .nest("/api/auth", routes::auth_router())
        .nest("/api/contacts", routes::contacts_router())
        .nest("/api/newsletter", routes::newsletter_router())
        .nest("/api/integrations", routes::integrations_router())
        .route("/docs/openapi.json", get(openapi_json))
        .route("/docs/redoc", get(redoc_ui))
        .route("/docs/markdown", get(api_markdown))
        .route("/docs", get(api_documentation))
        .merge(SwaggerUi::new("/api/docs").url("/api/openapi.json", openapi.clone()))
        .merge(Redoc::with_url("/api/redoc", openapi))
        .layer(cors)
        .layer(axum::middleware::from_fn(global_rate_limiter))
        .layer(axum::middleware::from_fn(request_id_middleware))
}

/// Main entry point for the BrandTURN API server. Connects the database,
/// publishes the global handle and serves until the process ends.
pub async fn start_http_server() {
    let database_path =
        std::env::var("DATABASE_PATH").unwrap_or_else(|_| "brandturn.db".to_string());
    let db = Arc::new(
        SqliteDatabase::new(&database_path)
            .await
            .expect("database must be reachable at startup"),
    );
    GLOBAL_DB.set(db).ok();

    let app = build_router();

    let port = std::env::var("PORT").unwrap_or_else(|_| "8080".to_string());
    let addr: SocketAddr = format!("0.0.0.0:{}", port)
        .parse()
        .expect("invalid PORT value");

    tracing::info!(action = "server_started", addr = %addr);
    axum::serve(
        tokio::net::TcpListener::bind(addr)
            .await
            .expect("failed to bind server port"),
        app,
    )
    .await
    .expect("server crashed");
}

async fn root() -> Json<types::WelcomeResponse> {
    Json(types::WelcomeResponse {
        message: "Welcome to BrandTURN Backend API".to_string(),
    })
}

async fn health_check() -> Json<types::HealthResponse> {
    Json(types::HealthResponse {
        status: "OK".to_string(),
        timestamp: Utc::now(),
    })
}

/// Export OpenAPI specification as JSON.
async fn openapi_json() -> Json<Value> {
    let openapi = ApiDoc::openapi();
    Json(serde_json::to_value(openapi).unwrap_or_default())
}

/// Serves the Redoc UI for API documentation.
async fn redoc_ui() -> impl IntoResponse {
    let html = r#"
    <!DOCTYPE html>
    <html>
    <head>
        <title>BrandTURN API Documentation</title>
        <meta charset="utf-8"/>
        <meta name="viewport" content="width=device-width, initial-scale=1">
        <style>
            body {
                margin: 0;
                padding: 0;
            }
        </style>
    </head>
    <body>
        <redoc spec-url="/docs/openapi.json"></redoc>
        <script src="https://cdn.redoc.ly/redoc/latest/bundles/redoc.standalone.js"></script>
    </body>
    </html>
    "#;
    axum::response::Html(html)
}

/// Serves the API documentation as downloadable Markdown.
async fn api_markdown() -> impl IntoResponse {
    let markdown = docs::generate_markdown_docs();
    axum::response::Response::builder()
        .header("Content-Type", "text/markdown")
        .header(
            "Content-Disposition",
            "attachment; filename=\"API_DOCUMENTATION.md\"",
        )
        .body(axum::body::Body::from(markdown))
        .unwrap_or_else(|_| axum::response::Response::new(axum::body::Body::empty()))
}

/// Serves the main API documentation HTML page.
async fn api_documentation() -> impl IntoResponse {
    let html = docs::generate_documentation_html();
    axum::response::Html(html)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use tower::util::ServiceExt;

    #[tokio::test]
    async fn health_endpoint_reports_ok() {
        let app = Router::new().route("/api/health", get(health_check));
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["status"], "OK");
        assert!(body["timestamp"].is_string());
    }

    #[tokio::test]
    async fn root_returns_welcome_message() {
        let app = Router::new().route("/", get(root));
        let response = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["message"], "Welcome to BrandTURN Backend API");
    }
}
