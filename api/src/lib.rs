//! Formdesk HTTP API
//!
//! REST transport for schema management, submission intake and analytics.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                        formdesk-api                          │
//! │                                                              │
//! │  trace ─► gzip ─► CORS ─► body limit ─► rate limit ─► routes │
//! │                                                      │       │
//! │  /health   /api/forms/*   /api/analytics   /docs     │       │
//! └──────────────────────────────────────────────────────┼───────┘
//!                                                        ▼
//!                          formdesk_forms::FormService
//!                    (in-memory or SQLite repositories)
//! ```

pub mod config;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::http::{header, HeaderValue, Method};
use axum::routing::get;
use axum::Router;
use formdesk_forms::infrastructure::persistence::{
    InMemorySchemaRepository, InMemorySubmissionRepository, SqliteRepository,
};
use formdesk_forms::{AnalyticsAggregator, FormService};
use tower::ServiceBuilder;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub use config::{ServerConfig, StorageBackend};
pub use error::{ApiError, ApiResult, AppJson};
pub use models::*;

/// API state
pub struct ApiState {
    pub service: Arc<FormService>,
    pub version: String,
    pub environment: String,
}

impl ApiState {
    pub fn new(service: FormService, environment: impl Into<String>) -> Self {
        Self {
            service: Arc::new(service),
            version: env!("CARGO_PKG_VERSION").into(),
            environment: environment.into(),
        }
    }
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Formdesk API",
        description = "Dynamic form schemas, submission intake and analytics",
        license(name = "Apache-2.0")
    ),
    paths(
        routes::health::health_check,
        routes::forms::submit,
        routes::forms::list_submissions,
        routes::forms::get_submission,
        routes::forms::validate,
        routes::schemas::save_schema,
        routes::schemas::get_schema,
        routes::schemas::list_schemas,
        routes::analytics::get_analytics,
    ),
    components(
        schemas(
            ErrorResponse, SubmitRequest, ValidateRequest,
            formdesk_forms::FormSchema,
            formdesk_forms::FieldDescriptor,
            formdesk_forms::FieldType,
            formdesk_forms::PatternRule,
            formdesk_forms::FieldError,
            formdesk_forms::Submission,
            formdesk_forms::application::SubmissionPage,
            formdesk_forms::AnalyticsSnapshot,
            routes::health::HealthResponse
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "forms", description = "Submission intake and retrieval"),
        (name = "schemas", description = "Form schema management"),
        (name = "analytics", description = "Analytics and reporting")
    )
)]
pub struct ApiDoc;

/// Build the form service over the configured storage backend
pub fn build_service(config: &ServerConfig) -> anyhow::Result<FormService> {
    let service = match config.storage.backend {
        StorageBackend::Memory => FormService::new(
            Arc::new(InMemorySubmissionRepository::new()),
            Arc::new(InMemorySchemaRepository::new()),
        ),
        StorageBackend::Sqlite => {
            let repo = Arc::new(SqliteRepository::open(&config.storage.path, config.storage.busy_timeout())?);
            FormService::new(repo.clone(), repo)
        }
    };

    Ok(service
        .with_analytics(AnalyticsAggregator::new(config.analytics.clone()))
        .with_pattern_policy(config.validation.pattern_policy))
}

/// Build the API router
pub fn build_router(state: ApiState, config: &ServerConfig) -> Router {
    let limiter = Arc::new(middleware::RateLimiter::new((&config.rate_limit).into()));

    Router::new()
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/health", get(routes::health::health_check))
        .nest("/api", api_routes())
        .fallback(routes::not_found)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CompressionLayer::new())
                .layer(cors_layer(&config.cors.allowed_origins))
                .layer(DefaultBodyLimit::max(config.limits.body_bytes))
                .layer(axum::middleware::from_fn_with_state(limiter, middleware::rate_limit)),
        )
        .with_state(Arc::new(state))
}

fn api_routes() -> Router<Arc<ApiState>> {
    Router::new()
        .nest("/forms", routes::forms::router().merge(routes::schemas::router()))
        .route("/analytics", get(routes::analytics::get_analytics))
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.iter().any(|origin| origin == "*") {
        return CorsLayer::permissive();
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(%origin, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::ACCEPT, header::ORIGIN])
        .allow_credentials(true)
}
