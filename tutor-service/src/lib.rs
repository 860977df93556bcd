pub mod agents;
pub mod auth;
pub mod config;
pub mod dtos;
pub mod handlers;
pub mod models;
pub mod services;
pub mod startup;

use axum::{
    http::{header, HeaderName, HeaderValue, Method},
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
    Router,
};
use service_core::middleware::{
    metrics::metrics_middleware,
    rate_limit::{create_ip_rate_limiter, ip_rate_limit_middleware, IpRateLimiter},
    security_headers::security_headers_middleware,
    tracing::{request_id_middleware, REQUEST_ID_HEADER},
};
use std::sync::Arc;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use crate::auth::{auth_middleware, JwtVerifier};
use crate::config::TutorConfig;
use crate::services::providers::TextProvider;
use crate::services::{Database, LlmClient};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<TutorConfig>,
    pub db: Database,
    pub llm: LlmClient,
    pub jwt: JwtVerifier,
    /// Shared by every route that calls the model.
    pub generation_rate_limiter: IpRateLimiter,
}

impl AppState {
    pub fn new(config: TutorConfig, db: Database, provider: Arc<dyn TextProvider>) -> Self {
        let llm = LlmClient::new(provider, config.llm.max_retries, config.llm.temperature);
        let jwt = JwtVerifier::new(&config.auth.jwt_secret, config.auth.issuer.clone());
        let generation_rate_limiter = create_ip_rate_limiter(
            config.rate_limit.generation_limit,
            config.rate_limit.generation_window_seconds,
        );

        Self {
            config: Arc::new(config),
            db,
            llm,
            jwt,
            generation_rate_limiter,
        }
    }
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origin = if allowed_origins.iter().any(|o| o == "*") {
        AllowOrigin::any()
    } else {
        AllowOrigin::list(allowed_origins.iter().filter_map(|o| {
            o.parse::<HeaderValue>()
                .map_err(|e| tracing::error!("Invalid CORS origin '{}': {}", o, e))
                .ok()
        }))
    };

    CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            HeaderName::from_static(REQUEST_ID_HEADER),
        ])
}

pub fn build_router(state: AppState) -> Router {
    use handlers::{assignments, feedback, health, lessons, progress, sessions, students, usage};

    // Routes that call the model, rate limited per client IP
    let generation_routes = Router::new()
        .route("/sessions/:id/messages", post(sessions::send_message))
        .route("/lessons", post(lessons::create_lesson))
        .route("/assignments", post(assignments::create_assignment))
        .route("/quizzes", post(assignments::create_quiz))
        .route(
            "/assignments/:id/submissions",
            post(assignments::submit_assignment),
        )
        .route("/feedback", post(feedback::request_feedback))
        .route_layer(from_fn_with_state(
            state.generation_rate_limiter.clone(),
            ip_rate_limit_middleware,
        ));

    let api_routes = Router::new()
        .route("/students/me", get(students::get_me).put(students::update_me))
        .route(
            "/sessions",
            get(sessions::list_sessions).post(sessions::create_session),
        )
        .route(
            "/sessions/:id",
            get(sessions::get_session).delete(sessions::delete_session),
        )
        .route("/lessons", get(lessons::list_lessons))
        .route("/lessons/:id", get(lessons::get_lesson))
        .route("/assignments", get(assignments::list_assignments))
        .route("/assignments/:id", get(assignments::get_assignment))
        .route(
            "/assignments/:id/submissions",
            get(assignments::list_submissions),
        )
        .route("/progress", get(progress::get_progress))
        .route("/feedback", get(feedback::list_feedback))
        .route("/usage", get(usage::get_usage))
        .merge(generation_routes)
        .layer(from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        .route("/metrics", get(health::metrics))
        .nest("/api/v1", api_routes)
        .with_state(state.clone())
        // Add metrics middleware
        .layer(from_fn(metrics_middleware))
        // Add tracing layer
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                let request_id = request
                    .headers()
                    .get(REQUEST_ID_HEADER)
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-");

                tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    method = %request.method(),
                    uri = %request.uri(),
                    version = ?request.version(),
                )
            }),
        )
        .layer(from_fn(request_id_middleware))
        .layer(from_fn(security_headers_middleware))
        .layer(cors_layer(&state.config.security.allowed_origins))
}
