pub mod config;
pub mod creator;
pub mod db;
pub mod eligibility;
pub mod email;
pub mod error;
pub mod mapping;
pub mod models;
pub mod rate_limit;
pub mod routes;
pub mod scoring;
pub mod state;
pub mod submission;

use std::sync::Arc;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::http::{HeaderName, HeaderValue, Method};
use sqlx::PgPool;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::creator::CreatorClient;
use crate::email::{Notifier, SystemMailer};
use crate::rate_limit::SubmissionRateLimiter;
use crate::state::{AppState, SharedState};

pub fn build_app(pool: PgPool, config: Config) -> Result<(Router, SharedState), String> {
    let notifier = config
        .smtp
        .as_ref()
        .and_then(|smtp| match SystemMailer::new(smtp) {
            Ok(mailer) => {
                tracing::info!("System SMTP configured");
                Some(Arc::new(mailer) as Arc<dyn Notifier>)
            }
            Err(e) => {
                tracing::warn!("System SMTP not available: {e}");
                None
            }
        });

    if notifier.is_none() {
        tracing::warn!("Applicant notifications disabled");
    }

    build_app_with(pool, config, notifier)
}

/// Build the router with an explicit notifier in place of SMTP.
pub fn build_app_with(
    pool: PgPool,
    config: Config,
    notifier: Option<Arc<dyn Notifier>>,
) -> Result<(Router, SharedState), String> {
    let creator = CreatorClient::new(config.creator.clone())?;

    let state: SharedState = Arc::new(AppState {
        pool,
        creator,
        notifier,
        submission_limiter: SubmissionRateLimiter::new(),
        config,
    });

    let router = Router::new()
        .merge(routes::api_routes())
        .merge(routes::creator_routes())
        .route("/health", axum::routing::get(health))
        .layer(DefaultBodyLimit::max(state.config.max_body_size))
        .layer(RequestBodyLimitLayer::new(state.config.max_body_size))
        .layer(cors_layer(&state.config.cors_origins))
        .layer(TraceLayer::new_for_http())
        .layer(SetResponseHeaderLayer::overriding(
            HeaderName::from_static("x-content-type-options"),
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            HeaderName::from_static("x-frame-options"),
            HeaderValue::from_static("DENY"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            HeaderName::from_static("referrer-policy"),
            HeaderValue::from_static("strict-origin-when-cross-origin"),
        ))
        .with_state(state.clone());

    Ok((router, state))
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers(Any);

    let parsed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| HeaderValue::from_str(o).ok())
        .collect();

    if parsed.is_empty() {
        layer.allow_origin(Any)
    } else {
        layer.allow_origin(AllowOrigin::list(parsed))
    }
}

async fn health() -> &'static str {
    "ok"
}
