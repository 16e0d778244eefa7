//! Route configuration and setup

use std::sync::Arc;

use assetgate_core::Config;
use axum::{
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method},
    routing::{delete, get, post},
    Json, Router,
};
use tower::limit::ConcurrencyLimitLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

use crate::auth::{auth_middleware, AuthState};
use crate::handlers;
use crate::state::AppState;

/// Setup all application routes
pub fn setup_routes(
    config: &Config,
    state: Arc<AppState>,
    auth_state: AuthState,
) -> Result<Router<()>, anyhow::Error> {
    let cors = setup_cors(config)?;

    // Public routes: authorization is carried in the URL itself (provider
    // signature on /get, capability signature on /upload_form) or not needed.
    let public_routes = Router::new()
        .route("/healthz", get(handlers::health::healthz))
        .route("/get/{*key}", get(handlers::asset_get::get_asset))
        .route("/upload_form", post(handlers::upload_form::upload_form));

    // Protected routes: identity resolved by the auth middleware.
    let protected_routes = Router::new()
        .route(
            "/presign_upload",
            post(handlers::presign_upload::presign_upload),
        )
        .route("/get_signed_url", post(handlers::sign::get_signed_url))
        .route("/assets", get(handlers::asset_list::list_assets))
        .route(
            "/delete/{*asset_name}",
            delete(handlers::asset_delete::delete_asset),
        )
        .route(
            "/presign_upload_form",
            post(handlers::upload_form::presign_upload_form),
        )
        .layer(axum::middleware::from_fn_with_state(
            Arc::new(auth_state),
            auth_middleware,
        ));

    // Server-level concurrency limit to protect against resource exhaustion under extreme load
    let http_concurrency_limit = std::env::var("HTTP_CONCURRENCY_LIMIT")
        .ok()
        .and_then(|s| s.parse::<usize>().ok())
        .unwrap_or(10_000)
        .max(1);

    let app = public_routes
        .merge(protected_routes)
        .route(
            "/openapi.json",
            get(|| async { Json(crate::api_doc::openapi_json()) }),
        )
        .nest(
            "/docs",
            utoipa_rapidoc::RapiDoc::new("/openapi.json")
                .path("/docs")
                .into(),
        )
        .layer(ConcurrencyLimitLayer::new(http_concurrency_limit))
        .layer(RequestBodyLimitLayer::new(config.max_body_bytes))
        .layer(DefaultBodyLimit::disable())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    Ok(app)
}

fn setup_cors(config: &Config) -> Result<CorsLayer, anyhow::Error> {
    let cors = if config.cors_origins.contains(&"*".to_string()) {
        tracing::warn!("CORS configured to allow all origins - not recommended for production");
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
            .allow_headers(Any)
    } else {
        let origins: Result<Vec<HeaderValue>, _> =
            config.cors_origins.iter().map(|o| o.parse()).collect();
        CorsLayer::new()
            .allow_origin(origins.unwrap_or_default())
            .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
            .allow_headers(Any)
    };
    Ok(cors)
}
