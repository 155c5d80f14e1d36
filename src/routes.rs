use crate::auth::require_api_key;
use crate::consts::API_KEY_HEADER;
use crate::handlers;
use crate::rate_limit::limit_by_ip;
use crate::types::AppState;

use axum::{
    http::{header::CONTENT_TYPE, HeaderName, HeaderValue, Method},
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};

/// `None` allows any origin. Credentials are only allowed alongside an exact
/// origin, since browsers reject them with a wildcard.
pub fn cors_layer(origin: Option<HeaderValue>) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([CONTENT_TYPE, HeaderName::from_static(API_KEY_HEADER)]);
    match origin {
        Some(origin) => cors
            .allow_origin(AllowOrigin::exact(origin))
            .allow_credentials(true),
        None => cors.allow_origin(AllowOrigin::any()),
    }
}

pub fn router(app_state: Arc<AppState>, cors_origin: Option<HeaderValue>) -> Router {
    let api = Router::new()
        .route(
            "/loads",
            get(handlers::get_loads).fallback(handlers::loads_method_not_allowed),
        )
        .route(
            "/inbound-calls",
            post(handlers::create_inbound_call).fallback(handlers::calls_method_not_allowed),
        )
        .route(
            "/inbound-calls/analytics",
            get(handlers::get_analytics).fallback(handlers::calls_method_not_allowed),
        )
        .layer(middleware::from_fn_with_state(
            app_state.clone(),
            require_api_key,
        ));

    let limited = Router::new()
        .route("/", get(handlers::root))
        .nest("/api", api)
        .layer(middleware::from_fn_with_state(
            app_state.clone(),
            limit_by_ip,
        ));

    Router::new()
        .route("/health", get(handlers::health))
        .merge(limited)
        .with_state(app_state)
        .layer(cors_layer(cors_origin))
}
