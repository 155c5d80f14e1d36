use crate::consts::API_KEY_HEADER;
use crate::error::{AppError, AuthError};
use crate::types::AppState;

use axum::{
    extract::State,
    middleware::Next,
    response::{IntoResponse, Response},
};
use http::Request;
use std::sync::Arc;
use tracing::{error, warn};

/// Guards the `/api` routes with the shared `X-API-Key` secret.
pub async fn require_api_key<B>(
    State(app_state): State<Arc<AppState>>,
    request: Request<B>,
    next: Next<B>,
) -> Response {
    match check_api_key(app_state.api_key.as_deref(), &request) {
        Ok(()) => next.run(request).await,
        Err(e) => e.into_response(),
    }
}

fn check_api_key<B>(expected: Option<&str>, request: &Request<B>) -> Result<(), AppError> {
    let Some(expected) = expected else {
        error!("API_KEY is not configured; rejecting api request");
        return Err(AppError::Auth(AuthError::ServerMisconfigured));
    };
    let Some(provided) = request.headers().get(API_KEY_HEADER) else {
        return Err(AppError::Auth(AuthError::MissingApiKey));
    };
    if provided.as_bytes() != expected.as_bytes() {
        warn!(path = %request.uri().path(), "rejected request with invalid api key");
        return Err(AppError::Auth(AuthError::InvalidApiKey));
    }
    Ok(())
}
