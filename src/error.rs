use axum::{
    http::{header::RETRY_AFTER, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// Which side of the request a failure belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Storage,
    Auth,
    RateLimit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthError {
    MissingApiKey,
    InvalidApiKey,
    /// No key is configured on the server side.
    ServerMisconfigured,
}

impl AuthError {
    pub fn code(self) -> Option<&'static str> {
        match self {
            AuthError::MissingApiKey => Some("MISSING_API_KEY"),
            AuthError::InvalidApiKey => Some("INVALID_API_KEY"),
            AuthError::ServerMisconfigured => None,
        }
    }

    fn message(self) -> &'static str {
        match self {
            AuthError::MissingApiKey => "API key is required. Please provide X-API-Key header.",
            AuthError::InvalidApiKey => "Invalid API key",
            AuthError::ServerMisconfigured => "Server configuration error",
        }
    }
}

/// Per-request failure. Every variant is terminal for the request.
#[derive(Debug, Error)]
pub enum AppError {
    /// Bad user input; the message is shown to the client as is.
    #[error("{0}")]
    Validation(String),
    /// Storage or unexpected failure. The cause is logged where it happens and
    /// only this generic message reaches the client.
    #[error("{0}")]
    Storage(&'static str),
    #[error("{}", .0.message())]
    Auth(AuthError),
    #[error("Too many requests from this IP, please try again later.")]
    RateLimited { retry_after: Duration },
}

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        AppError::Validation(message.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::Validation(_) => ErrorKind::Validation,
            AppError::Storage(_) => ErrorKind::Storage,
            AppError::Auth(_) => ErrorKind::Auth,
            AppError::RateLimited { .. } => ErrorKind::RateLimit,
        }
    }

    pub fn http_status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Auth(AuthError::ServerMisconfigured) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Auth(_) => StatusCode::UNAUTHORIZED,
            AppError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.http_status();
        debug!(kind=?self.kind(), status=%status, message=%self, "request failed");
        let body = match &self {
            AppError::Auth(auth) => match auth.code() {
                Some(code) => json!({ "message": self.to_string(), "error": code }),
                None => json!({ "message": self.to_string() }),
            },
            AppError::RateLimited { .. } => {
                json!({ "message": self.to_string(), "error": "RATE_LIMIT_EXCEEDED" })
            }
            _ => json!({ "message": self.to_string() }),
        };
        match self {
            AppError::RateLimited { retry_after } => {
                // Whole seconds, rounded up so clients never retry early.
                let secs = retry_after.as_secs() + u64::from(retry_after.subsec_nanos() > 0);
                (status, [(RETRY_AFTER, secs.to_string())], Json(body)).into_response()
            }
            _ => (status, Json(body)).into_response(),
        }
    }
}

/// Failure inside a storage adapter.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_follows_kind() {
        assert_eq!(
            AppError::validation("bad").http_status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::Storage("Failed to fetch loads").http_status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            AppError::Auth(AuthError::MissingApiKey).http_status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AppError::Auth(AuthError::ServerMisconfigured).http_status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(AppError::Auth(AuthError::InvalidApiKey).kind(), ErrorKind::Auth);
    }

    #[tokio::test]
    async fn auth_errors_carry_code() {
        let response = AppError::Auth(AuthError::InvalidApiKey).into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let bytes = hyper::body::to_bytes(response.into_body()).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"], "INVALID_API_KEY");
        assert_eq!(body["message"], "Invalid API key");
    }

    #[tokio::test]
    async fn rate_limited_is_429_with_retry_after() {
        let response = AppError::RateLimited {
            retry_after: Duration::from_millis(1500),
        }
        .into_response();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers()[RETRY_AFTER], "2");
        let bytes = hyper::body::to_bytes(response.into_body()).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"], "RATE_LIMIT_EXCEEDED");
        assert_eq!(
            body["message"],
            "Too many requests from this IP, please try again later."
        );
    }
}
