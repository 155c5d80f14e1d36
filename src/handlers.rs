use crate::calls::{call_analytics, create_call};
use crate::error::AppError;
use crate::loads::query_loads;
use crate::types::AppState;
use crate::validation::{InboundCallPayload, LoadQueryParams};

use axum::{
    body::Bytes,
    extract::{RawQuery, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use time::OffsetDateTime;
use tracing::{debug, warn};

#[derive(Serialize)]
struct Health {
    status: &'static str,
    #[serde(with = "time::serde::rfc3339")]
    timestamp: OffsetDateTime,
    service: &'static str,
}

pub async fn health() -> impl IntoResponse {
    Json(Health {
        status: "healthy",
        timestamp: OffsetDateTime::now_utc(),
        service: "loads-api",
    })
}

pub async fn root() -> impl IntoResponse {
    Json(json!({ "message": "Loads API is running!" }))
}

pub async fn get_loads(
    State(app_state): State<Arc<AppState>>,
    RawQuery(query): RawQuery,
) -> Result<impl IntoResponse, AppError> {
    let raw = query.unwrap_or_default();
    let params: LoadQueryParams = serde_urlencoded::from_str(&raw).map_err(|e| {
        warn!(error=%e, query=%raw, "failed to deserialize load query");
        AppError::validation("Invalid query string")
    })?;
    let request = app_state.rules.validate_load_query(&params).map_err(|e| {
        debug!(error=%e, "rejected load query");
        e
    })?;
    let page = query_loads(app_state.loads.as_ref(), request).await?;
    Ok(Json(page))
}

pub async fn create_inbound_call(
    State(app_state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<impl IntoResponse, AppError> {
    // An empty body is treated like `{}` so the missing-field message applies.
    let payload: InboundCallPayload = if body.iter().all(u8::is_ascii_whitespace) {
        InboundCallPayload::default()
    } else {
        serde_json::from_slice(&body).map_err(|e| {
            warn!(error=%e, "failed to deserialize inbound call payload");
            AppError::validation("Invalid JSON body")
        })?
    };
    let call = create_call(app_state.calls.as_ref(), &payload).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Inbound call record created successfully",
            "call_id": call.call_id,
            "call": call,
        })),
    ))
}

pub async fn get_analytics(
    State(app_state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(call_analytics(app_state.calls.as_ref()).await?))
}

fn method_not_allowed(allowed: &[&str]) -> Response {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        Json(json!({
            "message": "Method not allowed",
            "allowedMethods": allowed,
        })),
    )
        .into_response()
}

pub async fn loads_method_not_allowed() -> Response {
    method_not_allowed(&["GET"])
}

pub async fn calls_method_not_allowed() -> Response {
    method_not_allowed(&["GET", "POST"])
}
