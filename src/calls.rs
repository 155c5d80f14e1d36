use crate::analytics::{summarize, CallAnalytics};
use crate::db_types::InboundCall;
use crate::error::AppError;
use crate::store::CallStore;
use crate::validation::{validate_inbound_call, InboundCallPayload};

use time::OffsetDateTime;
use tracing::{error, info};

/// Validates and stores one inbound call record.
pub async fn create_call(
    store: &dyn CallStore,
    payload: &InboundCallPayload,
) -> Result<InboundCall, AppError> {
    let call = validate_inbound_call(payload)?;
    let inserted = store.insert_call(call.clone()).await.map_err(|e| {
        error!(
            error=%e,
            outcome=?call.outcome,
            caller_sentiment=?call.caller_sentiment,
            carrier_name=?call.carrier_name,
            mc_number=?call.mc_number,
            "failed to insert inbound call"
        );
        AppError::Storage("Failed to create inbound call record")
    })?;
    info!(call_id=%inserted.call_id, "inbound call recorded");
    Ok(inserted)
}

pub async fn call_analytics(store: &dyn CallStore) -> Result<CallAnalytics, AppError> {
    let calls = store.all_calls().await.map_err(|e| {
        error!(error=%e, "failed to read inbound calls for analytics");
        AppError::Storage("Failed to fetch analytics")
    })?;
    Ok(summarize(&calls, OffsetDateTime::now_utc()))
}
