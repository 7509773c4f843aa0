//! `POST /getSchedule`.

use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, RawQuery, State},
    http::HeaderMap,
    Json,
};
use chrono::Utc;
use serde_json::Value;

use crate::error::GatewayError;
use crate::http::server::AppState;
use crate::schedule::transform::apply_filter;
use crate::schedule::types::{Role, ScheduleFilter, ScheduleParams, ScheduleResponse};

/// Fetch Primary and Standby schedules for the posted group.
///
/// The body is parsed as JSON whatever its `Content-Type`.
pub async fn get_schedule(
    State(state): State<AppState>,
    headers: HeaderMap,
    RawQuery(query): RawQuery,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<ScheduleResponse>, GatewayError> {
    let body = body?;
    let params = ScheduleParams::from_query(query.as_deref());

    let base_group = parse_group(&body)?;

    let credentials = state
        .config
        .upstream
        .credentials
        .as_ref()
        .ok_or(GatewayError::CredentialsNotSet)?;

    let filter = ScheduleFilter::from(params);
    let today = Utc::now().date_naive();
    tracing::info!(group = %base_group, filter = ?filter, "Schedule requested");

    let request_id = headers.get("x-request-id");
    let (primary, standby) = tokio::try_join!(
        state
            .ocm
            .fetch_role(credentials, &base_group, Role::Primary, today, request_id),
        state
            .ocm
            .fetch_role(credentials, &base_group, Role::Standby, today, request_id),
    )?;

    let response = ScheduleResponse {
        primary: apply_filter(primary, &filter, today),
        standby: apply_filter(standby, &filter, today),
    };

    tracing::info!(
        group = %base_group,
        primary = response.primary.len(),
        standby = response.standby.len(),
        "Schedule assembled"
    );
    Ok(Json(response))
}

/// Extract a non-empty `group` string from a JSON object body.
fn parse_group(body: &[u8]) -> Result<String, GatewayError> {
    let value: Value = serde_json::from_slice(body)
        .map_err(|_| GatewayError::BadRequest("Invalid JSON body".into()))?;
    let object = value
        .as_object()
        .ok_or_else(|| GatewayError::BadRequest("Invalid JSON body".into()))?;

    match object.get("group").and_then(Value::as_str) {
        Some(group) if !group.is_empty() => Ok(group.to_string()),
        _ => Err(GatewayError::MissingGroup),
    }
}
