//! OCM cross-subscription schedule lookups.

use axum::http::{header, HeaderValue};
use chrono::{Duration as ChronoDuration, NaiveDate};
use serde_json::Value;
use url::Url;

use crate::config::Credentials;
use crate::error::GatewayError;
use crate::http::relay::basic_auth;
use crate::schedule::transform::{flatten, ocm_date};
use crate::schedule::types::{Role, ShiftRecord};
use crate::upstream::{UpstreamClient, UpstreamRequest};

/// Client for the OCM schedule API.
#[derive(Debug, Clone)]
pub struct OcmClient {
    upstream: UpstreamClient,
    base_url: Url,
    window_days: i64,
}

impl OcmClient {
    pub fn new(upstream: UpstreamClient, base_url: Url, window_days: i64) -> Self {
        Self {
            upstream,
            base_url,
            window_days,
        }
    }

    /// Schedule URL for `group_name` covering `today..today + window_days`.
    pub fn schedule_url(
        &self,
        credentials: &Credentials,
        group_name: &str,
        today: NaiveDate,
    ) -> Result<Url, GatewayError> {
        let end = today + ChronoDuration::days(self.window_days);

        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| GatewayError::Internal("OCM base URL cannot be a base".into()))?
            .pop_if_empty()
            .extend([
                "api",
                "ocdm",
                "v1",
                credentials.subscription_id(),
                "crosssubscriptionschedules",
            ]);
        url.query_pairs_mut()
            .append_pair("groupname", group_name)
            .append_pair("from", &ocm_date(today))
            .append_pair("to", &ocm_date(end));
        Ok(url)
    }

    /// Fetch and flatten the schedule of one role for `base_group`.
    ///
    /// A non-success OCM status is returned as `GatewayError::UpstreamStatus`.
    pub async fn fetch_role(
        &self,
        credentials: &Credentials,
        base_group: &str,
        role: Role,
        today: NaiveDate,
        request_id: Option<&HeaderValue>,
    ) -> Result<Vec<ShiftRecord>, GatewayError> {
        let group_name = role.group_name(base_group);
        let url = self.schedule_url(credentials, &group_name, today)?;

        let mut request = UpstreamRequest::get(url);
        request
            .headers
            .insert(header::ACCEPT, HeaderValue::from_static("application/json"));
        let auth = HeaderValue::from_str(&basic_auth(&credentials.username, &credentials.password))
            .map_err(|e| GatewayError::Internal(format!("invalid credential header: {e}")))?;
        request.headers.insert(header::AUTHORIZATION, auth);
        if let Some(id) = request_id {
            request.headers.insert("x-request-id", id.clone());
        }

        tracing::info!(group = %group_name, url = %request.url, "Fetching OCM schedule");

        let response = self.upstream.send(&request).await?;
        if !response.status.is_success() {
            tracing::warn!(group = %group_name, status = %response.status, "OCM returned an error status");
            return Err(GatewayError::UpstreamStatus(response));
        }

        let raw: Value = match serde_json::from_slice(&response.body) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!(group = %group_name, error = %e, "OCM response is not JSON");
                Value::Null
            }
        };

        let records = flatten(&raw, &group_name, role);
        tracing::info!(group = %group_name, records = records.len(), "OCM schedule fetched");
        Ok(records)
    }
}
