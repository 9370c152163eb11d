//! Thin JSON-over-HTTP client with bearer auth and status mapping.

use reqwest::StatusCode;
use serde_json::Value;
use url::Url;

use candela_core::{Capability, CandelaError, Credentials};

const BODY_EXCERPT: usize = 200;

/// Request paths relative to the base URL. A `{id}` segment is replaced by
/// the percent-encoded instance id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    /// Paginated candles; takes `symbol`, `interval`, `startTime`, `endTime`, `limit`.
    pub candles: String,
    /// Aggregated position history of an instance.
    pub position_history: String,
    /// Raw signals of an instance.
    pub signals: String,
    /// Channel history of an instance; takes `days`.
    pub channel_history: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            candles: "api/v1/candles".into(),
            position_history: "api/v1/instances/{id}/positions/history".into(),
            signals: "api/v1/instances/{id}/signals".into(),
            channel_history: "api/v1/instances/{id}/channel/history".into(),
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct ApiClient {
    pub(crate) name: &'static str,
    pub(crate) http: reqwest::Client,
    pub(crate) base: Url,
    pub(crate) endpoints: Endpoints,
}

impl ApiClient {
    pub(crate) fn url(
        &self,
        template: &str,
        instance_id: Option<&str>,
    ) -> Result<Url, CandelaError> {
        let mut url = self.base.clone();
        {
            let mut segs = url.path_segments_mut().map_err(|()| {
                CandelaError::InvalidArg(format!("{} cannot be a base url", self.base))
            })?;
            segs.pop_if_empty();
            for seg in template.split('/').filter(|s| !s.is_empty()) {
                match (seg, instance_id) {
                    ("{id}", Some(id)) => segs.push(id),
                    ("{id}", None) => {
                        return Err(CandelaError::InvalidArg(format!(
                            "endpoint {template} needs an instance id"
                        )));
                    }
                    _ => segs.push(seg),
                };
            }
        }
        Ok(url)
    }

    /// GET `url` with bearer auth and decode the JSON body.
    pub(crate) async fn get_json(
        &self,
        auth: &Credentials,
        url: Url,
        query: &[(&str, String)],
        capability: Capability,
    ) -> Result<Value, CandelaError> {
        if auth.is_blank() {
            return Err(CandelaError::MissingCredentials);
        }
        let resp = self
            .http
            .get(url)
            .bearer_auth(&auth.bearer)
            .query(query)
            .send()
            .await
            .map_err(|e| self.transport_error(&e, capability))?;

        let status = resp.status();
        if !status.is_success() {
            let retry_after_ms = resp
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.trim().parse::<u64>().ok())
                .map(|secs| secs.saturating_mul(1000));
            let body = resp.text().await.unwrap_or_default();
            return Err(map_status(status, retry_after_ms, &body, capability));
        }
        resp.json::<Value>()
            .await
            .map_err(|e| CandelaError::Data(format!("{capability} response: {e}")))
    }

    fn transport_error(&self, e: &reqwest::Error, capability: Capability) -> CandelaError {
        if e.is_timeout() {
            CandelaError::fetch_timeout(self.name, capability.as_str())
        } else {
            CandelaError::connector(self.name, e.to_string())
        }
    }
}

fn excerpt(body: &str) -> String {
    let trimmed = body.trim();
    match trimmed.char_indices().nth(BODY_EXCERPT) {
        Some((cut, _)) => format!("{}...", &trimmed[..cut]),
        None => trimmed.to_string(),
    }
}

/// Map a non-success status to the workspace error taxonomy.
pub(crate) fn map_status(
    status: StatusCode,
    retry_after_ms: Option<u64>,
    body: &str,
    capability: Capability,
) -> CandelaError {
    match status {
        StatusCode::TOO_MANY_REQUESTS => CandelaError::RateLimitExceeded { retry_after_ms },
        StatusCode::NOT_FOUND => {
            CandelaError::not_found(format!("{capability}: {}", excerpt(body)))
        }
        _ => CandelaError::Http {
            status: status.as_u16(),
            msg: excerpt(body),
        },
    }
}
