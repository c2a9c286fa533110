use reqwest::StatusCode;
use reqwest::header::{COOKIE, HeaderMap, HeaderValue, RETRY_AFTER};
use serde_json::Value;
use url::Url;

use quarry_core::QuarryError;

use crate::config::YahooConfig;

/// Shared HTTP client for every Yahoo source. Immutable once built.
#[derive(Debug, Clone)]
pub struct YahooClient {
    http: reqwest::Client,
    base: Url,
    crumb: Option<String>,
}

impl YahooClient {
    /// Build a client from configuration.
    ///
    /// # Errors
    /// Returns `InvalidConfig` for an unparseable base URL or cookie, or when the
    /// underlying HTTP client cannot be constructed.
    pub fn new(config: &YahooConfig) -> Result<Self, QuarryError> {
        let base = Url::parse(&config.base_url)
            .map_err(|e| QuarryError::InvalidConfig(format!("base_url: {e}")))?;
        let mut headers = HeaderMap::new();
        if let Some(cookie) = &config.cookie {
            let value = HeaderValue::from_str(cookie)
                .map_err(|e| QuarryError::InvalidConfig(format!("cookie: {e}")))?;
            headers.insert(COOKIE, value);
        }
        let http = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .default_headers(headers)
            .timeout(config.timeout)
            .build()
            .map_err(|e| QuarryError::InvalidConfig(format!("http client: {e}")))?;
        Ok(Self {
            http,
            base,
            crumb: config.crumb.clone(),
        })
    }

    /// GET `path` with `query` and decode the body as JSON.
    ///
    /// `source` names the calling source in errors. Status mapping: 401/403 become
    /// `Unauthorized`, 404 `NotFound`, 429 `RateLimited`, any other non-success status
    /// `Connector`.
    pub(crate) async fn get_json(
        &self,
        source: &str,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<Value, QuarryError> {
        let mut url = self
            .base
            .join(path)
            .map_err(|e| QuarryError::InvalidConfig(format!("url for {path}: {e}")))?;
        {
            let mut pairs = url.query_pairs_mut();
            for (k, v) in query {
                pairs.append_pair(k, v);
            }
            if let Some(crumb) = &self.crumb {
                pairs.append_pair("crumb", crumb);
            }
        }

        #[cfg(feature = "tracing")]
        tracing::debug!(source, path, "yahoo request");

        let resp = self.http.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                QuarryError::provider_timeout(source)
            } else {
                QuarryError::connector(source, format!("transport: {e}"))
            }
        })?;

        let status = resp.status();
        let retry_after_ms = resp
            .headers()
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.trim().parse::<u64>().ok())
            .map(|secs| secs.saturating_mul(1000));
        let body = resp
            .text()
            .await
            .map_err(|e| QuarryError::connector(source, format!("body: {e}")))?;

        match status {
            s if s.is_success() => serde_json::from_str(&body)
                .map_err(|e| QuarryError::Data(format!("{source}: invalid json: {e}"))),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(QuarryError::unauthorized(
                source,
                format!("status {status}"),
            )),
            StatusCode::NOT_FOUND => Err(QuarryError::not_found(format!("{source} {path}"))),
            StatusCode::TOO_MANY_REQUESTS => Err(QuarryError::rate_limited(source, retry_after_ms)),
            _ => Err(QuarryError::connector(source, format!("status {status}"))),
        }
    }
}

/// Unwrap `{<envelope>: {"result": [first], "error": ...}}`.
///
/// Returns `Ok(None)` when the provider reports the symbol as unknown (`Not Found`
/// error code or an empty/null result list).
pub(crate) fn first_result<'a>(
    source: &str,
    body: &'a Value,
    envelope: &str,
) -> Result<Option<&'a Value>, QuarryError> {
    let Some(env) = body.get(envelope) else {
        return Err(QuarryError::Data(format!("{source}: missing `{envelope}`")));
    };
    if let Some(err) = env.get("error").filter(|e| !e.is_null()) {
        let code = err.get("code").and_then(Value::as_str).unwrap_or_default();
        if code.eq_ignore_ascii_case("not found") {
            return Ok(None);
        }
        let description = err
            .get("description")
            .and_then(Value::as_str)
            .unwrap_or(code);
        return Err(QuarryError::connector(source, description.to_string()));
    }
    Ok(env
        .get("result")
        .and_then(Value::as_array)
        .and_then(|r| r.first()))
}
