//! Intelligence source adapters plus the shared cache and throttle they run through.

use std::{sync::Arc, time::Duration};

use reqwest::StatusCode;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

use crate::{
    config::{AppConfig, SourceConfig, SourceId},
    core::error::FalconError,
};

pub mod abuse;
pub mod breach;
pub mod cache;
pub mod email_rep;
pub mod geolocation;
pub mod host_search;
pub mod malware;
pub mod rate_limiter;
pub mod username;
pub mod whois;

use cache::ResultCache;
use rate_limiter::RateLimiter;

/// Outcome of one adapter call. Built once and never mutated.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceResult<T> {
    pub source: SourceId,
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
    pub cached: bool,
}

impl<T> SourceResult<T> {
    pub fn ok(source: SourceId, data: T, cached: bool) -> Self {
        Self {
            source,
            success: true,
            data: Some(data),
            error: None,
            cached,
        }
    }

    pub fn failed(source: SourceId, error: impl Into<String>) -> Self {
        Self {
            source,
            success: false,
            data: None,
            error: Some(error.into()),
            cached: false,
        }
    }

    pub fn into_data(self) -> Option<T> {
        self.data
    }
}

/// HTTP plumbing shared by every adapter: credentials, cache, throttle and deadline.
pub struct SourceClient {
    http: reqwest::Client,
    config: AppConfig,
    cache: Arc<ResultCache>,
    limiter: Arc<RateLimiter>,
    deadline: Duration,
}

impl SourceClient {
    pub fn new(
        config: AppConfig,
        cache: Arc<ResultCache>,
        limiter: Arc<RateLimiter>,
    ) -> Result<Self, FalconError> {
        let deadline = config.timeout();
        let http = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(deadline)
            .redirect(reqwest::redirect::Policy::limited(4))
            .build()
            .map_err(FalconError::from)?;
        Ok(Self {
            http,
            config,
            cache,
            limiter,
            deadline,
        })
    }

    /// Run one source call through cache, throttle, fetch and normalization.
    ///
    /// Soft failures (missing credential, transport, non-2xx, deadline) come
    /// back as `Ok` with `success=false`. Only a rate-limit breach is returned
    /// as `Err`, so the caller can abandon the live scan.
    pub async fn query<T, B, N>(
        &self,
        source: SourceId,
        params: &[(&str, &str)],
        build: B,
        normalize: N,
    ) -> Result<SourceResult<T>, FalconError>
    where
        T: Serialize + DeserializeOwned,
        B: FnOnce(&reqwest::Client, &SourceConfig) -> Result<reqwest::RequestBuilder, FalconError>,
        N: FnOnce(&Value) -> T,
    {
        let cfg = self.config.source(source);
        if source.requires_credential() && cfg.credential().is_none() {
            tracing::debug!(source = source.key(), "credential not configured");
            return Ok(SourceResult::failed(
                source,
                format!("{} API key not configured", source.label()),
            ));
        }

        let key = ResultCache::generate_key(source.key(), params);
        if self.config.caching_enabled {
            if let Some(hit) = self.cache.get(&key) {
                match serde_json::from_value::<T>(hit) {
                    Ok(data) => {
                        tracing::debug!(source = source.key(), "cache hit");
                        return Ok(SourceResult::ok(source, data, true));
                    }
                    Err(err) => tracing::warn!(source = source.key(), "unreadable cache entry: {}", err),
                }
            }
        }

        let request = match build(&self.http, &cfg) {
            Ok(request) => request,
            Err(err) => return Ok(SourceResult::failed(source, err.to_string())),
        };

        // The deadline covers the throttle wait as well as the exchange.
        let exchange = async {
            self.limiter
                .acquire(source.key(), Some(cfg.min_interval()))
                .await?;
            send_and_decode(source, request).await
        };
        let payload = match tokio::time::timeout(self.deadline, exchange).await {
            Ok(Ok(payload)) => payload,
            Ok(Err(err)) if err.is_fatal_for_live_scan() => return Err(err),
            Ok(Err(err)) => {
                tracing::warn!("provider {} error: {}", source.label(), err);
                return Ok(SourceResult::failed(source, err.to_string()));
            }
            Err(_) => {
                tracing::warn!("provider {} missed its {:?} deadline", source.label(), self.deadline);
                return Ok(SourceResult::failed(source, FalconError::Timeout.to_string()));
            }
        };

        let data = normalize(&payload);
        if self.config.caching_enabled {
            match serde_json::to_value(&data) {
                Ok(value) => self.cache.set(&key, value),
                Err(err) => tracing::warn!(source = source.key(), "not caching result: {}", err),
            }
        }
        Ok(SourceResult::ok(source, data, false))
    }
}

async fn send_and_decode(
    source: SourceId,
    request: reqwest::RequestBuilder,
) -> Result<Value, FalconError> {
    let resp = request.send().await?;
    let status = resp.status();
    if status == StatusCode::NOT_FOUND && source.empty_on_not_found() {
        return Ok(Value::Array(Vec::new()));
    }
    if !status.is_success() {
        return Err(FalconError::Http(format!(
            "HTTP {}: {}",
            status.as_u16(),
            status.canonical_reason().unwrap_or("error")
        )));
    }
    let text = resp.text().await?;
    if text.trim().is_empty() {
        return Ok(Value::Null);
    }
    Ok(serde_json::from_str::<Value>(&text)?)
}

impl SourceId {
    /// Sources that answer 404 for "nothing on record" rather than for errors.
    fn empty_on_not_found(&self) -> bool {
        matches!(self, SourceId::HaveIBeenPwned)
    }
}

/// `base` with each segment appended and percent-encoded.
pub(crate) fn endpoint(base: &str, segments: &[&str]) -> Result<reqwest::Url, FalconError> {
    let mut url = reqwest::Url::parse(base.trim_end_matches('/'))
        .map_err(|e| FalconError::Config(format!("bad base url {base}: {e}")))?;
    {
        let mut path = url
            .path_segments_mut()
            .map_err(|_| FalconError::Config(format!("base url cannot take a path: {base}")))?;
        path.pop_if_empty();
        for segment in segments {
            path.push(segment);
        }
    }
    Ok(url)
}

/// String at a JSON pointer; blank strings count as missing.
pub(crate) fn text_at(value: &Value, pointer: &str) -> Option<String> {
    match value.pointer(pointer)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Non-negative integer at a JSON pointer, accepting numeric strings.
pub(crate) fn number_at(value: &Value, pointer: &str) -> Option<u64> {
    match value.pointer(pointer)? {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

pub(crate) fn flag_at(value: &Value, pointer: &str) -> Option<bool> {
    match value.pointer(pointer)? {
        Value::Bool(b) => Some(*b),
        Value::String(s) => match s.trim().to_lowercase().as_str() {
            "true" => Some(true),
            "false" => Some(false),
            _ => None,
        },
        _ => None,
    }
}
