use crate::core::config::DEFAULT_RECV_WINDOW_MS;
use crate::core::errors::ExchangeError;
use crate::core::kernel::encoder::encode;
use crate::core::kernel::signer::Signer;
use async_trait::async_trait;
use dashmap::DashMap;
use reqwest::header::{HeaderMap, ACCEPT, CONTENT_TYPE};
use reqwest::{Client, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{instrument, trace, warn};

pub const API_KEY_HEADER: &str = "X-MBX-APIKEY";
const USED_WEIGHT_PREFIX: &str = "x-mbx-used-weight-";
const ORDER_COUNT_PREFIX: &str = "x-mbx-order-count-";
const RETRY_AFTER: &str = "retry-after";
const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Authentication an endpoint needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Security {
    /// No credentials
    Public,
    /// API key header only (user data stream and keyed market data)
    UserStream,
    /// API key header plus `timestamp`, `recvWindow` and `signature`
    Signed,
}

impl Security {
    pub const fn requires_api_key(self) -> bool {
        matches!(self, Self::UserStream | Self::Signed)
    }

    pub const fn requires_signature(self) -> bool {
        matches!(self, Self::Signed)
    }
}

/// Point-in-time copy of the usage headers seen so far.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RateLimitUsage {
    /// `X-Mbx-Used-Weight-<interval>` keyed by interval
    pub used_weight: HashMap<String, i64>,
    /// `X-Mbx-Order-Count-<interval>` keyed by interval
    pub order_count: HashMap<String, i64>,
    /// Last `Retry-After` value in seconds
    pub retry_after: i64,
}

/// REST client trait for making HTTP requests
///
/// This trait is the single seam between endpoint methods and the wire.
/// Implementations encode, optionally sign, dispatch, classify the status and
/// record usage headers. Success bodies are returned untouched.
#[async_trait]
pub trait RestClient: Send + Sync {
    /// Execute one request
    ///
    /// # Arguments
    /// * `method` - HTTP method; GET/DELETE carry params in the query string,
    ///   anything else in a form body
    /// * `endpoint` - The API endpoint path
    /// * `params` - Request parameters, if any
    /// * `security` - Which credentials the endpoint needs
    ///
    /// # Returns
    /// The raw response body of a 200 response
    async fn execute<P>(
        &self,
        method: Method,
        endpoint: &str,
        params: Option<&P>,
        security: Security,
    ) -> Result<Vec<u8>, ExchangeError>
    where
        P: Serialize + Sync + ?Sized;

    /// Execute a request and decode the body into `T`
    async fn execute_json<P, T>(
        &self,
        method: Method,
        endpoint: &str,
        params: Option<&P>,
        security: Security,
    ) -> Result<T, ExchangeError>
    where
        P: Serialize + Sync + ?Sized,
        T: DeserializeOwned + Send,
    {
        let body = self.execute(method, endpoint, params, security).await?;
        decode_body(&body)
    }

    /// Change the receive window used by subsequent signed requests
    fn set_window(&self, window_ms: u64);

    /// Snapshot of the rate-limit counters
    fn usage(&self) -> RateLimitUsage;
}

/// Decode a success body, keeping decode failures distinct from API errors.
pub fn decode_body<T: DeserializeOwned>(body: &[u8]) -> Result<T, ExchangeError> {
    serde_json::from_slice(body).map_err(|e| {
        ExchangeError::DeserializationError(format!(
            "Failed to decode response: {} (body: {})",
            e,
            String::from_utf8_lossy(body)
        ))
    })
}

#[derive(Deserialize)]
struct ApiErrorBody {
    code: i64,
    msg: String,
}

fn classify_error(status: StatusCode, body: &[u8]) -> ExchangeError {
    match serde_json::from_slice::<ApiErrorBody>(body) {
        Ok(err) => ExchangeError::ApiError {
            code: err.code,
            message: err.msg,
        },
        Err(_) => ExchangeError::MalformedErrorBody {
            status: status.as_u16(),
            body: String::from_utf8_lossy(body).into_owned(),
        },
    }
}

/// Usage counters shared by every clone of a client.
#[derive(Debug, Default)]
pub struct RateLimitState {
    used_weight: DashMap<String, i64>,
    order_count: DashMap<String, i64>,
    retry_after: AtomicI64,
}

impl RateLimitState {
    /// Record usage headers; last write wins per interval.
    pub fn record(&self, headers: &HeaderMap) {
        for (name, value) in headers {
            let name = name.as_str();
            let Some(value) = value.to_str().ok().and_then(|v| v.trim().parse::<i64>().ok())
            else {
                continue;
            };

            if let Some(interval) = name.strip_prefix(USED_WEIGHT_PREFIX) {
                self.used_weight.insert(interval.to_string(), value);
            } else if let Some(interval) = name.strip_prefix(ORDER_COUNT_PREFIX) {
                self.order_count.insert(interval.to_string(), value);
            } else if name == RETRY_AFTER {
                self.retry_after.store(value, Ordering::Relaxed);
            }
        }
    }

    pub fn used_weight(&self, interval: &str) -> Option<i64> {
        self.used_weight.get(interval).map(|v| *v)
    }

    pub fn order_count(&self, interval: &str) -> Option<i64> {
        self.order_count.get(interval).map(|v| *v)
    }

    pub fn retry_after(&self) -> i64 {
        self.retry_after.load(Ordering::Relaxed)
    }

    pub fn snapshot(&self) -> RateLimitUsage {
        RateLimitUsage {
            used_weight: self
                .used_weight
                .iter()
                .map(|e| (e.key().clone(), *e.value()))
                .collect(),
            order_count: self
                .order_count
                .iter()
                .map(|e| (e.key().clone(), *e.value()))
                .collect(),
            retry_after: self.retry_after(),
        }
    }
}

/// Configuration for the REST client
#[derive(Clone, Debug)]
pub struct RestClientConfig {
    /// Base URL for the API
    pub base_url: String,
    /// Exchange name for logging and tracing
    pub exchange_name: String,
    /// Request timeout in seconds
    pub timeout_seconds: u64,
    /// User agent string to include in requests
    pub user_agent: String,
    /// Receive window for signed requests in milliseconds
    pub recv_window_ms: u64,
    /// Refuse plain-http connections
    pub require_tls: bool,
    /// Speak HTTP/2 without ALPN negotiation
    pub http2_only: bool,
}

impl RestClientConfig {
    /// Create a new configuration
    ///
    /// # Arguments
    /// * `base_url` - Base URL for the API
    /// * `exchange_name` - Name of the exchange
    pub fn new(base_url: String, exchange_name: String) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            exchange_name,
            timeout_seconds: 30,
            user_agent: concat!("binance-api/", env!("CARGO_PKG_VERSION")).to_string(),
            recv_window_ms: DEFAULT_RECV_WINDOW_MS,
            require_tls: true,
            http2_only: false,
        }
    }

    /// Set the request timeout
    pub fn with_timeout(mut self, timeout_seconds: u64) -> Self {
        self.timeout_seconds = timeout_seconds;
        self
    }

    /// Set the user agent string
    pub fn with_user_agent(mut self, user_agent: String) -> Self {
        self.user_agent = user_agent;
        self
    }

    /// Set the receive window for signed requests
    pub fn with_recv_window(mut self, recv_window_ms: u64) -> Self {
        self.recv_window_ms = recv_window_ms;
        self
    }

    /// Allow or refuse plain-http base URLs
    pub fn with_require_tls(mut self, require_tls: bool) -> Self {
        self.require_tls = require_tls;
        self
    }

    /// Use HTTP/2 prior knowledge instead of HTTP/1.1
    pub fn with_http2(mut self, http2_only: bool) -> Self {
        self.http2_only = http2_only;
        self
    }
}

/// Builder for creating REST client instances
pub struct RestClientBuilder {
    config: RestClientConfig,
    signer: Option<Arc<dyn Signer>>,
    client: Option<Client>,
}

impl RestClientBuilder {
    /// Create a new builder with the given configuration
    pub fn new(config: RestClientConfig) -> Self {
        Self {
            config,
            signer: None,
            client: None,
        }
    }

    /// Set the signer for authenticated requests
    pub fn with_signer(mut self, signer: Arc<dyn Signer>) -> Self {
        self.signer = Some(signer);
        self
    }

    /// Use a caller-provided HTTP client instead of building one
    pub fn with_client(mut self, client: Client) -> Self {
        self.client = Some(client);
        self
    }

    /// Build the REST client
    ///
    /// # Returns
    /// A new `ReqwestRest` instance
    pub fn build(self) -> Result<ReqwestRest, ExchangeError> {
        let client = match self.client {
            Some(client) => client,
            None => {
                let mut builder = Client::builder()
                    .timeout(Duration::from_secs(self.config.timeout_seconds))
                    .user_agent(&self.config.user_agent)
                    .https_only(self.config.require_tls);
                if self.config.http2_only {
                    builder = builder.http2_prior_knowledge();
                }
                builder.build().map_err(|e| {
                    ExchangeError::ConfigError(crate::core::config::ConfigError::InvalidConfiguration(
                        format!("Failed to build HTTP client: {}", e),
                    ))
                })?
            }
        };

        Ok(ReqwestRest {
            client,
            recv_window: Arc::new(AtomicU64::new(self.config.recv_window_ms)),
            config: self.config,
            signer: self.signer,
            limits: Arc::new(RateLimitState::default()),
        })
    }
}

/// Implementation of `RestClient` using reqwest
///
/// Clones share the connection pool, signer, receive window and counters.
#[derive(Clone)]
pub struct ReqwestRest {
    client: Client,
    config: RestClientConfig,
    signer: Option<Arc<dyn Signer>>,
    recv_window: Arc<AtomicU64>,
    limits: Arc<RateLimitState>,
}

impl std::fmt::Debug for ReqwestRest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReqwestRest")
            .field("config", &self.config)
            .field("has_signer", &self.signer.is_some())
            .field("recv_window", &self.recv_window.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

impl ReqwestRest {
    /// Shared usage counters
    pub fn rate_limits(&self) -> &RateLimitState {
        &self.limits
    }

    /// Last `X-Mbx-Used-Weight-<interval>` value
    pub fn used_weight(&self, interval: &str) -> Option<i64> {
        self.limits.used_weight(interval)
    }

    /// Last `X-Mbx-Order-Count-<interval>` value
    pub fn order_count(&self, interval: &str) -> Option<i64> {
        self.limits.order_count(interval)
    }

    /// Last `Retry-After` value in seconds
    pub fn retry_after(&self) -> i64 {
        self.limits.retry_after()
    }

    pub fn config(&self) -> &RestClientConfig {
        &self.config
    }

    /// Whether signed and user-stream endpoints can be called
    pub fn has_signer(&self) -> bool {
        self.signer.is_some()
    }

    fn signer(&self) -> Result<&dyn Signer, ExchangeError> {
        self.signer.as_deref().ok_or_else(|| {
            ExchangeError::AuthError("Endpoint requires an API key but no credentials were configured".to_string())
        })
    }

    fn carries_body(method: &Method) -> bool {
        !matches!(*method, Method::GET | Method::DELETE | Method::HEAD)
    }
}

#[async_trait]
impl RestClient for ReqwestRest {
    #[instrument(skip(self, params), fields(exchange = %self.config.exchange_name, method = %method, endpoint = %endpoint))]
    async fn execute<P>(
        &self,
        method: Method,
        endpoint: &str,
        params: Option<&P>,
        security: Security,
    ) -> Result<Vec<u8>, ExchangeError>
    where
        P: Serialize + Sync + ?Sized,
    {
        let mut payload = match params {
            Some(params) => encode(params)?,
            None => String::new(),
        };

        let signer = if security.requires_api_key() {
            Some(self.signer()?)
        } else {
            None
        };

        if let (Some(signer), true) = (signer, security.requires_signature()) {
            let timestamp = chrono::Utc::now().timestamp_millis();
            payload = signer.sign_request(
                &payload,
                timestamp,
                self.recv_window.load(Ordering::Relaxed),
            )?;
        }

        let body_request = Self::carries_body(&method);
        // query is appended verbatim so the server sees exactly the signed bytes
        let url = if body_request || payload.is_empty() {
            format!("{}{}", self.config.base_url, endpoint)
        } else {
            format!("{}{}?{}", self.config.base_url, endpoint, payload)
        };

        let mut request = self
            .client
            .request(method, &url)
            .header(ACCEPT, "application/json");

        if let Some(signer) = signer {
            request = request.header(API_KEY_HEADER, signer.api_key());
        }

        if body_request && !payload.is_empty() {
            request = request.header(CONTENT_TYPE, FORM_CONTENT_TYPE).body(payload);
        }

        let response = request
            .send()
            .await
            .map_err(|e| ExchangeError::NetworkError(format!("Request failed: {}", e)))?;

        self.limits.record(response.headers());

        let status = response.status();
        let body = response.bytes().await.map_err(|e| {
            ExchangeError::NetworkError(format!("Failed to read response body: {}", e))
        })?;

        trace!(status = %status, bytes = body.len(), "Response received");

        if status != StatusCode::OK {
            let err = classify_error(status, &body);
            warn!(status = %status, error = %err, "Request rejected");
            return Err(err);
        }

        Ok(body.to_vec())
    }

    fn set_window(&self, window_ms: u64) {
        self.recv_window.store(window_ms, Ordering::Relaxed);
    }

    fn usage(&self) -> RateLimitUsage {
        self.limits.snapshot()
    }
}
