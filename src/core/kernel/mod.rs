/// Transport kernel shared by every endpoint group
///
/// The kernel knows how to encode parameters, sign them, move bytes over
/// HTTP or a WebSocket and classify failures. It knows nothing about
/// individual endpoints or payload schemas.
///
/// # Architecture
///
/// ## Transport Layer
/// - `RestClient`: HTTP seam used by every endpoint method
/// - `WsConnection`: one socket, one stream, one codec
///
/// ## Authentication
/// - `Signer`: pluggable signature interface
/// - `HmacSigner`: HMAC-SHA256 over the exact transmitted parameter string
///
/// ## Message Handling
/// - `encode`: sorted form encoding of request structs
/// - `WsCodec`: typed decoding of data frames
///
/// # Usage
///
/// ## REST
/// ```rust,no_run
/// use binance_api::core::kernel::*;
/// use std::sync::Arc;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let rest_config = RestClientConfig::new("https://api.binance.com".to_string(), "binance".to_string());
/// let signer = Arc::new(HmacSigner::new("api_key".to_string(), "secret_key".to_string()));
/// let rest = RestClientBuilder::new(rest_config)
///     .with_signer(signer)
///     .build()?;
///
/// let body = rest
///     .execute(reqwest::Method::GET, "/api/v3/time", None::<&()>, Security::Public)
///     .await?;
/// # let _ = body;
/// # Ok(())
/// # }
/// ```
///
/// ## WebSocket
/// ```rust,no_run
/// use binance_api::core::kernel::*;
///
/// #[derive(serde::Deserialize)]
/// struct Trade {
///     #[serde(rename = "p")]
///     price: String,
/// }
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let ws = WsConnection::connect(
///     "wss://stream.binance.com:9443/ws/btcusdt@trade",
///     JsonCodec::<Trade>::new(),
///     &WsConfig::default(),
/// )
/// .await?;
///
/// let mut trades = ws.stream()?;
/// while let Some(trade) = trades.recv().await {
///     println!("{}", trade.price);
/// }
/// # Ok(())
/// # }
/// ```
pub mod codec;
pub mod encoder;
pub mod rest;
pub mod signer;
pub mod ws;

// Re-export key types for convenience
pub use codec::{JsonCodec, WsCodec};
pub use encoder::{encode, json_array};
pub use rest::{
    decode_body, RateLimitState, RateLimitUsage, ReqwestRest, RestClient, RestClientBuilder,
    RestClientConfig, Security, API_KEY_HEADER,
};
pub use signer::{HmacSigner, Signer};
pub use ws::{WsConfig, WsConnection};
