use super::client::BinanceClient;
use super::websocket::BinanceWsClient;
use crate::core::config::ClientConfig;
use crate::core::errors::ExchangeError;
use crate::core::kernel::{HmacSigner, ReqwestRest, RestClientBuilder, RestClientConfig};
use std::sync::Arc;

/// Create a REST client from `config`
///
/// Signed and user-stream calls fail with `AuthError` when the config has no
/// credentials.
pub fn build_client(config: &ClientConfig) -> Result<BinanceClient<ReqwestRest>, ExchangeError> {
    let rest_config = RestClientConfig::new(config.rest_url(), "binance".to_string())
        .with_timeout(config.timeout_seconds)
        .with_recv_window(config.recv_window_ms);

    let mut rest_builder = RestClientBuilder::new(rest_config);

    if config.has_credentials() {
        let signer = Arc::new(HmacSigner::new(
            config.api_key().to_string(),
            config.secret_key().to_string(),
        ));
        rest_builder = rest_builder.with_signer(signer);
    }

    Ok(BinanceClient::new(rest_builder.build()?))
}

/// Create a stream client for the configured stream endpoint
pub fn build_ws_client(config: &ClientConfig) -> BinanceWsClient {
    BinanceWsClient::from_config(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::{DEFAULT_STREAM_URL, TESTNET_REST_URL, TESTNET_STREAM_URL};

    #[test]
    fn test_build_client_uses_config() {
        let config = ClientConfig::new("key".to_string(), "secret".to_string())
            .testnet(true)
            .recv_window(10_000)
            .timeout(5);
        let client = build_client(&config).unwrap();

        assert_eq!(client.rest().config().base_url, TESTNET_REST_URL);
        assert_eq!(client.rest().config().recv_window_ms, 10_000);
        assert_eq!(client.rest().config().timeout_seconds, 5);
        assert!(client.rest().has_signer());
    }

    #[test]
    fn test_build_read_only_client() {
        let client = build_client(&ClientConfig::read_only()).unwrap();
        assert!(!client.rest().has_signer());
        assert_eq!(client.usage().retry_after, 0);
    }

    #[test]
    fn test_build_ws_client() {
        assert_eq!(
            build_ws_client(&ClientConfig::read_only()).base_url(),
            DEFAULT_STREAM_URL
        );
        assert_eq!(
            build_ws_client(&ClientConfig::read_only().testnet(true)).base_url(),
            TESTNET_STREAM_URL
        );
    }
}
