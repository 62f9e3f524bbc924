use super::endpoints;
use super::requests::ExchangeInfoRequest;
use super::types::{ExchangeInfo, ServerTime};
use crate::core::errors::ExchangeError;
use crate::core::kernel::{RateLimitUsage, ReqwestRest, RestClient, Security};
use reqwest::Method;
use tracing::instrument;

/// REST client for the Binance spot API
///
/// Endpoint groups live in `market_data`, `trading`, `oco` and `account`;
/// each method validates its request, then goes through the transport.
#[derive(Debug, Clone)]
pub struct BinanceClient<R: RestClient = ReqwestRest> {
    rest: R,
}

impl<R: RestClient> BinanceClient<R> {
    pub fn new(rest: R) -> Self {
        Self { rest }
    }

    /// Underlying transport
    pub fn rest(&self) -> &R {
        &self.rest
    }

    /// Change `recvWindow` for subsequent signed calls
    pub fn set_window(&self, window_ms: u64) {
        self.rest.set_window(window_ms);
    }

    /// Rate-limit headers seen so far
    pub fn usage(&self) -> RateLimitUsage {
        self.rest.usage()
    }

    /// Test connectivity
    #[instrument(skip(self), fields(exchange = "binance"))]
    pub async fn ping(&self) -> Result<(), ExchangeError> {
        self.rest
            .execute(Method::GET, endpoints::PING, None::<&()>, Security::Public)
            .await
            .map(|_| ())
    }

    /// Current server time in milliseconds
    #[instrument(skip(self), fields(exchange = "binance"))]
    pub async fn server_time(&self) -> Result<i64, ExchangeError> {
        let time: ServerTime = self
            .rest
            .execute_json(Method::GET, endpoints::TIME, None::<&()>, Security::Public)
            .await?;
        Ok(time.server_time)
    }

    /// Trading rules and symbol information
    ///
    /// # Arguments
    /// * `request` - Optional symbol filter; the default request returns every symbol
    #[instrument(skip(self, request), fields(exchange = "binance"))]
    pub async fn exchange_info(
        &self,
        request: &ExchangeInfoRequest,
    ) -> Result<ExchangeInfo, ExchangeError> {
        self.rest
            .execute_json(
                Method::GET,
                endpoints::EXCHANGE_INFO,
                Some(request),
                Security::Public,
            )
            .await
    }
}
