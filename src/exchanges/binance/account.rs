use super::client::BinanceClient;
use super::endpoints;
use super::requests::{
    clamp_limit, require_listen_key, require_symbol, AccountTradesRequest, ListenKeyParams,
    PreventedMatchesRequest, DEFAULT_LIMIT, MAX_LIMIT,
};
use super::types::{AccountInfo, AccountTrade, ListenKey, OrderRateLimit, PreventedMatch};
use crate::core::errors::{ExchangeError, ValidationError};
use crate::core::kernel::{RestClient, Security};
use reqwest::Method;
use tracing::instrument;

/// Account information and user data stream keys
impl<R: RestClient> BinanceClient<R> {
    /// Balances and permissions
    #[instrument(skip(self), fields(exchange = "binance"))]
    pub async fn account(&self) -> Result<AccountInfo, ExchangeError> {
        self.rest()
            .execute_json(Method::GET, endpoints::ACCOUNT, None::<&()>, Security::Signed)
            .await
    }

    /// Trades of this account on one symbol
    #[instrument(skip(self, request), fields(exchange = "binance", symbol = %request.symbol))]
    pub async fn account_trades(
        &self,
        request: &AccountTradesRequest,
    ) -> Result<Vec<AccountTrade>, ExchangeError> {
        require_symbol(&request.symbol)?;
        let params = AccountTradesRequest {
            limit: clamp_limit(request.limit, DEFAULT_LIMIT, MAX_LIMIT),
            ..request.clone()
        };
        self.rest()
            .execute_json(Method::GET, endpoints::MY_TRADES, Some(&params), Security::Signed)
            .await
    }

    /// Current unfilled order count for every interval
    #[instrument(skip(self), fields(exchange = "binance"))]
    pub async fn order_rate_limit(&self) -> Result<Vec<OrderRateLimit>, ExchangeError> {
        self.rest()
            .execute_json(
                Method::GET,
                endpoints::RATE_LIMIT_ORDER,
                None::<&()>,
                Security::Signed,
            )
            .await
    }

    /// Orders that expired because of self-trade prevention
    #[instrument(skip(self, request), fields(exchange = "binance", symbol = %request.symbol))]
    pub async fn prevented_matches(
        &self,
        request: &PreventedMatchesRequest,
    ) -> Result<Vec<PreventedMatch>, ExchangeError> {
        require_symbol(&request.symbol)?;
        if request.order_id.is_none() && request.prevented_match_id.is_none() {
            return Err(ValidationError::EmptyOrderId.into());
        }
        let params = PreventedMatchesRequest {
            limit: clamp_limit(request.limit, DEFAULT_LIMIT, MAX_LIMIT),
            ..request.clone()
        };
        self.rest()
            .execute_json(
                Method::GET,
                endpoints::MY_PREVENTED_MATCHES,
                Some(&params),
                Security::Signed,
            )
            .await
    }

    /// Start a user data stream; the key stays valid for 60 minutes
    #[instrument(skip(self), fields(exchange = "binance"))]
    pub async fn create_listen_key(&self) -> Result<String, ExchangeError> {
        let key: ListenKey = self
            .rest()
            .execute_json(
                Method::POST,
                endpoints::USER_DATA_STREAM,
                None::<&()>,
                Security::UserStream,
            )
            .await?;
        Ok(key.listen_key)
    }

    /// Extend a listen key by another 60 minutes
    #[instrument(skip(self, listen_key), fields(exchange = "binance"))]
    pub async fn keep_alive_listen_key(&self, listen_key: &str) -> Result<(), ExchangeError> {
        self.listen_key_call(Method::PUT, listen_key).await
    }

    /// Close a user data stream
    #[instrument(skip(self, listen_key), fields(exchange = "binance"))]
    pub async fn close_listen_key(&self, listen_key: &str) -> Result<(), ExchangeError> {
        self.listen_key_call(Method::DELETE, listen_key).await
    }

    async fn listen_key_call(&self, method: Method, listen_key: &str) -> Result<(), ExchangeError> {
        require_listen_key(listen_key)?;
        self.rest()
            .execute(
                method,
                endpoints::USER_DATA_STREAM,
                Some(&ListenKeyParams { listen_key }),
                Security::UserStream,
            )
            .await
            .map(|_| ())
    }
}
