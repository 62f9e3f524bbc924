use super::client::BinanceClient;
use super::endpoints;
use super::requests::{
    clamp_limit, AllOcoRequest, CancelOcoRequest, NewOcoRequest, QueryOcoRequest, DEFAULT_LIMIT,
    MAX_LIMIT,
};
use super::types::OcoOrder;
use crate::core::errors::ExchangeError;
use crate::core::kernel::{RestClient, Security};
use reqwest::Method;
use tracing::instrument;

/// One-cancels-the-other order lists
impl<R: RestClient> BinanceClient<R> {
    #[instrument(skip(self, request), fields(exchange = "binance", symbol = %request.symbol, side = ?request.side))]
    pub async fn new_oco(&self, request: &NewOcoRequest) -> Result<OcoOrder, ExchangeError> {
        request.validate()?;
        self.rest()
            .execute_json(Method::POST, endpoints::OCO_ORDER, Some(request), Security::Signed)
            .await
    }

    #[instrument(skip(self, request), fields(exchange = "binance", symbol = %request.symbol))]
    pub async fn cancel_oco(&self, request: &CancelOcoRequest) -> Result<OcoOrder, ExchangeError> {
        request.validate()?;
        self.rest()
            .execute_json(Method::DELETE, endpoints::ORDER_LIST, Some(request), Security::Signed)
            .await
    }

    #[instrument(skip(self, request), fields(exchange = "binance", order_list_id = ?request.order_list_id))]
    pub async fn query_oco(&self, request: &QueryOcoRequest) -> Result<OcoOrder, ExchangeError> {
        request.validate()?;
        self.rest()
            .execute_json(Method::GET, endpoints::ORDER_LIST, Some(request), Security::Signed)
            .await
    }

    #[instrument(skip(self, request), fields(exchange = "binance"))]
    pub async fn all_oco(&self, request: &AllOcoRequest) -> Result<Vec<OcoOrder>, ExchangeError> {
        let params = AllOcoRequest {
            limit: clamp_limit(request.limit, DEFAULT_LIMIT, MAX_LIMIT),
            ..request.clone()
        };
        self.rest()
            .execute_json(Method::GET, endpoints::ALL_ORDER_LIST, Some(&params), Security::Signed)
            .await
    }

    #[instrument(skip(self), fields(exchange = "binance"))]
    pub async fn open_oco(&self) -> Result<Vec<OcoOrder>, ExchangeError> {
        self.rest()
            .execute_json(Method::GET, endpoints::OPEN_ORDER_LIST, None::<&()>, Security::Signed)
            .await
    }
}
