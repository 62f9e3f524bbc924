use super::client::BinanceClient;
use super::endpoints;
use super::requests::{
    clamp_limit, require_symbol, AllOrdersRequest, CancelOrderRequest, CancelReplaceRequest,
    OrderRequest, QueryOrderRequest, SymbolParams, DEFAULT_LIMIT, MAX_LIMIT,
};
use super::types::{
    CancelReplaceResponse, CanceledOrder, Order, OrderAck, OrderFull, OrderReport, OrderRespType,
    OrderResult,
};
use crate::core::errors::ExchangeError;
use crate::core::kernel::{RestClient, Security};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::instrument;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct OpenOrdersParams<'a> {
    symbol: Option<&'a str>,
}

/// Order placement and management; every call is signed
impl<R: RestClient> BinanceClient<R> {
    /// Place an order and get the ACK response
    #[instrument(skip(self, order), fields(exchange = "binance", symbol = %order.symbol, side = ?order.side, order_type = ?order.order_type))]
    pub async fn new_order(&self, order: &OrderRequest) -> Result<OrderAck, ExchangeError> {
        self.place_order(endpoints::ORDER, order, OrderRespType::Ack)
            .await
    }

    /// Place an order and get the RESULT response
    #[instrument(skip(self, order), fields(exchange = "binance", symbol = %order.symbol, side = ?order.side, order_type = ?order.order_type))]
    pub async fn new_order_result(&self, order: &OrderRequest) -> Result<OrderResult, ExchangeError> {
        self.place_order(endpoints::ORDER, order, OrderRespType::Result)
            .await
    }

    /// Place an order and get the FULL response, fills included
    #[instrument(skip(self, order), fields(exchange = "binance", symbol = %order.symbol, side = ?order.side, order_type = ?order.order_type))]
    pub async fn new_order_full(&self, order: &OrderRequest) -> Result<OrderFull, ExchangeError> {
        self.place_order(endpoints::ORDER, order, OrderRespType::Full)
            .await
    }

    /// Validate an order on the exchange without sending it to the matching engine
    #[instrument(skip(self, order), fields(exchange = "binance", symbol = %order.symbol))]
    pub async fn test_order(&self, order: &OrderRequest) -> Result<(), ExchangeError> {
        let mut params = order.clone();
        params.validate()?;
        self.rest()
            .execute(Method::POST, endpoints::ORDER_TEST, Some(&params), Security::Signed)
            .await
            .map(|_| ())
    }

    async fn place_order<T: DeserializeOwned + Send>(
        &self,
        endpoint: &str,
        order: &OrderRequest,
        resp_type: OrderRespType,
    ) -> Result<T, ExchangeError> {
        let mut params = order.clone();
        params.validate()?;
        params.new_order_resp_type = Some(resp_type);
        self.rest()
            .execute_json(Method::POST, endpoint, Some(&params), Security::Signed)
            .await
    }

    /// Status of one order
    #[instrument(skip(self, request), fields(exchange = "binance", symbol = %request.symbol))]
    pub async fn query_order(&self, request: &QueryOrderRequest) -> Result<Order, ExchangeError> {
        request.validate()?;
        self.rest()
            .execute_json(Method::GET, endpoints::ORDER, Some(request), Security::Signed)
            .await
    }

    /// Cancel an active order
    #[instrument(skip(self, request), fields(exchange = "binance", symbol = %request.symbol))]
    pub async fn cancel_order(
        &self,
        request: &CancelOrderRequest,
    ) -> Result<OrderReport, ExchangeError> {
        request.validate()?;
        self.rest()
            .execute_json(Method::DELETE, endpoints::ORDER, Some(request), Security::Signed)
            .await
    }

    /// Cancel every open order and order list on a symbol
    #[instrument(skip(self), fields(exchange = "binance"))]
    pub async fn cancel_open_orders(
        &self,
        symbol: &str,
    ) -> Result<Vec<CanceledOrder>, ExchangeError> {
        require_symbol(symbol)?;
        self.rest()
            .execute_json(
                Method::DELETE,
                endpoints::OPEN_ORDERS,
                Some(&SymbolParams { symbol }),
                Security::Signed,
            )
            .await
    }

    /// Cancel an order and place a new one atomically
    #[instrument(skip(self, request), fields(exchange = "binance", symbol = %request.order.symbol))]
    pub async fn cancel_replace_order(
        &self,
        request: &CancelReplaceRequest,
    ) -> Result<CancelReplaceResponse, ExchangeError> {
        let mut params = request.clone();
        params.validate()?;
        params
            .order
            .new_order_resp_type
            .get_or_insert(OrderRespType::Ack);
        self.rest()
            .execute_json(
                Method::POST,
                endpoints::CANCEL_REPLACE,
                Some(&params),
                Security::Signed,
            )
            .await
    }

    /// Open orders, for one symbol or all of them
    #[instrument(skip(self), fields(exchange = "binance"))]
    pub async fn open_orders(&self, symbol: Option<&str>) -> Result<Vec<Order>, ExchangeError> {
        let params = OpenOrdersParams { symbol };
        self.rest()
            .execute_json(Method::GET, endpoints::OPEN_ORDERS, Some(&params), Security::Signed)
            .await
    }

    /// All orders on a symbol: active, canceled or filled
    #[instrument(skip(self, request), fields(exchange = "binance", symbol = %request.symbol))]
    pub async fn all_orders(&self, request: &AllOrdersRequest) -> Result<Vec<Order>, ExchangeError> {
        require_symbol(&request.symbol)?;
        let params = AllOrdersRequest {
            limit: clamp_limit(request.limit, DEFAULT_LIMIT, MAX_LIMIT),
            ..request.clone()
        };
        self.rest()
            .execute_json(Method::GET, endpoints::ALL_ORDERS, Some(&params), Security::Signed)
            .await
    }
}
