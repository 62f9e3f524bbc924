//! Request parameter types.
//!
//! Every struct serializes through [`crate::core::kernel::encode`]: `None`
//! fields and empty strings never reach the wire, keys are sorted at encode
//! time so declaration order does not matter.

use super::types::{
    CancelReplaceMode, KlineInterval, OrderRespType, OrderSide, OrderType,
    SelfTradePreventionMode, TickerType, TimeInForce,
};
use crate::core::errors::ValidationError;
use crate::core::kernel::json_array;
use rust_decimal::Decimal;
use serde::Serialize;

pub const DEFAULT_DEPTH_LIMIT: u32 = 100;
pub const MAX_DEPTH_LIMIT: u32 = 5000;
pub const DEFAULT_LIMIT: u32 = 500;
pub const MAX_LIMIT: u32 = 1000;
pub const MIN_STRATEGY_TYPE: i64 = 1_000_000;

/// Replace an out-of-range limit with the endpoint default; `None` stays absent.
pub fn clamp_limit(limit: Option<u32>, default: u32, max: u32) -> Option<u32> {
    limit.map(|l| if l == 0 || l > max { default } else { l })
}

/// Accepts `1m`-`59m`, `1h`-`23h` and `1d`-`7d`.
pub fn validate_window_size(window: &str) -> Result<(), ValidationError> {
    let invalid = || ValidationError::InvalidTickerWindow(window.to_string());

    if window.len() < 2 || !window.is_ascii() {
        return Err(invalid());
    }
    let (amount, unit) = window.split_at(window.len() - 1);
    if amount.starts_with('0') || amount.starts_with('+') {
        return Err(invalid());
    }
    let amount: u32 = amount.parse().map_err(|_| invalid())?;

    let max = match unit {
        "m" => 59,
        "h" => 23,
        "d" => 7,
        _ => return Err(invalid()),
    };

    if (1..=max).contains(&amount) {
        Ok(())
    } else {
        Err(invalid())
    }
}

pub(crate) fn require_symbol(symbol: &str) -> Result<(), ValidationError> {
    if symbol.is_empty() {
        Err(ValidationError::EmptySymbol)
    } else {
        Ok(())
    }
}

// Market data

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExchangeInfoRequest {
    pub symbol: Option<String>,
    #[serde(serialize_with = "json_array", skip_serializing_if = "Vec::is_empty")]
    pub symbols: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DepthRequest {
    pub symbol: String,
    pub limit: Option<u32>,
}

impl DepthRequest {
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            limit: None,
        }
    }

    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TradesRequest {
    pub symbol: String,
    pub limit: Option<u32>,
}

impl TradesRequest {
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            limit: None,
        }
    }

    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoricalTradesRequest {
    pub symbol: String,
    pub limit: Option<u32>,
    /// Trade id to fetch from, inclusive
    pub from_id: Option<i64>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AggTradesRequest {
    pub symbol: String,
    pub from_id: Option<i64>,
    pub start_time: Option<i64>,
    pub end_time: Option<i64>,
    pub limit: Option<u32>,
}

impl AggTradesRequest {
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            from_id: None,
            start_time: None,
            end_time: None,
            limit: None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KlinesRequest {
    pub symbol: String,
    pub interval: KlineInterval,
    pub start_time: Option<i64>,
    pub end_time: Option<i64>,
    pub time_zone: Option<String>,
    pub limit: Option<u32>,
}

impl KlinesRequest {
    pub fn new(symbol: impl Into<String>, interval: KlineInterval) -> Self {
        Self {
            symbol: symbol.into(),
            interval,
            start_time: None,
            end_time: None,
            time_zone: None,
            limit: None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct SymbolParams<'a> {
    pub symbol: &'a str,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct TickerParams<'a> {
    pub symbol: Option<&'a str>,
    #[serde(serialize_with = "json_array", skip_serializing_if = "Vec::is_empty")]
    pub symbols: Vec<String>,
    pub window_size: Option<&'a str>,
    #[serde(rename = "type")]
    pub ticker_type: Option<TickerType>,
}

// Trading

/// Parameters of a new order.
///
/// Which optional fields are required depends on `order_type`; the endpoint
/// methods check them before anything is sent.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderRequest {
    pub symbol: String,
    pub side: OrderSide,
    #[serde(rename = "type")]
    pub order_type: OrderType,
    pub time_in_force: Option<TimeInForce>,
    pub quantity: Option<Decimal>,
    pub quote_order_qty: Option<Decimal>,
    pub price: Option<Decimal>,
    pub new_client_order_id: Option<String>,
    pub strategy_id: Option<i64>,
    pub strategy_type: Option<i64>,
    pub stop_price: Option<Decimal>,
    pub trailing_delta: Option<i64>,
    pub iceberg_qty: Option<Decimal>,
    pub new_order_resp_type: Option<OrderRespType>,
    pub self_trade_prevention_mode: Option<SelfTradePreventionMode>,
}

impl OrderRequest {
    pub fn new(symbol: impl Into<String>, side: OrderSide, order_type: OrderType) -> Self {
        Self {
            symbol: symbol.into(),
            side,
            order_type,
            time_in_force: None,
            quantity: None,
            quote_order_qty: None,
            price: None,
            new_client_order_id: None,
            strategy_id: None,
            strategy_type: None,
            stop_price: None,
            trailing_delta: None,
            iceberg_qty: None,
            new_order_resp_type: None,
            self_trade_prevention_mode: None,
        }
    }

    /// Limit order; time in force defaults to GTC when sent
    pub fn limit(
        symbol: impl Into<String>,
        side: OrderSide,
        quantity: Decimal,
        price: Decimal,
    ) -> Self {
        Self::new(symbol, side, OrderType::Limit)
            .with_quantity(quantity)
            .with_price(price)
    }

    /// Market order; set either a base quantity or a quote quantity
    pub fn market(symbol: impl Into<String>, side: OrderSide) -> Self {
        Self::new(symbol, side, OrderType::Market)
    }

    pub fn with_quantity(mut self, quantity: Decimal) -> Self {
        self.quantity = Some(quantity);
        self
    }

    pub fn with_quote_order_qty(mut self, quote_order_qty: Decimal) -> Self {
        self.quote_order_qty = Some(quote_order_qty);
        self
    }

    pub fn with_price(mut self, price: Decimal) -> Self {
        self.price = Some(price);
        self
    }

    pub fn with_stop_price(mut self, stop_price: Decimal) -> Self {
        self.stop_price = Some(stop_price);
        self
    }

    pub fn with_trailing_delta(mut self, trailing_delta: i64) -> Self {
        self.trailing_delta = Some(trailing_delta);
        self
    }

    pub fn with_time_in_force(mut self, time_in_force: TimeInForce) -> Self {
        self.time_in_force = Some(time_in_force);
        self
    }

    pub fn with_client_order_id(mut self, id: impl Into<String>) -> Self {
        self.new_client_order_id = Some(id.into());
        self
    }

    pub fn with_strategy(mut self, strategy_id: i64, strategy_type: i64) -> Self {
        self.strategy_id = Some(strategy_id);
        self.strategy_type = Some(strategy_type);
        self
    }

    pub fn with_self_trade_prevention(mut self, mode: SelfTradePreventionMode) -> Self {
        self.self_trade_prevention_mode = Some(mode);
        self
    }

    /// Check the fields the order type needs and normalize time in force.
    pub fn validate(&mut self) -> Result<(), ValidationError> {
        require_symbol(&self.symbol)?;

        if let Some(strategy_type) = self.strategy_type {
            if strategy_type < MIN_STRATEGY_TYPE {
                return Err(ValidationError::MinStrategyType(strategy_type));
            }
        }

        let has_stop = self.stop_price.is_some() || self.trailing_delta.is_some();

        match self.order_type {
            OrderType::Limit | OrderType::LimitMaker => {
                if self.price.is_none() {
                    return Err(ValidationError::EmptyPrice);
                }
                if self.quantity.is_none() {
                    return Err(ValidationError::EmptyQuantity);
                }
            }
            OrderType::Market => {
                if self.quantity.is_none() && self.quote_order_qty.is_none() {
                    return Err(ValidationError::EmptyQuantity);
                }
            }
            OrderType::StopLoss | OrderType::TakeProfit => {
                if self.quantity.is_none() {
                    return Err(ValidationError::EmptyQuantity);
                }
                if !has_stop {
                    return Err(ValidationError::EmptyStopPrice);
                }
            }
            OrderType::StopLossLimit | OrderType::TakeProfitLimit => {
                if self.quantity.is_none() {
                    return Err(ValidationError::EmptyQuantity);
                }
                if self.price.is_none() {
                    return Err(ValidationError::EmptyPrice);
                }
                if !has_stop {
                    return Err(ValidationError::EmptyStopPrice);
                }
            }
        }

        if self.order_type.takes_time_in_force() {
            self.time_in_force.get_or_insert(TimeInForce::Gtc);
        } else if self.order_type == OrderType::LimitMaker {
            // rejected by the exchange on LIMIT_MAKER
            self.time_in_force = None;
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryOrderRequest {
    pub symbol: String,
    pub order_id: Option<i64>,
    pub orig_client_order_id: Option<String>,
}

impl QueryOrderRequest {
    pub fn by_id(symbol: impl Into<String>, order_id: i64) -> Self {
        Self {
            symbol: symbol.into(),
            order_id: Some(order_id),
            orig_client_order_id: None,
        }
    }

    pub fn by_client_id(symbol: impl Into<String>, client_order_id: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            order_id: None,
            orig_client_order_id: Some(client_order_id.into()),
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require_symbol(&self.symbol)?;
        require_order_id(self.order_id, self.orig_client_order_id.as_deref())
    }
}

fn require_order_id(order_id: Option<i64>, client_id: Option<&str>) -> Result<(), ValidationError> {
    if order_id.is_none() && client_id.map_or(true, str::is_empty) {
        Err(ValidationError::EmptyOrderId)
    } else {
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelOrderRequest {
    pub symbol: String,
    pub order_id: Option<i64>,
    pub orig_client_order_id: Option<String>,
    pub new_client_order_id: Option<String>,
}

impl CancelOrderRequest {
    pub fn by_id(symbol: impl Into<String>, order_id: i64) -> Self {
        Self {
            symbol: symbol.into(),
            order_id: Some(order_id),
            orig_client_order_id: None,
            new_client_order_id: None,
        }
    }

    pub fn by_client_id(symbol: impl Into<String>, client_order_id: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            order_id: None,
            orig_client_order_id: Some(client_order_id.into()),
            new_client_order_id: None,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require_symbol(&self.symbol)?;
        require_order_id(self.order_id, self.orig_client_order_id.as_deref())
    }
}

/// Cancel an existing order and place a new one on the same symbol.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelReplaceRequest {
    #[serde(flatten)]
    pub order: OrderRequest,
    pub cancel_replace_mode: Option<CancelReplaceMode>,
    pub cancel_new_client_order_id: Option<String>,
    pub cancel_orig_client_order_id: Option<String>,
    pub cancel_order_id: Option<i64>,
}

impl CancelReplaceRequest {
    pub fn new(order: OrderRequest, cancel_order_id: i64) -> Self {
        Self {
            order,
            cancel_replace_mode: None,
            cancel_new_client_order_id: None,
            cancel_orig_client_order_id: None,
            cancel_order_id: Some(cancel_order_id),
        }
    }

    pub fn validate(&mut self) -> Result<(), ValidationError> {
        require_order_id(
            self.cancel_order_id,
            self.cancel_orig_client_order_id.as_deref(),
        )?;
        self.order.validate()?;
        self.cancel_replace_mode
            .get_or_insert(CancelReplaceMode::StopOnFailure);
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AllOrdersRequest {
    pub symbol: String,
    pub order_id: Option<i64>,
    pub start_time: Option<i64>,
    pub end_time: Option<i64>,
    pub limit: Option<u32>,
}

impl AllOrdersRequest {
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            order_id: None,
            start_time: None,
            end_time: None,
            limit: None,
        }
    }
}

// OCO

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOcoRequest {
    pub symbol: String,
    pub list_client_order_id: Option<String>,
    pub side: OrderSide,
    pub quantity: Option<Decimal>,
    pub limit_client_order_id: Option<String>,
    pub price: Option<Decimal>,
    pub limit_iceberg_qty: Option<Decimal>,
    pub stop_client_order_id: Option<String>,
    pub stop_price: Option<Decimal>,
    pub stop_limit_price: Option<Decimal>,
    pub stop_iceberg_qty: Option<Decimal>,
    pub stop_limit_time_in_force: Option<TimeInForce>,
    pub new_order_resp_type: Option<OrderRespType>,
    pub self_trade_prevention_mode: Option<SelfTradePreventionMode>,
}

impl NewOcoRequest {
    pub fn new(
        symbol: impl Into<String>,
        side: OrderSide,
        quantity: Decimal,
        price: Decimal,
        stop_price: Decimal,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            list_client_order_id: None,
            side,
            quantity: Some(quantity),
            limit_client_order_id: None,
            price: Some(price),
            limit_iceberg_qty: None,
            stop_client_order_id: None,
            stop_price: Some(stop_price),
            stop_limit_price: None,
            stop_iceberg_qty: None,
            stop_limit_time_in_force: None,
            new_order_resp_type: None,
            self_trade_prevention_mode: None,
        }
    }

    /// Turn the stop leg into a stop-limit order
    pub fn with_stop_limit(mut self, stop_limit_price: Decimal, time_in_force: TimeInForce) -> Self {
        self.stop_limit_price = Some(stop_limit_price);
        self.stop_limit_time_in_force = Some(time_in_force);
        self
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require_symbol(&self.symbol)?;
        if self.quantity.is_none() {
            return Err(ValidationError::EmptyQuantity);
        }
        if self.price.is_none() {
            return Err(ValidationError::EmptyPrice);
        }
        if self.stop_price.is_none() {
            return Err(ValidationError::EmptyStopPrice);
        }
        Ok(())
    }
}

fn require_order_list_id(
    order_list_id: Option<i64>,
    client_id: Option<&str>,
) -> Result<(), ValidationError> {
    if order_list_id.is_none() && client_id.map_or(true, str::is_empty) {
        Err(ValidationError::EmptyOrderListId)
    } else {
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelOcoRequest {
    pub symbol: String,
    pub order_list_id: Option<i64>,
    pub list_client_order_id: Option<String>,
    pub new_client_order_id: Option<String>,
}

impl CancelOcoRequest {
    pub fn by_id(symbol: impl Into<String>, order_list_id: i64) -> Self {
        Self {
            symbol: symbol.into(),
            order_list_id: Some(order_list_id),
            list_client_order_id: None,
            new_client_order_id: None,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require_symbol(&self.symbol)?;
        require_order_list_id(self.order_list_id, self.list_client_order_id.as_deref())
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryOcoRequest {
    pub order_list_id: Option<i64>,
    pub orig_client_order_id: Option<String>,
}

impl QueryOcoRequest {
    pub fn by_id(order_list_id: i64) -> Self {
        Self {
            order_list_id: Some(order_list_id),
            orig_client_order_id: None,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require_order_list_id(self.order_list_id, self.orig_client_order_id.as_deref())
    }
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AllOcoRequest {
    pub from_id: Option<i64>,
    pub start_time: Option<i64>,
    pub end_time: Option<i64>,
    pub limit: Option<u32>,
}

// Account

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountTradesRequest {
    pub symbol: String,
    pub order_id: Option<i64>,
    pub start_time: Option<i64>,
    pub end_time: Option<i64>,
    pub from_id: Option<i64>,
    pub limit: Option<u32>,
}

impl AccountTradesRequest {
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            order_id: None,
            start_time: None,
            end_time: None,
            from_id: None,
            limit: None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreventedMatchesRequest {
    pub symbol: String,
    pub prevented_match_id: Option<i64>,
    pub order_id: Option<i64>,
    pub from_prevented_match_id: Option<i64>,
    pub limit: Option<u32>,
}

impl PreventedMatchesRequest {
    pub fn by_order(symbol: impl Into<String>, order_id: i64) -> Self {
        Self {
            symbol: symbol.into(),
            prevented_match_id: None,
            order_id: Some(order_id),
            from_prevented_match_id: None,
            limit: None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ListenKeyParams<'a> {
    pub listen_key: &'a str,
}

pub(crate) fn require_non_empty_symbols(symbols: &[String]) -> Result<(), ValidationError> {
    if symbols.is_empty() {
        return Err(ValidationError::EmptySymbols);
    }
    symbols.iter().try_for_each(|s| require_symbol(s))
}

pub(crate) fn require_listen_key(listen_key: &str) -> Result<(), ValidationError> {
    if listen_key.is_empty() {
        Err(ValidationError::EmptyListenKey)
    } else {
        Ok(())
    }
}

pub(crate) fn symbol(symbol: &str) -> Result<SymbolParams<'_>, ValidationError> {
    require_symbol(symbol)?;
    Ok(SymbolParams { symbol })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::kernel::encode;
    use rstest::rstest;
    use std::str::FromStr;

    #[rstest]
    #[case(None, None)]
    #[case(Some(0), Some(DEFAULT_LIMIT))]
    #[case(Some(1), Some(1))]
    #[case(Some(1000), Some(1000))]
    #[case(Some(1001), Some(DEFAULT_LIMIT))]
    fn test_clamp_limit(#[case] input: Option<u32>, #[case] expected: Option<u32>) {
        assert_eq!(clamp_limit(input, DEFAULT_LIMIT, MAX_LIMIT), expected);
    }

    #[rstest]
    #[case("1m", true)]
    #[case("59m", true)]
    #[case("60m", false)]
    #[case("1h", true)]
    #[case("23h", true)]
    #[case("24h", false)]
    #[case("7d", true)]
    #[case("8d", false)]
    #[case("0m", false)]
    #[case("01m", false)]
    #[case("1w", false)]
    #[case("m", false)]
    #[case("", false)]
    fn test_window_size(#[case] window: &str, #[case] valid: bool) {
        assert_eq!(validate_window_size(window).is_ok(), valid, "{}", window);
    }

    fn qty(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_limit_order_defaults_gtc() {
        let mut order = OrderRequest::limit("LTCBTC", OrderSide::Sell, qty("1"), qty("0.1"));
        order.validate().unwrap();

        assert_eq!(order.time_in_force, Some(TimeInForce::Gtc));
        assert_eq!(
            encode(&order).unwrap(),
            "price=0.1&quantity=1&side=SELL&symbol=LTCBTC&timeInForce=GTC&type=LIMIT"
        );
    }

    #[test]
    fn test_limit_maker_never_sends_time_in_force() {
        let mut order = OrderRequest::new("BTCUSDT", OrderSide::Buy, OrderType::LimitMaker)
            .with_quantity(qty("1"))
            .with_price(qty("10"))
            .with_time_in_force(TimeInForce::Ioc);
        order.validate().unwrap();

        assert_eq!(order.time_in_force, None);
        assert!(!encode(&order).unwrap().contains("timeInForce"));
    }

    #[test]
    fn test_explicit_time_in_force_is_kept() {
        let mut order = OrderRequest::limit("BTCUSDT", OrderSide::Buy, qty("1"), qty("10"))
            .with_time_in_force(TimeInForce::Fok);
        order.validate().unwrap();
        assert_eq!(order.time_in_force, Some(TimeInForce::Fok));
    }

    #[rstest]
    #[case(OrderRequest::market("BTCUSDT", OrderSide::Buy), ValidationError::EmptyQuantity)]
    #[case(
        OrderRequest::new("BTCUSDT", OrderSide::Buy, OrderType::Limit).with_quantity(qty("1")),
        ValidationError::EmptyPrice
    )]
    #[case(
        OrderRequest::new("BTCUSDT", OrderSide::Buy, OrderType::Limit).with_price(qty("1")),
        ValidationError::EmptyQuantity
    )]
    #[case(
        OrderRequest::new("BTCUSDT", OrderSide::Sell, OrderType::StopLoss).with_quantity(qty("1")),
        ValidationError::EmptyStopPrice
    )]
    #[case(
        OrderRequest::new("BTCUSDT", OrderSide::Sell, OrderType::TakeProfitLimit)
            .with_quantity(qty("1"))
            .with_stop_price(qty("2")),
        ValidationError::EmptyPrice
    )]
    #[case(
        OrderRequest::limit("", OrderSide::Buy, qty("1"), qty("1")),
        ValidationError::EmptySymbol
    )]
    #[case(
        OrderRequest::limit("BTCUSDT", OrderSide::Buy, qty("1"), qty("1")).with_strategy(1, 999_999),
        ValidationError::MinStrategyType(999_999)
    )]
    fn test_order_validation_failures(
        #[case] order: OrderRequest,
        #[case] expected: ValidationError,
    ) {
        let mut order = order;
        assert_eq!(order.validate().unwrap_err(), expected);
    }

    #[test]
    fn test_stop_orders_accept_trailing_delta() {
        let mut order = OrderRequest::new("BTCUSDT", OrderSide::Sell, OrderType::StopLossLimit)
            .with_quantity(qty("1"))
            .with_price(qty("9"))
            .with_trailing_delta(100);
        order.validate().unwrap();
        assert_eq!(order.time_in_force, Some(TimeInForce::Gtc));
    }

    #[test]
    fn test_market_order_accepts_quote_quantity() {
        let mut order =
            OrderRequest::market("BTCUSDT", OrderSide::Buy).with_quote_order_qty(qty("25.5"));
        order.validate().unwrap();
        assert_eq!(order.time_in_force, None);
    }

    #[test]
    fn test_cancel_replace_defaults_mode_and_flattens() {
        let order = OrderRequest::limit("BTCUSDT", OrderSide::Buy, qty("1"), qty("10"));
        let mut request = CancelReplaceRequest::new(order, 42);
        request.validate().unwrap();

        let encoded = encode(&request).unwrap();
        assert!(encoded.starts_with("cancelOrderId=42&cancelReplaceMode=STOP_ON_FAILURE&price=10"));
    }

    #[test]
    fn test_cancel_replace_requires_cancel_target() {
        let order = OrderRequest::limit("BTCUSDT", OrderSide::Buy, qty("1"), qty("10"));
        let mut request = CancelReplaceRequest::new(order, 1);
        request.cancel_order_id = None;
        assert_eq!(request.validate().unwrap_err(), ValidationError::EmptyOrderId);
    }

    #[test]
    fn test_order_id_requirements() {
        let mut query = QueryOrderRequest::by_client_id("BTCUSDT", "");
        assert_eq!(query.validate().unwrap_err(), ValidationError::EmptyOrderId);
        query.order_id = Some(7);
        assert!(query.validate().is_ok());

        let cancel = CancelOrderRequest::by_id("", 7);
        assert_eq!(cancel.validate().unwrap_err(), ValidationError::EmptySymbol);

        let oco = QueryOcoRequest {
            order_list_id: None,
            orig_client_order_id: None,
        };
        assert_eq!(oco.validate().unwrap_err(), ValidationError::EmptyOrderListId);
    }

    #[test]
    fn test_new_oco_validation() {
        let mut oco = NewOcoRequest::new("LTCBTC", OrderSide::Sell, qty("1"), qty("0.1"), qty("0.05"));
        assert!(oco.validate().is_ok());

        oco.stop_price = None;
        assert_eq!(oco.validate().unwrap_err(), ValidationError::EmptyStopPrice);
    }

    #[test]
    fn test_symbols_list_validation() {
        assert_eq!(
            require_non_empty_symbols(&[]).unwrap_err(),
            ValidationError::EmptySymbols
        );
        assert_eq!(
            require_non_empty_symbols(&["BTCUSDT".to_string(), String::new()]).unwrap_err(),
            ValidationError::EmptySymbol
        );
    }
}
