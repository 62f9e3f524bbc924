use super::client::BinanceClient;
use super::endpoints;
use super::requests::{
    clamp_limit, require_non_empty_symbols, require_symbol, symbol, validate_window_size,
    AggTradesRequest, DepthRequest, HistoricalTradesRequest, KlinesRequest, TickerParams,
    TradesRequest,
    DEFAULT_DEPTH_LIMIT, DEFAULT_LIMIT, MAX_DEPTH_LIMIT, MAX_LIMIT,
};
use super::types::{
    AggTrade, AvgPrice, BookTicker, Depth, Kline, RollingWindowTicker, SymbolPrice, TickerMini,
    TickerStats, TickerType, Trade,
};
use crate::core::errors::{ExchangeError, ValidationError};
use crate::core::kernel::{RestClient, Security};
use reqwest::Method;
use serde::de::DeserializeOwned;
use tracing::instrument;

/// Market data endpoints
impl<R: RestClient> BinanceClient<R> {
    /// Order book snapshot
    #[instrument(skip(self, request), fields(exchange = "binance", symbol = %request.symbol))]
    pub async fn depth(&self, request: &DepthRequest) -> Result<Depth, ExchangeError> {
        require_symbol(&request.symbol)?;
        let params = DepthRequest {
            symbol: request.symbol.clone(),
            limit: clamp_limit(request.limit, DEFAULT_DEPTH_LIMIT, MAX_DEPTH_LIMIT),
        };
        self.rest()
            .execute_json(Method::GET, endpoints::DEPTH, Some(&params), Security::Public)
            .await
    }

    /// Recent trades
    #[instrument(skip(self, request), fields(exchange = "binance", symbol = %request.symbol))]
    pub async fn trades(&self, request: &TradesRequest) -> Result<Vec<Trade>, ExchangeError> {
        require_symbol(&request.symbol)?;
        let params = TradesRequest {
            symbol: request.symbol.clone(),
            limit: clamp_limit(request.limit, DEFAULT_LIMIT, MAX_LIMIT),
        };
        self.rest()
            .execute_json(Method::GET, endpoints::TRADES, Some(&params), Security::Public)
            .await
    }

    /// Older trades; needs the API key header
    #[instrument(skip(self, request), fields(exchange = "binance", symbol = %request.symbol))]
    pub async fn historical_trades(
        &self,
        request: &HistoricalTradesRequest,
    ) -> Result<Vec<Trade>, ExchangeError> {
        require_symbol(&request.symbol)?;
        let params = HistoricalTradesRequest {
            limit: clamp_limit(request.limit, DEFAULT_LIMIT, MAX_LIMIT),
            ..request.clone()
        };
        self.rest()
            .execute_json(
                Method::GET,
                endpoints::HISTORICAL_TRADES,
                Some(&params),
                Security::UserStream,
            )
            .await
    }

    /// Compressed, aggregate trades
    #[instrument(skip(self, request), fields(exchange = "binance", symbol = %request.symbol))]
    pub async fn agg_trades(
        &self,
        request: &AggTradesRequest,
    ) -> Result<Vec<AggTrade>, ExchangeError> {
        require_symbol(&request.symbol)?;
        let params = AggTradesRequest {
            limit: clamp_limit(request.limit, DEFAULT_LIMIT, MAX_LIMIT),
            ..request.clone()
        };
        self.rest()
            .execute_json(Method::GET, endpoints::AGG_TRADES, Some(&params), Security::Public)
            .await
    }

    /// Candlesticks
    #[instrument(skip(self, request), fields(exchange = "binance", symbol = %request.symbol, interval = %request.interval))]
    pub async fn klines(&self, request: &KlinesRequest) -> Result<Vec<Kline>, ExchangeError> {
        self.fetch_klines(endpoints::KLINES, request).await
    }

    /// Candlesticks tuned for chart display
    #[instrument(skip(self, request), fields(exchange = "binance", symbol = %request.symbol, interval = %request.interval))]
    pub async fn ui_klines(&self, request: &KlinesRequest) -> Result<Vec<Kline>, ExchangeError> {
        self.fetch_klines(endpoints::UI_KLINES, request).await
    }

    async fn fetch_klines(
        &self,
        endpoint: &str,
        request: &KlinesRequest,
    ) -> Result<Vec<Kline>, ExchangeError> {
        require_symbol(&request.symbol)?;
        let params = KlinesRequest {
            limit: clamp_limit(request.limit, DEFAULT_LIMIT, MAX_LIMIT),
            ..request.clone()
        };
        self.rest()
            .execute_json(Method::GET, endpoint, Some(&params), Security::Public)
            .await
    }

    /// Current average price
    #[instrument(skip(self), fields(exchange = "binance"))]
    pub async fn avg_price(&self, symbol_name: &str) -> Result<AvgPrice, ExchangeError> {
        let params = symbol(symbol_name)?;
        self.rest()
            .execute_json(Method::GET, endpoints::AVG_PRICE, Some(&params), Security::Public)
            .await
    }

    /// 24h statistics for one symbol
    #[instrument(skip(self), fields(exchange = "binance"))]
    pub async fn ticker_24h(&self, symbol_name: &str) -> Result<TickerStats, ExchangeError> {
        self.single_ticker(endpoints::TICKER_24H, symbol_name, None, TickerType::Full)
            .await
    }

    /// 24h statistics for one symbol, mini response
    #[instrument(skip(self), fields(exchange = "binance"))]
    pub async fn ticker_24h_mini(&self, symbol_name: &str) -> Result<TickerMini, ExchangeError> {
        self.single_ticker(endpoints::TICKER_24H, symbol_name, None, TickerType::Mini)
            .await
    }

    /// 24h statistics for several symbols; an empty list means every symbol
    #[instrument(skip(self, symbols), fields(exchange = "binance", count = symbols.len()))]
    pub async fn tickers_24h(&self, symbols: &[String]) -> Result<Vec<TickerStats>, ExchangeError> {
        self.multi_ticker(endpoints::TICKER_24H, symbols, None, TickerType::Full, true)
            .await
    }

    /// 24h statistics for several symbols, mini response
    #[instrument(skip(self, symbols), fields(exchange = "binance", count = symbols.len()))]
    pub async fn tickers_24h_mini(
        &self,
        symbols: &[String],
    ) -> Result<Vec<TickerMini>, ExchangeError> {
        self.multi_ticker(endpoints::TICKER_24H, symbols, None, TickerType::Mini, true)
            .await
    }

    /// Latest price for one symbol
    #[instrument(skip(self), fields(exchange = "binance"))]
    pub async fn ticker_price(&self, symbol_name: &str) -> Result<SymbolPrice, ExchangeError> {
        let params = symbol(symbol_name)?;
        self.rest()
            .execute_json(Method::GET, endpoints::TICKER_PRICE, Some(&params), Security::Public)
            .await
    }

    /// Latest prices; an empty list means every symbol
    #[instrument(skip(self, symbols), fields(exchange = "binance", count = symbols.len()))]
    pub async fn tickers_price(&self, symbols: &[String]) -> Result<Vec<SymbolPrice>, ExchangeError> {
        let params = listed_symbols(symbols, true)?;
        self.rest()
            .execute_json(Method::GET, endpoints::TICKER_PRICE, Some(&params), Security::Public)
            .await
    }

    /// Best bid/ask for one symbol
    #[instrument(skip(self), fields(exchange = "binance"))]
    pub async fn book_ticker(&self, symbol_name: &str) -> Result<BookTicker, ExchangeError> {
        let params = symbol(symbol_name)?;
        self.rest()
            .execute_json(Method::GET, endpoints::TICKER_BOOK, Some(&params), Security::Public)
            .await
    }

    /// Best bid/ask; an empty list means every symbol
    #[instrument(skip(self, symbols), fields(exchange = "binance", count = symbols.len()))]
    pub async fn book_tickers(&self, symbols: &[String]) -> Result<Vec<BookTicker>, ExchangeError> {
        let params = listed_symbols(symbols, true)?;
        self.rest()
            .execute_json(Method::GET, endpoints::TICKER_BOOK, Some(&params), Security::Public)
            .await
    }

    /// Rolling window statistics for one symbol
    ///
    /// # Arguments
    /// * `symbol_name` - Trading pair
    /// * `window_size` - `1m`-`59m`, `1h`-`23h` or `1d`-`7d`; `None` uses the exchange default (1d)
    #[instrument(skip(self), fields(exchange = "binance"))]
    pub async fn rolling_window_ticker(
        &self,
        symbol_name: &str,
        window_size: Option<&str>,
    ) -> Result<RollingWindowTicker, ExchangeError> {
        self.single_ticker(endpoints::TICKER, symbol_name, window_size, TickerType::Full)
            .await
    }

    /// Rolling window statistics for one symbol, mini response
    #[instrument(skip(self), fields(exchange = "binance"))]
    pub async fn rolling_window_ticker_mini(
        &self,
        symbol_name: &str,
        window_size: Option<&str>,
    ) -> Result<TickerMini, ExchangeError> {
        self.single_ticker(endpoints::TICKER, symbol_name, window_size, TickerType::Mini)
            .await
    }

    /// Rolling window statistics for several symbols
    #[instrument(skip(self, symbols), fields(exchange = "binance", count = symbols.len()))]
    pub async fn rolling_window_tickers(
        &self,
        symbols: &[String],
        window_size: Option<&str>,
    ) -> Result<Vec<RollingWindowTicker>, ExchangeError> {
        self.multi_ticker(endpoints::TICKER, symbols, window_size, TickerType::Full, false)
            .await
    }

    /// Rolling window statistics for several symbols, mini response
    #[instrument(skip(self, symbols), fields(exchange = "binance", count = symbols.len()))]
    pub async fn rolling_window_tickers_mini(
        &self,
        symbols: &[String],
        window_size: Option<&str>,
    ) -> Result<Vec<TickerMini>, ExchangeError> {
        self.multi_ticker(endpoints::TICKER, symbols, window_size, TickerType::Mini, false)
            .await
    }

    async fn single_ticker<T: DeserializeOwned + Send>(
        &self,
        endpoint: &str,
        symbol_name: &str,
        window_size: Option<&str>,
        ticker_type: TickerType,
    ) -> Result<T, ExchangeError> {
        require_symbol(symbol_name)?;
        if let Some(window) = window_size {
            validate_window_size(window)?;
        }
        let params = TickerParams {
            symbol: Some(symbol_name),
            window_size,
            ticker_type: Some(ticker_type),
            ..TickerParams::default()
        };
        self.rest()
            .execute_json(Method::GET, endpoint, Some(&params), Security::Public)
            .await
    }

    async fn multi_ticker<T: DeserializeOwned + Send>(
        &self,
        endpoint: &str,
        symbols: &[String],
        window_size: Option<&str>,
        ticker_type: TickerType,
        allow_all: bool,
    ) -> Result<Vec<T>, ExchangeError> {
        if let Some(window) = window_size {
            validate_window_size(window)?;
        }
        let params = TickerParams {
            window_size,
            ticker_type: Some(ticker_type),
            ..listed_symbols(symbols, allow_all)?
        };
        self.rest()
            .execute_json(Method::GET, endpoint, Some(&params), Security::Public)
            .await
    }
}

/// `symbols=[...]` parameters; an empty list is only allowed where the
/// endpoint then answers for every symbol.
fn listed_symbols<'a>(
    symbols: &[String],
    allow_all: bool,
) -> Result<TickerParams<'a>, ValidationError> {
    if !(allow_all && symbols.is_empty()) {
        require_non_empty_symbols(symbols)?;
    }
    Ok(TickerParams {
        symbols: symbols.to_vec(),
        ..TickerParams::default()
    })
}
