use super::codec::AccountEventCodec;
use super::endpoints;
use super::requests::require_listen_key;
use super::types::KlineInterval;
use super::ws_types::{
    AccountEvent, AccountPositionEvent, AggTradeUpdate, BalanceUpdateEvent, BookTickerUpdate,
    DepthLevel, DepthLevelUpdate, DepthUpdate, KlineUpdate, MiniTickerUpdate, OcoUpdateEvent,
    OrderUpdateEvent, TickerUpdate, TradeUpdate, UpdateSpeed,
};
use crate::core::config::ClientConfig;
use crate::core::errors::{ExchangeError, ValidationError};
use crate::core::kernel::{JsonCodec, WsCodec, WsConfig, WsConnection};
use std::sync::{Arc, Mutex as StdMutex};
use tokio::sync::{mpsc, watch};
use tracing::{debug, instrument, trace};

pub type DiffDepthStream = WsConnection<JsonCodec<DepthUpdate>>;
pub type DepthLevelStream = WsConnection<JsonCodec<DepthLevelUpdate>>;
pub type KlineStream = WsConnection<JsonCodec<KlineUpdate>>;
pub type AggTradeStream = WsConnection<JsonCodec<AggTradeUpdate>>;
pub type TradeStream = WsConnection<JsonCodec<TradeUpdate>>;
pub type TickerStream = WsConnection<JsonCodec<TickerUpdate>>;
pub type MiniTickerStream = WsConnection<JsonCodec<MiniTickerUpdate>>;
pub type BookTickerStream = WsConnection<JsonCodec<BookTickerUpdate>>;
pub type AllTickersStream = WsConnection<JsonCodec<Vec<TickerUpdate>>>;
pub type AllMiniTickersStream = WsConnection<JsonCodec<Vec<MiniTickerUpdate>>>;

/// Windows offered by the rolling window ticker streams
const STREAM_WINDOWS: [&str; 3] = ["1h", "4h", "1d"];

fn validate_stream_window(window: &str) -> Result<(), ValidationError> {
    if STREAM_WINDOWS.contains(&window) {
        Ok(())
    } else {
        Err(ValidationError::InvalidTickerWindow(window.to_string()))
    }
}

/// Opens raw streams; each connection carries exactly one stream.
#[derive(Debug, Clone)]
pub struct BinanceWsClient {
    base_url: String,
    config: WsConfig,
}

impl BinanceWsClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        if !base_url.ends_with('/') {
            base_url.push('/');
        }
        Self {
            base_url,
            config: WsConfig::default(),
        }
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(config.ws_url())
    }

    pub fn with_ws_config(mut self, config: WsConfig) -> Self {
        self.config = config;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn symbol_url(&self, symbol: &str, suffix: &str) -> Result<String, ValidationError> {
        if symbol.is_empty() {
            return Err(ValidationError::EmptySymbol);
        }
        Ok(self.url(&format!("{}{}", symbol.to_lowercase(), suffix)))
    }

    async fn open<C: WsCodec>(&self, url: &str, codec: C) -> Result<WsConnection<C>, ExchangeError> {
        WsConnection::connect(url, codec, &self.config).await
    }

    async fn open_json<T>(&self, url: &str) -> Result<WsConnection<JsonCodec<T>>, ExchangeError>
    where
        T: serde::de::DeserializeOwned + Send + 'static,
    {
        self.open(url, JsonCodec::new()).await
    }

    fn diff_depth_url(&self, symbol: &str, speed: UpdateSpeed) -> Result<String, ValidationError> {
        self.symbol_url(
            symbol,
            &format!("{}{}", endpoints::STREAM_DEPTH, speed.as_suffix()),
        )
    }

    fn depth_level_url(
        &self,
        symbol: &str,
        levels: DepthLevel,
        speed: UpdateSpeed,
    ) -> Result<String, ValidationError> {
        self.symbol_url(
            symbol,
            &format!(
                "{}{}{}",
                endpoints::STREAM_DEPTH,
                levels.as_str(),
                speed.as_suffix()
            ),
        )
    }

    fn rolling_window_url(&self, symbol: &str, window: &str) -> Result<String, ValidationError> {
        validate_stream_window(window)?;
        self.symbol_url(symbol, &format!("{}{}", endpoints::STREAM_WINDOW_TICKER, window))
    }

    fn all_rolling_window_url(&self, window: &str) -> Result<String, ValidationError> {
        validate_stream_window(window)?;
        Ok(self.url(&format!(
            "{}{}{}",
            endpoints::STREAM_ALL_WINDOW_TICKERS,
            window,
            endpoints::STREAM_ARRAY
        )))
    }

    /// Order book diffs for one symbol
    #[instrument(skip(self), fields(exchange = "binance"))]
    pub async fn diff_depth(
        &self,
        symbol: &str,
        speed: UpdateSpeed,
    ) -> Result<DiffDepthStream, ExchangeError> {
        let url = self.diff_depth_url(symbol, speed)?;
        self.open_json(&url).await
    }

    /// Top `levels` bids and asks, pushed every `speed`
    #[instrument(skip(self), fields(exchange = "binance"))]
    pub async fn depth_level(
        &self,
        symbol: &str,
        levels: DepthLevel,
        speed: UpdateSpeed,
    ) -> Result<DepthLevelStream, ExchangeError> {
        let url = self.depth_level_url(symbol, levels, speed)?;
        self.open_json(&url).await
    }

    #[instrument(skip(self), fields(exchange = "binance"))]
    pub async fn klines(
        &self,
        symbol: &str,
        interval: KlineInterval,
    ) -> Result<KlineStream, ExchangeError> {
        let url = self.symbol_url(symbol, &format!("{}{}", endpoints::STREAM_KLINE, interval))?;
        self.open_json(&url).await
    }

    #[instrument(skip(self), fields(exchange = "binance"))]
    pub async fn agg_trades(&self, symbol: &str) -> Result<AggTradeStream, ExchangeError> {
        let url = self.symbol_url(symbol, endpoints::STREAM_AGG_TRADE)?;
        self.open_json(&url).await
    }

    #[instrument(skip(self), fields(exchange = "binance"))]
    pub async fn trades(&self, symbol: &str) -> Result<TradeStream, ExchangeError> {
        let url = self.symbol_url(symbol, endpoints::STREAM_TRADE)?;
        self.open_json(&url).await
    }

    /// 24h statistics for one symbol, pushed every second
    #[instrument(skip(self), fields(exchange = "binance"))]
    pub async fn individual_ticker(&self, symbol: &str) -> Result<TickerStream, ExchangeError> {
        let url = self.symbol_url(symbol, endpoints::STREAM_TICKER)?;
        self.open_json(&url).await
    }

    /// Rolling window statistics for one symbol; `window` is `1h`, `4h` or `1d`
    #[instrument(skip(self), fields(exchange = "binance"))]
    pub async fn individual_rolling_window_ticker(
        &self,
        symbol: &str,
        window: &str,
    ) -> Result<TickerStream, ExchangeError> {
        let url = self.rolling_window_url(symbol, window)?;
        self.open_json(&url).await
    }

    #[instrument(skip(self), fields(exchange = "binance"))]
    pub async fn individual_mini_ticker(
        &self,
        symbol: &str,
    ) -> Result<MiniTickerStream, ExchangeError> {
        let url = self.symbol_url(symbol, endpoints::STREAM_MINI_TICKER)?;
        self.open_json(&url).await
    }

    /// Best bid/ask updates in real time
    #[instrument(skip(self), fields(exchange = "binance"))]
    pub async fn individual_book_ticker(
        &self,
        symbol: &str,
    ) -> Result<BookTickerStream, ExchangeError> {
        let url = self.symbol_url(symbol, endpoints::STREAM_BOOK_TICKER)?;
        self.open_json(&url).await
    }

    /// 24h statistics of every symbol that changed
    #[instrument(skip(self), fields(exchange = "binance"))]
    pub async fn all_market_tickers(&self) -> Result<AllTickersStream, ExchangeError> {
        let url = self.url(endpoints::STREAM_ALL_TICKERS);
        self.open_json(&url).await
    }

    #[instrument(skip(self), fields(exchange = "binance"))]
    pub async fn all_market_rolling_window_tickers(
        &self,
        window: &str,
    ) -> Result<AllTickersStream, ExchangeError> {
        let url = self.all_rolling_window_url(window)?;
        self.open_json(&url).await
    }

    #[instrument(skip(self), fields(exchange = "binance"))]
    pub async fn all_market_mini_tickers(&self) -> Result<AllMiniTickersStream, ExchangeError> {
        let url = self.url(endpoints::STREAM_ALL_MINI_TICKERS);
        self.open_json(&url).await
    }

    /// Account events for the session behind `listen_key`
    ///
    /// # Arguments
    /// * `listen_key` - Key from `BinanceClient::create_listen_key`
    #[instrument(skip(self, listen_key), fields(exchange = "binance"))]
    pub async fn user_data(&self, listen_key: &str) -> Result<UserDataStream, ExchangeError> {
        self.user_data_with_codec(listen_key, AccountEventCodec::new())
            .await
    }

    /// Same as [`Self::user_data`] with an explicit codec, e.g.
    /// [`AccountEventCodec::full_decode`]
    pub async fn user_data_with_codec(
        &self,
        listen_key: &str,
        codec: AccountEventCodec,
    ) -> Result<UserDataStream, ExchangeError> {
        require_listen_key(listen_key)?;
        let connection = self.open(&self.url(listen_key), codec).await?;
        Ok(UserDataStream::new(connection, self.config.channel_capacity))
    }
}

#[derive(Default)]
struct Subscribers {
    orders: Vec<mpsc::Sender<OrderUpdateEvent>>,
    balances: Vec<mpsc::Sender<BalanceUpdateEvent>>,
    accounts: Vec<mpsc::Sender<AccountPositionEvent>>,
    oco_orders: Vec<mpsc::Sender<OcoUpdateEvent>>,
    running: bool,
    finished: bool,
}

impl Subscribers {
    fn close_all(&mut self) {
        self.orders.clear();
        self.balances.clear();
        self.accounts.clear();
        self.oco_orders.clear();
        self.finished = true;
    }
}

type SharedSubscribers = Arc<StdMutex<Subscribers>>;

/// Event types a `UserDataStream` can route to subscribers
trait Routed: Clone + Send + 'static {
    fn subscribers(subs: &mut Subscribers) -> &mut Vec<mpsc::Sender<Self>>;
}

impl Routed for OrderUpdateEvent {
    fn subscribers(subs: &mut Subscribers) -> &mut Vec<mpsc::Sender<Self>> {
        &mut subs.orders
    }
}

impl Routed for BalanceUpdateEvent {
    fn subscribers(subs: &mut Subscribers) -> &mut Vec<mpsc::Sender<Self>> {
        &mut subs.balances
    }
}

impl Routed for AccountPositionEvent {
    fn subscribers(subs: &mut Subscribers) -> &mut Vec<mpsc::Sender<Self>> {
        &mut subs.accounts
    }
}

impl Routed for OcoUpdateEvent {
    fn subscribers(subs: &mut Subscribers) -> &mut Vec<mpsc::Sender<Self>> {
        &mut subs.oco_orders
    }
}

/// User data stream with typed sub-streams.
///
/// The first subscription starts one reader task. It decodes each frame once
/// and hands it to every subscriber of that event type; events nobody
/// subscribed to are dropped. When the socket ends, every subscriber channel
/// closes.
pub struct UserDataStream {
    connection: WsConnection<AccountEventCodec>,
    subscribers: SharedSubscribers,
    channel_capacity: usize,
}

impl std::fmt::Debug for UserDataStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserDataStream")
            .field("connection", &self.connection)
            .finish_non_exhaustive()
    }
}

impl UserDataStream {
    fn new(connection: WsConnection<AccountEventCodec>, channel_capacity: usize) -> Self {
        Self {
            connection,
            subscribers: Arc::new(StdMutex::new(Subscribers::default())),
            channel_capacity: channel_capacity.max(1),
        }
    }

    pub fn connection(&self) -> &WsConnection<AccountEventCodec> {
        &self.connection
    }

    /// `executionReport` events
    pub fn orders_stream(&self) -> Result<mpsc::Receiver<OrderUpdateEvent>, ExchangeError> {
        self.subscribe()
    }

    /// `balanceUpdate` events
    pub fn balances_stream(&self) -> Result<mpsc::Receiver<BalanceUpdateEvent>, ExchangeError> {
        self.subscribe()
    }

    /// `outboundAccountPosition` events
    pub fn account_stream(&self) -> Result<mpsc::Receiver<AccountPositionEvent>, ExchangeError> {
        self.subscribe()
    }

    /// `listStatus` events
    pub fn oco_orders_stream(&self) -> Result<mpsc::Receiver<OcoUpdateEvent>, ExchangeError> {
        self.subscribe()
    }

    /// Read one event directly; fails with `StreamBusy` once a sub-stream
    /// has been opened
    pub async fn read(&self) -> Result<AccountEvent, ExchangeError> {
        self.connection.read().await
    }

    /// Close the socket; every sub-stream channel then closes
    pub async fn close(&self) -> Result<(), ExchangeError> {
        self.connection.close().await
    }

    /// Error that ended the reader task
    pub fn last_error(&self) -> Option<ExchangeError> {
        self.connection.last_error()
    }

    fn subscribe<T: Routed>(&self) -> Result<mpsc::Receiver<T>, ExchangeError> {
        let mut subs = self
            .subscribers
            .lock()
            .map_err(|_| ExchangeError::StreamClosed)?;
        if subs.finished {
            return Err(ExchangeError::StreamClosed);
        }
        if !subs.running {
            let events = self.connection.stream()?;
            subs.running = true;
            tokio::spawn(pump(
                events,
                self.connection.finished(),
                Arc::clone(&self.subscribers),
            ));
        }

        let (tx, rx) = mpsc::channel(self.channel_capacity);
        T::subscribers(&mut subs).push(tx);
        Ok(rx)
    }
}

async fn pump(
    mut events: mpsc::Receiver<AccountEvent>,
    mut finished: watch::Receiver<bool>,
    subscribers: SharedSubscribers,
) {
    debug!("User data fan-out started");

    while let Some(event) = events.recv().await {
        let delivered = match event {
            AccountEvent::OrderUpdate(e) => fan_out(&subscribers, e, &mut finished).await,
            AccountEvent::BalanceUpdate(e) => fan_out(&subscribers, e, &mut finished).await,
            AccountEvent::AccountPosition(e) => fan_out(&subscribers, e, &mut finished).await,
            AccountEvent::OcoUpdate(e) => fan_out(&subscribers, e, &mut finished).await,
            AccountEvent::Other { event_type, .. } => {
                trace!(event_type = %event_type, "Account event without subscriber dropped");
                true
            }
        };
        if !delivered {
            debug!("Connection finished while a subscriber was blocked");
            break;
        }
    }

    if let Ok(mut subs) = subscribers.lock() {
        subs.close_all();
    }
    debug!("User data fan-out finished");
}

/// Resolves once the connection stops delivering frames.
async fn wait_finished(finished: &mut watch::Receiver<bool>) {
    loop {
        if *finished.borrow_and_update() {
            return;
        }
        if finished.changed().await.is_err() {
            return;
        }
    }
}

/// Deliver `event` to every subscriber of its type, then prune the ones whose
/// receiver is gone.
///
/// Returns `false` when the connection finished while a send was still
/// waiting on a full subscriber channel.
async fn fan_out<T: Routed>(
    subscribers: &SharedSubscribers,
    event: T,
    finished: &mut watch::Receiver<bool>,
) -> bool {
    let targets: Vec<mpsc::Sender<T>> = match subscribers.lock() {
        Ok(mut subs) => T::subscribers(&mut subs).clone(),
        Err(_) => return false,
    };
    if targets.is_empty() {
        trace!("Account event without subscriber dropped");
        return true;
    }

    let mut pruned = false;
    for target in &targets {
        // a send with free capacity completes before the finished check
        tokio::select! {
            biased;
            sent = target.send(event.clone()) => pruned |= sent.is_err(),
            () = wait_finished(finished) => return false,
        }
    }

    if pruned {
        if let Ok(mut subs) = subscribers.lock() {
            let list = T::subscribers(&mut subs);
            let before = list.len();
            list.retain(|tx| !tx.is_closed());
            debug!(removed = before - list.len(), "Subscriber pruned");
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn client() -> BinanceWsClient {
        BinanceWsClient::new("wss://stream.binance.com:9443/ws")
    }

    #[test]
    fn test_base_url_gets_trailing_slash() {
        assert_eq!(client().base_url(), "wss://stream.binance.com:9443/ws/");
        assert_eq!(
            BinanceWsClient::new("wss://testnet.binance.vision/ws/").base_url(),
            "wss://testnet.binance.vision/ws/"
        );
    }

    #[test]
    fn test_symbol_is_lowercased() {
        assert_eq!(
            client().symbol_url("BNBBTC", endpoints::STREAM_AGG_TRADE).unwrap(),
            "wss://stream.binance.com:9443/ws/bnbbtc@aggTrade"
        );
    }

    #[test]
    fn test_empty_symbol_rejected() {
        assert_eq!(
            client().symbol_url("", endpoints::STREAM_TRADE).unwrap_err(),
            ValidationError::EmptySymbol
        );
    }

    #[rstest]
    #[case(UpdateSpeed::Ms100, "wss://stream.binance.com:9443/ws/ethbtc@depth@100ms")]
    #[case(UpdateSpeed::Ms1000, "wss://stream.binance.com:9443/ws/ethbtc@depth@1000ms")]
    fn test_diff_depth_url(#[case] speed: UpdateSpeed, #[case] expected: &str) {
        assert_eq!(client().diff_depth_url("ETHBTC", speed).unwrap(), expected);
    }

    #[rstest]
    #[case(DepthLevel::Five, "wss://stream.binance.com:9443/ws/ethbtc@depth5@100ms")]
    #[case(DepthLevel::Ten, "wss://stream.binance.com:9443/ws/ethbtc@depth10@100ms")]
    #[case(DepthLevel::Twenty, "wss://stream.binance.com:9443/ws/ethbtc@depth20@100ms")]
    fn test_depth_level_url(#[case] levels: DepthLevel, #[case] expected: &str) {
        assert_eq!(
            client()
                .depth_level_url("ETHBTC", levels, UpdateSpeed::Ms100)
                .unwrap(),
            expected
        );
    }

    #[test]
    fn test_kline_suffix_uses_interval_name() {
        let suffix = format!("{}{}", endpoints::STREAM_KLINE, KlineInterval::OneHour);
        assert_eq!(
            client().symbol_url("BTCUSDT", &suffix).unwrap(),
            "wss://stream.binance.com:9443/ws/btcusdt@kline_1h"
        );
    }

    #[test]
    fn test_rolling_window_urls() {
        assert_eq!(
            client().rolling_window_url("BNBUSDT", "4h").unwrap(),
            "wss://stream.binance.com:9443/ws/bnbusdt@ticker_4h"
        );
        assert_eq!(
            client().all_rolling_window_url("1d").unwrap(),
            "wss://stream.binance.com:9443/ws/!ticker_1d@arr"
        );
    }

    #[rstest]
    #[case("2h")]
    #[case("1m")]
    #[case("")]
    fn test_rolling_window_rejects_unsupported_window(#[case] window: &str) {
        assert_eq!(
            client().all_rolling_window_url(window).unwrap_err(),
            ValidationError::InvalidTickerWindow(window.to_string())
        );
    }

    #[test]
    fn test_all_market_paths() {
        assert_eq!(
            client().url(endpoints::STREAM_ALL_TICKERS),
            "wss://stream.binance.com:9443/ws/!ticker@arr"
        );
        assert_eq!(
            client().url(endpoints::STREAM_ALL_MINI_TICKERS),
            "wss://stream.binance.com:9443/ws/!miniTicker@arr"
        );
    }

    #[tokio::test]
    async fn test_user_data_requires_listen_key() {
        let err = client().user_data("").await.unwrap_err();
        assert_eq!(
            err,
            ExchangeError::Validation(ValidationError::EmptyListenKey)
        );
    }
}
