//! REST paths and stream path fragments.

// Public market data
pub const PING: &str = "/api/v3/ping";
pub const TIME: &str = "/api/v3/time";
pub const EXCHANGE_INFO: &str = "/api/v3/exchangeInfo";
pub const DEPTH: &str = "/api/v3/depth";
pub const TRADES: &str = "/api/v3/trades";
pub const HISTORICAL_TRADES: &str = "/api/v3/historicalTrades";
pub const AGG_TRADES: &str = "/api/v3/aggTrades";
pub const KLINES: &str = "/api/v3/klines";
pub const UI_KLINES: &str = "/api/v3/uiKlines";
pub const AVG_PRICE: &str = "/api/v3/avgPrice";
pub const TICKER: &str = "/api/v3/ticker";
pub const TICKER_24H: &str = "/api/v3/ticker/24hr";
pub const TICKER_PRICE: &str = "/api/v3/ticker/price";
pub const TICKER_BOOK: &str = "/api/v3/ticker/bookTicker";

// Signed
pub const ORDER: &str = "/api/v3/order";
pub const ORDER_TEST: &str = "/api/v3/order/test";
pub const CANCEL_REPLACE: &str = "/api/v3/order/cancelReplace";
pub const OPEN_ORDERS: &str = "/api/v3/openOrders";
pub const ALL_ORDERS: &str = "/api/v3/allOrders";
pub const OCO_ORDER: &str = "/api/v3/order/oco";
pub const ORDER_LIST: &str = "/api/v3/orderList";
pub const ALL_ORDER_LIST: &str = "/api/v3/allOrderList";
pub const OPEN_ORDER_LIST: &str = "/api/v3/openOrderList";
pub const ACCOUNT: &str = "/api/v3/account";
pub const MY_TRADES: &str = "/api/v3/myTrades";
pub const RATE_LIMIT_ORDER: &str = "/api/v3/rateLimit/order";
pub const MY_PREVENTED_MATCHES: &str = "/api/v3/myPreventedMatches";

// API key only
pub const USER_DATA_STREAM: &str = "/api/v3/userDataStream";

// Stream suffixes, appended to a lowercased symbol
pub const STREAM_DEPTH: &str = "@depth";
pub const STREAM_TICKER: &str = "@ticker";
pub const STREAM_WINDOW_TICKER: &str = "@ticker_";
pub const STREAM_MINI_TICKER: &str = "@miniTicker";
pub const STREAM_BOOK_TICKER: &str = "@bookTicker";
pub const STREAM_KLINE: &str = "@kline_";
pub const STREAM_AGG_TRADE: &str = "@aggTrade";
pub const STREAM_TRADE: &str = "@trade";

// All-market streams
pub const STREAM_ALL_TICKERS: &str = "!ticker@arr";
pub const STREAM_ALL_WINDOW_TICKERS: &str = "!ticker_";
pub const STREAM_ALL_MINI_TICKERS: &str = "!miniTicker@arr";
pub const STREAM_ARRAY: &str = "@arr";
