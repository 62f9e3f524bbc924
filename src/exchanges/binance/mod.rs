pub mod account;
pub mod builder;
pub mod client;
pub mod codec;
pub mod endpoints;
pub mod market_data;
pub mod oco;
pub mod requests;
pub mod trading;
pub mod types;
pub mod websocket;
pub mod ws_types;

// Re-export main types for easier importing
pub use builder::{build_client, build_ws_client};
pub use client::BinanceClient;
pub use codec::{AccountEventCodec, AccountEventType};
pub use requests::{
    AccountTradesRequest, AggTradesRequest, AllOcoRequest, AllOrdersRequest, CancelOcoRequest,
    CancelOrderRequest, CancelReplaceRequest, DepthRequest, ExchangeInfoRequest,
    HistoricalTradesRequest, KlinesRequest, NewOcoRequest, OrderRequest, PreventedMatchesRequest,
    QueryOcoRequest, QueryOrderRequest, TradesRequest,
};
pub use types::{
    CancelReplaceMode, ExecutionType, KlineInterval, OrderRespType, OrderSide, OrderStatus,
    OrderType, SelfTradePreventionMode, TimeInForce,
};
pub use websocket::{BinanceWsClient, UserDataStream};
pub use ws_types::{AccountEvent, DepthLevel, UpdateSpeed};
