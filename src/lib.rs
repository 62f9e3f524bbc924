pub mod core;
pub mod exchanges;

pub use self::core::{config::ClientConfig, errors::ExchangeError, errors::ValidationError};
pub use exchanges::binance::{BinanceClient, BinanceWsClient};
