use thiserror::Error;

/// Every failure a client call or stream can surface.
///
/// The enum is `Clone` so a stream's terminal error can be recorded on the
/// connection and still be handed to whoever asks for it later.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExchangeError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Encoding error: {0}")]
    EncodingError(String),

    #[error("Signing error: {0}")]
    SigningError(String),

    #[error("Authentication error: {0}")]
    AuthError(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Connection timeout: {0}")]
    ConnectionTimeout(String),

    #[error("API error: {code} - {message}")]
    ApiError { code: i64, message: String },

    #[error("Malformed error body (HTTP {status}): {body}")]
    MalformedErrorBody { status: u16, body: String },

    #[error("Deserialization error: {0}")]
    DeserializationError(String),

    #[error("Configuration error: {0}")]
    ConfigError(#[from] crate::core::config::ConfigError),

    #[error("WebSocket error: {0}")]
    WebSocketError(String),

    #[error("cannot determine account event type")]
    IncorrectAccountEventType,

    #[error("stream closed")]
    StreamClosed,

    #[error("stream already has an active reader")]
    StreamBusy,
}

impl ExchangeError {
    /// True when the exchange itself rejected the request.
    pub fn is_api_error(&self) -> bool {
        matches!(self, Self::ApiError { .. })
    }

    /// Exchange error code, if this is an API rejection.
    pub fn api_code(&self) -> Option<i64> {
        match self {
            Self::ApiError { code, .. } => Some(*code),
            _ => None,
        }
    }
}

/// Caller input rejected before anything touches the network.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("symbol is empty")]
    EmptySymbol,

    #[error("symbols list is empty")]
    EmptySymbols,

    #[error("either orderId or origClientOrderId must be set")]
    EmptyOrderId,

    #[error("either orderListId or listClientOrderId must be set")]
    EmptyOrderListId,

    #[error("quantity is empty")]
    EmptyQuantity,

    #[error("price is empty")]
    EmptyPrice,

    #[error("stopPrice or trailingDelta must be set")]
    EmptyStopPrice,

    #[error("listen key is empty")]
    EmptyListenKey,

    #[error("strategyType {0} is below the minimum of 1000000")]
    MinStrategyType(i64),

    #[error("invalid ticker window size: {0}")]
    InvalidTickerWindow(String),
}
