use crate::core::errors::ExchangeError;
use serde::de::DeserializeOwned;
use std::marker::PhantomData;

/// Codec trait for turning data frames into typed messages
///
/// A connection carries exactly one stream, so a codec decodes one schema.
/// Control frames (ping, pong, close) never reach the codec.
pub trait WsCodec: Send + Sync + 'static {
    /// The type representing parsed messages from this stream
    type Message: Send + 'static;

    /// Decode the payload of one text or binary frame
    ///
    /// # Returns
    /// - `Ok(message)` - Successfully decoded message
    /// - `Err(error)` - The frame does not match the schema; this terminates
    ///   a running stream
    fn decode_message(&self, payload: &[u8]) -> Result<Self::Message, ExchangeError>;
}

/// Decodes every frame as JSON into `T`.
pub struct JsonCodec<T> {
    _marker: PhantomData<fn() -> T>,
}

impl<T> JsonCodec<T> {
    pub const fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<T> Default for JsonCodec<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> std::fmt::Debug for JsonCodec<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsonCodec")
            .field("message", &std::any::type_name::<T>())
            .finish()
    }
}

impl<T> WsCodec for JsonCodec<T>
where
    T: DeserializeOwned + Send + 'static,
{
    type Message = T;

    fn decode_message(&self, payload: &[u8]) -> Result<T, ExchangeError> {
        serde_json::from_slice(payload).map_err(|e| {
            ExchangeError::DeserializationError(format!(
                "Failed to decode {}: {}",
                std::any::type_name::<T>(),
                e
            ))
        })
    }
}
