use super::ws_types::{
    AccountEvent, AccountPositionEvent, BalanceUpdateEvent, OcoUpdateEvent, OrderUpdateEvent,
};
use crate::core::errors::ExchangeError;
use crate::core::kernel::{JsonCodec, WsCodec};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::borrow::Cow;
use tracing::trace;

/// Discriminator of a user data stream frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccountEventType {
    OrderReport,
    BalanceUpdate,
    AccountPosition,
    OcoReport,
    Other(String),
}

impl AccountEventType {
    const KNOWN: [Self; 4] = [
        Self::OrderReport,
        Self::BalanceUpdate,
        Self::AccountPosition,
        Self::OcoReport,
    ];

    pub fn from_name(name: &str) -> Self {
        match name {
            "executionReport" => Self::OrderReport,
            "balanceUpdate" => Self::BalanceUpdate,
            "outboundAccountPosition" => Self::AccountPosition,
            "listStatus" => Self::OcoReport,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::OrderReport => "executionReport",
            Self::BalanceUpdate => "balanceUpdate",
            Self::AccountPosition => "outboundAccountPosition",
            Self::OcoReport => "listStatus",
            Self::Other(name) => name,
        }
    }
}

const DISCRIMINATOR_PREFIX: &[u8] = br#"{"e":""#;

/// Classify a frame from its leading bytes.
///
/// Matches only when the frame starts exactly with `{"e":"<known name>"`.
/// Anything else, including known events with another field first, returns
/// `None` and needs [`decode_event_type`].
pub fn sniff_event_type(payload: &[u8]) -> Option<AccountEventType> {
    let rest = payload.strip_prefix(DISCRIMINATOR_PREFIX)?;
    AccountEventType::KNOWN.into_iter().find(|kind| {
        rest.strip_prefix(kind.as_str().as_bytes())
            .is_some_and(|tail| tail.first() == Some(&b'"'))
    })
}

#[derive(Deserialize)]
struct Discriminator<'a> {
    #[serde(rename = "e", borrow)]
    event_type: Cow<'a, str>,
}

/// Read the `"e"` field with a full JSON parse
pub fn decode_event_type(payload: &[u8]) -> Result<AccountEventType, ExchangeError> {
    // serde also accepts a struct encoded as a sequence
    let is_object = payload
        .iter()
        .find(|b| !b.is_ascii_whitespace())
        .is_some_and(|b| *b == b'{');
    if !is_object {
        return Err(ExchangeError::IncorrectAccountEventType);
    }

    serde_json::from_slice::<Discriminator<'_>>(payload)
        .map(|d| AccountEventType::from_name(&d.event_type))
        .map_err(|e| {
            trace!(error = %e, "Account event without discriminator");
            ExchangeError::IncorrectAccountEventType
        })
}

/// Sniff first when `fast_path` is set, then fall back to the full decode.
pub fn classify(payload: &[u8], fast_path: bool) -> Result<AccountEventType, ExchangeError> {
    if fast_path {
        if let Some(kind) = sniff_event_type(payload) {
            return Ok(kind);
        }
    }
    decode_event_type(payload)
}

fn decode_as<T: DeserializeOwned + Send + 'static>(payload: &[u8]) -> Result<T, ExchangeError> {
    JsonCodec::<T>::new().decode_message(payload)
}

/// Decoder for the user data stream, where one socket carries every account
/// event type
#[derive(Debug, Clone, Copy)]
pub struct AccountEventCodec {
    fast_path: bool,
}

impl AccountEventCodec {
    pub const fn new() -> Self {
        Self { fast_path: true }
    }

    /// Codec that skips the byte sniff and always parses the discriminator
    pub const fn full_decode() -> Self {
        Self { fast_path: false }
    }

    pub const fn uses_fast_path(&self) -> bool {
        self.fast_path
    }
}

impl Default for AccountEventCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl WsCodec for AccountEventCodec {
    type Message = AccountEvent;

    fn decode_message(&self, payload: &[u8]) -> Result<AccountEvent, ExchangeError> {
        let kind = classify(payload, self.fast_path)?;
        trace!(event_type = kind.as_str(), "Account event received");

        match kind {
            AccountEventType::OrderReport => {
                decode_as::<OrderUpdateEvent>(payload).map(AccountEvent::OrderUpdate)
            }
            AccountEventType::BalanceUpdate => {
                decode_as::<BalanceUpdateEvent>(payload).map(AccountEvent::BalanceUpdate)
            }
            AccountEventType::AccountPosition => {
                decode_as::<AccountPositionEvent>(payload).map(AccountEvent::AccountPosition)
            }
            AccountEventType::OcoReport => {
                decode_as::<OcoUpdateEvent>(payload).map(AccountEvent::OcoUpdate)
            }
            AccountEventType::Other(event_type) => Ok(AccountEvent::Other {
                event_type,
                payload: payload.to_vec(),
            }),
        }
    }
}
