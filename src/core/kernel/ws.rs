use crate::core::errors::ExchangeError;
use crate::core::kernel::codec::WsCodec;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, watch, Mutex};
use tokio_tungstenite::tungstenite::{protocol::Message, Error as WsError};
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, instrument, trace, warn};

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;
type Writer = Arc<Mutex<SplitSink<Socket, Message>>>;
type Reader = SplitStream<Socket>;

/// WebSocket connection settings
#[derive(Debug, Clone)]
pub struct WsConfig {
    /// Connection timeout in milliseconds
    pub connect_timeout_ms: u64,
    /// Capacity of the channel returned by `stream()`; 1 keeps the reader in
    /// lock-step with the consumer
    pub channel_capacity: usize,
}

impl Default for WsConfig {
    fn default() -> Self {
        Self {
            connect_timeout_ms: 10_000,
            channel_capacity: 1,
        }
    }
}

/// One upgraded socket carrying one stream.
///
/// Frames are consumed by exactly one reader at a time: either a `read()` call
/// or the task started by `stream()`. Ping frames are answered by that reader.
/// `close()` (or dropping the connection) wakes a pending reader, which then
/// terminates with [`ExchangeError::StreamClosed`].
pub struct WsConnection<C: WsCodec> {
    url: String,
    codec: Arc<C>,
    writer: Writer,
    reader: Arc<Mutex<Reader>>,
    closed: watch::Sender<bool>,
    finished: Arc<watch::Sender<bool>>,
    last_error: Arc<StdMutex<Option<ExchangeError>>>,
    channel_capacity: usize,
}

impl<C: WsCodec> std::fmt::Debug for WsConnection<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WsConnection")
            .field("url", &self.url)
            .field("closed", &self.is_closed())
            .finish_non_exhaustive()
    }
}

impl<C: WsCodec> WsConnection<C> {
    /// Dial and upgrade `url`
    ///
    /// # Arguments
    /// * `url` - Full stream URL (base + stream path)
    /// * `codec` - Decoder for this stream's single schema
    /// * `config` - Connection settings
    #[instrument(skip(url, codec, config), fields(url = %url))]
    pub async fn connect(url: &str, codec: C, config: &WsConfig) -> Result<Self, ExchangeError> {
        let connect_timeout = Duration::from_millis(config.connect_timeout_ms);

        let (socket, _) = tokio::time::timeout(connect_timeout, connect_async(url))
            .await
            .map_err(|_| {
                ExchangeError::ConnectionTimeout(format!("WebSocket connection to {} timed out", url))
            })?
            .map_err(|e| ExchangeError::NetworkError(format!("WebSocket connection failed: {}", e)))?;

        debug!("WebSocket connected");

        let (write, read) = socket.split();
        let (closed, _) = watch::channel(false);
        let (finished, _) = watch::channel(false);

        Ok(Self {
            url: url.to_string(),
            codec: Arc::new(codec),
            writer: Arc::new(Mutex::new(write)),
            reader: Arc::new(Mutex::new(read)),
            closed,
            finished: Arc::new(finished),
            last_error: Arc::new(StdMutex::new(None)),
            channel_capacity: config.channel_capacity.max(1),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn is_closed(&self) -> bool {
        *self.closed.borrow()
    }

    /// Flips to `true` once the connection is done delivering frames: after
    /// `close()`, or when the `stream()` task stops for any reason.
    pub fn finished(&self) -> watch::Receiver<bool> {
        self.finished.subscribe()
    }

    /// Error that terminated the last `stream()` task, if any
    pub fn last_error(&self) -> Option<ExchangeError> {
        self.last_error.lock().ok().and_then(|slot| slot.clone())
    }

    /// Wait for one data frame and decode it
    ///
    /// Fails with [`ExchangeError::StreamBusy`] while a `stream()` task owns
    /// the socket.
    #[instrument(skip(self), fields(url = %self.url))]
    pub async fn read(&self) -> Result<C::Message, ExchangeError> {
        let mut reader = self
            .reader
            .try_lock()
            .map_err(|_| ExchangeError::StreamBusy)?;
        let mut closed = self.closed.subscribe();

        let payload = next_payload(&mut reader, &self.writer, &mut closed).await?;
        self.codec.decode_message(&payload)
    }

    /// Start the background reader and return its channel
    ///
    /// The task pushes each decoded message and stops at the first read or
    /// decode error, recording it for [`Self::last_error`]. Dropping the
    /// sender closes the returned channel.
    pub fn stream(&self) -> Result<mpsc::Receiver<C::Message>, ExchangeError> {
        let mut reader = Arc::clone(&self.reader)
            .try_lock_owned()
            .map_err(|_| ExchangeError::StreamBusy)?;

        let (tx, rx) = mpsc::channel(self.channel_capacity);
        let writer = Arc::clone(&self.writer);
        let codec = Arc::clone(&self.codec);
        let last_error = Arc::clone(&self.last_error);
        let finished = Arc::clone(&self.finished);
        let mut closed = self.closed.subscribe();
        let url = self.url.clone();

        tokio::spawn(async move {
            debug!(url = %url, "Stream reader started");

            let err = loop {
                let message = match next_payload(&mut reader, &writer, &mut closed).await {
                    Ok(payload) => match codec.decode_message(&payload) {
                        Ok(message) => message,
                        Err(e) => break e,
                    },
                    Err(e) => break e,
                };

                tokio::select! {
                    biased;
                    _ = closed.changed() => break ExchangeError::StreamClosed,
                    sent = tx.send(message) => {
                        if sent.is_err() {
                            break ExchangeError::StreamClosed;
                        }
                    }
                }
            };

            debug!(url = %url, error = %err, "Stream reader finished");
            if let Ok(mut slot) = last_error.lock() {
                *slot = Some(err);
            }
            finished.send_replace(true);
        });

        Ok(rx)
    }

    /// Close the socket and stop any pending reader
    ///
    /// A second call returns [`ExchangeError::StreamClosed`].
    #[instrument(skip(self), fields(url = %self.url))]
    pub async fn close(&self) -> Result<(), ExchangeError> {
        if self.closed.send_replace(true) {
            return Err(ExchangeError::StreamClosed);
        }
        self.finished.send_replace(true);

        let mut writer = self.writer.lock().await;
        match writer.close().await {
            Ok(()) | Err(WsError::ConnectionClosed | WsError::AlreadyClosed) => Ok(()),
            Err(e) => Err(ExchangeError::WebSocketError(format!(
                "Failed to close WebSocket: {}",
                e
            ))),
        }
    }
}

/// Read until the next data frame, answering pings on the way.
async fn next_payload(
    reader: &mut Reader,
    writer: &Writer,
    closed: &mut watch::Receiver<bool>,
) -> Result<Vec<u8>, ExchangeError> {
    loop {
        if *closed.borrow() {
            return Err(ExchangeError::StreamClosed);
        }

        let frame = tokio::select! {
            biased;
            _ = closed.changed() => return Err(ExchangeError::StreamClosed),
            frame = reader.next() => frame,
        };

        match frame {
            Some(Ok(Message::Text(text))) => return Ok(text.into_bytes()),
            Some(Ok(Message::Binary(data))) => return Ok(data),
            Some(Ok(Message::Ping(data))) => {
                trace!("Ping received");
                if let Err(e) = writer.lock().await.send(Message::Pong(data)).await {
                    warn!("Failed to send pong response: {}", e);
                }
            }
            Some(Ok(Message::Pong(_) | Message::Frame(_))) => {}
            Some(Ok(Message::Close(frame))) => {
                debug!(?frame, "Close frame received");
                return Err(ExchangeError::StreamClosed);
            }
            Some(Err(e)) => {
                return Err(ExchangeError::WebSocketError(format!("WebSocket error: {}", e)))
            }
            None => return Err(ExchangeError::StreamClosed),
        }
    }
}
