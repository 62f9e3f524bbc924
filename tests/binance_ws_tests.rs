use binance_api::exchanges::binance::{
    AccountEvent, AccountEventCodec, BinanceWsClient, UpdateSpeed,
};
use binance_api::ExchangeError;
use futures::{SinkExt, StreamExt};
use std::future::Future;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::WebSocketStream;

type ServerSocket = WebSocketStream<TcpStream>;

const TRADE: &str = r#"{"e":"trade","E":1672515782136,"s":"BNBBTC","t":12345,"p":"0.001","q":"100","T":1672515782136,"m":true,"M":true}"#;

const EXECUTION_REPORT: &str = r#"{"e":"executionReport","E":1499405658658,"s":"ETHBTC","c":"mUvoqJxFIILMdfAW5iGSOW","S":"BUY","o":"LIMIT","f":"GTC","q":"1.00000000","p":"0.10264410","P":"0.00000000","F":"0.00000000","g":-1,"C":"","x":"NEW","X":"NEW","r":"NONE","i":4293153,"l":"0.00000000","z":"0.00000000","L":"0.00000000","n":"0","N":null,"T":1499405658657,"t":-1,"I":8641984,"w":true,"m":false,"M":false,"O":1499405658657,"Z":"0.00000000","Y":"0.00000000","Q":"0.00000000"}"#;

const BALANCE_UPDATE: &str =
    r#"{"e":"balanceUpdate","E":1573200697110,"a":"BTC","d":"100.00000000","T":1573200697068}"#;

const ACCOUNT_POSITION: &str = r#"{"e":"outboundAccountPosition","E":1564034571105,"u":1564034571073,"B":[{"a":"ETH","f":"10000.000000","l":"0.000000"}]}"#;

const LISTEN_KEY_EXPIRED: &str = r#"{"e":"listenKeyExpired","E":1576653824250}"#;

/// Accept one connection on a local port and hand it to `handler`.
///
/// Returns the stream base URL and the request path the client asked for.
async fn serve<F, Fut>(handler: F) -> (String, oneshot::Receiver<String>)
where
    F: FnOnce(ServerSocket) -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (path_tx, path_rx) = oneshot::channel();

    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let callback = |req: &Request, resp: Response| -> Result<Response, ErrorResponse> {
            let _ = path_tx.send(req.uri().path().to_string());
            Ok(resp)
        };
        let ws = tokio_tungstenite::accept_hdr_async(stream, callback)
        .await
        .unwrap();
        handler(ws).await;
    });

    (format!("ws://{}/ws/", addr), path_rx)
}

/// Send `frames`, then keep the socket open until the client goes away
async fn send_then_hold(mut ws: ServerSocket, frames: Vec<&'static str>) {
    for frame in frames {
        ws.send(Message::Text(frame.to_string())).await.unwrap();
    }
    while let Some(Ok(_)) = ws.next().await {}
}

/// Send `frames`, then close from the server side
async fn send_then_close(mut ws: ServerSocket, frames: Vec<&'static str>) {
    for frame in frames {
        ws.send(Message::Text(frame.to_string())).await.unwrap();
    }
    let _ = ws.close(None).await;
    while let Some(Ok(_)) = ws.next().await {}
}

const WAIT: Duration = Duration::from_secs(1);

mod market_streams {
    use super::*;

    #[tokio::test]
    async fn test_stream_delivers_decoded_frames() {
        let (url, path) = serve(|ws| send_then_hold(ws, vec![TRADE, TRADE])).await;
        let conn = BinanceWsClient::new(url).trades("BNBBTC").await.unwrap();

        let mut rx = conn.stream().unwrap();
        let first = timeout(WAIT, rx.recv()).await.unwrap().unwrap();
        let second = timeout(WAIT, rx.recv()).await.unwrap().unwrap();

        assert_eq!(first.symbol, "BNBBTC");
        assert_eq!(first.trade_id, 12345);
        assert!(second.is_buyer_maker);
        assert_eq!(path.await.unwrap(), "/ws/bnbbtc@trade");

        conn.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_close_unblocks_pending_stream() {
        let (url, _) = serve(|ws| send_then_hold(ws, vec![])).await;
        let conn = BinanceWsClient::new(url)
            .diff_depth("BTCUSDT", UpdateSpeed::Ms100)
            .await
            .unwrap();
        let mut rx = conn.stream().unwrap();

        // let the reader block on the socket first
        tokio::task::yield_now().await;
        conn.close().await.unwrap();

        assert!(timeout(WAIT, rx.recv()).await.unwrap().is_none());
        assert_eq!(conn.last_error(), Some(ExchangeError::StreamClosed));
        assert!(conn.is_closed());
        assert_eq!(conn.close().await, Err(ExchangeError::StreamClosed));
    }

    #[tokio::test]
    async fn test_only_one_reader_at_a_time() {
        let (url, _) = serve(|ws| send_then_hold(ws, vec![])).await;
        let conn = BinanceWsClient::new(url)
            .individual_book_ticker("BTCUSDT")
            .await
            .unwrap();

        let _rx = conn.stream().unwrap();

        assert_eq!(conn.read().await.unwrap_err(), ExchangeError::StreamBusy);
        assert_eq!(conn.stream().unwrap_err(), ExchangeError::StreamBusy);
        conn.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_schema_mismatch_ends_stream() {
        let (url, _) = serve(|ws| send_then_hold(ws, vec![r#"{"result":null,"id":1}"#])).await;
        let conn = BinanceWsClient::new(url).agg_trades("BTCUSDT").await.unwrap();
        let mut rx = conn.stream().unwrap();

        assert!(timeout(WAIT, rx.recv()).await.unwrap().is_none());
        assert!(matches!(
            conn.last_error(),
            Some(ExchangeError::DeserializationError(_))
        ));
    }

    #[tokio::test]
    async fn test_server_close_ends_stream() {
        let (url, _) = serve(|ws| send_then_close(ws, vec![TRADE])).await;
        let conn = BinanceWsClient::new(url).trades("BNBBTC").await.unwrap();
        let mut rx = conn.stream().unwrap();

        assert!(timeout(WAIT, rx.recv()).await.unwrap().is_some());
        assert!(timeout(WAIT, rx.recv()).await.unwrap().is_none());
        assert_eq!(conn.last_error(), Some(ExchangeError::StreamClosed));
    }

    #[tokio::test]
    async fn test_read_answers_ping() {
        let (pong_tx, pong_rx) = oneshot::channel();
        let (url, _) = serve(|mut ws| async move {
            ws.send(Message::Ping(b"hi".to_vec())).await.unwrap();
            if let Some(Ok(Message::Pong(payload))) = ws.next().await {
                let _ = pong_tx.send(payload);
            }
            send_then_hold(ws, vec![TRADE]).await;
        })
        .await;
        let conn = BinanceWsClient::new(url).trades("BNBBTC").await.unwrap();

        let trade = timeout(WAIT, conn.read()).await.unwrap().unwrap();

        assert_eq!(trade.trade_id, 12345);
        assert_eq!(pong_rx.await.unwrap(), b"hi".to_vec());
        conn.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_all_market_stream_path() {
        let (url, path) = serve(|ws| send_then_hold(ws, vec!["[]"])).await;
        let conn = BinanceWsClient::new(url)
            .all_market_mini_tickers()
            .await
            .unwrap();

        let tickers = timeout(WAIT, conn.read()).await.unwrap().unwrap();

        assert!(tickers.is_empty());
        assert_eq!(path.await.unwrap(), "/ws/!miniTicker@arr");
        conn.close().await.unwrap();
    }
}

mod user_data {
    use super::*;

    #[tokio::test]
    async fn test_events_fan_out_by_type() {
        let (url, path) = serve(|ws| {
            send_then_close(
                ws,
                vec![
                    EXECUTION_REPORT,
                    LISTEN_KEY_EXPIRED,
                    ACCOUNT_POSITION,
                    BALANCE_UPDATE,
                ],
            )
        })
        .await;
        let stream = BinanceWsClient::new(url).user_data("listen-key").await.unwrap();

        let mut orders = stream.orders_stream().unwrap();
        let mut balances = stream.balances_stream().unwrap();

        let order = timeout(WAIT, orders.recv()).await.unwrap().unwrap();
        let balance = timeout(WAIT, balances.recv()).await.unwrap().unwrap();

        assert_eq!(order.order_id, 4_293_153);
        assert_eq!(balance.asset, "BTC");
        assert_eq!(path.await.unwrap(), "/ws/listen-key");

        assert!(timeout(WAIT, orders.recv()).await.unwrap().is_none());
        assert!(timeout(WAIT, balances.recv()).await.unwrap().is_none());
        assert_eq!(
            stream.account_stream().unwrap_err(),
            ExchangeError::StreamClosed
        );
    }

    #[tokio::test]
    async fn test_every_subscriber_of_a_type_gets_the_event() {
        let (url, _) = serve(|ws| send_then_hold(ws, vec![ACCOUNT_POSITION])).await;
        let stream = BinanceWsClient::new(url).user_data("key").await.unwrap();

        let mut first = stream.account_stream().unwrap();
        let mut second = stream.account_stream().unwrap();

        let a = timeout(WAIT, first.recv()).await.unwrap().unwrap();
        let b = timeout(WAIT, second.recv()).await.unwrap().unwrap();
        assert_eq!(a.balances[0].asset, "ETH");
        assert_eq!(b.last_update_time, a.last_update_time);

        stream.close().await.unwrap();
        assert!(timeout(WAIT, first.recv()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_dropped_subscriber_does_not_block_others() {
        let (url, _) =
            serve(|ws| send_then_hold(ws, vec![BALANCE_UPDATE, BALANCE_UPDATE, BALANCE_UPDATE]))
                .await;
        let stream = BinanceWsClient::new(url).user_data("key").await.unwrap();

        let gone = stream.balances_stream().unwrap();
        let mut kept = stream.balances_stream().unwrap();
        drop(gone);

        for _ in 0..3 {
            let event = timeout(WAIT, kept.recv()).await.unwrap().unwrap();
            assert_eq!(event.delta, "100.00000000");
        }
        stream.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_close_with_stalled_subscriber_closes_every_substream() {
        let (url, _) = serve(|ws| send_then_hold(ws, vec![BALANCE_UPDATE; 5])).await;
        let stream = BinanceWsClient::new(url).user_data("key").await.unwrap();

        let mut orders = stream.orders_stream().unwrap();
        // never read, so its channel fills up
        let _balances = stream.balances_stream().unwrap();
        tokio::time::sleep(Duration::from_millis(200)).await;

        stream.close().await.unwrap();

        let closed = timeout(WAIT, orders.recv())
            .await
            .expect("orders sub-stream still open after close()");
        assert!(closed.is_none());
        assert_eq!(
            stream.account_stream().unwrap_err(),
            ExchangeError::StreamClosed
        );
    }

    #[tokio::test]
    async fn test_dropping_stream_with_stalled_subscriber_closes_substreams() {
        let (url, _) = serve(|ws| send_then_hold(ws, vec![BALANCE_UPDATE; 5])).await;
        let stream = BinanceWsClient::new(url).user_data("key").await.unwrap();

        let mut orders = stream.orders_stream().unwrap();
        let _balances = stream.balances_stream().unwrap();
        tokio::time::sleep(Duration::from_millis(200)).await;

        drop(stream);

        assert!(timeout(WAIT, orders.recv()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_unclassifiable_frame_closes_every_substream() {
        let (url, _) = serve(|ws| send_then_hold(ws, vec![r#"[1,2,3]"#])).await;
        let stream = BinanceWsClient::new(url).user_data("key").await.unwrap();

        let mut orders = stream.orders_stream().unwrap();
        let mut oco = stream.oco_orders_stream().unwrap();

        assert!(timeout(WAIT, orders.recv()).await.unwrap().is_none());
        assert!(timeout(WAIT, oco.recv()).await.unwrap().is_none());
        assert_eq!(
            stream.last_error(),
            Some(ExchangeError::IncorrectAccountEventType)
        );
    }

    #[tokio::test]
    async fn test_direct_read_before_fan_out() {
        let (url, _) = serve(|ws| send_then_hold(ws, vec![LISTEN_KEY_EXPIRED])).await;
        let stream = BinanceWsClient::new(url)
            .user_data_with_codec("key", AccountEventCodec::full_decode())
            .await
            .unwrap();

        let event = timeout(WAIT, stream.read()).await.unwrap().unwrap();
        assert!(matches!(
            event,
            AccountEvent::Other { ref event_type, .. } if event_type == "listenKeyExpired"
        ));

        let _orders = stream.orders_stream().unwrap();
        assert_eq!(stream.read().await.unwrap_err(), ExchangeError::StreamBusy);
        stream.close().await.unwrap();
    }
}
