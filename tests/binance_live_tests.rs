//! Tests against the public Binance testnet.
//!
//! Skipped unless `RUN_INTEGRATION_TESTS=true`; account tests additionally
//! need `BINANCE_TESTNET_API_KEY` and `BINANCE_TESTNET_SECRET_KEY`.

use binance_api::exchanges::binance::{
    build_client, build_ws_client, BinanceClient, DepthRequest, KlineInterval, KlinesRequest,
};
use binance_api::ClientConfig;
use std::env;
use std::time::Duration;
use tokio::time::timeout;

const TEST_TIMEOUT: Duration = Duration::from_secs(30);

fn should_run_integration_tests() -> bool {
    env::var("RUN_INTEGRATION_TESTS").unwrap_or_default() == "true"
}

fn public_client() -> BinanceClient {
    build_client(&ClientConfig::read_only().testnet(true)).unwrap()
}

/// Testnet credentials from the environment, if present
fn credentials() -> Option<ClientConfig> {
    ClientConfig::from_env("BINANCE_TESTNET")
        .ok()
        .map(|config| config.testnet(true))
}

#[tokio::test]
async fn test_server_time_is_recent() {
    if !should_run_integration_tests() {
        println!("⚠️ Skipping live test (set RUN_INTEGRATION_TESTS=true)");
        return;
    }
    let client = public_client();

    match timeout(TEST_TIMEOUT, client.server_time()).await {
        Ok(Ok(server_time)) => {
            let local = chrono::Utc::now().timestamp_millis();
            assert!((server_time - local).abs() < 60_000, "clock skew over a minute");
            println!("✅ Server time: {}", server_time);
        }
        Ok(Err(e)) => panic!("❌ Failed to fetch server time: {}", e),
        Err(_) => panic!("❌ Timeout occurred while fetching server time"),
    }
    assert!(client.usage().used_weight.contains_key("1m"));
}

#[tokio::test]
async fn test_depth_and_klines() {
    if !should_run_integration_tests() {
        return;
    }
    let client = public_client();

    let depth = timeout(
        TEST_TIMEOUT,
        client.depth(&DepthRequest::new("BTCUSDT").with_limit(5)),
    )
    .await
    .expect("timeout")
    .unwrap();
    assert!(depth.bids.len() <= 5);

    let request = KlinesRequest {
        limit: Some(3),
        ..KlinesRequest::new("BTCUSDT", KlineInterval::OneMinute)
    };
    let klines = timeout(TEST_TIMEOUT, client.klines(&request))
        .await
        .expect("timeout")
        .unwrap();
    assert_eq!(klines.len(), 3);
    println!("✅ Last close: {}", klines[2].close);
}

#[tokio::test]
async fn test_book_ticker_stream() {
    if !should_run_integration_tests() {
        return;
    }
    let ws = build_ws_client(&ClientConfig::read_only().testnet(true));
    let conn = timeout(TEST_TIMEOUT, ws.individual_book_ticker("BTCUSDT"))
        .await
        .expect("timeout")
        .unwrap();

    let update = timeout(TEST_TIMEOUT, conn.read())
        .await
        .expect("no book ticker within timeout")
        .unwrap();
    assert_eq!(update.symbol, "BTCUSDT");
    println!("✅ Best bid {} / ask {}", update.bid_price, update.ask_price);

    conn.close().await.unwrap();
}

#[tokio::test]
async fn test_account_and_listen_key() {
    if !should_run_integration_tests() {
        return;
    }
    let Some(config) = credentials() else {
        println!("⚠️ Skipping account test: no testnet credentials");
        return;
    };
    let client = build_client(&config).unwrap();

    let account = timeout(TEST_TIMEOUT, client.account())
        .await
        .expect("timeout")
        .unwrap();
    println!("✅ {} balances", account.balances.len());

    let key = client.create_listen_key().await.unwrap();
    client.keep_alive_listen_key(&key).await.unwrap();

    let stream = build_ws_client(&config).user_data(&key).await.unwrap();
    let _orders = stream.orders_stream().unwrap();
    stream.close().await.unwrap();

    client.close_listen_key(&key).await.unwrap();
}
