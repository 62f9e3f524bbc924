use binance_api::exchanges::binance::{build_client, DepthRequest};
use binance_api::ClientConfig;
use tracing::{info, warn};
use tracing_subscriber::filter::LevelFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(LevelFilter::INFO)
        .init();

    // Credentials are optional; public endpoints work without them
    let config = ClientConfig::from_env("BINANCE").unwrap_or_else(|e| {
        warn!("No credentials loaded ({}), using public endpoints only", e);
        ClientConfig::read_only()
    });

    let client = build_client(&config)?;

    client.ping().await?;
    let server_time = client.server_time().await?;
    info!(server_time, "Connected to {}", config.rest_url());

    let depth = client
        .depth(&DepthRequest::new("BTCUSDT").with_limit(5))
        .await?;
    for level in &depth.bids {
        info!(price = %level.price, quantity = %level.quantity, "bid");
    }

    if config.has_credentials() {
        let account = client.account().await?;
        info!(balances = account.balances.len(), "Account loaded");
    }

    let usage = client.usage();
    info!(used_weight = ?usage.used_weight, "Rate limit usage");

    Ok(())
}
