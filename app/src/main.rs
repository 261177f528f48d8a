use std::sync::Arc;

use anyhow::Result;
use common::logger;
use connector::{ConnectorConfig, MarketDataProvider, MockProvider, RestClient};
use datalayer::AssetRegistry;
use dotenvy::dotenv;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    logger::init_logging();

    if mock_enabled() {
        info!("HL_MOCK set, using the offline mock provider");
        run(Arc::new(MockProvider::default())).await
    } else {
        run(Arc::new(RestClient::from_config(&config_from_env()))).await
    }
}

fn mock_enabled() -> bool {
    std::env::var("HL_MOCK").map(|v| v != "0").unwrap_or(false)
}

fn config_from_env() -> ConnectorConfig {
    if std::env::var("HL_TESTNET").map(|v| v != "0").unwrap_or(false) {
        ConnectorConfig::testnet()
    } else if let Ok(api_base) = std::env::var("HL_API_BASE") {
        ConnectorConfig { api_base }
    } else {
        ConnectorConfig::default()
    }
}

async fn run<P: MarketDataProvider>(provider: Arc<P>) -> Result<()> {
    let registry = AssetRegistry::new(provider);
    let summary = registry.refresh().await?;
    info!(
        perps = summary.perp_count,
        perp_dex = summary.perp_dex_count,
        spot = summary.spot_count,
        "asset registry ready"
    );
    for warning in &summary.warnings {
        warn!(?warning, "registry inconsistency");
    }

    let snapshot = registry.snapshot().await;
    for venue in snapshot.venues().iter() {
        info!(
            name = %venue.name,
            index = venue.venue_index,
            offset = venue.offset,
            "venue"
        );
    }

    if let Ok(symbol) = std::env::var("SYMBOL") {
        match registry.resolve_symbol(&symbol).await {
            Ok(asset) => info!(
                %symbol,
                asset_id = asset.asset_id,
                class = %asset.class,
                sz_decimals = asset.sz_decimals,
                px_decimals = asset.px_decimals,
                max_leverage = asset.max_leverage,
                "resolved symbol"
            ),
            Err(err) => warn!(%symbol, ?err, "symbol did not resolve"),
        }
    }
    Ok(())
}
