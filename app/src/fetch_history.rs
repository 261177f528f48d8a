use std::sync::Arc;

use anyhow::{anyhow, Result};
use common::constant::{DEFAULT_LOOKBACK_HOURS, DEFAULT_SYMBOL};
use common::{logger, CandleInterval};
use connector::{ConnectorConfig, MarketDataProvider, MockProvider, RestClient};
use dotenvy::dotenv;
use engine::{CancelFlag, HistoryService};
use tracing::{info, warn};
use utils::time::{align_to_interval, rolling_window_hours};

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    logger::init_logging();

    if std::env::var("HL_MOCK").map(|v| v != "0").unwrap_or(false) {
        info!("HL_MOCK set, using the offline mock provider");
        run(Arc::new(MockProvider::default())).await
    } else {
        run(Arc::new(RestClient::from_config(&config_from_env()))).await
    }
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
    let symbol = std::env::var("SYMBOL").unwrap_or_else(|_| DEFAULT_SYMBOL.to_string());
    let interval = match std::env::var("INTERVAL") {
        Ok(raw) => {
            CandleInterval::parse(&raw).ok_or_else(|| anyhow!("unsupported interval '{raw}'"))?
        }
        Err(_) => CandleInterval::H1,
    };
    let lookback_hours = std::env::var("LOOKBACK_HOURS")
        .ok()
        .and_then(|raw| raw.parse::<i64>().ok())
        .unwrap_or(DEFAULT_LOOKBACK_HOURS);

    let service = HistoryService::new(provider);
    let summary = service.registry().refresh().await?;
    for warning in &summary.warnings {
        warn!(?warning, "registry inconsistency");
    }

    let (start, end) = rolling_window_hours(lookback_hours);
    let start = align_to_interval(start, interval);
    let end = align_to_interval(end, interval);

    let history = service
        .fetch_symbol_history(&symbol, interval, start, end, &CancelFlag::new())
        .await?;

    info!(
        %symbol,
        coin = %history.coin,
        %interval,
        candles = history.candles.len(),
        gaps = history.gaps.len(),
        synthetic = history.synthetic_count,
        status = ?history.status,
        "history fetched"
    );
    for gap in &history.gaps {
        warn!(
            from = gap.from_time,
            to = gap.to_time,
            missing = gap.missing,
            "series gap"
        );
    }
    for warning in &history.warnings {
        warn!(?warning, "history warning");
    }
    if let (Some(first), Some(last)) = (history.candles.first(), history.candles.last()) {
        info!(
            first_open = first.open_time,
            last_open = last.open_time,
            last_close_px = last.close,
            "series bounds"
        );
    }
    Ok(())
}
