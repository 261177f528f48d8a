use async_trait::async_trait;

use common::CandleInterval;

use crate::rest::RestError;
use crate::types::{CandleEntry, PerpDexEntry, PerpMetaResponse, SpotMetaResponse};

/// The market-metadata/market-data collaborator everything above the
/// transport consumes.
///
/// `fetch_candles` is subject to the venue's per-request bar cap
/// (`common::constant::CANDLE_SNAPSHOT_CAP`); both time bounds are
/// inclusive at bar-open granularity.
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Raw venue listing. Position 0 is `None` for the implicit primary
    /// venue and must be skipped when assigning offsets.
    async fn fetch_venue_list(&self) -> Result<Vec<Option<PerpDexEntry>>, RestError>;

    /// Perp universe for one venue; `None` selects the primary venue.
    async fn fetch_perp_listing(&self, venue: Option<&str>)
        -> Result<PerpMetaResponse, RestError>;

    /// Spot token and pair tables.
    async fn fetch_spot_meta(&self) -> Result<SpotMetaResponse, RestError>;

    /// Candles for `coin` with `open_time` in `[start_time, end_time]`,
    /// ascending, truncated at the cap.
    async fn fetch_candles(
        &self,
        coin: &str,
        interval: CandleInterval,
        start_time: i64,
        end_time: i64,
    ) -> Result<Vec<CandleEntry>, RestError>;
}
