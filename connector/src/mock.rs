use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};

use async_trait::async_trait;
use rand::{rngs::StdRng, Rng, SeedableRng};

use common::constant::CANDLE_SNAPSHOT_CAP;
use common::CandleInterval;

use crate::provider::MarketDataProvider;
use crate::rest::RestError;
use crate::types::{
    CandleEntry, PerpDexEntry, PerpMetaResponse, PerpUniverseEntry, SpotMetaResponse,
    SpotPairEntry, SpotTokenEntry,
};

/// Every seventh bar is a zero-trade carried-forward bar.
const SYNTHETIC_STRIDE: u64 = 7;

/// Deterministic offline provider: a small fixed universe plus seeded
/// random-walk candles, so demos and tests run without network access.
///
/// Candle values depend only on `(seed, coin, bar open)`, never on the
/// requested window, so pagination slices always agree with each other.
pub struct MockProvider {
    seed: u64,
    venues: Vec<Option<PerpDexEntry>>,
    primary: Vec<PerpUniverseEntry>,
    deployed: HashMap<String, Vec<PerpUniverseEntry>>,
    spot: (Vec<SpotTokenEntry>, Vec<SpotPairEntry>),
    history_start: i64,
    history_end: i64,
}

impl MockProvider {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            venues: default_venues(),
            primary: default_primary_universe(),
            deployed: default_deployed_universes(),
            spot: default_spot_meta(),
            history_start: 1_600_000_000_000,
            history_end: 1_900_000_000_000,
        }
    }

    /// Restrict the span of available candle history. Requests outside it
    /// return empty batches, like a listing-date boundary on the venue.
    pub fn with_history_range(mut self, start_ms: i64, end_ms: i64) -> Self {
        self.history_start = start_ms;
        self.history_end = end_ms;
        self
    }

    fn bar_rng(&self, coin: &str, bar_open: i64) -> StdRng {
        let mut hasher = DefaultHasher::new();
        self.seed.hash(&mut hasher);
        coin.hash(&mut hasher);
        bar_open.hash(&mut hasher);
        StdRng::seed_from_u64(hasher.finish())
    }

    fn base_price(&self, coin: &str) -> f64 {
        let mut hasher = DefaultHasher::new();
        coin.hash(&mut hasher);
        (hasher.finish() % 90_000 + 10_000) as f64 / 10.0
    }

    fn is_synthetic_bar(&self, coin: &str, bar_open: i64) -> bool {
        self.bar_rng(coin, bar_open).gen_range(0..SYNTHETIC_STRIDE) == 0
    }

    /// Close of the bar at `bar_open`; synthetic bars repeat the close of
    /// the nearest earlier traded bar.
    fn close_at(&self, coin: &str, bar_open: i64, step: i64) -> f64 {
        let mut open = bar_open;
        while self.is_synthetic_bar(coin, open) && open > self.history_start {
            open -= step;
        }
        let mut rng = self.bar_rng(coin, open);
        // second draw: the first decided the synthetic stride slot
        let _ = rng.gen_range(0..SYNTHETIC_STRIDE);
        self.base_price(coin) * (1.0 + 0.1 * (rng.gen::<f64>() - 0.5))
    }

    fn candle_at(&self, coin: &str, bar_open: i64, step: i64) -> CandleEntry {
        let close = self.close_at(coin, bar_open, step);
        let prev_close = self.close_at(coin, bar_open - step, step);
        if self.is_synthetic_bar(coin, bar_open) {
            return CandleEntry {
                open_time: bar_open,
                close_time: bar_open + step,
                open: format!("{prev_close:.6}"),
                high: format!("{prev_close:.6}"),
                low: format!("{prev_close:.6}"),
                close: format!("{prev_close:.6}"),
                volume: "0.0".to_string(),
                trade_count: 0,
            };
        }
        let mut rng = self.bar_rng(coin, bar_open);
        let _ = rng.gen_range(0..SYNTHETIC_STRIDE);
        let _ = rng.gen::<f64>();
        let high = close.max(prev_close) * (1.0 + 0.01 * rng.gen::<f64>());
        let low = close.min(prev_close) * (1.0 - 0.01 * rng.gen::<f64>());
        CandleEntry {
            open_time: bar_open,
            close_time: bar_open + step,
            open: format!("{prev_close:.6}"),
            high: format!("{high:.6}"),
            low: format!("{low:.6}"),
            close: format!("{close:.6}"),
            volume: format!("{:.4}", rng.gen::<f64>() * 100.0),
            trade_count: rng.gen_range(1..50),
        }
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new(7)
    }
}

#[async_trait]
impl MarketDataProvider for MockProvider {
    async fn fetch_venue_list(&self) -> Result<Vec<Option<PerpDexEntry>>, RestError> {
        Ok(self.venues.clone())
    }

    async fn fetch_perp_listing(
        &self,
        venue: Option<&str>,
    ) -> Result<PerpMetaResponse, RestError> {
        let universe = match venue {
            None => self.primary.clone(),
            Some(dex) => self
                .deployed
                .get(dex)
                .cloned()
                .ok_or(RestError::InvalidPayload("unknown venue"))?,
        };
        Ok(PerpMetaResponse { universe })
    }

    async fn fetch_spot_meta(&self) -> Result<SpotMetaResponse, RestError> {
        Ok(SpotMetaResponse {
            tokens: self.spot.0.clone(),
            universe: self.spot.1.clone(),
        })
    }

    async fn fetch_candles(
        &self,
        coin: &str,
        interval: CandleInterval,
        start_time: i64,
        end_time: i64,
    ) -> Result<Vec<CandleEntry>, RestError> {
        let step = interval.millis();
        let first = start_time.max(self.history_start);
        let first = first.div_euclid(step) * step + if first % step == 0 { 0 } else { step };
        let last = end_time.min(self.history_end);

        let mut batch = Vec::new();
        let mut open = first;
        while open <= last && batch.len() < CANDLE_SNAPSHOT_CAP {
            batch.push(self.candle_at(coin, open, step));
            open += step;
        }
        Ok(batch)
    }
}

fn default_venues() -> Vec<Option<PerpDexEntry>> {
    vec![
        None,
        Some(PerpDexEntry {
            name: "xyz".to_string(),
            full_name: "XYZ Markets".to_string(),
        }),
    ]
}

fn default_primary_universe() -> Vec<PerpUniverseEntry> {
    vec![
        perp_entry("BTC", 5, 50, None),
        perp_entry("ETH", 4, 50, None),
        perp_entry("DOGE", 0, 10, None),
    ]
}

fn default_deployed_universes() -> HashMap<String, Vec<PerpUniverseEntry>> {
    let mut map = HashMap::new();
    // The deployed-venue listing reproduces the upstream defect of shipping
    // a hardcoded zero price precision; the registry is expected to flag it.
    map.insert(
        "xyz".to_string(),
        vec![
            perp_entry("xyz:TSLA", 2, 20, Some(0)),
            perp_entry("xyz:GOLD", 1, 20, None),
        ],
    );
    map
}

fn default_spot_meta() -> (Vec<SpotTokenEntry>, Vec<SpotPairEntry>) {
    let tokens = vec![
        spot_token("USDC", 0, 8, 8, true),
        spot_token("PURR", 1, 0, 5, true),
        spot_token("JEFF", 2, 2, 6, false),
    ];
    let pairs = vec![
        SpotPairEntry {
            name: "PURR/USDC".to_string(),
            index: 0,
            tokens: vec![1, 0],
            is_canonical: true,
        },
        SpotPairEntry {
            name: "@1".to_string(),
            index: 1,
            tokens: vec![2, 0],
            is_canonical: false,
        },
    ];
    (tokens, pairs)
}

fn perp_entry(
    name: &str,
    sz_decimals: i64,
    max_leverage: u32,
    px_decimals: Option<i64>,
) -> PerpUniverseEntry {
    PerpUniverseEntry {
        name: name.to_string(),
        sz_decimals,
        max_leverage,
        is_delisted: false,
        only_isolated: false,
        px_decimals,
    }
}

fn spot_token(
    name: &str,
    index: u32,
    sz_decimals: i64,
    wei_decimals: u32,
    is_canonical: bool,
) -> SpotTokenEntry {
    SpotTokenEntry {
        name: name.to_string(),
        index,
        sz_decimals,
        wei_decimals,
        is_canonical,
        token_id: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn candles_are_window_independent() {
        let provider = MockProvider::new(1);
        let step = CandleInterval::M1.millis();
        let start = 1_700_000_000_000i64.div_euclid(step) * step;
        let end = start + 99 * step;

        let whole = provider
            .fetch_candles("BTC", CandleInterval::M1, start, end)
            .await
            .unwrap();
        let head = provider
            .fetch_candles("BTC", CandleInterval::M1, start, start + 49 * step)
            .await
            .unwrap();
        let tail = provider
            .fetch_candles("BTC", CandleInterval::M1, start + 50 * step, end)
            .await
            .unwrap();

        assert_eq!(whole.len(), 100);
        assert_eq!(head.len(), 50);
        assert_eq!(tail.len(), 50);
        assert_eq!(whole[49].close, head[49].close);
        assert_eq!(whole[50].close, tail[0].close);
    }

    #[tokio::test]
    async fn synthetic_bars_carry_the_previous_close() {
        let provider = MockProvider::new(1);
        let step = CandleInterval::M1.millis();
        let start = 1_700_000_000_000i64.div_euclid(step) * step;
        let batch = provider
            .fetch_candles("BTC", CandleInterval::M1, start, start + 499 * step)
            .await
            .unwrap();

        let synthetic: Vec<_> = batch.iter().filter(|c| c.trade_count == 0).collect();
        assert!(!synthetic.is_empty(), "seeded stream should contain n=0 bars");
        for bar in synthetic {
            assert_eq!(bar.open, bar.close);
            assert_eq!(bar.high, bar.low);
            assert_eq!(bar.volume, "0.0");
        }
    }

    #[tokio::test]
    async fn respects_the_per_request_cap() {
        let provider = MockProvider::new(1);
        let step = CandleInterval::M1.millis();
        let start = 1_700_000_000_000i64.div_euclid(step) * step;
        let batch = provider
            .fetch_candles("BTC", CandleInterval::M1, start, start + 7000 * step)
            .await
            .unwrap();
        assert_eq!(batch.len(), CANDLE_SNAPSHOT_CAP);
    }

    #[tokio::test]
    async fn empty_outside_history_range() {
        let provider = MockProvider::new(1).with_history_range(1_000, 2_000);
        let batch = provider
            .fetch_candles("BTC", CandleInterval::M1, 1_700_000_000_000, 1_700_000_600_000)
            .await
            .unwrap();
        assert!(batch.is_empty());
    }
}
