use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use futures_util::future::try_join_all;
use tokio::sync::{Mutex, RwLock};
use tracing::{info, warn};

use common::constant::{PERP_DEX_OFFSET_BASE, PERP_DEX_OFFSET_STRIDE, SPOT_ASSET_OFFSET};
use common::{
    now_ms, resolve_px_decimals, AssetClass, AssetInfo, PrecisionError, SpotPair, SpotToken,
};
use connector::{
    MarketDataProvider, PerpUniverseEntry, RestError, SpotMetaResponse, SpotTokenEntry,
};

use crate::symbology;
use crate::venues::VenueCatalog;

/// Leverage assumed when a primary listing omits `maxLeverage`.
const DEFAULT_PERP_LEVERAGE: u32 = 50;
/// Leverage assumed when a deployed-venue listing omits `maxLeverage`.
const DEFAULT_PERP_DEX_LEVERAGE: u32 = 20;

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("provider error: {0}")]
    Provider(#[from] RestError),
    #[error("unknown asset id {0}")]
    UnknownAsset(u32),
    #[error("cannot resolve symbol '{0}'")]
    SymbolResolution(String),
    #[error("asset id collision at {id} between '{existing}' and '{incoming}'")]
    AssetIdCollision {
        id: u32,
        existing: String,
        incoming: String,
    },
    #[error("{class} listing index {index} exceeds its id range")]
    IndexOutOfRange { class: AssetClass, index: u32 },
    #[error("invalid listing entry for '{coin}': {source}")]
    InvalidListing {
        coin: String,
        #[source]
        source: PrecisionError,
    },
}

/// Non-fatal inconsistencies found while rebuilding the registry. They ride
/// on the [`RefreshSummary`] so callers can inspect them programmatically.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RefreshWarning {
    /// The venue listing repeated a name; the first occurrence wins.
    DuplicateVenue { name: String },
    /// A listing carried a price precision that disagrees with the
    /// recomputation; the recomputed value wins.
    PrecisionMismatch {
        coin: String,
        listed: i64,
        computed: u32,
    },
}

/// Outcome of one registry refresh.
#[derive(Clone, Debug, Default)]
pub struct RefreshSummary {
    pub perp_count: usize,
    pub perp_dex_count: usize,
    pub spot_count: usize,
    pub warnings: Vec<RefreshWarning>,
}

/// One immutable build of the asset table. Readers hold an `Arc` to it and
/// are unaffected by later refreshes.
#[derive(Debug, Default)]
pub struct RegistrySnapshot {
    pub built_at_ms: i64,
    assets: HashMap<u32, AssetInfo>,
    by_wire: HashMap<String, u32>,
    tokens: HashMap<u32, SpotToken>,
    pairs: HashMap<u32, SpotPair>,
    venues: VenueCatalog,
}

impl RegistrySnapshot {
    pub fn get(&self, asset_id: u32) -> Option<&AssetInfo> {
        self.assets.get(&asset_id)
    }

    /// Lookup by exact wire coin string (`"BTC"`, `"xyz:TSLA"`,
    /// `"PURR/USDC"`, `"@1"`).
    pub fn by_wire(&self, coin: &str) -> Option<&AssetInfo> {
        self.by_wire.get(coin).and_then(|id| self.assets.get(id))
    }

    pub fn assets(&self) -> impl Iterator<Item = &AssetInfo> {
        self.assets.values()
    }

    pub fn venues(&self) -> &VenueCatalog {
        &self.venues
    }

    pub fn token(&self, index: u32) -> Option<&SpotToken> {
        self.tokens.get(&index)
    }

    pub fn pair(&self, index: u32) -> Option<&SpotPair> {
        self.pairs.get(&index)
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }
}

/// The unified asset table across the primary venue, deployed perp venues
/// and the spot market.
///
/// Refresh rebuilds the table wholesale and publishes it atomically; the
/// prior snapshot stays visible to readers until the new one is complete,
/// and stays in effect if the rebuild fails.
pub struct AssetRegistry<P> {
    provider: Arc<P>,
    snapshot: RwLock<Arc<RegistrySnapshot>>,
    refresh_lock: Mutex<()>,
    epoch: AtomicU64,
    last_summary: RwLock<RefreshSummary>,
}

impl<P: MarketDataProvider> AssetRegistry<P> {
    pub fn new(provider: Arc<P>) -> Self {
        Self {
            provider,
            snapshot: RwLock::new(Arc::new(RegistrySnapshot::default())),
            refresh_lock: Mutex::new(()),
            epoch: AtomicU64::new(0),
            last_summary: RwLock::new(RefreshSummary::default()),
        }
    }

    /// Current snapshot; empty until the first successful refresh.
    pub async fn snapshot(&self) -> Arc<RegistrySnapshot> {
        self.snapshot.read().await.clone()
    }

    /// Rebuild the asset table. Single-flight: a caller that arrives while
    /// another refresh is in flight waits for it and adopts its outcome
    /// instead of fetching again.
    pub async fn refresh(&self) -> Result<RefreshSummary, RegistryError> {
        let epoch_before = self.epoch.load(Ordering::SeqCst);
        let _guard = self.refresh_lock.lock().await;
        if self.epoch.load(Ordering::SeqCst) != epoch_before {
            return Ok(self.last_summary.read().await.clone());
        }

        let (snapshot, summary) = self.build_snapshot().await?;
        *self.snapshot.write().await = Arc::new(snapshot);
        *self.last_summary.write().await = summary.clone();
        self.epoch.fetch_add(1, Ordering::SeqCst);

        info!(
            perps = summary.perp_count,
            perp_dex = summary.perp_dex_count,
            spot = summary.spot_count,
            warnings = summary.warnings.len(),
            "asset registry refreshed"
        );
        Ok(summary)
    }

    pub async fn lookup(&self, asset_id: u32) -> Result<AssetInfo, RegistryError> {
        self.snapshot()
            .await
            .get(asset_id)
            .cloned()
            .ok_or(RegistryError::UnknownAsset(asset_id))
    }

    /// Resolve a human symbol: direct coin name for primary perps,
    /// `venue:coin` for deployed venues, canonical pair name or `@index`
    /// for spot.
    pub async fn resolve_symbol(&self, symbol: &str) -> Result<AssetInfo, RegistryError> {
        let snapshot = self.snapshot().await;
        symbology::decode(&snapshot, symbol)
            .cloned()
            .ok_or_else(|| RegistryError::SymbolResolution(symbol.to_string()))
    }

    async fn build_snapshot(
        &self,
    ) -> Result<(RegistrySnapshot, RefreshSummary), RegistryError> {
        let mut warnings = Vec::new();

        let venue_list = self.provider.fetch_venue_list().await?;
        let venues = VenueCatalog::build(&venue_list, &mut warnings);

        let primary = self.provider.fetch_perp_listing(None).await?;
        let deployed: Vec<_> = venues.deployed().cloned().collect();
        let listings = try_join_all(
            deployed
                .iter()
                .map(|venue| self.provider.fetch_perp_listing(Some(&venue.name))),
        )
        .await?;
        let spot = self.provider.fetch_spot_meta().await?;

        let mut assets = HashMap::new();
        let mut by_wire = HashMap::new();

        for (idx, entry) in primary.universe.iter().enumerate() {
            let index = idx as u32;
            if index >= SPOT_ASSET_OFFSET {
                return Err(RegistryError::IndexOutOfRange {
                    class: AssetClass::Perp,
                    index,
                });
            }
            let asset = build_perp_asset(entry, AssetClass::Perp, "", index, index, &mut warnings)?;
            insert_asset(&mut assets, &mut by_wire, asset)?;
        }
        let perp_count = assets.len();

        for (venue, listing) in deployed.iter().zip(&listings) {
            for (idx, entry) in listing.universe.iter().enumerate() {
                let local_index = idx as u32;
                if local_index >= PERP_DEX_OFFSET_STRIDE {
                    return Err(RegistryError::IndexOutOfRange {
                        class: AssetClass::PerpDex,
                        index: local_index,
                    });
                }
                let asset = build_perp_asset(
                    entry,
                    AssetClass::PerpDex,
                    &venue.name,
                    venue.offset + local_index,
                    local_index,
                    &mut warnings,
                )?;
                insert_asset(&mut assets, &mut by_wire, asset)?;
            }
        }
        let perp_dex_count = assets.len() - perp_count;

        let (tokens, pairs, spot_count) =
            build_spot_assets(&spot, &mut assets, &mut by_wire)?;

        let snapshot = RegistrySnapshot {
            built_at_ms: now_ms(),
            assets,
            by_wire,
            tokens,
            pairs,
            venues,
        };
        let summary = RefreshSummary {
            perp_count,
            perp_dex_count,
            spot_count,
            warnings,
        };
        Ok((snapshot, summary))
    }
}

fn build_perp_asset(
    entry: &PerpUniverseEntry,
    class: AssetClass,
    venue: &str,
    asset_id: u32,
    local_index: u32,
    warnings: &mut Vec<RefreshWarning>,
) -> Result<AssetInfo, RegistryError> {
    let name = strip_venue_prefix(&entry.name).to_string();
    let px_decimals =
        resolve_px_decimals(class, entry.sz_decimals).map_err(|source| {
            RegistryError::InvalidListing {
                coin: name.clone(),
                source,
            }
        })?;
    if let Some(listed) = entry.px_decimals {
        if listed != px_decimals as i64 {
            warnings.push(RefreshWarning::PrecisionMismatch {
                coin: name.clone(),
                listed,
                computed: px_decimals,
            });
        }
    }
    let max_leverage = match (entry.max_leverage, class) {
        (0, AssetClass::Perp) => DEFAULT_PERP_LEVERAGE,
        (0, _) => DEFAULT_PERP_DEX_LEVERAGE,
        (lev, _) => lev,
    };
    Ok(AssetInfo {
        asset_id,
        class,
        name,
        venue: venue.to_string(),
        local_index,
        sz_decimals: entry.sz_decimals as u32,
        px_decimals,
        max_leverage,
        is_delisted: entry.is_delisted,
        only_isolated: entry.only_isolated,
        is_canonical: false,
    })
}

type SpotTables = (HashMap<u32, SpotToken>, HashMap<u32, SpotPair>, usize);

fn build_spot_assets(
    spot: &SpotMetaResponse,
    assets: &mut HashMap<u32, AssetInfo>,
    by_wire: &mut HashMap<String, u32>,
) -> Result<SpotTables, RegistryError> {
    let mut tokens = HashMap::new();
    for entry in &spot.tokens {
        tokens.insert(entry.index, build_spot_token(entry)?);
    }

    let mut pairs = HashMap::new();
    let mut spot_count = 0usize;
    for pair in &spot.universe {
        if pair.tokens.len() < 2 {
            warn!(pair = %pair.name, "spot pair without two token indices, skipping");
            continue;
        }
        if pair.index >= PERP_DEX_OFFSET_BASE - SPOT_ASSET_OFFSET {
            return Err(RegistryError::IndexOutOfRange {
                class: AssetClass::Spot,
                index: pair.index,
            });
        }
        let base = match tokens.get(&pair.tokens[0]) {
            Some(token) => token,
            None => {
                warn!(pair = %pair.name, token = pair.tokens[0], "spot pair references unknown base token, skipping");
                continue;
            }
        };
        // Token 0 is always the USDC quote; anything unresolvable falls back
        // to it, matching the venue's own display convention.
        let quote_name = tokens
            .get(&pair.tokens[1])
            .map(|t| t.name.as_str())
            .unwrap_or("USDC");
        let name = if pair.is_canonical {
            pair.name.clone()
        } else {
            format!("{}/{}", base.name, quote_name)
        };
        let px_decimals = resolve_px_decimals(AssetClass::Spot, base.sz_decimals as i64)
            .map_err(|source| RegistryError::InvalidListing {
                coin: name.clone(),
                source,
            })?;

        let asset = AssetInfo {
            asset_id: SPOT_ASSET_OFFSET + pair.index,
            class: AssetClass::Spot,
            name,
            venue: String::new(),
            local_index: pair.index,
            sz_decimals: base.sz_decimals,
            px_decimals,
            max_leverage: 1,
            is_delisted: false,
            only_isolated: false,
            is_canonical: pair.is_canonical,
        };
        insert_asset(assets, by_wire, asset)?;
        pairs.insert(
            pair.index,
            SpotPair {
                index: pair.index,
                name: pair.name.clone(),
                tokens: [pair.tokens[0], pair.tokens[1]],
                is_canonical: pair.is_canonical,
            },
        );
        spot_count += 1;
    }
    Ok((tokens, pairs, spot_count))
}

fn build_spot_token(entry: &SpotTokenEntry) -> Result<SpotToken, RegistryError> {
    if !(0..=18).contains(&entry.sz_decimals) {
        return Err(RegistryError::InvalidListing {
            coin: entry.name.clone(),
            source: PrecisionError::InvalidInput(entry.sz_decimals, AssetClass::Spot),
        });
    }
    Ok(SpotToken {
        index: entry.index,
        name: entry.name.clone(),
        sz_decimals: entry.sz_decimals as u32,
        wei_decimals: entry.wei_decimals,
        is_canonical: entry.is_canonical,
        token_id: entry.token_id.clone(),
    })
}

fn insert_asset(
    assets: &mut HashMap<u32, AssetInfo>,
    by_wire: &mut HashMap<String, u32>,
    asset: AssetInfo,
) -> Result<(), RegistryError> {
    if let Some(existing) = assets.get(&asset.asset_id) {
        return Err(RegistryError::AssetIdCollision {
            id: asset.asset_id,
            existing: existing.name.clone(),
            incoming: asset.name,
        });
    }
    let wire = symbology::encode(&asset);
    if let Some(prev) = by_wire.insert(wire.clone(), asset.asset_id) {
        warn!(coin = %wire, prev, shadowed_by = asset.asset_id, "duplicate wire symbol, keeping the first listing");
        by_wire.insert(wire, prev);
    }
    assets.insert(asset.asset_id, asset);
    Ok(())
}

/// Deployed-venue listings prefix coin names with the venue
/// (`"xyz:TSLA"` -> `"TSLA"`).
fn strip_venue_prefix(api_name: &str) -> &str {
    match api_name.split_once(':') {
        Some((_, coin)) => coin,
        None => api_name,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    use async_trait::async_trait;
    use common::CandleInterval;
    use connector::{CandleEntry, MockProvider, PerpDexEntry, PerpMetaResponse, SpotPairEntry};

    use super::*;

    #[tokio::test]
    async fn refresh_partitions_the_id_space() {
        let registry = AssetRegistry::new(Arc::new(MockProvider::default()));
        let summary = registry.refresh().await.unwrap();

        assert_eq!(summary.perp_count, 3);
        assert_eq!(summary.perp_dex_count, 2);
        assert_eq!(summary.spot_count, 2);

        let snapshot = registry.snapshot().await;
        for asset in snapshot.assets() {
            match asset.class {
                AssetClass::Perp => assert!(asset.asset_id < 10_000),
                AssetClass::Spot => {
                    assert!((10_000..100_000).contains(&asset.asset_id))
                }
                AssetClass::PerpDex => assert!(asset.asset_id >= 110_000),
            }
        }
    }

    #[tokio::test]
    async fn precision_is_recomputed_and_mismatch_flagged() {
        let registry = AssetRegistry::new(Arc::new(MockProvider::default()));
        let summary = registry.refresh().await.unwrap();

        // the mock's deployed listing hardcodes pxDecimals=0 for TSLA (sz=2)
        assert!(summary.warnings.contains(&RefreshWarning::PrecisionMismatch {
            coin: "TSLA".to_string(),
            listed: 0,
            computed: 4,
        }));
        let tsla = registry.resolve_symbol("xyz:TSLA").await.unwrap();
        assert_eq!(tsla.px_decimals, 4);
        assert_eq!(tsla.asset_id, 110_000);
    }

    #[tokio::test]
    async fn symbol_resolution_covers_every_class() {
        let registry = AssetRegistry::new(Arc::new(MockProvider::default()));
        registry.refresh().await.unwrap();

        assert_eq!(registry.resolve_symbol("BTC").await.unwrap().asset_id, 0);
        assert_eq!(
            registry.resolve_symbol("xyz:GOLD").await.unwrap().asset_id,
            110_001
        );
        assert_eq!(
            registry.resolve_symbol("PURR/USDC").await.unwrap().asset_id,
            10_000
        );
        assert_eq!(registry.resolve_symbol("@1").await.unwrap().asset_id, 10_001);
        // the @index form also reaches canonical pairs
        assert_eq!(registry.resolve_symbol("@0").await.unwrap().asset_id, 10_000);

        assert!(matches!(
            registry.resolve_symbol("NOPE").await,
            Err(RegistryError::SymbolResolution(_))
        ));
    }

    #[tokio::test]
    async fn lookup_rejects_unknown_ids() {
        let registry = AssetRegistry::new(Arc::new(MockProvider::default()));
        registry.refresh().await.unwrap();
        assert!(registry.lookup(0).await.is_ok());
        assert!(matches!(
            registry.lookup(99_999).await,
            Err(RegistryError::UnknownAsset(99_999))
        ));
    }

    /// Wraps the mock and counts venue-list fetches, with a delay wide
    /// enough for a second refresh call to pile up behind the first.
    struct CountingProvider {
        inner: MockProvider,
        venue_fetches: AtomicUsize,
    }

    #[async_trait]
    impl MarketDataProvider for CountingProvider {
        async fn fetch_venue_list(&self) -> Result<Vec<Option<PerpDexEntry>>, RestError> {
            self.venue_fetches.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(20)).await;
            self.inner.fetch_venue_list().await
        }

        async fn fetch_perp_listing(
            &self,
            venue: Option<&str>,
        ) -> Result<PerpMetaResponse, RestError> {
            self.inner.fetch_perp_listing(venue).await
        }

        async fn fetch_spot_meta(&self) -> Result<SpotMetaResponse, RestError> {
            self.inner.fetch_spot_meta().await
        }

        async fn fetch_candles(
            &self,
            coin: &str,
            interval: CandleInterval,
            start_time: i64,
            end_time: i64,
        ) -> Result<Vec<CandleEntry>, RestError> {
            self.inner.fetch_candles(coin, interval, start_time, end_time).await
        }
    }

    #[tokio::test]
    async fn concurrent_refreshes_share_one_fetch() {
        let provider = Arc::new(CountingProvider {
            inner: MockProvider::default(),
            venue_fetches: AtomicUsize::new(0),
        });
        let registry = Arc::new(AssetRegistry::new(provider.clone()));

        let (a, b) = tokio::join!(registry.refresh(), registry.refresh());
        assert!(a.is_ok());
        assert!(b.is_ok());
        assert_eq!(provider.venue_fetches.load(Ordering::SeqCst), 1);

        // a later refresh is a new flight
        registry.refresh().await.unwrap();
        assert_eq!(provider.venue_fetches.load(Ordering::SeqCst), 2);
    }

    /// Mock variant whose spot table repeats a pair index.
    struct CollidingProvider(MockProvider);

    #[async_trait]
    impl MarketDataProvider for CollidingProvider {
        async fn fetch_venue_list(&self) -> Result<Vec<Option<PerpDexEntry>>, RestError> {
            self.0.fetch_venue_list().await
        }

        async fn fetch_perp_listing(
            &self,
            venue: Option<&str>,
        ) -> Result<PerpMetaResponse, RestError> {
            self.0.fetch_perp_listing(venue).await
        }

        async fn fetch_spot_meta(&self) -> Result<SpotMetaResponse, RestError> {
            let mut meta = self.0.fetch_spot_meta().await?;
            meta.universe.push(SpotPairEntry {
                name: "DUP/USDC".to_string(),
                index: 0,
                tokens: vec![1, 0],
                is_canonical: false,
            });
            Ok(meta)
        }

        async fn fetch_candles(
            &self,
            coin: &str,
            interval: CandleInterval,
            start_time: i64,
            end_time: i64,
        ) -> Result<Vec<CandleEntry>, RestError> {
            self.0.fetch_candles(coin, interval, start_time, end_time).await
        }
    }

    #[tokio::test]
    async fn id_collision_aborts_and_keeps_the_prior_snapshot() {
        let registry = AssetRegistry::new(Arc::new(CollidingProvider(MockProvider::default())));
        let err = registry.refresh().await.unwrap_err();
        assert!(matches!(err, RegistryError::AssetIdCollision { id: 10_000, .. }));
        assert!(registry.snapshot().await.is_empty());
    }
}
