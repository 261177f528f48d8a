/// Base URL for the Hyperliquid mainnet REST API.
pub const HYPERLIQUID_API_BASE: &str = "https://api.hyperliquid.xyz";
/// Base URL for the Hyperliquid testnet REST API.
pub const HYPERLIQUID_TESTNET_API_BASE: &str = "https://api.hyperliquid-testnet.xyz";

/// Maximum number of candles returned by a single `candleSnapshot` request.
pub const CANDLE_SNAPSHOT_CAP: usize = 5000;

/// First asset id of the spot range; spot pair `i` maps to `SPOT_ASSET_OFFSET + i`.
pub const SPOT_ASSET_OFFSET: u32 = 10_000;
/// Base of the deployed perp-venue id ranges.
pub const PERP_DEX_OFFSET_BASE: u32 = 100_000;
/// Id-range stride between consecutive deployed perp venues.
pub const PERP_DEX_OFFSET_STRIDE: u32 = 10_000;

/// Price-precision budget for perp assets (primary and deployed venues).
pub const PERP_MAX_DECIMALS: u32 = 6;
/// Price-precision budget for spot pairs.
pub const SPOT_MAX_DECIMALS: u32 = 8;

/// Default symbol used by the demo binaries when none is configured.
pub const DEFAULT_SYMBOL: &str = "BTC";
/// Default lookback window for the history demo binary.
pub const DEFAULT_LOOKBACK_HOURS: i64 = 24;
