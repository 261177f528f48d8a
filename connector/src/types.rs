use serde::Deserialize;

/// One non-null entry of the raw `perpDexs` listing.
#[derive(Clone, Debug, Deserialize)]
pub struct PerpDexEntry {
    pub name: String,
    #[serde(rename = "fullName", default)]
    pub full_name: String,
}

/// One entry of a perp `meta.universe` listing.
#[derive(Clone, Debug, Deserialize)]
pub struct PerpUniverseEntry {
    /// Coin name as the API reports it; deployed venues prefix it with the
    /// venue name (`"xyz:TSLA"`).
    pub name: String,
    #[serde(rename = "szDecimals")]
    pub sz_decimals: i64,
    #[serde(rename = "maxLeverage", default)]
    pub max_leverage: u32,
    #[serde(rename = "isDelisted", default)]
    pub is_delisted: bool,
    #[serde(rename = "onlyIsolated", default)]
    pub only_isolated: bool,
    /// Some listings ship a precomputed price precision. The registry
    /// recomputes it and surfaces disagreement instead of trusting this.
    #[serde(rename = "pxDecimals", default)]
    pub px_decimals: Option<i64>,
}

/// `meta` response for one venue.
#[derive(Clone, Debug, Deserialize)]
pub struct PerpMetaResponse {
    pub universe: Vec<PerpUniverseEntry>,
}

/// One entry of the `spotMeta.tokens` table.
#[derive(Clone, Debug, Deserialize)]
pub struct SpotTokenEntry {
    pub name: String,
    pub index: u32,
    #[serde(rename = "szDecimals")]
    pub sz_decimals: i64,
    #[serde(rename = "weiDecimals", default)]
    pub wei_decimals: u32,
    #[serde(rename = "isCanonical", default)]
    pub is_canonical: bool,
    #[serde(rename = "tokenId", default)]
    pub token_id: Option<String>,
}

/// One entry of the `spotMeta.universe` pair table; `tokens` is
/// `[base, quote]` by token index.
#[derive(Clone, Debug, Deserialize)]
pub struct SpotPairEntry {
    pub name: String,
    pub index: u32,
    pub tokens: Vec<u32>,
    #[serde(rename = "isCanonical", default)]
    pub is_canonical: bool,
}

/// Full `spotMeta` response.
#[derive(Clone, Debug, Deserialize)]
pub struct SpotMetaResponse {
    pub tokens: Vec<SpotTokenEntry>,
    pub universe: Vec<SpotPairEntry>,
}

/// Raw `candleSnapshot` row. Prices arrive as strings.
#[derive(Clone, Debug, Deserialize)]
pub struct CandleEntry {
    /// Bar open, ms since epoch.
    #[serde(rename = "t")]
    pub open_time: i64,
    #[serde(rename = "T")]
    pub close_time: i64,
    #[serde(rename = "o")]
    pub open: String,
    #[serde(rename = "h")]
    pub high: String,
    #[serde(rename = "l")]
    pub low: String,
    #[serde(rename = "c")]
    pub close: String,
    #[serde(rename = "v")]
    pub volume: String,
    /// Trade count; zero marks a synthetic carried-forward bar.
    #[serde(rename = "n", default)]
    pub trade_count: u64,
}
