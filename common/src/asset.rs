use serde::{Deserialize, Serialize};

use crate::constant::{PERP_DEX_OFFSET_BASE, PERP_DEX_OFFSET_STRIDE};

/// Asset class. Decides the id range an asset lives in and its
/// price-precision budget.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, Eq, PartialEq, Hash)]
pub enum AssetClass {
    /// Primary-venue perpetuals, ids `[0, 10_000)`.
    Perp,
    /// Deployed perp-venue assets, ids `>= 100_000`.
    PerpDex,
    /// Spot token pairs, ids `[10_000, 100_000)`.
    Spot,
}

impl std::fmt::Display for AssetClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AssetClass::Perp => write!(f, "perp"),
            AssetClass::PerpDex => write!(f, "perp_dex"),
            AssetClass::Spot => write!(f, "spot"),
        }
    }
}

/// One sub-venue of the platform. `venue_index` is 1-based among the
/// non-null entries of the raw venue listing; the implicit primary venue
/// sits at index 0 with offset 0.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Venue {
    pub name: String,
    pub full_name: String,
    pub venue_index: u32,
    /// First asset id of this venue's range.
    pub offset: u32,
}

impl Venue {
    pub fn primary() -> Self {
        Self {
            name: String::new(),
            full_name: String::new(),
            venue_index: 0,
            offset: 0,
        }
    }

    pub fn is_primary(&self) -> bool {
        self.venue_index == 0
    }

    /// Id offset for the deployed venue at `venue_index` (1-based).
    pub fn offset_for(venue_index: u32) -> u32 {
        PERP_DEX_OFFSET_BASE + venue_index * PERP_DEX_OFFSET_STRIDE
    }
}

/// One entry of the unified asset table.
///
/// `asset_id` is unique across the whole space: primary perps occupy
/// `[0, 10_000)` in listing order, spot pairs `[10_000, 100_000)` at
/// `10_000 + pair_index`, and each deployed venue `[offset, offset + 10_000)`
/// at `offset + local_index`.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct AssetInfo {
    pub asset_id: u32,
    pub class: AssetClass,
    /// Bare coin name for perps (`"BTC"`, `"TSLA"`). For spot pairs this is
    /// the canonical pair name when one exists (`"PURR/USDC"`), otherwise
    /// the `BASE/QUOTE` display built from the token table.
    pub name: String,
    /// Owning deployed-venue name for `PerpDex` assets, empty otherwise.
    pub venue: String,
    /// Position inside the owning listing: universe index for perps, pair
    /// index for spot.
    pub local_index: u32,
    pub sz_decimals: u32,
    pub px_decimals: u32,
    pub max_leverage: u32,
    pub is_delisted: bool,
    pub only_isolated: bool,
    /// Spot pairs only: whether the pair carries a stable human-readable name.
    pub is_canonical: bool,
}

impl AssetInfo {
    /// Smallest price increment, `10^-px_decimals`.
    pub fn tick_size(&self) -> f64 {
        10f64.powi(-(self.px_decimals as i32))
    }

    /// Smallest order size, `10^-sz_decimals`.
    pub fn min_size(&self) -> f64 {
        10f64.powi(-(self.sz_decimals as i32))
    }
}

/// One token of the spot token table, keyed by `index` (names repeat).
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct SpotToken {
    pub index: u32,
    pub name: String,
    pub sz_decimals: u32,
    pub wei_decimals: u32,
    pub is_canonical: bool,
    /// EVM contract id for bridged tokens, `None` for native entries.
    pub token_id: Option<String>,
}

/// One spot trading pair; `tokens` is `[base, quote]` by token index.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct SpotPair {
    pub index: u32,
    pub name: String,
    pub tokens: [u32; 2],
    pub is_canonical: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn venue_offsets_increase_with_index() {
        assert_eq!(Venue::offset_for(1), 110_000);
        assert_eq!(Venue::offset_for(2), 120_000);
        assert_eq!(Venue::offset_for(3), 130_000);
    }

    #[test]
    fn derived_steps() {
        let asset = AssetInfo {
            asset_id: 0,
            class: AssetClass::Perp,
            name: "BTC".to_string(),
            venue: String::new(),
            local_index: 0,
            sz_decimals: 5,
            px_decimals: 1,
            max_leverage: 40,
            is_delisted: false,
            only_isolated: false,
            is_canonical: false,
        };
        assert!((asset.tick_size() - 0.1).abs() < 1e-12);
        assert!((asset.min_size() - 0.00001).abs() < 1e-12);
    }
}
