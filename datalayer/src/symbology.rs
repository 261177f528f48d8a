use common::constant::{PERP_DEX_OFFSET_BASE, SPOT_ASSET_OFFSET};
use common::{AssetClass, AssetInfo};

use crate::registry::RegistrySnapshot;

/// Wire coin string for one asset, exactly what the market-data API
/// expects for its class.
pub fn encode(asset: &AssetInfo) -> String {
    match asset.class {
        AssetClass::Perp => asset.name.clone(),
        AssetClass::PerpDex => format!("{}:{}", asset.venue, asset.name),
        AssetClass::Spot => {
            if asset.is_canonical {
                asset.name.clone()
            } else {
                format!("@{}", asset.local_index)
            }
        }
    }
}

/// Inverse of [`encode`] against one snapshot. Must round-trip exactly for
/// every registered asset. The `@index` form additionally reaches canonical
/// pairs, whose encoded form is their pair name.
pub fn decode<'a>(snapshot: &'a RegistrySnapshot, coin: &str) -> Option<&'a AssetInfo> {
    if let Some(asset) = snapshot.by_wire(coin) {
        return Some(asset);
    }
    if let Some(index) = coin.strip_prefix('@').and_then(|rest| rest.parse::<u32>().ok()) {
        if index < PERP_DEX_OFFSET_BASE - SPOT_ASSET_OFFSET {
            return snapshot.get(SPOT_ASSET_OFFSET + index);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use connector::MockProvider;

    use crate::registry::AssetRegistry;

    use super::*;

    #[tokio::test]
    async fn every_registered_asset_round_trips() {
        let registry = AssetRegistry::new(Arc::new(MockProvider::default()));
        registry.refresh().await.unwrap();
        let snapshot = registry.snapshot().await;

        assert!(!snapshot.is_empty());
        for asset in snapshot.assets() {
            let wire = encode(asset);
            let decoded = decode(&snapshot, &wire)
                .unwrap_or_else(|| panic!("wire coin '{wire}' failed to decode"));
            assert_eq!(decoded, asset, "round-trip mismatch for '{wire}'");
        }
    }

    #[tokio::test]
    async fn wire_forms_per_class() {
        let registry = AssetRegistry::new(Arc::new(MockProvider::default()));
        registry.refresh().await.unwrap();
        let snapshot = registry.snapshot().await;

        assert_eq!(encode(snapshot.get(0).unwrap()), "BTC");
        assert_eq!(encode(snapshot.get(110_000).unwrap()), "xyz:TSLA");
        assert_eq!(encode(snapshot.get(10_000).unwrap()), "PURR/USDC");
        assert_eq!(encode(snapshot.get(10_001).unwrap()), "@1");
    }

    #[tokio::test]
    async fn decode_rejects_out_of_range_spot_indices() {
        let registry = AssetRegistry::new(Arc::new(MockProvider::default()));
        registry.refresh().await.unwrap();
        let snapshot = registry.snapshot().await;

        assert!(decode(&snapshot, "@90000").is_none());
        assert!(decode(&snapshot, "@nope").is_none());
    }
}
