mod mock;
mod provider;
mod rest;
mod types;

use common::constant::HYPERLIQUID_API_BASE;

pub use mock::MockProvider;
pub use provider::MarketDataProvider;
pub use rest::{RestClient, RestError};
pub use types::{
    CandleEntry, PerpDexEntry, PerpMetaResponse, PerpUniverseEntry, SpotMetaResponse,
    SpotPairEntry, SpotTokenEntry,
};

/// Connector configuration. Defaults target mainnet.
#[derive(Clone, Debug)]
pub struct ConnectorConfig {
    pub api_base: String,
}

impl Default for ConnectorConfig {
    fn default() -> Self {
        Self {
            api_base: HYPERLIQUID_API_BASE.to_string(),
        }
    }
}

impl ConnectorConfig {
    pub fn testnet() -> Self {
        Self {
            api_base: common::constant::HYPERLIQUID_TESTNET_API_BASE.to_string(),
        }
    }
}
