mod history;

use std::sync::Arc;

use common::{CandleHistory, CandleInterval};
use connector::MarketDataProvider;
use datalayer::{symbology, AssetRegistry, RegistryError};

pub use history::{CancelFlag, HistoryError, HistoryFetcher};

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error(transparent)]
    History(#[from] HistoryError),
}

/// Symbol-level history access: resolves a human symbol through the asset
/// registry, encodes the wire coin and runs the continuity fetcher. This is
/// the surface callers actually invoke.
pub struct HistoryService<P> {
    registry: Arc<AssetRegistry<P>>,
    fetcher: HistoryFetcher<P>,
}

impl<P: MarketDataProvider> HistoryService<P> {
    pub fn new(provider: Arc<P>) -> Self {
        Self {
            registry: Arc::new(AssetRegistry::new(provider.clone())),
            fetcher: HistoryFetcher::new(provider),
        }
    }

    pub fn registry(&self) -> &Arc<AssetRegistry<P>> {
        &self.registry
    }

    pub async fn fetch_symbol_history(
        &self,
        symbol: &str,
        interval: CandleInterval,
        start_time: i64,
        end_time: i64,
        cancel: &CancelFlag,
    ) -> Result<CandleHistory, ServiceError> {
        let asset = self.registry.resolve_symbol(symbol).await?;
        let coin = symbology::encode(&asset);
        let history = self
            .fetcher
            .fetch(&coin, interval, start_time, end_time, cancel)
            .await?;
        Ok(history)
    }
}

#[cfg(test)]
mod tests {
    use common::FetchStatus;
    use connector::MockProvider;

    use super::*;

    #[tokio::test]
    async fn resolves_then_fetches() {
        let provider = Arc::new(MockProvider::default());
        let service = HistoryService::new(provider);
        service.registry().refresh().await.unwrap();

        let step = CandleInterval::H1.millis();
        let start = 1_700_000_000_000i64.div_euclid(step) * step;
        let end = start + 23 * step;
        let history = service
            .fetch_symbol_history("PURR/USDC", CandleInterval::H1, start, end, &CancelFlag::new())
            .await
            .unwrap();

        assert_eq!(history.coin, "PURR/USDC");
        assert_eq!(history.status, FetchStatus::Complete);
        assert_eq!(history.candles.len(), 24);

        let err = service
            .fetch_symbol_history("NOPE", CandleInterval::H1, start, end, &CancelFlag::new())
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Registry(_)));
    }
}
