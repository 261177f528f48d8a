use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::time::sleep;
use tracing::{debug, warn};

use common::constant::CANDLE_SNAPSHOT_CAP;
use common::{Candle, CandleHistory, CandleInterval, FetchStatus, Gap, HistoryWarning};
use connector::{CandleEntry, MarketDataProvider, RestError};

/// Attempts per pagination window before degrading to a partial result.
const WINDOW_MAX_RETRIES: usize = 3;
/// Base delay for the exponential backoff between window retries.
const RETRY_BASE_DELAY_MS: u64 = 500;
/// Consecutive windows without a new bar before history counts as exhausted.
const EXHAUSTED_WINDOW_LIMIT: usize = 2;

#[derive(Debug, thiserror::Error)]
pub enum HistoryError {
    #[error("invalid range: start {start} after end {end}")]
    InvalidRange { start: i64, end: i64 },
    /// Out-of-order or duplicate open times survived pagination. This does
    /// not happen under correct pagination; it means the upstream or the
    /// cursor arithmetic is broken, so the series must not be trusted.
    #[error("series corruption: {0}")]
    SeriesCorruption(String),
}

/// Cooperative cancellation, checked between pagination windows (never
/// mid-request).
#[derive(Clone, Debug, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Retrieves OHLCV history over arbitrary spans by paginating past the
/// upstream per-request bar cap, validating time order and annotating
/// gaps and synthetic bars.
pub struct HistoryFetcher<P> {
    provider: Arc<P>,
    max_retries: usize,
    retry_base_delay: Duration,
}

impl<P: MarketDataProvider> HistoryFetcher<P> {
    pub fn new(provider: Arc<P>) -> Self {
        Self {
            provider,
            max_retries: WINDOW_MAX_RETRIES,
            retry_base_delay: Duration::from_millis(RETRY_BASE_DELAY_MS),
        }
    }

    pub fn with_retry_policy(mut self, max_retries: usize, base_delay: Duration) -> Self {
        self.max_retries = max_retries.max(1);
        self.retry_base_delay = base_delay;
        self
    }

    /// Fetch all bars of `coin` with open time in `[start_time, end_time]`.
    ///
    /// Windows advance strictly sequentially: each window's start depends on
    /// the previous window's last returned open time, so the pagination
    /// cursor cannot be parallelised.
    pub async fn fetch(
        &self,
        coin: &str,
        interval: CandleInterval,
        start_time: i64,
        end_time: i64,
        cancel: &CancelFlag,
    ) -> Result<CandleHistory, HistoryError> {
        if start_time > end_time {
            return Err(HistoryError::InvalidRange {
                start: start_time,
                end: end_time,
            });
        }

        let step = interval.millis();
        // Both bounds are inclusive at open-time granularity, so a span of
        // (CAP - 1) steps requests exactly CAP bar opens.
        let cap_span = (CANDLE_SNAPSHOT_CAP as i64 - 1) * step;

        let mut candles: Vec<Candle> = Vec::new();
        let mut warnings = Vec::new();
        let mut status = FetchStatus::Complete;
        let mut cursor = start_time;
        let mut dry_windows = 0usize;

        while cursor <= end_time {
            if cancel.is_cancelled() {
                debug!(coin, cursor, "history fetch cancelled between windows");
                status = FetchStatus::Cancelled;
                break;
            }

            let window_end = end_time.min(cursor.saturating_add(cap_span));
            let batch = match self.fetch_window(coin, interval, cursor, window_end).await {
                Ok(batch) => batch,
                Err(err) => {
                    warn!(coin, cursor, ?err, "candle window failed after retries");
                    warnings.push(HistoryWarning::Partial {
                        completed_through: candles.last().map(|c| c.open_time),
                        reason: err.to_string(),
                    });
                    status = FetchStatus::Partial;
                    break;
                }
            };

            let mut new_bars = 0usize;
            for entry in &batch {
                // Bars before the cursor are replays of an earlier window.
                if entry.open_time < cursor {
                    continue;
                }
                match convert_entry(entry, step) {
                    Some(candle) => {
                        candles.push(candle);
                        new_bars += 1;
                    }
                    None => {
                        warn!(coin, open_time = entry.open_time, "unparseable candle entry skipped")
                    }
                }
            }

            if new_bars == 0 {
                dry_windows += 1;
                if dry_windows >= EXHAUSTED_WINDOW_LIMIT {
                    if !candles.is_empty() {
                        warnings.push(HistoryWarning::HistoryExhausted {
                            last_open: candles.last().map(|c| c.open_time),
                        });
                    }
                    break;
                }
                continue;
            }
            dry_windows = 0;
            cursor = candles
                .last()
                .map(|c| c.open_time + step)
                .unwrap_or(window_end + step);
        }

        validate_series(&candles)?;
        let gaps = scan_gaps(&candles, step);
        let synthetic_count = candles.iter().filter(|c| c.is_synthetic).count();

        Ok(CandleHistory {
            coin: coin.to_string(),
            interval,
            start_time,
            end_time,
            candles,
            gaps,
            synthetic_count,
            status,
            warnings,
        })
    }

    async fn fetch_window(
        &self,
        coin: &str,
        interval: CandleInterval,
        start_time: i64,
        end_time: i64,
    ) -> Result<Vec<CandleEntry>, RestError> {
        let mut attempt = 0usize;
        loop {
            match self
                .provider
                .fetch_candles(coin, interval, start_time, end_time)
                .await
            {
                Ok(batch) => return Ok(batch),
                Err(err) => {
                    attempt += 1;
                    if attempt >= self.max_retries {
                        return Err(err);
                    }
                    let delay = self.retry_base_delay * (1u32 << (attempt - 1));
                    warn!(coin, attempt, ?err, "candle request failed, retrying");
                    sleep(delay).await;
                }
            }
        }
    }
}

fn convert_entry(entry: &CandleEntry, step: i64) -> Option<Candle> {
    let open = entry.open.parse::<f64>().ok()?;
    let high = entry.high.parse::<f64>().ok()?;
    let low = entry.low.parse::<f64>().ok()?;
    let close = entry.close.parse::<f64>().ok()?;
    let volume = entry.volume.parse::<f64>().ok()?;
    Some(Candle {
        open_time: entry.open_time,
        // derived from the interval; the upstream close-time field is advisory
        close_time: entry.open_time + step,
        open,
        high,
        low,
        close,
        volume,
        trade_count: entry.trade_count,
        is_synthetic: entry.trade_count == 0,
    })
}

fn validate_series(candles: &[Candle]) -> Result<(), HistoryError> {
    for pair in candles.windows(2) {
        if pair[1].open_time <= pair[0].open_time {
            return Err(HistoryError::SeriesCorruption(format!(
                "open time {} does not advance past {}",
                pair[1].open_time, pair[0].open_time
            )));
        }
    }
    Ok(())
}

fn scan_gaps(candles: &[Candle], step: i64) -> Vec<Gap> {
    candles
        .windows(2)
        .filter_map(|pair| {
            let delta = pair[1].open_time - pair[0].open_time;
            (delta > step).then(|| Gap {
                from_time: pair[0].open_time,
                to_time: pair[1].open_time,
                missing: delta / step - 1,
            })
        })
        .collect()
}
