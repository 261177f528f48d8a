use chrono::{Duration, Utc};

use common::CandleInterval;

/// Returns `(start_ms, end_ms)` covering the last `hours_lookback` hours.
pub fn rolling_window_hours(hours_lookback: i64) -> (i64, i64) {
    let end = Utc::now().timestamp_millis();
    let start = (Utc::now() - Duration::hours(hours_lookback)).timestamp_millis();
    (start, end)
}

/// Round `ts_ms` down to the open of the containing bar.
pub fn align_to_interval(ts_ms: i64, interval: CandleInterval) -> i64 {
    let step = interval.millis();
    ts_ms - ts_ms.rem_euclid(step)
}

/// Number of bar opens in the inclusive window `[start_ms, end_ms]`,
/// assuming both bounds sit on the bar grid.
pub fn bar_count(start_ms: i64, end_ms: i64, interval: CandleInterval) -> i64 {
    if end_ms < start_ms {
        return 0;
    }
    (end_ms - start_ms) / interval.millis() + 1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alignment_floors_to_the_grid() {
        let step = CandleInterval::M5.millis();
        assert_eq!(align_to_interval(10 * step + 1, CandleInterval::M5), 10 * step);
        assert_eq!(align_to_interval(10 * step, CandleInterval::M5), 10 * step);
    }

    #[test]
    fn inclusive_bar_counting() {
        let step = CandleInterval::M1.millis();
        assert_eq!(bar_count(0, 0, CandleInterval::M1), 1);
        assert_eq!(bar_count(0, 5_999 * step, CandleInterval::M1), 6_000);
        assert_eq!(bar_count(step, 0, CandleInterval::M1), 0);
    }

    #[test]
    fn rolling_window_spans_the_lookback() {
        let (start, end) = rolling_window_hours(24);
        let span = end - start;
        assert!((span - 24 * 3_600_000).abs() < 5_000);
    }
}
