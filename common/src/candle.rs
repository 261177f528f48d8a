use serde::{Deserialize, Serialize};

/// Candle intervals supported by the venue.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, Eq, PartialEq, Hash)]
pub enum CandleInterval {
    M1,
    M3,
    M5,
    M15,
    M30,
    H1,
    H2,
    H4,
    D1,
}

impl CandleInterval {
    /// Wire string for the `candleSnapshot` request.
    pub fn as_str(&self) -> &'static str {
        match self {
            CandleInterval::M1 => "1m",
            CandleInterval::M3 => "3m",
            CandleInterval::M5 => "5m",
            CandleInterval::M15 => "15m",
            CandleInterval::M30 => "30m",
            CandleInterval::H1 => "1h",
            CandleInterval::H2 => "2h",
            CandleInterval::H4 => "4h",
            CandleInterval::D1 => "1d",
        }
    }

    pub fn millis(&self) -> i64 {
        let minutes = match self {
            CandleInterval::M1 => 1,
            CandleInterval::M3 => 3,
            CandleInterval::M5 => 5,
            CandleInterval::M15 => 15,
            CandleInterval::M30 => 30,
            CandleInterval::H1 => 60,
            CandleInterval::H2 => 120,
            CandleInterval::H4 => 240,
            CandleInterval::D1 => 1440,
        };
        minutes * 60 * 1000
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "1m" => Some(CandleInterval::M1),
            "3m" => Some(CandleInterval::M3),
            "5m" => Some(CandleInterval::M5),
            "15m" => Some(CandleInterval::M15),
            "30m" => Some(CandleInterval::M30),
            "1h" => Some(CandleInterval::H1),
            "2h" => Some(CandleInterval::H2),
            "4h" => Some(CandleInterval::H4),
            "1d" => Some(CandleInterval::D1),
            _ => None,
        }
    }
}

impl std::fmt::Display for CandleInterval {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One OHLCV bar. `open_time` is the bar open in ms since epoch;
/// `close_time = open_time + interval`.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Candle {
    pub open_time: i64,
    pub close_time: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    pub trade_count: u64,
    /// Zero-trade bar: price fields carry the previous close forward.
    pub is_synthetic: bool,
}

/// A hole between two consecutive bars of one series.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Gap {
    /// Open time of the bar before the hole.
    pub from_time: i64,
    /// Open time of the bar after the hole.
    pub to_time: i64,
    /// Whole bars missing in between.
    pub missing: i64,
}

/// How a history fetch ended.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, Eq, PartialEq)]
pub enum FetchStatus {
    Complete,
    /// Retries exhausted mid-span; `candles` holds the assembled prefix.
    Partial,
    /// Cancelled between pagination windows; `candles` holds the prefix.
    Cancelled,
}

/// Data-quality conditions attached to a fetch result. These ride on the
/// result itself so callers can inspect them programmatically.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub enum HistoryWarning {
    /// A pagination window failed after all retries.
    Partial {
        completed_through: Option<i64>,
        reason: String,
    },
    /// Upstream stopped producing new bars before the requested end.
    HistoryExhausted { last_open: Option<i64> },
}

/// Gap-annotated, time-ordered result of one history fetch.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CandleHistory {
    pub coin: String,
    pub interval: CandleInterval,
    pub start_time: i64,
    pub end_time: i64,
    pub candles: Vec<Candle>,
    pub gaps: Vec<Gap>,
    pub synthetic_count: usize,
    pub status: FetchStatus,
    pub warnings: Vec<HistoryWarning>,
}

impl CandleHistory {
    pub fn is_continuous(&self) -> bool {
        self.gaps.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interval_wire_round_trip() {
        for interval in [
            CandleInterval::M1,
            CandleInterval::M3,
            CandleInterval::M5,
            CandleInterval::M15,
            CandleInterval::M30,
            CandleInterval::H1,
            CandleInterval::H2,
            CandleInterval::H4,
            CandleInterval::D1,
        ] {
            assert_eq!(CandleInterval::parse(interval.as_str()), Some(interval));
        }
        assert_eq!(CandleInterval::parse("7m"), None);
    }

    #[test]
    fn interval_millis() {
        assert_eq!(CandleInterval::M1.millis(), 60_000);
        assert_eq!(CandleInterval::H1.millis(), 3_600_000);
        assert_eq!(CandleInterval::D1.millis(), 86_400_000);
    }
}
