use chrono::{DateTime, Utc};

pub mod asset;
pub mod candle;
pub mod constant;
pub mod logger;
pub mod precision;

pub use asset::*;
pub use candle::*;
pub use precision::*;

/// Human-facing symbol, e.g. `"BTC"`, `"xyz:TSLA"`, `"PURR/USDC"`, `"@142"`.
pub type Symbol = String;

pub fn now_ms() -> i64 {
    let now: DateTime<Utc> = Utc::now();
    now.timestamp_millis()
}
