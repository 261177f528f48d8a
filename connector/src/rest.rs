use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tracing::{debug, warn};

use common::CandleInterval;

use crate::provider::MarketDataProvider;
use crate::types::{CandleEntry, PerpDexEntry, PerpMetaResponse, SpotMetaResponse};
use crate::ConnectorConfig;

const HTTP_TIMEOUT_SECS: u64 = 10;
const INFO_PATH: &str = "/info";
const LOGGED_PAYLOAD_LIMIT: usize = 2048;

#[derive(Debug, thiserror::Error)]
pub enum RestError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("api error {code}: {body}")]
    HttpStatus { code: u16, body: String },
    #[error("unexpected response: {0}")]
    InvalidPayload(&'static str),
}

/// REST client for the venue's `/info` endpoint.
pub struct RestClient {
    http: Client,
    api_base: String,
}

impl RestClient {
    pub fn new() -> Self {
        Self::from_config(&ConnectorConfig::default())
    }

    pub fn from_config(cfg: &ConnectorConfig) -> Self {
        let http = Client::builder()
            .user_agent("hypermeta-connector")
            .timeout(Duration::from_secs(HTTP_TIMEOUT_SECS))
            .build()
            .expect("failed to build reqwest client");
        Self {
            http,
            api_base: cfg.api_base.clone(),
        }
    }

    async fn info_post<T: DeserializeOwned>(&self, payload: &Value) -> Result<T, RestError> {
        let url = format!("{}{}", self.api_base, INFO_PATH);
        let resp = self.http.post(&url).json(payload).send().await?;
        let status = resp.status();
        let body = resp.text().await?;
        if !status.is_success() {
            return Err(RestError::HttpStatus {
                code: status.as_u16(),
                body,
            });
        }
        match serde_json::from_str(&body) {
            Ok(data) => Ok(data),
            Err(err) => {
                warn!(
                    ?err,
                    request = %payload,
                    payload = %truncate_payload(&body, LOGGED_PAYLOAD_LIMIT),
                    "failed to decode info response"
                );
                Err(RestError::InvalidPayload("decode info response"))
            }
        }
    }

}

impl Default for RestClient {
    fn default() -> Self {
        Self::new()
    }
}

fn truncate_payload(payload: &str, limit: usize) -> &str {
    match payload.char_indices().nth(limit) {
        Some((idx, _)) => &payload[..idx],
        None => payload,
    }
}

#[async_trait]
impl MarketDataProvider for RestClient {
    async fn fetch_venue_list(&self) -> Result<Vec<Option<PerpDexEntry>>, RestError> {
        debug!("fetching venue listing");
        self.info_post(&json!({"type": "perpDexs"})).await
    }

    async fn fetch_perp_listing(
        &self,
        venue: Option<&str>,
    ) -> Result<PerpMetaResponse, RestError> {
        let payload = match venue {
            Some(dex) => json!({"type": "meta", "dex": dex}),
            None => json!({"type": "meta"}),
        };
        debug!(venue = venue.unwrap_or(""), "fetching perp listing");
        self.info_post(&payload).await
    }

    async fn fetch_spot_meta(&self) -> Result<SpotMetaResponse, RestError> {
        debug!("fetching spot meta");
        self.info_post(&json!({"type": "spotMeta"})).await
    }

    async fn fetch_candles(
        &self,
        coin: &str,
        interval: CandleInterval,
        start_time: i64,
        end_time: i64,
    ) -> Result<Vec<CandleEntry>, RestError> {
        let payload = json!({
            "type": "candleSnapshot",
            "req": {
                "coin": coin,
                "interval": interval.as_str(),
                "startTime": start_time,
                "endTime": end_time,
            }
        });
        debug!(coin, %interval, start_time, end_time, "fetching candles");
        self.info_post(&payload).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_truncation_respects_char_boundaries() {
        assert_eq!(truncate_payload("abcdef", 4), "abcd");
        assert_eq!(truncate_payload("ab", 4), "ab");
        assert_eq!(truncate_payload("éééééé", 3), "ééé");
    }

    #[test]
    fn candle_entry_decodes_wire_shape() {
        let raw = r#"{"t":1700000000000,"T":1700000059999,"s":"BTC","i":"1m",
                      "o":"35000.0","h":"35010.0","l":"34990.0","c":"35005.0",
                      "v":"12.5","n":42}"#;
        let entry: CandleEntry = serde_json::from_str(raw).unwrap();
        assert_eq!(entry.open_time, 1_700_000_000_000);
        assert_eq!(entry.trade_count, 42);
        assert_eq!(entry.close, "35005.0");
    }

    #[test]
    fn venue_list_decodes_null_primary_slot() {
        let raw = r#"[null,{"name":"xyz","fullName":"XYZ Markets"},{"name":"flx"}]"#;
        let entries: Vec<Option<PerpDexEntry>> = serde_json::from_str(raw).unwrap();
        assert_eq!(entries.len(), 3);
        assert!(entries[0].is_none());
        assert_eq!(entries[1].as_ref().unwrap().name, "xyz");
        assert_eq!(entries[2].as_ref().unwrap().full_name, "");
    }
}
