use std::sync::Arc;

use serde::Deserialize;

use crate::data_source::{DailyPriceSource, SourceFuture};
use crate::domain::{CalendarDate, Observation};
use crate::fetch::fetch_json;
use crate::http_client::HttpClient;
use crate::source::BtcProviderId;
use crate::EngineError;

const HISTODAY_URL: &str = "https://min-api.cryptocompare.com/data/v2/histoday?fsym=BTC&tsym=USD&allData=true";

pub const DEFAULT_TIMEOUT_MS: u64 = 12_000;

/// CryptoCompare full daily history; the longest-running of the providers.
#[derive(Clone)]
pub struct CryptoCompareAdapter {
    http_client: Arc<dyn HttpClient>,
    timeout_ms: u64,
}

impl CryptoCompareAdapter {
    pub fn new(http_client: Arc<dyn HttpClient>) -> Self {
        Self {
            http_client,
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    async fn fetch_histoday(&self) -> Result<Vec<Observation>, EngineError> {
        let body: HistodayResponse =
            fetch_json(self.http_client.as_ref(), HISTODAY_URL, self.timeout_ms).await?;

        if body.response != "Success" {
            return Err(EngineError::transport(format!(
                "cryptocompare responded '{}': {}",
                body.response,
                body.message.unwrap_or_default()
            )));
        }
        let data = body
            .data
            .ok_or_else(|| EngineError::transport("cryptocompare response is missing Data"))?;

        let mut points = Vec::with_capacity(data.data.len());
        for candle in data.data {
            // Early history is padded with zero closes.
            if candle.close <= 0.0 {
                continue;
            }
            let date = CalendarDate::from_unix_seconds(candle.time)?;
            points.extend(Observation::new(date, candle.close));
        }
        Ok(points)
    }
}

impl DailyPriceSource for CryptoCompareAdapter {
    fn id(&self) -> BtcProviderId {
        BtcProviderId::CryptoCompare
    }

    fn daily_closes<'a>(&'a self) -> SourceFuture<'a, Vec<Observation>> {
        Box::pin(self.fetch_histoday())
    }
}

#[derive(Debug, Deserialize)]
struct HistodayResponse {
    #[serde(rename = "Response")]
    response: String,
    #[serde(rename = "Message", default)]
    message: Option<String>,
    #[serde(rename = "Data", default)]
    data: Option<HistodayData>,
}

#[derive(Debug, Deserialize)]
struct HistodayData {
    #[serde(rename = "Data")]
    data: Vec<HistodayCandle>,
}

#[derive(Debug, Deserialize)]
struct HistodayCandle {
    time: i64,
    close: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http_client::StaticHttpClient;

    #[tokio::test]
    async fn skips_zero_padding_and_converts_seconds() {
        let body = r#"{"Response":"Success","Data":{"Data":[
            {"time":1279238400,"close":0},
            {"time":1279324800,"close":0.04951},
            {"time":1279411200,"close":0.08584}
        ]}}"#;
        let client = Arc::new(StaticHttpClient::new().with_json("histoday", body));

        let closes = CryptoCompareAdapter::new(client)
            .daily_closes()
            .await
            .expect("valid");

        assert_eq!(closes.len(), 2);
        assert_eq!(closes[0].date.to_string(), "2010-07-17");
    }

    #[tokio::test]
    async fn error_response_is_transport_failure() {
        let body = r#"{"Response":"Error","Message":"rate limit"}"#;
        let client = Arc::new(StaticHttpClient::new().with_json("histoday", body));

        let err = CryptoCompareAdapter::new(client)
            .daily_closes()
            .await
            .expect_err("error response");
        assert!(err.to_string().contains("rate limit"));
    }
}
