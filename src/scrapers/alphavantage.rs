use crate::config::{Config, OutputSize, API_KEY_ENV};
use crate::errors::{DataHubError, Result};
use crate::models::price::{DailyPrice, DATE_FORMAT};
use crate::scrapers::base::PriceScraper;
use async_trait::async_trait;
use chrono::NaiveDate;
use log::{debug, warn};
use reqwest::Client;
use serde_json::Value;

const DAILY_ADJUSTED_FUNCTION: &str = "TIME_SERIES_DAILY_ADJUSTED";
const TIME_SERIES_KEY: &str = "Time Series (Daily)";

const OPEN_KEY: &str = "1. open";
const HIGH_KEY: &str = "2. high";
const LOW_KEY: &str = "3. low";
const CLOSE_KEY: &str = "4. close";
const VOLUME_KEY: &str = "6. volume";

/// Keys Alpha Vantage uses for advisory messages instead of data
/// (rate limiting, unknown symbol, premium endpoints).
const NOTICE_KEYS: [&str; 3] = ["Error Message", "Note", "Information"];

/// Alpha Vantage 日线数据抓取器
pub struct AlphaVantageScraper {
    client: Client,
    base_url: String,
    api_key: String,
    output_size: OutputSize,
}

impl AlphaVantageScraper {
    /// 创建新的抓取器，API key 必须已在配置中提供
    pub fn new(config: &Config) -> Result<Self> {
        let api_key = config
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .ok_or(DataHubError::MissingApiKey(API_KEY_ENV))?
            .to_string();

        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(DataHubError::RequestError)?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            api_key,
            output_size: config.output_size,
        })
    }
}

#[async_trait]
impl PriceScraper for AlphaVantageScraper {
    fn source_name(&self) -> &'static str {
        "AlphaVantage"
    }

    async fn fetch_daily_series(&self, ticker: &str) -> Result<Vec<DailyPrice>> {
        debug!("Requesting {} daily series for {}", self.output_size, ticker);

        let response = self
            .client
            .get(&self.base_url)
            .query(&[
                ("function", DAILY_ADJUSTED_FUNCTION),
                ("symbol", ticker),
                ("apikey", self.api_key.as_str()),
                ("outputsize", self.output_size.as_str()),
            ])
            .send()
            .await?
            .error_for_status()?;

        let text = response.text().await?;
        let json: Value = serde_json::from_str(&text)?;

        let records = parse_daily_series(ticker, &json)?;
        if records.is_empty() {
            match api_notice(&json) {
                Some(notice) => warn!("No time series for {}: {}", ticker, notice),
                None => warn!("No time series for {}", ticker),
            }
        } else {
            debug!("Got {} daily records for {}", records.len(), ticker);
        }

        Ok(records)
    }
}

/// Parse the `Time Series (Daily)` mapping of a response into records sorted
/// ascending by date. A missing or empty series yields an empty vector.
pub fn parse_daily_series(ticker: &str, json: &Value) -> Result<Vec<DailyPrice>> {
    let series = match json.get(TIME_SERIES_KEY).and_then(Value::as_object) {
        Some(series) => series,
        None => return Ok(Vec::new()),
    };

    let mut records = Vec::with_capacity(series.len());
    for (date_str, values) in series {
        let date = NaiveDate::parse_from_str(date_str, DATE_FORMAT)?;
        records.push(DailyPrice {
            date,
            ticker: ticker.to_string(),
            open: field_text(values, OPEN_KEY, ticker, date_str)?,
            high: field_text(values, HIGH_KEY, ticker, date_str)?,
            low: field_text(values, LOW_KEY, ticker, date_str)?,
            close: field_text(values, CLOSE_KEY, ticker, date_str)?,
            volume: field_text(values, VOLUME_KEY, ticker, date_str)?,
        });
    }

    records.sort_by(|a, b| a.date.cmp(&b.date));
    Ok(records)
}

/// Advisory message returned in place of data, if any.
pub fn api_notice(json: &Value) -> Option<String> {
    NOTICE_KEYS
        .iter()
        .find_map(|key| json.get(*key).and_then(Value::as_str))
        .map(str::to_string)
}

fn field_text(values: &Value, key: &str, ticker: &str, date: &str) -> Result<String> {
    match values.get(key) {
        Some(Value::String(s)) => Ok(s.clone()),
        Some(Value::Number(n)) => Ok(n.to_string()),
        _ => Err(DataHubError::DataError(format!(
            "{} on {} has no \"{}\" value",
            ticker, date, key
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use serde_json::json;

    fn two_day_payload() -> Value {
        json!({
            "Meta Data": { "2. Symbol": "ACME" },
            "Time Series (Daily)": {
                "2024-03-05": {
                    "1. open": "1.2000", "2. high": "1.3000", "3. low": "1.1000",
                    "4. close": "1.2500", "5. adjusted close": "1.2500",
                    "6. volume": "15000", "7. dividend amount": "0.0000"
                },
                "2024-03-04": {
                    "1. open": "1.1000", "2. high": "1.2500", "3. low": "1.0500",
                    "4. close": "1.2000", "5. adjusted close": "1.2000",
                    "6. volume": "12000", "7. dividend amount": "0.0000"
                }
            }
        })
    }

    #[test]
    fn parses_two_dates_in_ascending_order() {
        let records = parse_daily_series("ACME", &two_day_payload()).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].date, NaiveDate::from_ymd_opt(2024, 3, 4).unwrap());
        assert_eq!(records[1].date, NaiveDate::from_ymd_opt(2024, 3, 5).unwrap());
        assert!(records.iter().all(|r| r.ticker == "ACME"));
        assert_eq!(records[0].open, "1.1000");
        assert_eq!(records[1].close, "1.2500");
        assert_eq!(records[1].volume, "15000");
    }

    #[test]
    fn missing_series_is_empty_and_notice_is_surfaced() {
        let payload = json!({ "Note": "Thank you for using Alpha Vantage! Our standard API rate limit is 25 requests per day." });
        assert!(parse_daily_series("ACME", &payload).unwrap().is_empty());
        assert!(api_notice(&payload).unwrap().contains("rate limit"));

        let empty = json!({ "Time Series (Daily)": {} });
        assert!(parse_daily_series("ACME", &empty).unwrap().is_empty());
        assert_eq!(api_notice(&empty), None);
    }

    #[test]
    fn numeric_values_are_coerced_to_text() {
        let payload = json!({
            "Time Series (Daily)": {
                "2024-01-02": { "1. open": 2.5, "2. high": 3, "3. low": 2.25, "4. close": 2.75, "6. volume": 900 }
            }
        });
        let records = parse_daily_series("NUM", &payload).unwrap();
        assert_eq!(records[0].open, "2.5");
        assert_eq!(records[0].high, "3");
        assert_eq!(records[0].volume, "900");
    }

    #[test]
    fn entry_without_close_is_a_data_error() {
        let payload = json!({
            "Time Series (Daily)": {
                "2024-01-02": { "1. open": "1", "2. high": "1", "3. low": "1", "6. volume": "1" }
            }
        });
        let err = parse_daily_series("ACME", &payload).unwrap_err();
        assert!(matches!(err, DataHubError::DataError(_)));
    }

    #[test]
    fn blank_api_key_is_rejected() {
        let config = Config::new().with_api_key(Some("   ".to_string()));
        assert!(matches!(
            AlphaVantageScraper::new(&config),
            Err(DataHubError::MissingApiKey(API_KEY_ENV))
        ));
        assert!(AlphaVantageScraper::new(&Config::new()).is_err());
    }

    #[tokio::test]
    async fn fetch_sends_daily_adjusted_query() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/query")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("function".into(), "TIME_SERIES_DAILY_ADJUSTED".into()),
                Matcher::UrlEncoded("symbol".into(), "ACME".into()),
                Matcher::UrlEncoded("apikey".into(), "test-key".into()),
                Matcher::UrlEncoded("outputsize".into(), "compact".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(two_day_payload().to_string())
            .create_async()
            .await;

        let config = Config::new()
            .with_api_key(Some("test-key".to_string()))
            .with_base_url(&format!("{}/query", server.url()));
        let scraper = AlphaVantageScraper::new(&config).unwrap();

        let records = scraper.fetch_daily_series("ACME").await.unwrap();
        mock.assert_async().await;
        assert_eq!(records.len(), 2);
        assert!(records[0].date < records[1].date);
    }

    #[tokio::test]
    async fn non_success_status_is_a_request_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/query")
            .match_query(Matcher::Any)
            .with_status(503)
            .create_async()
            .await;

        let config = Config::new()
            .with_api_key(Some("test-key".to_string()))
            .with_base_url(&format!("{}/query", server.url()));
        let scraper = AlphaVantageScraper::new(&config).unwrap();

        let err = scraper.fetch_daily_series("ACME").await.unwrap_err();
        assert!(matches!(err, DataHubError::RequestError(_)));
    }
}
