use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Column order of a price table.
pub const PRICE_COLUMNS: [&str; 7] = ["date", "ticker", "open", "high", "low", "close", "volume"];

/// Date format of the `date` column and of the API's series keys.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// 日线数据结构
///
/// Prices and volume stay as the decimal text the API returned, so a table
/// row always matches the payload it came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyPrice {
    #[serde(with = "iso_date")]
    pub date: NaiveDate,
    pub ticker: String,
    pub open: String,
    pub high: String,
    pub low: String,
    pub close: String,
    pub volume: String,
}

pub(crate) mod iso_date {
    use super::DATE_FORMAT;
    use chrono::NaiveDate;
    use serde::{self, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&date.format(DATE_FORMAT).to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        NaiveDate::parse_from_str(s.trim(), DATE_FORMAT).map_err(serde::de::Error::custom)
    }
}
