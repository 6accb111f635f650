use crate::errors::Result;
use crate::models::price::DailyPrice;
use async_trait::async_trait;

/// Base trait for daily price sources
#[async_trait]
pub trait PriceScraper {
    /// Name of the data source, used in log lines
    fn source_name(&self) -> &'static str;

    /// Fetch the daily series for one ticker, sorted ascending by date.
    /// An empty vector means the source had no series for this ticker.
    async fn fetch_daily_series(&self, ticker: &str) -> Result<Vec<DailyPrice>>;
}
