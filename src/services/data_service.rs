use crate::config::Config;
use crate::errors::Result;
use crate::scrapers::base::PriceScraper;
use crate::storage::{AppendSummary, PriceTable};
use crate::universe;
use crate::util;
use log::{error, info, warn};
use std::sync::Arc;

/// Result of one ticker's fetch-then-write cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickerOutcome {
    Updated(AppendSummary),
    /// The source returned no time series.
    NoData,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickerFailure {
    pub ticker: String,
    pub error: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub tickers: usize,
    pub updated: usize,
    pub empty: usize,
    pub rows_appended: usize,
    pub failed: Vec<TickerFailure>,
}

/// 数据服务，处理数据的获取与增量存储
pub struct DataService {
    config: Config,
    scraper: Arc<dyn PriceScraper + Send + Sync>,
}

impl DataService {
    pub fn new(config: Config, scraper: Arc<dyn PriceScraper + Send + Sync>) -> Self {
        Self { config, scraper }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// 处理单个股票：抓取并追加到对应的 CSV
    pub async fn process_ticker(&self, ticker: &str) -> Result<TickerOutcome> {
        info!("Fetching {} from {}", ticker, self.scraper.source_name());
        let records = self.scraper.fetch_daily_series(ticker).await?;

        if records.is_empty() {
            warn!("No data for {}, skipping", ticker);
            return Ok(TickerOutcome::NoData);
        }

        let table = PriceTable::for_ticker(&self.config.data_dir, ticker)?;
        let summary = table.append_new(&records)?;
        info!("Updated {}", table.path().display());
        Ok(TickerOutcome::Updated(summary))
    }

    /// 处理 universe 中的所有股票
    ///
    /// Tickers are processed one after another. A failing ticker is recorded
    /// in the summary and the run goes on, unless `fail_fast` is set.
    pub async fn run(&self) -> Result<RunSummary> {
        let load = universe::load_tickers(&self.config.universe_path)?;
        for skipped in &load.skipped {
            warn!("Skipped universe row {}: {}", skipped.row, skipped.reason);
        }

        let mut tickers = load.tickers;
        util::limit_tickers(&mut tickers, self.config.ticker_limit);

        let mut summary = RunSummary {
            tickers: tickers.len(),
            ..RunSummary::default()
        };
        if tickers.is_empty() {
            warn!("No tickers loaded, nothing to do");
            return Ok(summary);
        }

        for ticker in &tickers {
            match self.process_ticker(ticker).await {
                Ok(TickerOutcome::Updated(append)) => {
                    summary.updated += 1;
                    summary.rows_appended += append.appended;
                }
                Ok(TickerOutcome::NoData) => summary.empty += 1,
                Err(e) if self.config.fail_fast => {
                    error!("Failed to process {}: {}", ticker, e);
                    return Err(e);
                }
                Err(e) => {
                    error!("Failed to process {}: {}", ticker, e);
                    summary.failed.push(TickerFailure {
                        ticker: ticker.clone(),
                        error: e.to_string(),
                    });
                }
            }
        }

        info!(
            "Processed {} tickers: {} updated ({} new rows), {} without data, {} failed",
            summary.tickers,
            summary.updated,
            summary.rows_appended,
            summary.empty,
            summary.failed.len()
        );
        Ok(summary)
    }
}
