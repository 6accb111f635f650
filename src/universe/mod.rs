//! Micro-cap universe loading.
//!
//! The universe is a CSV file with at least the columns `ticker`, `region`,
//! `market_cap_musd` and `active`. Every row is evaluated on its own: rows
//! that cannot be parsed are reported as [`SkippedRow`]s and loading goes on.

use crate::errors::Result;
use crate::models::security::{parse_active_flag, Region, SecurityRecord};
use csv::{ReaderBuilder, StringRecord};
use log::{debug, info, warn};
use std::fs::File;
use std::io;
use std::path::Path;

const TICKER_COLUMN: &str = "ticker";
const REGION_COLUMN: &str = "region";
const MARKET_CAP_COLUMN: &str = "market_cap_musd";
const ACTIVE_COLUMN: &str = "active";

/// 一行原始数据，`None` 表示表头中没有该列
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRow {
    pub ticker: Option<String>,
    pub region: Option<String>,
    pub market_cap: Option<String>,
    pub active: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RowOutcome {
    Accepted(String),
    /// Parsed fine but outside the micro-cap universe.
    Filtered,
    Skipped(String),
}

/// A row that could not be evaluated. `row` is the 1-based data row number
/// (the header is not counted).
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedRow {
    pub row: usize,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct UniverseLoad {
    pub tickers: Vec<String>,
    pub skipped: Vec<SkippedRow>,
}

/// Decide a single universe row.
pub fn evaluate_row(row: &RawRow) -> RowOutcome {
    let raw_cap = row.market_cap.as_deref().unwrap_or("").trim();
    let market_cap = if raw_cap.is_empty() {
        0.0
    } else {
        match raw_cap.parse::<f64>() {
            Ok(value) => value,
            Err(e) => {
                return RowOutcome::Skipped(format!(
                    "invalid {} value {:?}: {}",
                    MARKET_CAP_COLUMN, raw_cap, e
                ))
            }
        }
    };

    let record = SecurityRecord {
        ticker: row.ticker.as_deref().unwrap_or("").trim().to_string(),
        region: Region::parse(row.region.as_deref().unwrap_or("")),
        market_cap,
        active: row.active.as_deref().map(parse_active_flag).unwrap_or(false),
    };

    if record.is_eligible() {
        RowOutcome::Accepted(record.ticker)
    } else {
        RowOutcome::Filtered
    }
}

struct ColumnIndex {
    ticker: Option<usize>,
    region: Option<usize>,
    market_cap: Option<usize>,
    active: Option<usize>,
}

impl ColumnIndex {
    fn from_headers(headers: &StringRecord) -> Self {
        let find = |name: &str| headers.iter().position(|h| h.trim() == name);
        Self {
            ticker: find(TICKER_COLUMN),
            region: find(REGION_COLUMN),
            market_cap: find(MARKET_CAP_COLUMN),
            active: find(ACTIVE_COLUMN),
        }
    }

    fn raw_row(&self, record: &StringRecord) -> std::result::Result<RawRow, String> {
        let field = |index: Option<usize>, name: &str| -> std::result::Result<Option<String>, String> {
            match index {
                None => Ok(None),
                Some(i) => record
                    .get(i)
                    .map(|value| Some(value.to_string()))
                    .ok_or_else(|| format!("row has no value for column {}", name)),
            }
        };

        Ok(RawRow {
            ticker: field(self.ticker, TICKER_COLUMN)?,
            region: field(self.region, REGION_COLUMN)?,
            market_cap: field(self.market_cap, MARKET_CAP_COLUMN)?,
            active: field(self.active, ACTIVE_COLUMN)?,
        })
    }
}

/// 加载 micro-cap 股票代码
///
/// A missing file is not an error: it yields an empty universe.
pub fn load_tickers(path: &Path) -> Result<UniverseLoad> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            warn!("Universe file {} not found, no tickers loaded", path.display());
            return Ok(UniverseLoad::default());
        }
        Err(e) => return Err(e.into()),
    };

    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(file);
    let columns = ColumnIndex::from_headers(reader.headers()?);

    let mut load = UniverseLoad::default();
    for (i, result) in reader.records().enumerate() {
        let row = i + 1;
        let record = match result {
            Ok(record) => record,
            Err(e) => {
                if let csv::ErrorKind::Io(_) = e.kind() {
                    return Err(e.into());
                }
                load.skipped.push(SkippedRow { row, reason: e.to_string() });
                continue;
            }
        };

        let outcome = match columns.raw_row(&record) {
            Ok(raw) => evaluate_row(&raw),
            Err(reason) => RowOutcome::Skipped(reason),
        };

        match outcome {
            RowOutcome::Accepted(ticker) => load.tickers.push(ticker),
            RowOutcome::Filtered => debug!("Row {} filtered out of the universe", row),
            RowOutcome::Skipped(reason) => load.skipped.push(SkippedRow { row, reason }),
        }
    }

    info!(
        "Loaded {} active micro-cap tickers from {} ({} rows skipped)",
        load.tickers.len(),
        path.display(),
        load.skipped.len()
    );
    Ok(load)
}
