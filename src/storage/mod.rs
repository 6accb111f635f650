//! Per-ticker price tables.
//!
//! Each ticker owns one CSV file under the data directory. Tables are only
//! ever appended to; a date already present in a table is never written
//! again.

use crate::errors::{DataHubError, Result};
use crate::models::price::{DailyPrice, DATE_FORMAT, PRICE_COLUMNS};
use chrono::NaiveDate;
use csv::{ReaderBuilder, WriterBuilder};
use log::{debug, info};
use std::collections::HashSet;
use std::fs::{self, File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

/// 合并步骤：只保留表中不存在的日期，保持输入顺序
///
/// A date repeated inside `incoming` is kept only once (first occurrence).
pub fn select_new_records<'a>(
    existing: &HashSet<NaiveDate>,
    incoming: &'a [DailyPrice],
) -> Vec<&'a DailyPrice> {
    let mut seen = HashSet::new();
    incoming
        .iter()
        .filter(|record| !existing.contains(&record.date) && seen.insert(record.date))
        .collect()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AppendSummary {
    pub appended: usize,
    /// Dates already in the table.
    pub skipped_existing: usize,
    /// Dates repeated within the incoming batch.
    pub skipped_duplicate: usize,
}

/// The CSV table of one ticker.
#[derive(Debug, Clone)]
pub struct PriceTable {
    ticker: String,
    path: PathBuf,
}

impl PriceTable {
    pub fn for_ticker(data_dir: &Path, ticker: &str) -> Result<Self> {
        let ticker = ticker.trim();
        if ticker.is_empty()
            || ticker == "."
            || ticker == ".."
            || ticker.contains(|c: char| c == '/' || c == '\\')
        {
            return Err(DataHubError::DataError(format!(
                "Ticker {:?} cannot be used as a file name",
                ticker
            )));
        }

        Ok(Self {
            ticker: ticker.to_string(),
            path: data_dir.join(format!("{}.csv", ticker)),
        })
    }

    pub fn ticker(&self) -> &str {
        &self.ticker
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    // 上次追加中断时最后一行可能没有换行符
    fn ends_with_newline(&self) -> Result<bool> {
        let mut file = File::open(&self.path)?;
        file.seek(SeekFrom::End(-1))?;
        let mut last = [0u8; 1];
        file.read_exact(&mut last)?;
        Ok(last[0] == b'\n')
    }

    fn has_content(&self) -> Result<bool> {
        match fs::metadata(&self.path) {
            Ok(meta) => Ok(meta.len() > 0),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Dates already present in the table. Empty when the table does not
    /// exist yet. Rows whose date does not parse (e.g. a row truncated by an
    /// interrupted append) are ignored. The header must match
    /// [`PRICE_COLUMNS`], since appends are written in that order.
    pub fn existing_dates(&self) -> Result<HashSet<NaiveDate>> {
        let mut dates = HashSet::new();
        if !self.has_content()? {
            return Ok(dates);
        }

        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_path(&self.path)?;
        let headers = reader.headers()?.clone();
        if !headers.iter().map(str::trim).eq(PRICE_COLUMNS.iter().copied()) {
            return Err(DataHubError::DataError(format!(
                "{} has header {:?}, expected {}",
                self.path.display(),
                headers,
                PRICE_COLUMNS.join(",")
            )));
        }

        for record in reader.records() {
            let record = record?;
            let raw = record.get(0).unwrap_or("").trim();
            match NaiveDate::parse_from_str(raw, DATE_FORMAT) {
                Ok(date) => {
                    dates.insert(date);
                }
                Err(_) => debug!("Ignoring unreadable date {:?} in {}", raw, self.path.display()),
            }
        }

        Ok(dates)
    }

    /// 追加新的日线数据（跳过已存在的日期）
    ///
    /// The file is flushed and closed before this returns.
    pub fn append_new(&self, records: &[DailyPrice]) -> Result<AppendSummary> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir)?;
        }

        let needs_header = !self.has_content()?;
        let existing = self.existing_dates()?;
        let new_records = select_new_records(&existing, records);
        let skipped_existing = records.iter().filter(|r| existing.contains(&r.date)).count();
        let summary = AppendSummary {
            appended: new_records.len(),
            skipped_existing,
            skipped_duplicate: records.len() - new_records.len() - skipped_existing,
        };
        let needs_terminator = !needs_header && !self.ends_with_newline()?;

        let mut file = OpenOptions::new().create(true).append(true).open(&self.path)?;
        if needs_terminator {
            debug!("Terminating partial last row of {}", self.path.display());
            file.write_all(b"\n")?;
        }
        let mut writer = WriterBuilder::new().has_headers(false).from_writer(file);
        if needs_header {
            writer.write_record(PRICE_COLUMNS)?;
        }
        for record in new_records {
            writer.serialize(record)?;
        }

        let mut file = writer
            .into_inner()
            .map_err(|e| DataHubError::IoError(e.into_error()))?;
        file.flush()?;

        info!(
            "{}: appended {} rows, {} already present, {} repeated in batch",
            self.path.display(),
            summary.appended,
            summary.skipped_existing,
            summary.skipped_duplicate
        );
        Ok(summary)
    }

    /// Read every row of the table in file order. A row left incomplete by
    /// an interrupted append is skipped.
    pub fn read_records(&self) -> Result<Vec<DailyPrice>> {
        if !self.has_content()? {
            return Ok(Vec::new());
        }

        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_path(&self.path)?;
        let headers = reader.headers()?.clone();
        let mut records: Vec<DailyPrice> = Vec::new();
        for record in reader.records() {
            let record = record?;
            let parsed: std::result::Result<DailyPrice, csv::Error> = record.deserialize(Some(&headers));
            match parsed {
                Ok(price) => records.push(price),
                Err(e) => debug!("Skipping unreadable row in {}: {}", self.path.display(), e),
            }
        }
        Ok(records)
    }
}
