use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Environment variable the binary reads the Alpha Vantage credential from.
pub const API_KEY_ENV: &str = "ALPHAVANTAGE_API_KEY";

pub const DEFAULT_UNIVERSE_PATH: &str = "Start Your Own/microcap_universe.csv";
pub const DEFAULT_DATA_DIR: &str = "data/prices";
pub const DEFAULT_BASE_URL: &str = "https://www.alphavantage.co/query";

/// `outputsize` query parameter of the daily time series endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputSize {
    /// Latest 100 data points.
    Compact,
    Full,
}

impl OutputSize {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputSize::Compact => "compact",
            OutputSize::Full => "full",
        }
    }
}

impl fmt::Display for OutputSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutputSize {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "compact" => Ok(OutputSize::Compact),
            "full" => Ok(OutputSize::Full),
            other => Err(format!("Unknown output size: {}", other)),
        }
    }
}

pub struct Config {
    pub universe_path: PathBuf,
    pub data_dir: PathBuf,
    pub api_key: Option<String>,
    pub base_url: String,
    pub output_size: OutputSize,
    pub request_timeout: Duration,
    pub fail_fast: bool,
    pub ticker_limit: Option<usize>,
}

impl Config {
    pub fn new() -> Self {
        Self {
            universe_path: PathBuf::from(DEFAULT_UNIVERSE_PATH),
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            output_size: OutputSize::Compact,
            request_timeout: Duration::from_secs(30),
            fail_fast: false,
            ticker_limit: None,
        }
    }

    pub fn with_universe_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.universe_path = path.into();
        self
    }

    pub fn with_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = dir.into();
        self
    }

    pub fn with_api_key(mut self, api_key: Option<String>) -> Self {
        self.api_key = api_key;
        self
    }

    pub fn with_base_url(mut self, url: &str) -> Self {
        self.base_url = url.to_string();
        self
    }

    pub fn with_output_size(mut self, output_size: OutputSize) -> Self {
        self.output_size = output_size;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    // 第一个失败的股票即终止整个批次
    pub fn with_fail_fast(mut self, fail_fast: bool) -> Self {
        self.fail_fast = fail_fast;
        self
    }

    pub fn with_ticker_limit(mut self, limit: Option<usize>) -> Self {
        self.ticker_limit = limit;
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_point_at_compact_alpha_vantage_query() {
        let config = Config::new();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.output_size, OutputSize::Compact);
        assert_eq!(config.data_dir, PathBuf::from("data/prices"));
        assert!(config.api_key.is_none());
        assert!(!config.fail_fast);
    }

    #[test]
    fn output_size_parses_case_insensitively() {
        assert_eq!("FULL".parse::<OutputSize>().unwrap(), OutputSize::Full);
        assert_eq!("compact".parse::<OutputSize>().unwrap(), OutputSize::Compact);
        assert!("weekly".parse::<OutputSize>().is_err());
    }
}
