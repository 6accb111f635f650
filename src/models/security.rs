use std::fmt;

/// Listing region of a security in the universe file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Region {
    Us,
    Eu,
    Other(String),
}

impl Region {
    /// Case-insensitive, surrounding whitespace ignored.
    pub fn parse(raw: &str) -> Self {
        let region = raw.trim().to_uppercase();
        match region.as_str() {
            "US" => Region::Us,
            "EU" => Region::Eu,
            _ => Region::Other(region),
        }
    }

    pub fn is_accepted(&self) -> bool {
        matches!(self, Region::Us | Region::Eu)
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Region::Us => f.write_str("US"),
            Region::Eu => f.write_str("EU"),
            Region::Other(other) => f.write_str(other),
        }
    }
}

/// 候选证券（来自 micro-cap 列表的一行）
#[derive(Debug, Clone, PartialEq)]
pub struct SecurityRecord {
    pub ticker: String,
    pub region: Region,
    /// Market capitalization in millions.
    pub market_cap: f64,
    pub active: bool,
}

impl SecurityRecord {
    pub const MICRO_CAP_LIMIT_MUSD: f64 = 300.0;

    pub fn is_micro_cap(&self) -> bool {
        // NaN 不小于任何值，因此被排除
        self.market_cap < Self::MICRO_CAP_LIMIT_MUSD
    }

    pub fn is_eligible(&self) -> bool {
        self.region.is_accepted() && self.is_micro_cap() && self.active && !self.ticker.is_empty()
    }
}

/// Only these literal tokens mark a security as active.
pub fn parse_active_flag(raw: &str) -> bool {
    matches!(raw.trim(), "1" | "true" | "True")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn region_matching_ignores_case_and_padding() {
        assert_eq!(Region::parse(" us "), Region::Us);
        assert_eq!(Region::parse("Eu"), Region::Eu);
        assert_eq!(Region::parse("asia"), Region::Other("ASIA".to_string()));
        assert!(!Region::parse("").is_accepted());
    }

    #[test]
    fn active_flag_accepts_only_literal_tokens() {
        assert!(parse_active_flag("1"));
        assert!(parse_active_flag(" true "));
        assert!(parse_active_flag("True"));
        assert!(!parse_active_flag("TRUE"));
        assert!(!parse_active_flag("yes"));
        assert!(!parse_active_flag("0"));
        assert!(!parse_active_flag(""));
    }

    #[test]
    fn micro_cap_limit_is_strict() {
        let mut record = SecurityRecord {
            ticker: "ACME".to_string(),
            region: Region::Us,
            market_cap: 299.99,
            active: true,
        };
        assert!(record.is_eligible());
        record.market_cap = 300.0;
        assert!(!record.is_eligible());
        record.market_cap = f64::NAN;
        assert!(!record.is_eligible());
    }
}
