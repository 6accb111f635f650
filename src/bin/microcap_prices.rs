use microcap_prices::config::{Config, OutputSize, API_KEY_ENV, DEFAULT_DATA_DIR, DEFAULT_UNIVERSE_PATH};
use microcap_prices::scrapers::alphavantage::AlphaVantageScraper;
use microcap_prices::services::data_service::DataService;
use microcap_prices::storage::PriceTable;

use clap::{App, Arg, SubCommand};
use env_logger::Env;
use log::{error, info};
use std::error::Error;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // Initialize logger, info by default, RUST_LOG overrides
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let app = App::new("microcap_prices")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Collect daily prices for micro-cap stocks into per-ticker CSV files")
        .subcommand(
            SubCommand::with_name("fetch")
                .about("Fetch daily series for every ticker in the universe and append new days")
                .arg(
                    Arg::with_name("universe")
                        .short('u')
                        .long("universe")
                        .value_name("PATH")
                        .help("Micro-cap universe CSV")
                        .takes_value(true)
                        .default_value(DEFAULT_UNIVERSE_PATH),
                )
                .arg(
                    Arg::with_name("data-dir")
                        .short('d')
                        .long("data-dir")
                        .value_name("DIR")
                        .help("Directory holding the per-ticker price tables")
                        .takes_value(true)
                        .default_value(DEFAULT_DATA_DIR),
                )
                .arg(
                    Arg::with_name("output-size")
                        .long("output-size")
                        .value_name("SIZE")
                        .help("Alpha Vantage outputsize (compact, full)")
                        .takes_value(true)
                        .default_value("compact"),
                )
                .arg(
                    Arg::with_name("timeout")
                        .long("timeout")
                        .value_name("SECS")
                        .help("HTTP request timeout in seconds")
                        .takes_value(true)
                        .default_value("30"),
                )
                .arg(
                    Arg::with_name("limit")
                        .short('l')
                        .long("limit")
                        .value_name("N")
                        .help("Only process the first N tickers")
                        .takes_value(true),
                )
                .arg(
                    Arg::with_name("fail-fast")
                        .long("fail-fast")
                        .help("Abort the whole run on the first failing ticker")
                        .takes_value(false),
                ),
        )
        .subcommand(
            SubCommand::with_name("show")
                .about("Show the latest rows of a ticker's price table")
                .arg(
                    Arg::with_name("ticker")
                        .short('t')
                        .long("ticker")
                        .value_name("TICKER")
                        .required(true)
                        .takes_value(true),
                )
                .arg(
                    Arg::with_name("data-dir")
                        .short('d')
                        .long("data-dir")
                        .value_name("DIR")
                        .takes_value(true)
                        .default_value(DEFAULT_DATA_DIR),
                )
                .arg(
                    Arg::with_name("limit")
                        .short('l')
                        .long("limit")
                        .value_name("N")
                        .help("Number of rows to display")
                        .takes_value(true)
                        .default_value("10"),
                ),
        );

    let matches = app.get_matches();

    if let Some(matches) = matches.subcommand_matches("fetch") {
        let output_size = matches
            .value_of("output-size")
            .unwrap_or("compact")
            .parse::<OutputSize>()?;
        let timeout = matches.value_of("timeout").unwrap_or("30").parse::<u64>()?;
        let ticker_limit = match matches.value_of("limit") {
            Some(limit) => Some(limit.parse::<usize>()?),
            None => None,
        };

        let config = Config::new()
            .with_universe_path(matches.value_of("universe").unwrap_or(DEFAULT_UNIVERSE_PATH))
            .with_data_dir(matches.value_of("data-dir").unwrap_or(DEFAULT_DATA_DIR))
            .with_api_key(std::env::var(API_KEY_ENV).ok())
            .with_output_size(output_size)
            .with_request_timeout(Duration::from_secs(timeout))
            .with_fail_fast(matches.is_present("fail-fast"))
            .with_ticker_limit(ticker_limit);

        // 没有 API key 时在任何网络请求之前退出
        let scraper = AlphaVantageScraper::new(&config)?;
        let service = DataService::new(config, Arc::new(scraper));
        let summary = service.run().await?;

        if !summary.failed.is_empty() {
            for failure in &summary.failed {
                error!("{}: {}", failure.ticker, failure.error);
            }
            return Err(format!("{} of {} tickers failed", summary.failed.len(), summary.tickers).into());
        }
    } else if let Some(matches) = matches.subcommand_matches("show") {
        let ticker = matches.value_of("ticker").unwrap_or_default();
        let data_dir = matches.value_of("data-dir").unwrap_or(DEFAULT_DATA_DIR);
        let limit = matches.value_of("limit").unwrap_or("10").parse::<usize>()?;

        let table = PriceTable::for_ticker(Path::new(data_dir), ticker)?;
        let records = table.read_records()?;
        if records.is_empty() {
            info!("No price data stored for {}", table.ticker());
            return Ok(());
        }

        info!("{} ({} rows in {})", table.ticker(), records.len(), table.path().display());
        info!("{:-<72}", "");
        info!("{:<12} {:<12} {:<12} {:<12} {:<12} {:<12}",
              "Date", "Open", "High", "Low", "Close", "Volume");
        info!("{:-<72}", "");
        for daily in records.iter().skip(records.len().saturating_sub(limit)) {
            info!("{:<12} {:<12} {:<12} {:<12} {:<12} {:<12}",
                  daily.date.format("%Y-%m-%d").to_string(), daily.open, daily.high,
                  daily.low, daily.close, daily.volume);
        }
    } else {
        info!("No command specified. Use --help for usage information.");
    }

    Ok(())
}
