use log::info;

// 限制处理的股票数量（调试用）
pub fn limit_tickers(tickers: &mut Vec<String>, limit: Option<usize>) {
    if let Some(max) = limit {
        if tickers.len() > max {
            info!("Limiting run to {} of {} tickers", max, tickers.len());
            tickers.truncate(max);
        }
    }
}
