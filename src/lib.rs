// 公开导出的模块，供外部使用
pub mod models;
pub mod errors;
pub mod config;
pub mod universe;
pub mod scrapers;
pub mod storage;
pub mod services;

#[doc(hidden)]
pub mod util;

// 重新导出常用类型，方便使用
pub use config::Config;
pub use errors::{DataHubError, Result};
pub use models::price::DailyPrice;
pub use models::security::{Region, SecurityRecord};
pub use services::data_service::{DataService, RunSummary};
pub use storage::PriceTable;
