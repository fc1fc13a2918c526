//! Jewelry price estimation: metal and gemstone cost breakdowns from a
//! material catalog and market gold and exchange-rate quotes.

pub mod cache;
pub mod config;
pub mod error;
pub mod pricing;

pub use cache::AppCache;
pub use config::AppConfig;
pub use error::{AppError, Result};
