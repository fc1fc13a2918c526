//! Jewelry pricing engine.
//!
//! Combines catalog prices for metals and stones with live gold and exchange
//! rate quotes into an itemized INR/USD breakdown, with static estimation
//! tables wherever the catalog has no answer.

pub mod calculators;
pub mod catalog;
pub mod engine;
pub mod estimation;
pub mod feed;
pub mod models;
pub mod queries;
pub mod requests;
pub mod responses;
pub mod sources;

// Re-export commonly used items
pub use calculators::{round_money, round_whole};
pub use catalog::{InMemoryCatalog, MaterialCatalog, PgMaterialCatalog};
pub use engine::PriceEngine;
pub use estimation::{EstimationTables, MaterialKind};
pub use feed::{start_feed_refresher, LiveMarketFeed, MarketPriceFeed};
pub use requests::{GemInput, MaterialId, PricingRequest};
pub use responses::{GemCost, MarketQuote, PriceBreakdown, QuickEstimate};
