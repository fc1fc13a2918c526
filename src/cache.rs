//! In-memory caching using moka
//!
//! Holds market quotes and catalog listings. Quotes live in two caches: a
//! fresh cache whose TTL is the freshness window, and a last-known cache
//! without TTL that backs the stale fallback when a live fetch fails.

use moka::future::Cache;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

use crate::pricing::models::{MetalType, StoneType};
use crate::pricing::responses::MarketQuote;

/// Which market value a quote describes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QuoteKind {
    /// 24K gold, INR per gram
    GoldPerGram,
    /// INR per USD
    UsdInr,
}

impl QuoteKind {
    pub fn label(self) -> &'static str {
        match self {
            QuoteKind::GoldPerGram => "gold_inr_per_gram",
            QuoteKind::UsdInr => "usd_inr",
        }
    }
}

const CATALOG_KEY: &str = "all";

/// Application cache holding market quotes and catalog listings
#[derive(Clone)]
pub struct AppCache {
    /// Quotes fetched inside the freshness window
    pub fresh_quotes: Cache<QuoteKind, MarketQuote>,
    /// Most recent live quote of each kind, kept indefinitely
    pub last_known_quotes: Cache<QuoteKind, MarketQuote>,
    /// Full metal type listing
    pub metal_types: Cache<String, Arc<Vec<MetalType>>>,
    /// Full stone type listing
    pub stone_types: Cache<String, Arc<Vec<StoneType>>>,
}

impl AppCache {
    /// Create a new cache instance with the given quote freshness window
    pub fn new(quote_ttl: Duration) -> Self {
        Self {
            fresh_quotes: Cache::builder()
                .max_capacity(8)
                .time_to_live(quote_ttl)
                .build(),

            last_known_quotes: Cache::builder().max_capacity(8).build(),

            // Catalog listings: 5 min TTL, admin edits show up quickly
            metal_types: Cache::builder()
                .max_capacity(1)
                .time_to_live(Duration::from_secs(5 * 60))
                .build(),

            stone_types: Cache::builder()
                .max_capacity(1)
                .time_to_live(Duration::from_secs(5 * 60))
                .build(),
        }
    }

    /// Fresh quote, if one was stored inside the freshness window
    pub async fn fresh_quote(&self, kind: QuoteKind) -> Option<MarketQuote> {
        self.fresh_quotes.get(&kind).await
    }

    /// Most recent live quote regardless of age
    pub async fn last_known_quote(&self, kind: QuoteKind) -> Option<MarketQuote> {
        self.last_known_quotes.get(&kind).await
    }

    /// Record a live quote in both quote caches
    pub async fn store_quote(&self, kind: QuoteKind, quote: MarketQuote) {
        self.fresh_quotes.insert(kind, quote.clone()).await;
        self.last_known_quotes.insert(kind, quote).await;
    }

    pub async fn metal_listing(&self) -> Option<Arc<Vec<MetalType>>> {
        self.metal_types.get(CATALOG_KEY).await
    }

    pub async fn store_metal_listing(&self, metals: Vec<MetalType>) -> Arc<Vec<MetalType>> {
        let metals = Arc::new(metals);
        self.metal_types
            .insert(CATALOG_KEY.to_string(), metals.clone())
            .await;
        metals
    }

    pub async fn stone_listing(&self) -> Option<Arc<Vec<StoneType>>> {
        self.stone_types.get(CATALOG_KEY).await
    }

    pub async fn store_stone_listing(&self, stones: Vec<StoneType>) -> Arc<Vec<StoneType>> {
        let stones = Arc::new(stones);
        self.stone_types
            .insert(CATALOG_KEY.to_string(), stones.clone())
            .await;
        stones
    }
}

impl Default for AppCache {
    fn default() -> Self {
        Self::new(Duration::from_secs(15 * 60))
    }
}
