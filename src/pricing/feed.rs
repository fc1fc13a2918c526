//! Market price feed: gold price per gram and the USD/INR rate.
//!
//! Lookup order per value: fresh cache, live source (bounded by a timeout),
//! last known live value, configured default. The feed never fails; callers
//! see provenance through [`MarketQuote::source`] and `is_live`.

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{interval, timeout};
use tracing::{info, warn};

use crate::cache::{AppCache, QuoteKind};
use crate::config::FeedConfig;

use super::responses::{MarketQuote, QuoteSource};
use super::sources::LiveQuoteSource;

#[async_trait]
pub trait MarketPriceFeed: Send + Sync {
    /// 24K gold, INR per gram
    async fn gold_price_per_gram(&self) -> MarketQuote;

    /// INR per USD
    async fn exchange_rate(&self) -> MarketQuote;
}

/// Feed backed by live sources and the shared quote cache
pub struct LiveMarketFeed {
    gold_source: Option<Arc<dyn LiveQuoteSource>>,
    exchange_rate_source: Option<Arc<dyn LiveQuoteSource>>,
    cache: AppCache,
    config: FeedConfig,
}

impl LiveMarketFeed {
    /// Feed without live sources: serves cached values or defaults.
    pub fn new(cache: AppCache, config: FeedConfig) -> Self {
        Self {
            gold_source: None,
            exchange_rate_source: None,
            cache,
            config,
        }
    }

    pub fn with_gold_source(mut self, source: Arc<dyn LiveQuoteSource>) -> Self {
        self.gold_source = Some(source);
        self
    }

    pub fn with_exchange_rate_source(mut self, source: Arc<dyn LiveQuoteSource>) -> Self {
        self.exchange_rate_source = Some(source);
        self
    }

    fn source(&self, kind: QuoteKind) -> Option<&Arc<dyn LiveQuoteSource>> {
        match kind {
            QuoteKind::GoldPerGram => self.gold_source.as_ref(),
            QuoteKind::UsdInr => self.exchange_rate_source.as_ref(),
        }
    }

    fn default_value(&self, kind: QuoteKind) -> Decimal {
        match kind {
            QuoteKind::GoldPerGram => self.config.default_gold_price_per_gram,
            QuoteKind::UsdInr => self.config.default_exchange_rate,
        }
    }

    /// Current quote, served from cache inside the freshness window.
    pub async fn quote(&self, kind: QuoteKind) -> MarketQuote {
        if let Some(fresh) = self.cache.fresh_quote(kind).await {
            return fresh.served_as(QuoteSource::Cache);
        }
        self.fetch_or_fallback(kind).await
    }

    /// Force a live fetch, ignoring the fresh cache.
    pub async fn refresh(&self, kind: QuoteKind) -> MarketQuote {
        self.fetch_or_fallback(kind).await
    }

    async fn fetch_live(&self, kind: QuoteKind) -> Option<MarketQuote> {
        let source = self.source(kind)?;

        match timeout(self.config.timeout, source.fetch()).await {
            Ok(Ok(value)) if value > Decimal::ZERO => {
                let quote = MarketQuote::live(value, Utc::now());
                self.cache.store_quote(kind, quote.clone()).await;
                info!("Fetched {} = {} from {}", kind.label(), value, source.id());
                Some(quote)
            }
            Ok(Ok(value)) => {
                warn!(
                    "Ignoring non-positive {} = {} from {}",
                    kind.label(),
                    value,
                    source.id()
                );
                None
            }
            Ok(Err(e)) => {
                warn!("Failed to fetch {} from {}: {}", kind.label(), source.id(), e);
                None
            }
            Err(_) => {
                warn!(
                    "Timed out after {:?} fetching {} from {}",
                    self.config.timeout,
                    kind.label(),
                    source.id()
                );
                None
            }
        }
    }

    async fn fetch_or_fallback(&self, kind: QuoteKind) -> MarketQuote {
        if let Some(quote) = self.fetch_live(kind).await {
            return quote;
        }

        if let Some(last) = self.cache.last_known_quote(kind).await {
            warn!(
                "Using last known {} = {} from {}",
                kind.label(),
                last.value,
                last.timestamp
            );
            return last.served_as(QuoteSource::Stale);
        }

        let value = self.default_value(kind);
        warn!("Using default {} = {}", kind.label(), value);
        MarketQuote::fallback(value)
    }
}

#[async_trait]
impl MarketPriceFeed for LiveMarketFeed {
    async fn gold_price_per_gram(&self) -> MarketQuote {
        self.quote(QuoteKind::GoldPerGram).await
    }

    async fn exchange_rate(&self) -> MarketQuote {
        self.quote(QuoteKind::UsdInr).await
    }
}

/// Refresh both market values now and then on every tick of `every`.
pub async fn start_feed_refresher(feed: Arc<LiveMarketFeed>, every: Duration) {
    let mut ticker = interval(every);
    loop {
        ticker.tick().await;
        let gold = feed.refresh(QuoteKind::GoldPerGram).await;
        let rate = feed.refresh(QuoteKind::UsdInr).await;
        info!(
            "Market refresh: gold {} INR/g ({:?}), USD/INR {} ({:?})",
            gold.value, gold.source, rate.value, rate.source
        );
    }
}
