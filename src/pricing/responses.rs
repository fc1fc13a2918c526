//! Result types returned by the price engine and market feed.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

/// Where a resolved unit price or modifier came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceSource {
    /// Zero-cost metal rule, applied before any lookup
    Policy,
    CatalogId,
    CatalogName,
    CatalogPartial,
    /// A rule in the static estimation table matched
    Estimate,
    /// Nothing matched; the table default was used
    Default,
}

impl PriceSource {
    pub fn is_catalog(self) -> bool {
        matches!(
            self,
            PriceSource::CatalogId | PriceSource::CatalogName | PriceSource::CatalogPartial
        )
    }
}

/// Metal line of a breakdown
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetalCost {
    pub metal_type: String,
    #[serde(with = "rust_decimal::serde::str")]
    pub weight_grams: Decimal,
    /// Fraction of the 24K price
    #[serde(with = "rust_decimal::serde::str")]
    pub price_modifier: Decimal,
    pub source: PriceSource,
    /// True when the metal was not recognized and the 18K default was assumed
    pub modifier_defaulted: bool,
    #[serde(with = "rust_decimal::serde::str")]
    pub cost: Decimal,
}

/// One gem line of a breakdown
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GemCost {
    pub name: String,
    #[serde(with = "rust_decimal::serde::str")]
    pub carats: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub unit_price: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub subtotal: Decimal,
    pub source: PriceSource,
    pub carats_defaulted: bool,
    /// True when the price came from the static table rather than the catalog
    pub price_estimated: bool,
    pub is_other_stone: bool,
}

/// Full cost breakdown in INR with a USD conversion
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceBreakdown {
    pub metal: MetalCost,
    #[serde(with = "rust_decimal::serde::str")]
    pub metal_cost: Decimal,
    pub per_gem_cost: Vec<GemCost>,
    #[serde(with = "rust_decimal::serde::str")]
    pub stone_cost: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub overhead: Decimal,
    #[serde(rename = "totalINR", with = "rust_decimal::serde::str")]
    pub total_inr: Decimal,
    #[serde(rename = "totalUSD", with = "rust_decimal::serde::str")]
    pub total_usd: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub gold_price_per_gram: Decimal,
    pub gold_price_live: bool,
    #[serde(with = "rust_decimal::serde::str")]
    pub exchange_rate_used: Decimal,
    pub exchange_rate_live: bool,
    /// Set on the flat emergency price returned when calculation failed
    pub is_fallback: bool,
}

impl PriceBreakdown {
    /// Number of gems whose price came from the static table
    pub fn estimated_gem_count(&self) -> usize {
        self.per_gem_cost.iter().filter(|g| g.price_estimated).count()
    }
}

/// Speculative price used alongside generated product copy
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuickEstimate {
    #[serde(rename = "priceUSD", with = "rust_decimal::serde::str")]
    pub price_usd: Decimal,
    #[serde(rename = "priceINR", with = "rust_decimal::serde::str")]
    pub price_inr: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub base_price: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub craftsmanship_multiplier: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub exchange_rate_used: Decimal,
}

/// How a market quote was obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QuoteSource {
    Live,
    /// Live value fetched inside the freshness window
    Cache,
    /// Last known live value, older than the freshness window
    Stale,
    /// Configured static default
    Default,
}

/// A market value with its provenance
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketQuote {
    #[serde(with = "rust_decimal::serde::str")]
    pub value: Decimal,
    pub is_live: bool,
    pub timestamp: DateTime<Utc>,
    pub source: QuoteSource,
}

impl MarketQuote {
    pub fn live(value: Decimal, timestamp: DateTime<Utc>) -> Self {
        Self {
            value,
            is_live: true,
            timestamp,
            source: QuoteSource::Live,
        }
    }

    pub fn fallback(value: Decimal) -> Self {
        Self {
            value,
            is_live: false,
            timestamp: Utc::now(),
            source: QuoteSource::Default,
        }
    }

    /// Re-label a stored live quote when it is served from cache.
    pub fn served_as(&self, source: QuoteSource) -> Self {
        Self {
            value: self.value,
            is_live: matches!(source, QuoteSource::Live | QuoteSource::Cache),
            timestamp: self.timestamp,
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_served_as_updates_liveness() {
        let quote = MarketQuote::live(dec!(9800), Utc::now());
        let cached = quote.served_as(QuoteSource::Cache);
        assert!(cached.is_live);
        assert_eq!(cached.timestamp, quote.timestamp);

        let stale = quote.served_as(QuoteSource::Stale);
        assert!(!stale.is_live);
        assert_eq!(stale.value, dec!(9800));
    }

    #[test]
    fn test_quick_estimate_json_keys() {
        let estimate = QuickEstimate {
            price_usd: dec!(120),
            price_inr: dec!(10000),
            base_price: dec!(10000),
            craftsmanship_multiplier: dec!(1.0),
            exchange_rate_used: dec!(84),
        };
        let json = serde_json::to_value(&estimate).unwrap();
        assert_eq!(json["priceUSD"], "120");
        assert_eq!(json["priceINR"], "10000");
    }

    #[test]
    fn test_price_source_is_catalog() {
        assert!(PriceSource::CatalogPartial.is_catalog());
        assert!(!PriceSource::Estimate.is_catalog());
        assert!(!PriceSource::Policy.is_catalog());
    }
}
