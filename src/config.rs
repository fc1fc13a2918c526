//! Runtime configuration loaded from the environment.
//!
//! `.env` is read through dotenvy first. Every value has a default so the
//! library runs with nothing configured: no database (in-memory catalog) and
//! no live sources (cached or default market values).

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{AppError, Result};
use crate::pricing::estimation::{craftsmanship_multipliers, EstimationTables, RuleTable};

pub const DEFAULT_GOLD_PRICE_PER_GRAM: Decimal = dec!(9800);
pub const DEFAULT_USD_INR_RATE: Decimal = dec!(83);
pub const DEFAULT_GOLD_PRICE_SELECTOR: &str = ".gold-price";

/// Market feed fallbacks and timing
#[derive(Debug, Clone, PartialEq)]
pub struct FeedConfig {
    pub default_gold_price_per_gram: Decimal,
    pub default_exchange_rate: Decimal,
    /// Bound on a single live fetch
    pub timeout: Duration,
    /// Freshness window of cached quotes
    pub cache_ttl: Duration,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            default_gold_price_per_gram: DEFAULT_GOLD_PRICE_PER_GRAM,
            default_exchange_rate: DEFAULT_USD_INR_RATE,
            timeout: Duration::from_secs(10),
            cache_ttl: Duration::from_secs(15 * 60),
        }
    }
}

/// Flat price shown when a calculation fails outright
#[derive(Debug, Clone, PartialEq)]
pub struct EmergencyConfig {
    pub price_inr: Decimal,
    pub exchange_rate: Decimal,
}

impl Default for EmergencyConfig {
    fn default() -> Self {
        Self {
            price_inr: dec!(25000),
            exchange_rate: DEFAULT_USD_INR_RATE,
        }
    }
}

/// Constants of the quick content estimate.
///
/// Kept apart from the engine's market defaults: the quick estimate prices at
/// a retail gold rate with making charges folded in and converts at its own
/// rate.
#[derive(Debug, Clone, PartialEq)]
pub struct QuickEstimateConfig {
    pub gold_price_per_gram: Decimal,
    pub exchange_rate: Decimal,
    pub tables: EstimationTables,
    pub craftsmanship: RuleTable,
}

impl Default for QuickEstimateConfig {
    fn default() -> Self {
        Self {
            gold_price_per_gram: dec!(10500),
            exchange_rate: dec!(84),
            tables: EstimationTables::quick(),
            craftsmanship: craftsmanship_multipliers(),
        }
    }
}

/// Business parameters of the price engine
#[derive(Debug, Clone, PartialEq)]
pub struct PricingConfig {
    pub tables: EstimationTables,
    /// Used when the feed hands back a non-positive exchange rate
    pub fallback_exchange_rate: Decimal,
    pub emergency: EmergencyConfig,
    pub quick: QuickEstimateConfig,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            tables: EstimationTables::standard(),
            fallback_exchange_rate: DEFAULT_USD_INR_RATE,
            emergency: EmergencyConfig::default(),
            quick: QuickEstimateConfig::default(),
        }
    }
}

/// Everything the binary needs to wire the engine
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: Option<String>,
    pub catalog_file: Option<String>,
    pub gold_price_url: Option<String>,
    pub gold_price_selector: String,
    pub gold_price_grams_per_quote: Decimal,
    pub exchange_rate_url: Option<String>,
    pub refresh_interval: Duration,
    pub feed: FeedConfig,
    pub pricing: PricingConfig,
}

impl AppConfig {
    /// Load `.env` (if present) and read the process environment
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; blank values count as unset
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let decimal = |key: &str, default: Decimal| -> Result<Decimal> {
            match get(key) {
                Some(raw) => parse_positive_decimal(key, &raw),
                None => Ok(default),
            }
        };
        let seconds = |key: &str, default: u64| -> Result<Duration> {
            match get(key) {
                Some(raw) => raw
                    .parse::<u64>()
                    .ok()
                    .filter(|s| *s > 0)
                    .map(Duration::from_secs)
                    .ok_or_else(|| {
                        AppError::Config(format!("{} must be a positive number of seconds", key))
                    }),
                None => Ok(Duration::from_secs(default)),
            }
        };

        let feed = FeedConfig {
            default_gold_price_per_gram: decimal(
                "DEFAULT_GOLD_PRICE_PER_GRAM",
                DEFAULT_GOLD_PRICE_PER_GRAM,
            )?,
            default_exchange_rate: decimal("DEFAULT_USD_INR_RATE", DEFAULT_USD_INR_RATE)?,
            timeout: seconds("PRICE_FEED_TIMEOUT_SECS", 10)?,
            cache_ttl: seconds("PRICE_CACHE_TTL_SECS", 15 * 60)?,
        };

        let defaults = QuickEstimateConfig::default();
        let quick = QuickEstimateConfig {
            gold_price_per_gram: decimal(
                "QUICK_GOLD_PRICE_PER_GRAM",
                defaults.gold_price_per_gram,
            )?,
            exchange_rate: decimal("QUICK_USD_INR_RATE", defaults.exchange_rate)?,
            ..defaults
        };

        let pricing = PricingConfig {
            tables: EstimationTables::standard(),
            fallback_exchange_rate: feed.default_exchange_rate,
            emergency: EmergencyConfig {
                price_inr: decimal("EMERGENCY_PRICE_INR", EmergencyConfig::default().price_inr)?,
                exchange_rate: feed.default_exchange_rate,
            },
            quick,
        };

        Ok(Self {
            database_url: get("DATABASE_URL"),
            catalog_file: get("CATALOG_FILE"),
            gold_price_url: get("GOLD_PRICE_URL"),
            gold_price_selector: get("GOLD_PRICE_SELECTOR")
                .unwrap_or_else(|| DEFAULT_GOLD_PRICE_SELECTOR.to_string()),
            gold_price_grams_per_quote: decimal("GOLD_PRICE_GRAMS_PER_QUOTE", dec!(10))?,
            exchange_rate_url: get("EXCHANGE_RATE_URL"),
            refresh_interval: seconds("PRICE_REFRESH_INTERVAL_SECS", 10 * 60)?,
            feed,
            pricing,
        })
    }
}

fn parse_positive_decimal(key: &str, raw: &str) -> Result<Decimal> {
    Decimal::from_str(raw)
        .ok()
        .filter(|v| *v > Decimal::ZERO)
        .ok_or_else(|| {
            AppError::Config(format!("{} must be a positive number, got {:?}", key, raw))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<AppConfig> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults_with_empty_environment() {
        let config = config_from(&[]).unwrap();
        assert!(config.database_url.is_none());
        assert!(config.gold_price_url.is_none());
        assert_eq!(config.gold_price_selector, DEFAULT_GOLD_PRICE_SELECTOR);
        assert_eq!(config.feed, FeedConfig::default());
        assert_eq!(config.pricing, PricingConfig::default());
        assert_eq!(config.gold_price_grams_per_quote, dec!(10));
    }

    #[test]
    fn test_overrides() {
        let config = config_from(&[
            ("DATABASE_URL", "postgres://localhost/jewelry"),
            ("DEFAULT_GOLD_PRICE_PER_GRAM", "10150.5"),
            ("DEFAULT_USD_INR_RATE", "84.2"),
            ("PRICE_FEED_TIMEOUT_SECS", "3"),
            ("EMERGENCY_PRICE_INR", "30000"),
            ("QUICK_USD_INR_RATE", "85"),
        ])
        .unwrap();

        assert_eq!(config.database_url.as_deref(), Some("postgres://localhost/jewelry"));
        assert_eq!(config.feed.default_gold_price_per_gram, dec!(10150.5));
        assert_eq!(config.feed.timeout, Duration::from_secs(3));
        assert_eq!(config.pricing.fallback_exchange_rate, dec!(84.2));
        assert_eq!(config.pricing.emergency.price_inr, dec!(30000));
        assert_eq!(config.pricing.emergency.exchange_rate, dec!(84.2));
        assert_eq!(config.pricing.quick.exchange_rate, dec!(85));
        assert_eq!(config.pricing.quick.gold_price_per_gram, dec!(10500));
    }

    #[test]
    fn test_blank_values_are_unset() {
        let config = config_from(&[("DATABASE_URL", "  "), ("DEFAULT_USD_INR_RATE", "")]).unwrap();
        assert!(config.database_url.is_none());
        assert_eq!(config.feed.default_exchange_rate, DEFAULT_USD_INR_RATE);
    }

    #[test]
    fn test_invalid_values_are_config_errors() {
        assert!(matches!(
            config_from(&[("DEFAULT_USD_INR_RATE", "eighty-three")]),
            Err(AppError::Config(_))
        ));
        assert!(matches!(
            config_from(&[("DEFAULT_GOLD_PRICE_PER_GRAM", "-1")]),
            Err(AppError::Config(_))
        ));
        assert!(matches!(
            config_from(&[("PRICE_CACHE_TTL_SECS", "0")]),
            Err(AppError::Config(_))
        ));
    }
}
