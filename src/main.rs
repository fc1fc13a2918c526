//! Jewelry pricing operator CLI
//!
//! Thin harness over the library for checking prices and market feeds from a
//! shell. Requests are the same camelCase JSON the storefront sends.

use anyhow::{bail, Context, Result};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::postgres::PgPoolOptions;
use std::io::Read;
use std::str::FromStr;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use jewelry_pricing::cache::{AppCache, QuoteKind};
use jewelry_pricing::config::AppConfig;
use jewelry_pricing::pricing::sources::{HtmlGoldPriceSource, JsonExchangeRateSource};
use jewelry_pricing::pricing::{
    start_feed_refresher, InMemoryCatalog, LiveMarketFeed, MaterialCatalog, PgMaterialCatalog,
    PriceEngine, PricingRequest,
};

const USAGE: &str = "usage:
  jewelry-pricing quote [request.json|-]
  jewelry-pricing quick [request.json|-]
  jewelry-pricing legacy <productType> <metalType> <grams> [gem[:carats]...] [other=<stone>]
  jewelry-pricing market
  jewelry-pricing watch";

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = AppConfig::from_env().context("loading configuration")?;
    let cache = AppCache::new(config.feed.cache_ttl);
    let feed = Arc::new(build_feed(&config, cache.clone())?);

    let args: Vec<String> = std::env::args().skip(1).collect();
    match args.first().map(String::as_str) {
        Some("quote") => {
            let request = read_request(args.get(1))?;
            let catalog = build_catalog(&config, cache).await?;
            let engine = PriceEngine::new(catalog, feed, config.pricing);
            print_json(&engine.calculate(&request).await)
        }
        Some("quick") => {
            let request = read_request(args.get(1))?;
            let engine = PriceEngine::new(Arc::new(InMemoryCatalog::new()), feed, config.pricing);
            print_json(&engine.quick_estimate(&request))
        }
        Some("legacy") => {
            let (product_type, metal_type, grams) = match &args[1..] {
                [product, metal, grams, ..] => (product, metal, grams),
                _ => bail!("{}", USAGE),
            };
            let grams = Decimal::from_str(grams).with_context(|| format!("weight {:?}", grams))?;
            let (gems, other_stone) = parse_legacy_gems(&args[4..])?;
            let gems: Vec<(&str, Option<Decimal>)> =
                gems.iter().map(|(name, carats)| (name.as_str(), *carats)).collect();

            let catalog = build_catalog(&config, cache).await?;
            let engine = PriceEngine::new(catalog, feed, config.pricing);
            let breakdown = engine
                .calculate_legacy(product_type, metal_type, grams, &gems, other_stone.as_deref())
                .await;
            print_json(&breakdown)
        }
        Some("market") => {
            let gold = feed.quote(QuoteKind::GoldPerGram).await;
            let rate = feed.quote(QuoteKind::UsdInr).await;
            print_json(&serde_json::json!({ "goldPricePerGram": gold, "usdInr": rate }))
        }
        Some("watch") => {
            info!("Refreshing market quotes every {:?}", config.refresh_interval);
            start_feed_refresher(feed, config.refresh_interval).await;
            Ok(())
        }
        _ => bail!("{}", USAGE),
    }
}

fn build_feed(config: &AppConfig, cache: AppCache) -> Result<LiveMarketFeed> {
    let mut feed = LiveMarketFeed::new(cache, config.feed.clone());

    if let Some(url) = &config.gold_price_url {
        let source = HtmlGoldPriceSource::new(
            url.clone(),
            config.gold_price_selector.clone(),
            config.gold_price_grams_per_quote,
        )?;
        feed = feed.with_gold_source(Arc::new(source));
    }
    if let Some(url) = &config.exchange_rate_url {
        feed = feed.with_exchange_rate_source(Arc::new(JsonExchangeRateSource::new(url.clone())));
    }

    Ok(feed)
}

async fn build_catalog(config: &AppConfig, cache: AppCache) -> Result<Arc<dyn MaterialCatalog>> {
    if let Some(url) = &config.database_url {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(url)
            .await
            .context("connecting to catalog database")?;
        return Ok(Arc::new(PgMaterialCatalog::new(pool, cache)));
    }

    match &config.catalog_file {
        Some(path) => {
            let catalog = InMemoryCatalog::from_json_file(path)
                .with_context(|| format!("loading catalog from {}", path))?;
            info!(
                "Loaded {} metals and {} stones from {}",
                catalog.metals.len(),
                catalog.stones.len(),
                path
            );
            Ok(Arc::new(catalog))
        }
        None => {
            info!("No DATABASE_URL or CATALOG_FILE; pricing from estimation tables only");
            Ok(Arc::new(InMemoryCatalog::new()))
        }
    }
}

/// `Ruby:1.5`, `Pearl`, and one optional `other=<stone>`
fn parse_legacy_gems(args: &[String]) -> Result<(Vec<(String, Option<Decimal>)>, Option<String>)> {
    let mut gems = Vec::new();
    let mut other_stone = None;

    for arg in args {
        if let Some(name) = arg.strip_prefix("other=") {
            other_stone = Some(name.to_string());
            continue;
        }
        match arg.rsplit_once(':') {
            Some((name, carats)) => {
                let carats = Decimal::from_str(carats)
                    .with_context(|| format!("carats in {:?}", arg))?;
                gems.push((name.to_string(), Some(carats)));
            }
            None => gems.push((arg.clone(), None)),
        }
    }

    Ok((gems, other_stone))
}

fn read_request(path: Option<&String>) -> Result<PricingRequest> {
    let raw = match path.map(String::as_str) {
        None | Some("-") => {
            let mut raw = String::new();
            std::io::stdin().read_to_string(&mut raw)?;
            raw
        }
        Some(path) => std::fs::read_to_string(path).with_context(|| format!("reading {}", path))?,
    };
    serde_json::from_str(&raw).context("parsing pricing request")
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
