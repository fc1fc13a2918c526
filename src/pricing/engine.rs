//! Jewelry price engine.
//!
//! `calculate` resolves every material through the catalog and the static
//! tables, prices metal against the live gold feed, adds the fixed overhead
//! and converts to USD. It always returns a breakdown: lookup misses and feed
//! outages degrade to estimates and defaults, and any other failure produces
//! the flat emergency price.
//!
//! `quick_estimate` is the speculative variant quoted next to generated
//! product copy. It never touches the catalog or the feed and has no explicit
//! overhead term.

use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{debug, error, warn};

use crate::config::{PricingConfig, QuickEstimateConfig};
use crate::error::Result;

use super::calculators::{
    self, add_costs, calculate_totals, convert_inr_to_usd, gem_subtotal, non_negative,
    round_whole, scale, DEFAULT_CARATS,
};
use super::catalog::{MaterialCatalog, MaterialKey};
use super::estimation::{RuleTable, COMMERCIAL_METAL};
use super::feed::MarketPriceFeed;
use super::requests::{GemInput, PricingRequest};
use super::responses::{GemCost, MetalCost, PriceBreakdown, PriceSource, QuickEstimate};

fn table_source(table: &RuleTable, name: &str) -> (Decimal, PriceSource) {
    let hit = table.lookup(name);
    let source = if hit.is_default() {
        PriceSource::Default
    } else {
        PriceSource::Estimate
    };
    (hit.value, source)
}

fn is_commercial_metal(metal_type: &str) -> bool {
    metal_type.to_lowercase().contains(COMMERCIAL_METAL)
}

pub struct PriceEngine {
    catalog: Arc<dyn MaterialCatalog>,
    feed: Arc<dyn MarketPriceFeed>,
    config: PricingConfig,
}

impl PriceEngine {
    pub fn new(
        catalog: Arc<dyn MaterialCatalog>,
        feed: Arc<dyn MarketPriceFeed>,
        config: PricingConfig,
    ) -> Self {
        Self {
            catalog,
            feed,
            config,
        }
    }

    /// Price a piece. Never fails; see [`PriceBreakdown::is_fallback`].
    pub async fn calculate(&self, request: &PricingRequest) -> PriceBreakdown {
        match self.try_calculate(request).await {
            Ok(breakdown) => breakdown,
            Err(e) => {
                error!(
                    "Price calculation failed for {:?} ({}g): {}; returning emergency price",
                    request.metal_type, request.metal_weight_grams, e
                );
                self.emergency_breakdown(request)
            }
        }
    }

    /// Positional call shape kept for older callers.
    pub async fn calculate_legacy(
        &self,
        product_type: &str,
        metal_type: &str,
        metal_weight_grams: Decimal,
        gems: &[(&str, Option<Decimal>)],
        other_stone: Option<&str>,
    ) -> PriceBreakdown {
        let request = PricingRequest::from_legacy(
            product_type,
            metal_type,
            metal_weight_grams,
            gems,
            other_stone,
        );
        self.calculate(&request).await
    }

    /// The full pipeline, surfacing catalog and arithmetic failures.
    pub async fn try_calculate(&self, request: &PricingRequest) -> Result<PriceBreakdown> {
        if request.metal_weight_grams < Decimal::ZERO {
            warn!(
                "Negative metal weight {} treated as 0",
                request.metal_weight_grams
            );
        }
        let weight = non_negative(request.metal_weight_grams);

        let (modifier, metal_source) = self.resolve_metal_modifier(request).await?;
        let gold = self.feed.gold_price_per_gram().await;
        let metal_cost = calculators::metal_cost(weight, gold.value, modifier)?;

        let mut per_gem_cost = Vec::with_capacity(request.primary_gems.len() + 1);
        for gem in &request.primary_gems {
            per_gem_cost.push(self.price_gem(gem, false).await?);
        }
        if let Some(other) = &request.other_stone {
            per_gem_cost.push(self.price_gem(other, true).await?);
        }

        let rate = self.feed.exchange_rate().await;
        let (exchange_rate, exchange_rate_live) = if rate.value > Decimal::ZERO {
            (rate.value, rate.is_live)
        } else {
            warn!(
                "Feed returned exchange rate {}; using {}",
                rate.value, self.config.fallback_exchange_rate
            );
            (self.config.fallback_exchange_rate, false)
        };

        let subtotals: Vec<Decimal> = per_gem_cost.iter().map(|g| g.subtotal).collect();
        let totals = calculate_totals(metal_cost, &subtotals, exchange_rate)?;

        debug!(
            "Priced {:?}: metal {} + stones {} + overhead {} = {} INR / {} USD",
            request.metal_type,
            totals.metal_cost,
            totals.stone_cost,
            totals.overhead,
            totals.total_inr,
            totals.total_usd
        );

        Ok(PriceBreakdown {
            metal: MetalCost {
                metal_type: request.metal_type.clone(),
                weight_grams: weight,
                price_modifier: modifier,
                source: metal_source,
                modifier_defaulted: metal_source == PriceSource::Default,
                cost: totals.metal_cost,
            },
            metal_cost: totals.metal_cost,
            per_gem_cost,
            stone_cost: totals.stone_cost,
            overhead: totals.overhead,
            total_inr: totals.total_inr,
            total_usd: totals.total_usd,
            gold_price_per_gram: gold.value,
            gold_price_live: gold.is_live,
            exchange_rate_used: exchange_rate,
            exchange_rate_live,
            is_fallback: false,
        })
    }

    /// Commercial metal policy, then catalog id, catalog name, karat table.
    async fn resolve_metal_modifier(
        &self,
        request: &PricingRequest,
    ) -> Result<(Decimal, PriceSource)> {
        if is_commercial_metal(&request.metal_type) {
            debug!("{:?} is commercial metal, priced at zero", request.metal_type);
            return Ok((Decimal::ZERO, PriceSource::Policy));
        }

        if let Some(id) = &request.metal_type_id {
            if let Some(hit) = self.catalog.metal_price_modifier(MaterialKey::Id(id)).await? {
                return Ok((hit.value, hit.source));
            }
            debug!("Metal type id {} missed the catalog", id);
        }

        if let Some(hit) = self
            .catalog
            .metal_price_modifier(MaterialKey::Name(&request.metal_type))
            .await?
        {
            return Ok((hit.value, hit.source));
        }

        let (modifier, source) = table_source(&self.config.tables.metals, &request.metal_type);
        if source == PriceSource::Default {
            warn!(
                "Unrecognized metal {:?}, assuming modifier {}",
                request.metal_type, modifier
            );
        }
        Ok((modifier, source))
    }

    /// Catalog id, catalog name (exact then partial), static gem table.
    async fn resolve_stone_price(&self, gem: &GemInput) -> Result<(Decimal, PriceSource)> {
        if let Some(id) = &gem.stone_type_id {
            if let Some(hit) = self.catalog.stone_price_per_carat(MaterialKey::Id(id)).await? {
                return Ok((hit.value, hit.source));
            }
            debug!("Stone type id {} missed the catalog for {:?}", id, gem.name);
        }

        if let Some(hit) = self
            .catalog
            .stone_price_per_carat(MaterialKey::Name(&gem.name))
            .await?
        {
            return Ok((hit.value, hit.source));
        }

        let (price, source) = table_source(&self.config.tables.gems, &gem.name);
        debug!("Estimated {:?} at {} INR/ct ({:?})", gem.name, price, source);
        Ok((price, source))
    }

    async fn price_gem(&self, gem: &GemInput, is_other_stone: bool) -> Result<GemCost> {
        let (carats, carats_defaulted) = match gem.carats {
            Some(carats) => (non_negative(carats), false),
            None => (DEFAULT_CARATS, true),
        };
        let (unit_price, source) = self.resolve_stone_price(gem).await?;
        let subtotal = gem_subtotal(carats, unit_price)?;

        Ok(GemCost {
            name: gem.name.clone(),
            carats,
            unit_price,
            subtotal,
            source,
            carats_defaulted,
            price_estimated: !source.is_catalog(),
            is_other_stone,
        })
    }

    /// Flat price returned when the pipeline fails
    pub fn emergency_breakdown(&self, request: &PricingRequest) -> PriceBreakdown {
        let emergency = &self.config.emergency;
        let total_usd = convert_inr_to_usd(emergency.price_inr, emergency.exchange_rate)
            .unwrap_or(Decimal::ZERO);

        PriceBreakdown {
            metal: MetalCost {
                metal_type: request.metal_type.clone(),
                weight_grams: non_negative(request.metal_weight_grams),
                price_modifier: Decimal::ZERO,
                source: PriceSource::Default,
                modifier_defaulted: true,
                cost: Decimal::ZERO,
            },
            metal_cost: Decimal::ZERO,
            per_gem_cost: Vec::new(),
            stone_cost: Decimal::ZERO,
            overhead: Decimal::ZERO,
            total_inr: emergency.price_inr,
            total_usd,
            gold_price_per_gram: Decimal::ZERO,
            gold_price_live: false,
            exchange_rate_used: emergency.exchange_rate,
            exchange_rate_live: false,
            is_fallback: true,
        }
    }

    /// Speculative estimate for generated product copy. Never fails.
    pub fn quick_estimate(&self, request: &PricingRequest) -> QuickEstimate {
        match try_quick_estimate(&self.config.quick, request) {
            Ok(estimate) => estimate,
            Err(e) => {
                error!("Quick estimate failed: {}; returning emergency price", e);
                let emergency = &self.config.emergency;
                let exchange_rate = self.config.quick.exchange_rate;
                QuickEstimate {
                    price_usd: convert_inr_to_usd(emergency.price_inr, exchange_rate)
                        .unwrap_or(Decimal::ZERO),
                    price_inr: emergency.price_inr,
                    base_price: emergency.price_inr,
                    craftsmanship_multiplier: Decimal::ONE,
                    exchange_rate_used: exchange_rate,
                }
            }
        }
    }
}

/// Quick estimate from the static tables only.
///
/// `base = weight × gold × karat + Σ carats × gem price`; the retail gold rate
/// already covers making charges, so there is no overhead line. The product
/// type selects the craftsmanship multiplier.
pub fn try_quick_estimate(
    config: &QuickEstimateConfig,
    request: &PricingRequest,
) -> Result<QuickEstimate> {
    let weight = non_negative(request.metal_weight_grams);
    let modifier = config.tables.metals.value_for(&request.metal_type);
    let mut base_price = calculators::metal_cost(weight, config.gold_price_per_gram, modifier)?;

    for gem in request.all_gems() {
        let carats = gem.carats.map(non_negative).unwrap_or(DEFAULT_CARATS);
        let subtotal = gem_subtotal(carats, config.tables.gems.value_for(&gem.name))?;
        base_price = add_costs(base_price, subtotal)?;
    }

    let multiplier = config.craftsmanship.value_for(&request.product_type);
    let price_inr = round_whole(scale(base_price, multiplier)?);
    let price_usd = convert_inr_to_usd(price_inr, config.exchange_rate)?;

    Ok(QuickEstimate {
        price_usd,
        price_inr,
        base_price,
        craftsmanship_multiplier: multiplier,
        exchange_rate_used: config.exchange_rate,
    })
}
