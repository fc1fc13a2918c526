//! Core pricing calculation functions.
//!
//! Pure functions for pricing math - no catalog or market access.
//! Every multiplication and division is checked so an overflow surfaces as a
//! calculation error instead of a panic.

use rust_decimal::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::error::{AppError, Result};

/// Craftsmanship and business overhead applied to combined material cost
pub const OVERHEAD_RATE: Decimal = dec!(0.25);

/// Carat weight assumed for a gem whose weight was not given
pub const DEFAULT_CARATS: Decimal = dec!(0.5);

/// Round to specified decimal places using banker's rounding (ROUND_HALF_EVEN).
///
/// Banker's rounding rounds to the nearest even number when the value is exactly
/// halfway between two possibilities. This reduces cumulative rounding bias.
///
/// # Examples
/// ```
/// use rust_decimal_macros::dec;
/// use jewelry_pricing::pricing::round_money;
///
/// assert_eq!(round_money(dec!(2.5), 0), dec!(2));   // rounds to even
/// assert_eq!(round_money(dec!(3.5), 0), dec!(4));   // rounds to even
/// assert_eq!(round_money(dec!(1.234), 2), dec!(1.23));
/// ```
pub fn round_money(amount: Decimal, places: u32) -> Decimal {
    amount.round_dp_with_strategy(places, RoundingStrategy::MidpointNearestEven)
}

/// Round to whole currency units, halves away from zero.
///
/// Used for every customer-facing total (INR and USD).
pub fn round_whole(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
}

/// Clamp negative caller input to zero.
pub fn non_negative(value: Decimal) -> Decimal {
    value.max(Decimal::ZERO)
}

fn checked(operation: &str, value: Option<Decimal>) -> Result<Decimal> {
    value.ok_or_else(|| AppError::Calculation(format!("{} overflowed", operation)))
}

/// `weight × gold price per gram × purity modifier`
pub fn metal_cost(
    weight_grams: Decimal,
    gold_price_per_gram: Decimal,
    modifier: Decimal,
) -> Result<Decimal> {
    let per_gram = checked("metal price", gold_price_per_gram.checked_mul(modifier))?;
    checked("metal cost", weight_grams.checked_mul(per_gram))
}

/// `carats × price per carat`
pub fn gem_subtotal(carats: Decimal, unit_price: Decimal) -> Result<Decimal> {
    checked("gem subtotal", carats.checked_mul(unit_price))
}

/// Checked sum of two costs
pub fn add_costs(a: Decimal, b: Decimal) -> Result<Decimal> {
    checked("cost sum", a.checked_add(b))
}

/// Checked `amount × factor`
pub fn scale(amount: Decimal, factor: Decimal) -> Result<Decimal> {
    checked("scaling", amount.checked_mul(factor))
}

/// Fixed 25% overhead on the material cost, in whole rupees.
pub fn overhead(material_cost: Decimal) -> Result<Decimal> {
    let raw = checked("overhead", material_cost.checked_mul(OVERHEAD_RATE))?;
    Ok(round_whole(raw))
}

/// Convert a rupee amount to whole dollars at `inr_per_usd`.
pub fn convert_inr_to_usd(amount_inr: Decimal, inr_per_usd: Decimal) -> Result<Decimal> {
    if inr_per_usd <= Decimal::ZERO {
        return Err(AppError::Calculation(format!(
            "exchange rate must be positive, got {}",
            inr_per_usd
        )));
    }
    let usd = checked("currency conversion", amount_inr.checked_div(inr_per_usd))?;
    Ok(round_whole(usd))
}

/// Aggregate a metal cost and gem subtotals into overhead and totals.
///
/// `overhead` and `total_inr` are each rounded to whole rupees. For material
/// costs under about 4 INR the rounding can leave `total_inr` below the
/// unrounded material cost (1.47 INR totals 1 INR).
pub fn calculate_totals(
    metal_cost: Decimal,
    gem_subtotals: &[Decimal],
    inr_per_usd: Decimal,
) -> Result<PriceTotals> {
    let mut stone_cost = Decimal::ZERO;
    for subtotal in gem_subtotals {
        stone_cost = checked("stone cost", stone_cost.checked_add(*subtotal))?;
    }

    let material_cost = checked("material cost", metal_cost.checked_add(stone_cost))?;
    let overhead = overhead(material_cost)?;
    let total_inr = round_whole(checked(
        "total",
        material_cost.checked_add(overhead),
    )?);
    let total_usd = convert_inr_to_usd(total_inr, inr_per_usd)?;

    Ok(PriceTotals {
        metal_cost,
        stone_cost,
        overhead,
        total_inr,
        total_usd,
    })
}

/// Result of pricing totals calculation
#[derive(Debug, Clone, PartialEq)]
pub struct PriceTotals {
    pub metal_cost: Decimal,
    pub stone_cost: Decimal,
    pub overhead: Decimal,
    pub total_inr: Decimal,
    pub total_usd: Decimal,
}

#[cfg(test)]
mod tests {
    use super::*;

    // ==================== round_money tests ====================

    #[test]
    fn test_round_money_bankers_rounding_to_even() {
        assert_eq!(round_money(dec!(2.5), 0), dec!(2)); // rounds down to even
        assert_eq!(round_money(dec!(3.5), 0), dec!(4)); // rounds up to even
        assert_eq!(round_money(dec!(4.5), 0), dec!(4));
        assert_eq!(round_money(dec!(5.5), 0), dec!(6));
    }

    #[test]
    fn test_round_money_normal_rounding() {
        assert_eq!(round_money(dec!(1.234), 2), dec!(1.23));
        assert_eq!(round_money(dec!(1.236), 2), dec!(1.24));
        assert_eq!(round_money(dec!(984.55), 1), dec!(984.6));
    }

    // ==================== round_whole tests ====================

    #[test]
    fn test_round_whole_half_away_from_zero() {
        assert_eq!(round_whole(dec!(2.5)), dec!(3));
        assert_eq!(round_whole(dec!(3.5)), dec!(4));
        assert_eq!(round_whole(dec!(1106.93)), dec!(1107));
        assert_eq!(round_whole(dec!(1106.49)), dec!(1106));
    }

    #[test]
    fn test_non_negative_clamps() {
        assert_eq!(non_negative(dec!(-3)), Decimal::ZERO);
        assert_eq!(non_negative(dec!(4.2)), dec!(4.2));
    }

    // ==================== cost components ====================

    #[test]
    fn test_metal_cost() {
        assert_eq!(metal_cost(dec!(10), dec!(9800), dec!(0.75)).unwrap(), dec!(73500));
        assert_eq!(metal_cost(dec!(10), dec!(9800), Decimal::ZERO).unwrap(), Decimal::ZERO);
        assert_eq!(metal_cost(Decimal::ZERO, dec!(9800), dec!(1)).unwrap(), Decimal::ZERO);
    }

    #[test]
    fn test_metal_cost_monotonic_in_weight() {
        let mut previous = Decimal::ZERO;
        for grams in 0..50 {
            let cost = metal_cost(Decimal::from(grams), dec!(9800), dec!(0.58)).unwrap();
            assert!(cost >= previous);
            previous = cost;
        }
    }

    #[test]
    fn test_metal_cost_overflow_is_error() {
        let result = metal_cost(Decimal::MAX, Decimal::MAX, dec!(1));
        assert!(matches!(result, Err(AppError::Calculation(_))));
    }

    #[test]
    fn test_gem_subtotal() {
        assert_eq!(gem_subtotal(DEFAULT_CARATS, dec!(56000)).unwrap(), dec!(28000));
        assert_eq!(gem_subtotal(dec!(1.25), dec!(800)).unwrap(), dec!(1000));
    }

    #[test]
    fn test_add_and_scale_are_checked() {
        assert_eq!(add_costs(dec!(1.5), dec!(2)).unwrap(), dec!(3.5));
        assert_eq!(scale(dec!(199100), dec!(1.3)).unwrap(), dec!(258830));
        assert!(add_costs(Decimal::MAX, Decimal::MAX).is_err());
        assert!(scale(Decimal::MAX, dec!(2)).is_err());
    }

    #[test]
    fn test_overhead_is_quarter_rounded() {
        assert_eq!(overhead(dec!(73500)).unwrap(), dec!(18375));
        assert_eq!(overhead(dec!(10.02)).unwrap(), dec!(3)); // 2.505
        assert_eq!(overhead(Decimal::ZERO).unwrap(), Decimal::ZERO);
    }

    #[test]
    fn test_convert_inr_to_usd() {
        assert_eq!(convert_inr_to_usd(dec!(91875), dec!(83)).unwrap(), dec!(1107));
        assert!(convert_inr_to_usd(dec!(100), Decimal::ZERO).is_err());
        assert!(convert_inr_to_usd(dec!(100), dec!(-83)).is_err());
    }

    // ==================== calculate_totals tests ====================

    #[test]
    fn test_calculate_totals_metal_only() {
        let totals = calculate_totals(dec!(73500), &[], dec!(83)).unwrap();
        assert_eq!(totals.stone_cost, Decimal::ZERO);
        assert_eq!(totals.overhead, dec!(18375));
        assert_eq!(totals.total_inr, dec!(91875));
        assert_eq!(totals.total_usd, dec!(1107));
    }

    #[test]
    fn test_calculate_totals_with_gems() {
        let totals = calculate_totals(dec!(10000), &[dec!(28000), dec!(1750)], dec!(83)).unwrap();
        assert_eq!(totals.stone_cost, dec!(29750));
        // (10000 + 29750) * 0.25 = 9937.5 -> 9938
        assert_eq!(totals.overhead, dec!(9938));
        assert_eq!(totals.total_inr, dec!(49688));
        assert_eq!(totals.total_usd, round_whole(dec!(49688) / dec!(83)));
    }

    #[test]
    fn test_calculate_totals_tiny_material_rounds_down() {
        // 0.0002 g of 18K at 9800/g
        let metal = metal_cost(dec!(0.0002), dec!(9800), dec!(0.75)).unwrap();
        let totals = calculate_totals(metal, &[], dec!(83)).unwrap();
        assert_eq!(totals.metal_cost, dec!(1.47));
        assert_eq!(totals.overhead, Decimal::ZERO);
        assert_eq!(totals.total_inr, dec!(1));
        assert!(totals.total_inr < totals.metal_cost);
        assert_eq!(totals.total_usd, Decimal::ZERO);
    }

    #[test]
    fn test_calculate_totals_arithmetic_laws() {
        let cases = [
            (dec!(0), vec![]),
            (dec!(1234.56), vec![dec!(0.01)]),
            (dec!(99999.99), vec![dec!(500), dec!(333.33)]),
        ];
        for (metal, gems) in cases {
            let totals = calculate_totals(metal, &gems, dec!(83.25)).unwrap();
            let material = totals.metal_cost + totals.stone_cost;
            assert_eq!(totals.overhead, round_whole(material * OVERHEAD_RATE));
            assert_eq!(totals.total_inr, round_whole(material + totals.overhead));
            assert_eq!(totals.total_usd, round_whole(totals.total_inr / dec!(83.25)));
            assert!(totals.total_inr >= material);
        }
    }
}
