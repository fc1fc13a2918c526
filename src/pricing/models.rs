//! Database models for the material catalog.
//!
//! These models use sqlx's FromRow derive for direct database deserialization.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Metal type from metal_types
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetalType {
    pub id: i32,
    pub name: String,
    /// Percentage of the 24K gold price, e.g. 91 for 22K
    pub price_modifier: Option<Decimal>,
}

impl MetalType {
    /// Modifier as a fraction, `None` when missing or zero
    pub fn modifier_fraction(&self) -> Option<Decimal> {
        self.price_modifier
            .filter(|pct| *pct > Decimal::ZERO)
            .map(|pct| pct / Decimal::ONE_HUNDRED)
    }
}

/// Stone type from stone_types
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoneType {
    pub id: i32,
    pub name: String,
    /// INR per carat
    pub price_per_carat: Option<Decimal>,
}

impl StoneType {
    /// Price per carat, `None` when missing or zero
    pub fn usable_price(&self) -> Option<Decimal> {
        self.price_per_carat.filter(|p| *p > Decimal::ZERO)
    }
}

/// Anything in the catalog addressable by name
pub trait NamedMaterial {
    fn name(&self) -> &str;
}

impl NamedMaterial for MetalType {
    fn name(&self) -> &str {
        &self.name
    }
}

impl NamedMaterial for StoneType {
    fn name(&self) -> &str {
        &self.name
    }
}

/// Case-insensitive whole-name match
pub fn name_equals(a: &str, b: &str) -> bool {
    a.trim().to_lowercase() == b.trim().to_lowercase()
}

/// Case-insensitive containment in either direction
pub fn name_overlaps(catalog_name: &str, requested: &str) -> bool {
    let catalog_name = catalog_name.trim().to_lowercase();
    let requested = requested.trim().to_lowercase();
    if catalog_name.is_empty() || requested.is_empty() {
        return false;
    }
    requested.contains(&catalog_name) || catalog_name.contains(&requested)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_modifier_fraction() {
        let metal = MetalType {
            id: 1,
            name: "22K Gold".to_string(),
            price_modifier: Some(dec!(91)),
        };
        assert_eq!(metal.modifier_fraction(), Some(dec!(0.91)));

        let zero = MetalType {
            price_modifier: Some(Decimal::ZERO),
            ..metal.clone()
        };
        assert_eq!(zero.modifier_fraction(), None);

        let missing = MetalType {
            price_modifier: None,
            ..metal
        };
        assert_eq!(missing.modifier_fraction(), None);
    }

    #[test]
    fn test_usable_price() {
        let stone = StoneType {
            id: 4,
            name: "Ruby".to_string(),
            price_per_carat: Some(dec!(3200)),
        };
        assert_eq!(stone.usable_price(), Some(dec!(3200)));
        let unpriced = StoneType {
            price_per_carat: Some(Decimal::ZERO),
            ..stone
        };
        assert_eq!(unpriced.usable_price(), None);
    }

    #[test]
    fn test_name_matching() {
        assert!(name_equals("Natural Diamond", " natural diamond "));
        assert!(!name_equals("Diamond", "Natural Diamond"));

        assert!(name_overlaps("Diamond", "Natural Diamond"));
        assert!(name_overlaps("Blue Sapphire Premium", "blue sapphire"));
        assert!(!name_overlaps("Ruby", "Emerald"));
        assert!(!name_overlaps("", "Emerald"));
    }
}
