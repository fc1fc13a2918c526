//! Static estimation tables for materials the catalog can't price.
//!
//! Every table is an ordered list of substring rules evaluated top to bottom;
//! the first rule that matches the lowercased material name wins, otherwise the
//! table default applies. The same structure carries karat modifiers, gem
//! prices per carat and craftsmanship multipliers.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// A single first-match rule.
///
/// Matches when the name contains any of `any_of` and, if `requires_any` is
/// non-empty, also contains one of `requires_any` (e.g. "diamond" + "lab").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceRule {
    pub label: String,
    pub any_of: Vec<String>,
    #[serde(default)]
    pub requires_any: Vec<String>,
    #[serde(with = "rust_decimal::serde::str")]
    pub value: Decimal,
}

impl PriceRule {
    pub fn new(label: &str, any_of: &[&str], value: Decimal) -> Self {
        Self {
            label: label.to_string(),
            any_of: any_of.iter().map(|s| s.to_string()).collect(),
            requires_any: Vec::new(),
            value,
        }
    }

    /// Narrow the rule to names that also contain one of `keywords`.
    pub fn requiring(mut self, keywords: &[&str]) -> Self {
        self.requires_any = keywords.iter().map(|s| s.to_string()).collect();
        self
    }

    /// `name_lower` must already be lowercased.
    pub fn matches(&self, name_lower: &str) -> bool {
        let primary = self.any_of.iter().any(|k| name_lower.contains(k.as_str()));
        if !primary {
            return false;
        }
        self.requires_any.is_empty()
            || self
                .requires_any
                .iter()
                .any(|k| name_lower.contains(k.as_str()))
    }
}

/// Result of a table lookup
#[derive(Debug, Clone, PartialEq)]
pub struct TableMatch {
    pub value: Decimal,
    /// Label of the matching rule, `None` when the default was used
    pub label: Option<String>,
}

impl TableMatch {
    pub fn is_default(&self) -> bool {
        self.label.is_none()
    }
}

/// Ordered first-match rule table with a default value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleTable {
    pub rules: Vec<PriceRule>,
    #[serde(with = "rust_decimal::serde::str")]
    pub default: Decimal,
}

impl RuleTable {
    pub fn new(rules: Vec<PriceRule>, default: Decimal) -> Self {
        Self { rules, default }
    }

    /// First rule matching `name` (case-insensitive)
    pub fn find(&self, name: &str) -> Option<&PriceRule> {
        let name_lower = name.to_lowercase();
        self.rules.iter().find(|rule| rule.matches(&name_lower))
    }

    pub fn lookup(&self, name: &str) -> TableMatch {
        match self.find(name) {
            Some(rule) => TableMatch {
                value: rule.value,
                label: Some(rule.label.clone()),
            },
            None => TableMatch {
                value: self.default,
                label: None,
            },
        }
    }

    pub fn value_for(&self, name: &str) -> Decimal {
        self.lookup(name).value
    }

    /// Replace the value of the rule labelled `label`, keeping its position.
    /// Unknown labels leave the table unchanged.
    pub fn with_value(mut self, label: &str, value: Decimal) -> Self {
        if let Some(rule) = self.rules.iter_mut().find(|r| r.label == label) {
            rule.value = value;
        }
        self
    }

    pub fn with_default(mut self, default: Decimal) -> Self {
        self.default = default;
        self
    }
}

/// Substring that marks a metal as priced at zero
pub const COMMERCIAL_METAL: &str = "commercial metal";

/// Fraction of the 24K price used when a metal name is not recognized (18K)
pub const DEFAULT_KARAT_MODIFIER: Decimal = dec!(0.75);

/// Karat purity modifiers as fractions of the 24K gold price.
pub fn karat_modifiers() -> RuleTable {
    RuleTable::new(
        vec![
            PriceRule::new("commercial_metal", &[COMMERCIAL_METAL], Decimal::ZERO),
            PriceRule::new("24k", &["24k", "24 karat", "24ct"], dec!(1.00)),
            PriceRule::new("22k", &["22k", "22 karat", "22ct"], dec!(0.91)),
            PriceRule::new("18k", &["18k", "18 karat", "18ct"], dec!(0.75)),
            PriceRule::new("14k", &["14k", "14 karat", "14ct"], dec!(0.58)),
        ],
        DEFAULT_KARAT_MODIFIER,
    )
}

const LAB_GROWN: &[&str] = &["lab", "synthetic", "cvd", "hpht"];

/// Gem prices in INR per carat used by the authoritative price engine.
pub fn standard_gem_prices() -> RuleTable {
    RuleTable::new(
        vec![
            PriceRule::new("lab_diamond", &["diamond"], dec!(18000)).requiring(LAB_GROWN),
            PriceRule::new("natural_diamond", &["diamond"], dec!(56000)),
            PriceRule::new("lab_polki", &["polki"], dec!(4000)).requiring(LAB_GROWN),
            PriceRule::new("natural_polki", &["polki"], dec!(12000)),
            PriceRule::new("ruby", &["ruby"], dec!(3500)),
            PriceRule::new("sapphire", &["sapphire"], dec!(4500)),
            PriceRule::new("emerald", &["emerald"], dec!(4000)),
            PriceRule::new("tanzanite", &["tanzanite"], dec!(2500)),
            PriceRule::new("quartz_family", &["amethyst", "quartz", "morganite"], dec!(600)),
            PriceRule::new("south_sea_pearl", &["pearl"], dec!(3000))
                .requiring(&["south sea", "south-sea"]),
            PriceRule::new("pearl", &["pearl"], dec!(800)),
            PriceRule::new("cz_swarovski", &["cz", "cubic zirconia", "swarovski"], dec!(150)),
        ],
        dec!(1000),
    )
}

/// Gem prices in INR per carat for the quick content estimate.
///
/// Shares rule order and the values that agree with [`standard_gem_prices`];
/// diamonds, corundum and the default carry the 2025 market-rate figures.
pub fn quick_gem_prices() -> RuleTable {
    standard_gem_prices()
        .with_value("lab_diamond", dec!(20000))
        .with_value("natural_diamond", dec!(65000))
        .with_value("ruby", dec!(4000))
        .with_value("sapphire", dec!(5000))
        .with_default(dec!(1500))
}

/// Product-type multipliers for the quick estimate. Rings use the default.
pub fn craftsmanship_multipliers() -> RuleTable {
    RuleTable::new(
        vec![
            PriceRule::new("necklace", &["necklace", "choker"], dec!(1.3)),
            PriceRule::new("bracelet", &["bracelet", "bangle"], dec!(1.15)),
            PriceRule::new("earring", &["earring"], dec!(1.1)),
            PriceRule::new("pendant", &["pendant"], dec!(1.05)),
        ],
        dec!(1.0),
    )
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaterialKind {
    Metal,
    Gem,
}

/// Metal and gem tables used together by an estimator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EstimationTables {
    pub metals: RuleTable,
    pub gems: RuleTable,
}

impl EstimationTables {
    pub fn standard() -> Self {
        Self {
            metals: karat_modifiers(),
            gems: standard_gem_prices(),
        }
    }

    pub fn quick() -> Self {
        Self {
            metals: karat_modifiers(),
            gems: quick_gem_prices(),
        }
    }

    pub fn table(&self, kind: MaterialKind) -> &RuleTable {
        match kind {
            MaterialKind::Metal => &self.metals,
            MaterialKind::Gem => &self.gems,
        }
    }

    /// Fallback unit price for a material: a karat fraction for metals,
    /// INR per carat for gems.
    pub fn estimate_unit_price(&self, material_name: &str, kind: MaterialKind) -> Decimal {
        self.table(kind).value_for(material_name)
    }
}

impl Default for EstimationTables {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ==================== rule matching ====================

    #[test]
    fn test_rule_requires_secondary_keyword() {
        let rule = PriceRule::new("lab_diamond", &["diamond"], dec!(1)).requiring(LAB_GROWN);
        assert!(rule.matches("lab grown diamond"));
        assert!(rule.matches("cvd diamond"));
        assert!(!rule.matches("natural diamond"));
        assert!(!rule.matches("lab ruby"));
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
        let table = standard_gem_prices();
        assert_eq!(table.value_for("NATURAL DIAMOND"), dec!(56000));
        assert_eq!(table.value_for("Burmese Ruby"), dec!(3500));
    }

    #[test]
    fn test_first_match_wins() {
        // Both diamond rules contain "diamond"; the lab rule comes first.
        let table = standard_gem_prices();
        let hit = table.lookup("Lab Grown Diamond");
        assert_eq!(hit.label.as_deref(), Some("lab_diamond"));
        assert_eq!(hit.value, dec!(18000));

        let hit = table.lookup("Natural Diamond");
        assert_eq!(hit.label.as_deref(), Some("natural_diamond"));
    }

    #[test]
    fn test_gem_priority_order() {
        let table = standard_gem_prices();
        assert_eq!(table.value_for("Synthetic Polki"), dec!(4000));
        assert_eq!(table.value_for("Uncut Polki"), dec!(12000));
        assert_eq!(table.value_for("Blue Sapphire"), dec!(4500));
        assert_eq!(table.value_for("Zambian Emerald"), dec!(4000));
        assert_eq!(table.value_for("Tanzanite"), dec!(2500));
        assert_eq!(table.value_for("Rose Quartz"), dec!(600));
        assert_eq!(table.value_for("Morganite"), dec!(600));
        assert_eq!(table.value_for("South Sea Pearl"), dec!(3000));
        assert_eq!(table.value_for("Freshwater Pearl"), dec!(800));
        assert_eq!(table.value_for("Swarovski Crystal"), dec!(150));
        assert_eq!(table.value_for("CZ"), dec!(150));
    }

    #[test]
    fn test_unknown_gem_uses_default() {
        let table = standard_gem_prices();
        let hit = table.lookup("Opal");
        assert!(hit.is_default());
        assert_eq!(hit.value, dec!(1000));
    }

    // ==================== karat table ====================

    #[test]
    fn test_karat_modifiers() {
        let table = karat_modifiers();
        assert_eq!(table.value_for("24K Gold"), dec!(1.00));
        assert_eq!(table.value_for("22k gold"), dec!(0.91));
        assert_eq!(table.value_for("18k Gold"), dec!(0.75));
        assert_eq!(table.value_for("14K White Gold"), dec!(0.58));
    }

    #[test]
    fn test_commercial_metal_is_zero() {
        let table = karat_modifiers();
        assert_eq!(table.value_for("Commercial Metal"), Decimal::ZERO);
        assert_eq!(table.value_for("Commercial Metal Band"), Decimal::ZERO);
        // Wins over karat markings further down the table
        assert_eq!(table.value_for("24k commercial metal"), Decimal::ZERO);
    }

    #[test]
    fn test_unrecognized_metal_defaults_to_18k() {
        let hit = karat_modifiers().lookup("Rose Gold");
        assert!(hit.is_default());
        assert_eq!(hit.value, DEFAULT_KARAT_MODIFIER);
    }

    // ==================== quick tables ====================

    #[test]
    fn test_quick_table_shares_agreeing_values() {
        let standard = standard_gem_prices();
        let quick = quick_gem_prices();
        assert_eq!(quick.rules.len(), standard.rules.len());
        assert_eq!(quick.value_for("Emerald"), standard.value_for("Emerald"));
        assert_eq!(quick.value_for("Natural Diamond"), dec!(65000));
        assert_eq!(quick.value_for("Opal"), dec!(1500));
    }

    #[test]
    fn test_with_value_unknown_label_is_noop() {
        let table = standard_gem_prices();
        assert_eq!(table.clone().with_value("unobtainium", dec!(1)), table);
    }

    #[test]
    fn test_craftsmanship_multipliers() {
        let table = craftsmanship_multipliers();
        assert_eq!(table.value_for("Choker Necklace"), dec!(1.3));
        assert_eq!(table.value_for("Bangle"), dec!(1.15));
        assert_eq!(table.value_for("Stud Earrings"), dec!(1.1));
        assert_eq!(table.value_for("Pendant"), dec!(1.05));
        assert_eq!(table.value_for("Ring"), dec!(1.0));
    }

    #[test]
    fn test_estimate_unit_price_by_kind() {
        let tables = EstimationTables::standard();
        assert_eq!(
            tables.estimate_unit_price("Natural Diamond", MaterialKind::Gem),
            dec!(56000)
        );
        assert_eq!(
            tables.estimate_unit_price("22K Gold", MaterialKind::Metal),
            dec!(0.91)
        );
    }
}
