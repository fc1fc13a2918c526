//! Request types for price calculations.
//!
//! Field names follow the storefront's camelCase JSON payloads.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Catalog key: storefront payloads send either numbers or numeric strings
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MaterialId {
    Number(i64),
    Text(String),
}

impl MaterialId {
    /// Database key, if the identifier is numeric and fits a Postgres `integer`.
    pub fn as_i32(&self) -> Option<i32> {
        match self {
            MaterialId::Number(n) => i32::try_from(*n).ok(),
            MaterialId::Text(s) => s.trim().parse::<i32>().ok(),
        }
    }
}

impl fmt::Display for MaterialId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MaterialId::Number(n) => write!(f, "{}", n),
            MaterialId::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<i32> for MaterialId {
    fn from(id: i32) -> Self {
        MaterialId::Number(i64::from(id))
    }
}

impl From<&str> for MaterialId {
    fn from(id: &str) -> Self {
        MaterialId::Text(id.to_string())
    }
}

/// A gemstone in a pricing request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GemInput {
    pub name: String,
    #[serde(default)]
    pub carats: Option<Decimal>,
    #[serde(default)]
    pub stone_type_id: Option<MaterialId>,
}

impl GemInput {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            carats: None,
            stone_type_id: None,
        }
    }

    pub fn with_carats(mut self, carats: Decimal) -> Self {
        self.carats = Some(carats);
        self
    }

    pub fn with_stone_type_id(mut self, id: impl Into<MaterialId>) -> Self {
        self.stone_type_id = Some(id.into());
        self
    }
}

/// Materials description of a piece to price
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PricingRequest {
    /// Only used to pick the quick-estimate craftsmanship multiplier
    #[serde(default)]
    pub product_type: String,
    pub metal_type: String,
    #[serde(default)]
    pub metal_type_id: Option<MaterialId>,
    #[serde(alias = "metalWeight")]
    pub metal_weight_grams: Decimal,
    #[serde(default)]
    pub primary_gems: Vec<GemInput>,
    #[serde(default)]
    pub other_stone: Option<GemInput>,
}

impl PricingRequest {
    pub fn new(metal_type: impl Into<String>, metal_weight_grams: Decimal) -> Self {
        Self {
            product_type: String::new(),
            metal_type: metal_type.into(),
            metal_type_id: None,
            metal_weight_grams,
            primary_gems: Vec::new(),
            other_stone: None,
        }
    }

    /// Build a request from the older positional call shape:
    /// product type, metal name, weight, `(gem name, carats)` pairs and an
    /// optional other-stone name.
    pub fn from_legacy(
        product_type: &str,
        metal_type: &str,
        metal_weight_grams: Decimal,
        gems: &[(&str, Option<Decimal>)],
        other_stone: Option<&str>,
    ) -> Self {
        Self {
            product_type: product_type.to_string(),
            metal_type: metal_type.to_string(),
            metal_type_id: None,
            metal_weight_grams,
            primary_gems: gems
                .iter()
                .filter(|(name, _)| !name.trim().is_empty())
                .map(|(name, carats)| GemInput {
                    name: name.to_string(),
                    carats: *carats,
                    stone_type_id: None,
                })
                .collect(),
            other_stone: other_stone
                .filter(|name| !name.trim().is_empty())
                .map(GemInput::new),
        }
    }

    pub fn with_product_type(mut self, product_type: impl Into<String>) -> Self {
        self.product_type = product_type.into();
        self
    }

    pub fn with_metal_type_id(mut self, id: impl Into<MaterialId>) -> Self {
        self.metal_type_id = Some(id.into());
        self
    }

    pub fn with_gem(mut self, gem: GemInput) -> Self {
        self.primary_gems.push(gem);
        self
    }

    pub fn with_other_stone(mut self, gem: GemInput) -> Self {
        self.other_stone = Some(gem);
        self
    }

    /// Primary gems in input order, then the other stone.
    pub fn all_gems(&self) -> impl Iterator<Item = &GemInput> {
        self.primary_gems.iter().chain(self.other_stone.iter())
    }
}
