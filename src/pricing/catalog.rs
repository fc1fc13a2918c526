//! Material catalog: metal price modifiers and stone prices per carat.
//!
//! Implementations only provide id, exact-name and listing lookups; the
//! id → exact name → partial name cascade lives in the provided methods so
//! every backend resolves the same way. Unknown identifiers are `Ok(None)`.

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::PgPool;
use std::path::Path;
use tracing::debug;

use crate::cache::AppCache;
use crate::error::Result;

use super::models::{name_equals, name_overlaps, MetalType, NamedMaterial, StoneType};
use super::queries;
use super::requests::MaterialId;
use super::responses::PriceSource;

/// How the caller identifies a material
#[derive(Debug, Clone, Copy)]
pub enum MaterialKey<'a> {
    Id(&'a MaterialId),
    Name(&'a str),
}

/// A catalog hit with the cascade step that produced it
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CatalogMatch {
    pub value: Decimal,
    pub source: PriceSource,
}

fn partial_match<'a, T: NamedMaterial>(items: &'a [T], name: &str) -> Vec<&'a T> {
    items
        .iter()
        .filter(|item| name_overlaps(item.name(), name))
        .collect()
}

#[async_trait]
pub trait MaterialCatalog: Send + Sync {
    async fn metal_by_id(&self, id: &MaterialId) -> Result<Option<MetalType>>;
    async fn metal_by_name(&self, name: &str) -> Result<Option<MetalType>>;
    async fn metal_types(&self) -> Result<Vec<MetalType>>;

    async fn stone_by_id(&self, id: &MaterialId) -> Result<Option<StoneType>>;
    async fn stone_by_name(&self, name: &str) -> Result<Option<StoneType>>;
    async fn stone_types(&self) -> Result<Vec<StoneType>>;

    /// Price modifier as a fraction of 24K. Zero or missing modifiers are misses.
    async fn metal_price_modifier(&self, key: MaterialKey<'_>) -> Result<Option<CatalogMatch>> {
        match key {
            MaterialKey::Id(id) => Ok(self
                .metal_by_id(id)
                .await?
                .and_then(|m| m.modifier_fraction())
                .map(|value| CatalogMatch {
                    value,
                    source: PriceSource::CatalogId,
                })),
            MaterialKey::Name(name) => {
                if name.trim().is_empty() {
                    return Ok(None);
                }
                if let Some(value) = self
                    .metal_by_name(name)
                    .await?
                    .and_then(|m| m.modifier_fraction())
                {
                    return Ok(Some(CatalogMatch {
                        value,
                        source: PriceSource::CatalogName,
                    }));
                }
                let metals = self.metal_types().await?;
                Ok(partial_match(&metals, name)
                    .into_iter()
                    .find_map(|m| m.modifier_fraction())
                    .map(|value| CatalogMatch {
                        value,
                        source: PriceSource::CatalogPartial,
                    }))
            }
        }
    }

    /// Stone price in INR per carat. Zero or missing prices are misses.
    async fn stone_price_per_carat(&self, key: MaterialKey<'_>) -> Result<Option<CatalogMatch>> {
        match key {
            MaterialKey::Id(id) => Ok(self
                .stone_by_id(id)
                .await?
                .and_then(|s| s.usable_price())
                .map(|value| CatalogMatch {
                    value,
                    source: PriceSource::CatalogId,
                })),
            MaterialKey::Name(name) => {
                if name.trim().is_empty() {
                    return Ok(None);
                }
                if let Some(value) = self
                    .stone_by_name(name)
                    .await?
                    .and_then(|s| s.usable_price())
                {
                    return Ok(Some(CatalogMatch {
                        value,
                        source: PriceSource::CatalogName,
                    }));
                }
                let stones = self.stone_types().await?;
                Ok(partial_match(&stones, name)
                    .into_iter()
                    .find_map(|s| s.usable_price())
                    .map(|value| CatalogMatch {
                        value,
                        source: PriceSource::CatalogPartial,
                    }))
            }
        }
    }
}

/// Postgres-backed catalog. Listings used for partial matching are cached.
#[derive(Clone)]
pub struct PgMaterialCatalog {
    pool: PgPool,
    cache: AppCache,
}

impl PgMaterialCatalog {
    pub fn new(pool: PgPool, cache: AppCache) -> Self {
        Self { pool, cache }
    }
}

#[async_trait]
impl MaterialCatalog for PgMaterialCatalog {
    async fn metal_by_id(&self, id: &MaterialId) -> Result<Option<MetalType>> {
        match id.as_i32() {
            Some(id) => queries::find_metal_type(&self.pool, id).await,
            None => {
                debug!("Non-numeric metal type id {}", id);
                Ok(None)
            }
        }
    }

    async fn metal_by_name(&self, name: &str) -> Result<Option<MetalType>> {
        queries::find_metal_type_by_name(&self.pool, name).await
    }

    async fn metal_types(&self) -> Result<Vec<MetalType>> {
        if let Some(cached) = self.cache.metal_listing().await {
            return Ok((*cached).clone());
        }
        let metals = queries::list_metal_types(&self.pool).await?;
        let metals = self.cache.store_metal_listing(metals).await;
        Ok((*metals).clone())
    }

    async fn stone_by_id(&self, id: &MaterialId) -> Result<Option<StoneType>> {
        match id.as_i32() {
            Some(id) => queries::find_stone_type(&self.pool, id).await,
            None => {
                debug!("Non-numeric stone type id {}", id);
                Ok(None)
            }
        }
    }

    async fn stone_by_name(&self, name: &str) -> Result<Option<StoneType>> {
        queries::find_stone_type_by_name(&self.pool, name).await
    }

    async fn stone_types(&self) -> Result<Vec<StoneType>> {
        if let Some(cached) = self.cache.stone_listing().await {
            return Ok((*cached).clone());
        }
        let stones = queries::list_stone_types(&self.pool).await?;
        let stones = self.cache.store_stone_listing(stones).await;
        Ok((*stones).clone())
    }
}

/// Catalog held in memory, seeded in code or from a JSON file
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InMemoryCatalog {
    #[serde(default)]
    pub metals: Vec<MetalType>,
    #[serde(default)]
    pub stones: Vec<StoneType>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load `{ "metals": [...], "stones": [...] }`
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    pub fn with_metal(mut self, id: i32, name: &str, price_modifier: Option<Decimal>) -> Self {
        self.metals.push(MetalType {
            id,
            name: name.to_string(),
            price_modifier,
        });
        self
    }

    pub fn with_stone(mut self, id: i32, name: &str, price_per_carat: Option<Decimal>) -> Self {
        self.stones.push(StoneType {
            id,
            name: name.to_string(),
            price_per_carat,
        });
        self
    }
}

#[async_trait]
impl MaterialCatalog for InMemoryCatalog {
    async fn metal_by_id(&self, id: &MaterialId) -> Result<Option<MetalType>> {
        let Some(id) = id.as_i32() else {
            return Ok(None);
        };
        Ok(self.metals.iter().find(|m| m.id == id).cloned())
    }

    async fn metal_by_name(&self, name: &str) -> Result<Option<MetalType>> {
        Ok(self.metals.iter().find(|m| name_equals(&m.name, name)).cloned())
    }

    async fn metal_types(&self) -> Result<Vec<MetalType>> {
        Ok(self.metals.clone())
    }

    async fn stone_by_id(&self, id: &MaterialId) -> Result<Option<StoneType>> {
        let Some(id) = id.as_i32() else {
            return Ok(None);
        };
        Ok(self.stones.iter().find(|s| s.id == id).cloned())
    }

    async fn stone_by_name(&self, name: &str) -> Result<Option<StoneType>> {
        Ok(self.stones.iter().find(|s| name_equals(&s.name, name)).cloned())
    }

    async fn stone_types(&self) -> Result<Vec<StoneType>> {
        Ok(self.stones.clone())
    }
}
