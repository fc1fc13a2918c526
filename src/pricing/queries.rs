//! Database queries for the material catalog.

use sqlx::PgPool;

use crate::error::Result;

use super::models::{MetalType, StoneType};

/// Find a metal type by primary key
pub async fn find_metal_type(pool: &PgPool, id: i32) -> Result<Option<MetalType>> {
    let metal = sqlx::query_as::<_, MetalType>(
        r#"
        SELECT id, name, price_modifier
        FROM metal_types
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(metal)
}

/// Find a metal type by case-insensitive exact name
pub async fn find_metal_type_by_name(pool: &PgPool, name: &str) -> Result<Option<MetalType>> {
    let metal = sqlx::query_as::<_, MetalType>(
        r#"
        SELECT id, name, price_modifier
        FROM metal_types
        WHERE LOWER(TRIM(name)) = LOWER(TRIM($1))
        ORDER BY id
        LIMIT 1
        "#,
    )
    .bind(name)
    .fetch_optional(pool)
    .await?;

    Ok(metal)
}

/// List all metal types
pub async fn list_metal_types(pool: &PgPool) -> Result<Vec<MetalType>> {
    let metals = sqlx::query_as::<_, MetalType>(
        r#"
        SELECT id, name, price_modifier
        FROM metal_types
        ORDER BY id
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(metals)
}

/// Find a stone type by primary key
pub async fn find_stone_type(pool: &PgPool, id: i32) -> Result<Option<StoneType>> {
    let stone = sqlx::query_as::<_, StoneType>(
        r#"
        SELECT id, name, price_per_carat
        FROM stone_types
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(stone)
}

/// Find a stone type by case-insensitive exact name
pub async fn find_stone_type_by_name(pool: &PgPool, name: &str) -> Result<Option<StoneType>> {
    let stone = sqlx::query_as::<_, StoneType>(
        r#"
        SELECT id, name, price_per_carat
        FROM stone_types
        WHERE LOWER(TRIM(name)) = LOWER(TRIM($1))
        ORDER BY id
        LIMIT 1
        "#,
    )
    .bind(name)
    .fetch_optional(pool)
    .await?;

    Ok(stone)
}

/// List all stone types
pub async fn list_stone_types(pool: &PgPool) -> Result<Vec<StoneType>> {
    let stones = sqlx::query_as::<_, StoneType>(
        r#"
        SELECT id, name, price_per_carat
        FROM stone_types
        ORDER BY id
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(stones)
}
