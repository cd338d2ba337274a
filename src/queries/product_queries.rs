use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::{
    error::Result,
    models::{Product, ProductQuery, ProductRequest},
};

const DEFAULT_PAGE_SIZE: i64 = 20;
const MAX_PAGE_SIZE: i64 = 100;

pub async fn find_by_id(pool: &PgPool, id: i32) -> Result<Option<Product>> {
    let product = sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;

    Ok(product)
}

pub async fn search_products(pool: &PgPool, params: ProductQuery) -> Result<Vec<Product>> {
    let mut query: QueryBuilder<Postgres> = QueryBuilder::new("SELECT * FROM products WHERE 1=1");

    if let Some(ref q) = params.query {
        query.push(" AND (name ILIKE ");
        query.push_bind(format!("%{}%", q));
        query.push(" OR description ILIKE ");
        query.push_bind(format!("%{}%", q));
        query.push(")");
    }

    if let Some(ref category) = params.category {
        query.push(" AND category = ");
        query.push_bind(category);
    }

    query.push(" ORDER BY created_at DESC");

    let limit = params.limit.unwrap_or(DEFAULT_PAGE_SIZE).min(MAX_PAGE_SIZE);
    query.push(" LIMIT ");
    query.push_bind(limit);

    if let Some(offset) = params.offset {
        query.push(" OFFSET ");
        query.push_bind(offset);
    }

    let products = query.build_query_as::<Product>().fetch_all(pool).await?;

    Ok(products)
}

pub async fn create_product(pool: &PgPool, req: &ProductRequest) -> Result<Product> {
    let product = sqlx::query_as::<_, Product>(
        r#"
        INSERT INTO products (name, description, price, stock, category, image)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING *
        "#,
    )
    .bind(&req.name)
    .bind(&req.description)
    .bind(&req.price)
    .bind(req.stock.unwrap_or(0))
    .bind(req.category.as_deref().unwrap_or(""))
    .bind(&req.image)
    .fetch_one(pool)
    .await?;

    Ok(product)
}

pub async fn update_product(pool: &PgPool, id: i32, req: &ProductRequest) -> Result<Product> {
    let product = sqlx::query_as::<_, Product>(
        r#"
        UPDATE products
        SET
            name = COALESCE($1, name),
            description = COALESCE($2, description),
            price = COALESCE($3, price),
            stock = COALESCE($4, stock),
            category = COALESCE($5, category),
            image = COALESCE($6, image),
            updated_at = NOW()
        WHERE id = $7
        RETURNING *
        "#,
    )
    .bind(&req.name)
    .bind(&req.description)
    .bind(&req.price)
    .bind(req.stock)
    .bind(&req.category)
    .bind(&req.image)
    .bind(id)
    .fetch_one(pool)
    .await?;

    Ok(product)
}

pub async fn delete_product(pool: &PgPool, id: i32) -> Result<u64> {
    let result = sqlx::query("DELETE FROM products WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}

/// Applies the decrement only while `stock >= quantity` still holds, in one
/// statement. Returns false when the condition no longer holds.
pub async fn conditional_decrement(pool: &PgPool, product_id: i32, quantity: i32) -> Result<bool> {
    let result = sqlx::query(
        "UPDATE products
         SET stock = stock - $1, updated_at = NOW()
         WHERE id = $2 AND stock >= $1",
    )
    .bind(quantity)
    .bind(product_id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() == 1)
}

pub async fn restock(pool: &PgPool, product_id: i32, quantity: i32) -> Result<()> {
    sqlx::query(
        "UPDATE products
         SET stock = stock + $1, updated_at = NOW()
         WHERE id = $2",
    )
    .bind(quantity)
    .bind(product_id)
    .execute(pool)
    .await?;

    Ok(())
}
