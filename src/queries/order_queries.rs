use rust_decimal::Decimal;
use sqlx::PgPool;
use std::collections::HashMap;

use crate::{
    error::Result,
    models::{NewOrder, Order, OrderItem, OrderResponse, OrderStatus},
};

pub async fn create_order_with_items(pool: &PgPool, new_order: &NewOrder) -> Result<OrderResponse> {
    let mut tx = pool.begin().await?;

    let order = sqlx::query_as::<_, Order>(
        "INSERT INTO orders (order_ref, user_id, status, total_amount)
         VALUES ($1, $2, $3, $4)
         RETURNING *",
    )
    .bind(&new_order.order_ref)
    .bind(new_order.user_id)
    .bind(new_order.status)
    .bind(new_order.total_amount)
    .fetch_one(&mut *tx)
    .await?;

    let product_ids: Vec<i32> = new_order.items.iter().map(|i| i.product_id).collect();
    let quantities: Vec<i32> = new_order.items.iter().map(|i| i.quantity).collect();
    let prices: Vec<Decimal> = new_order.items.iter().map(|i| i.price_at_purchase).collect();

    let items = sqlx::query_as::<_, OrderItem>(
        "INSERT INTO order_items (order_id, product_id, quantity, price_at_purchase)
         SELECT $1, unnest($2::int[]), unnest($3::int[]), unnest($4::decimal[])
         RETURNING *",
    )
    .bind(order.id)
    .bind(&product_ids)
    .bind(&quantities)
    .bind(&prices)
    .fetch_all(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(OrderResponse { order, items })
}

pub async fn find_by_id(pool: &PgPool, id: i32) -> Result<Option<Order>> {
    let order = sqlx::query_as::<_, Order>("SELECT * FROM orders WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;

    Ok(order)
}

pub async fn get_user_orders(pool: &PgPool, user_id: i32) -> Result<Vec<Order>> {
    let orders = sqlx::query_as::<_, Order>(
        "SELECT * FROM orders WHERE user_id = $1 ORDER BY created_at DESC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(orders)
}

pub async fn get_all_orders(pool: &PgPool) -> Result<Vec<Order>> {
    let orders = sqlx::query_as::<_, Order>("SELECT * FROM orders ORDER BY created_at DESC")
        .fetch_all(pool)
        .await?;

    Ok(orders)
}

pub async fn update_status(pool: &PgPool, id: i32, status: OrderStatus) -> Result<Option<Order>> {
    let order = sqlx::query_as::<_, Order>(
        "UPDATE orders SET status = $1 WHERE id = $2 RETURNING *",
    )
    .bind(status)
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(order)
}

pub async fn get_items_for_orders(pool: &PgPool, order_ids: &[i32]) -> Result<Vec<OrderItem>> {
    let items =
        sqlx::query_as::<_, OrderItem>("SELECT * FROM order_items WHERE order_id = ANY($1)")
            .bind(order_ids)
            .fetch_all(pool)
            .await?;

    Ok(items)
}

/// Fetches items for the given orders in one query and zips them back onto
/// their orders.
pub async fn attach_items(pool: &PgPool, orders: Vec<Order>) -> Result<Vec<OrderResponse>> {
    let order_ids: Vec<i32> = orders.iter().map(|o| o.id).collect();
    let all_items = get_items_for_orders(pool, &order_ids).await?;

    let mut items_map: HashMap<i32, Vec<OrderItem>> = HashMap::new();
    for item in all_items {
        items_map.entry(item.order_id).or_default().push(item);
    }

    let response = orders
        .into_iter()
        .map(|order| {
            let items = items_map.remove(&order.id).unwrap_or_default();
            OrderResponse { order, items }
        })
        .collect();

    Ok(response)
}
