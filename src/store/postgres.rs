use async_trait::async_trait;
use sqlx::PgPool;

use crate::error::Result;
use crate::models::{NewOrder, Order, OrderResponse, OrderStatus, Product};
use crate::queries::{order_queries, product_queries};
use crate::store::{CatalogStore, OrderStore};

#[derive(Clone)]
pub struct PgCatalogStore {
    pool: PgPool,
}

impl PgCatalogStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CatalogStore for PgCatalogStore {
    async fn get(&self, product_id: i32) -> Result<Option<Product>> {
        product_queries::find_by_id(&self.pool, product_id).await
    }

    async fn conditional_decrement(&self, product_id: i32, quantity: i32) -> Result<bool> {
        product_queries::conditional_decrement(&self.pool, product_id, quantity).await
    }

    async fn restock(&self, product_id: i32, quantity: i32) -> Result<()> {
        product_queries::restock(&self.pool, product_id, quantity).await
    }
}

#[derive(Clone)]
pub struct PgOrderStore {
    pool: PgPool,
}

impl PgOrderStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OrderStore for PgOrderStore {
    async fn insert(&self, order: NewOrder) -> Result<OrderResponse> {
        order_queries::create_order_with_items(&self.pool, &order).await
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<Order>> {
        order_queries::find_by_id(&self.pool, id).await
    }

    async fn find_by_user(&self, user_id: i32) -> Result<Vec<OrderResponse>> {
        let orders = order_queries::get_user_orders(&self.pool, user_id).await?;
        order_queries::attach_items(&self.pool, orders).await
    }

    async fn find_all(&self) -> Result<Vec<OrderResponse>> {
        let orders = order_queries::get_all_orders(&self.pool).await?;
        order_queries::attach_items(&self.pool, orders).await
    }

    async fn update_status(&self, id: i32, status: OrderStatus) -> Result<Option<Order>> {
        order_queries::update_status(&self.pool, id, status).await
    }
}
