mod memory;
mod postgres;

pub use memory::{InMemoryCatalogStore, InMemoryOrderStore};
pub use postgres::{PgCatalogStore, PgOrderStore};

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{NewOrder, Order, OrderResponse, OrderStatus, Product};

/// Product lookup and stock reservation.
///
/// `conditional_decrement` is the only stock-mutating operation available to
/// order placement and must be atomic: the decrement is applied if and only
/// if the product's current stock still covers the requested quantity.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn get(&self, product_id: i32) -> Result<Option<Product>>;

    /// Returns false when current stock no longer covers `quantity`; the
    /// product is left untouched in that case.
    async fn conditional_decrement(&self, product_id: i32, quantity: i32) -> Result<bool>;

    /// Returns previously reserved stock to the product.
    async fn restock(&self, product_id: i32, quantity: i32) -> Result<()>;
}

#[async_trait]
pub trait OrderStore: Send + Sync {
    async fn insert(&self, order: NewOrder) -> Result<OrderResponse>;
    async fn find_by_id(&self, id: i32) -> Result<Option<Order>>;
    async fn find_by_user(&self, user_id: i32) -> Result<Vec<OrderResponse>>;
    async fn find_all(&self) -> Result<Vec<OrderResponse>>;
    async fn update_status(&self, id: i32, status: OrderStatus) -> Result<Option<Order>>;
}
