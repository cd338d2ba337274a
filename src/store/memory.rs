use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::error::Result;
use crate::models::{NewOrder, Order, OrderItem, OrderResponse, OrderStatus, Product};
use crate::store::{CatalogStore, OrderStore};

/// In-memory catalog over `Arc<RwLock<HashMap>>`. The conditional decrement
/// performs its check and write under a single write-lock acquisition, which
/// gives it the same atomicity as the SQL conditional update.
#[derive(Default, Clone)]
pub struct InMemoryCatalogStore {
    products: Arc<RwLock<HashMap<i32, Product>>>,
}

impl InMemoryCatalogStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, product: Product) {
        self.products.write().await.insert(product.id, product);
    }

    pub async fn stock_of(&self, product_id: i32) -> Option<i32> {
        self.products
            .read()
            .await
            .get(&product_id)
            .map(|p| p.stock)
    }

    pub async fn set_price(&self, product_id: i32, price: rust_decimal::Decimal) {
        if let Some(product) = self.products.write().await.get_mut(&product_id) {
            product.price = price;
        }
    }
}

#[async_trait]
impl CatalogStore for InMemoryCatalogStore {
    async fn get(&self, product_id: i32) -> Result<Option<Product>> {
        let products = self.products.read().await;
        Ok(products.get(&product_id).cloned())
    }

    async fn conditional_decrement(&self, product_id: i32, quantity: i32) -> Result<bool> {
        let mut products = self.products.write().await;
        match products.get_mut(&product_id) {
            Some(product) if product.stock >= quantity => {
                product.stock -= quantity;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn restock(&self, product_id: i32, quantity: i32) -> Result<()> {
        let mut products = self.products.write().await;
        if let Some(product) = products.get_mut(&product_id) {
            product.stock += quantity;
        }
        Ok(())
    }
}

#[derive(Default)]
struct OrderBook {
    next_order_id: i32,
    next_item_id: i32,
    orders: Vec<OrderResponse>,
}

#[derive(Default, Clone)]
pub struct InMemoryOrderStore {
    book: Arc<RwLock<OrderBook>>,
}

impl InMemoryOrderStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
    async fn insert(&self, order: NewOrder) -> Result<OrderResponse> {
        let mut book = self.book.write().await;
        book.next_order_id += 1;
        let order_id = book.next_order_id;
        let now = Utc::now();

        let items = order
            .items
            .iter()
            .map(|item| {
                book.next_item_id += 1;
                OrderItem {
                    id: book.next_item_id,
                    order_id,
                    product_id: item.product_id,
                    quantity: item.quantity,
                    price_at_purchase: item.price_at_purchase,
                    created_at: now,
                }
            })
            .collect();

        let response = OrderResponse {
            order: Order {
                id: order_id,
                order_ref: order.order_ref,
                user_id: order.user_id,
                status: order.status,
                total_amount: order.total_amount,
                created_at: now,
            },
            items,
        };

        book.orders.push(response.clone());
        Ok(response)
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<Order>> {
        let book = self.book.read().await;
        Ok(book
            .orders
            .iter()
            .find(|o| o.order.id == id)
            .map(|o| o.order.clone()))
    }

    async fn find_by_user(&self, user_id: i32) -> Result<Vec<OrderResponse>> {
        let book = self.book.read().await;
        Ok(book
            .orders
            .iter()
            .filter(|o| o.order.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn find_all(&self) -> Result<Vec<OrderResponse>> {
        let book = self.book.read().await;
        Ok(book.orders.clone())
    }

    async fn update_status(&self, id: i32, status: OrderStatus) -> Result<Option<Order>> {
        let mut book = self.book.write().await;
        match book.orders.iter_mut().find(|o| o.order.id == id) {
            Some(existing) => {
                existing.order.status = status;
                Ok(Some(existing.order.clone()))
            }
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn product(id: i32, stock: i32) -> Product {
        let now = Utc::now();
        Product {
            id,
            name: format!("product-{}", id),
            description: None,
            price: dec!(10.00),
            stock,
            category: "test".to_string(),
            image: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn conditional_decrement_applies_while_stock_covers_demand() {
        let store = InMemoryCatalogStore::new();
        store.insert(product(1, 5)).await;

        assert!(store.conditional_decrement(1, 3).await.unwrap());
        assert_eq!(store.stock_of(1).await, Some(2));

        // 2 left, demand 3: rejected without touching stock
        assert!(!store.conditional_decrement(1, 3).await.unwrap());
        assert_eq!(store.stock_of(1).await, Some(2));
    }

    #[tokio::test]
    async fn conditional_decrement_on_unknown_product_is_rejected() {
        let store = InMemoryCatalogStore::new();
        assert!(!store.conditional_decrement(42, 1).await.unwrap());
    }

    #[tokio::test]
    async fn restock_returns_reserved_quantity() {
        let store = InMemoryCatalogStore::new();
        store.insert(product(1, 5)).await;

        assert!(store.conditional_decrement(1, 5).await.unwrap());
        store.restock(1, 5).await.unwrap();
        assert_eq!(store.stock_of(1).await, Some(5));
    }

    #[tokio::test]
    async fn update_status_on_unknown_order_returns_none() {
        let store = InMemoryOrderStore::new();
        let updated = store.update_status(7, OrderStatus::Shipped).await.unwrap();
        assert!(updated.is_none());
    }
}
