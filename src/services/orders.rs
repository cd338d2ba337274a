use std::sync::Arc;

use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{
    error::{AppError, Result},
    models::{LineItem, NewOrder, NewOrderItem, Order, OrderResponse, OrderStatus},
    store::{CatalogStore, OrderStore},
};

/// Places orders against the catalog.
///
/// The engine owns the one correctness-critical flow in the system: checking
/// availability, reserving stock and persisting the order must behave as a
/// single operation per call. Reservation goes through the catalog's atomic
/// conditional decrement, so concurrent placements over the same product can
/// never drive stock negative; when any step fails, every decrement already
/// applied by this call is released before the error is returned, so a failed
/// placement leaves the catalog exactly as it found it.
#[derive(Clone)]
pub struct OrderEngine {
    catalog: Arc<dyn CatalogStore>,
    orders: Arc<dyn OrderStore>,
}

impl OrderEngine {
    pub fn new(catalog: Arc<dyn CatalogStore>, orders: Arc<dyn OrderStore>) -> Self {
        Self { catalog, orders }
    }

    pub async fn place_order(&self, user_id: i32, items: &[LineItem]) -> Result<OrderResponse> {
        if items.is_empty() {
            return Err(AppError::Validation(
                "order must contain at least one item".to_string(),
            ));
        }

        for item in items {
            if item.quantity < 1 {
                return Err(AppError::Validation(format!(
                    "invalid quantity for product {}",
                    item.product_id
                )));
            }
        }

        // Combine duplicate product references so total demand is checked
        // against stock once per product. First-occurrence order is kept.
        let mut demand: Vec<(i32, i32)> = Vec::with_capacity(items.len());
        for item in items {
            match demand.iter_mut().find(|(id, _)| *id == item.product_id) {
                Some((_, quantity)) => *quantity += item.quantity,
                None => demand.push((item.product_id, item.quantity)),
            }
        }

        // Capture prices and validate availability before touching stock.
        let mut priced = Vec::with_capacity(demand.len());
        for (product_id, quantity) in &demand {
            let product = self
                .catalog
                .get(*product_id)
                .await?
                .ok_or(AppError::ProductUnavailable(*product_id))?;

            if product.stock < *quantity {
                return Err(AppError::InsufficientStock(*product_id));
            }

            priced.push((product, *quantity));
        }

        // Reserve. The conditional decrement re-validates stock atomically,
        // so a placement that lost the race since the check above fails here
        // and releases whatever it already reserved.
        let mut reserved: Vec<(i32, i32)> = Vec::with_capacity(priced.len());
        for (product, quantity) in &priced {
            match self.catalog.conditional_decrement(product.id, *quantity).await {
                Ok(true) => reserved.push((product.id, *quantity)),
                Ok(false) => {
                    self.release(&reserved).await;
                    tracing::warn!(
                        product_id = product.id,
                        quantity,
                        "stock contention, placement rejected"
                    );
                    return Err(AppError::InsufficientStock(product.id));
                }
                Err(e) => {
                    self.release(&reserved).await;
                    return Err(e);
                }
            }
        }

        let total_amount: Decimal = priced
            .iter()
            .map(|(product, quantity)| product.price * Decimal::from(*quantity))
            .sum();

        let new_order = NewOrder {
            order_ref: format!("ord_{}", Uuid::new_v4()),
            user_id,
            status: OrderStatus::Pending,
            total_amount,
            items: priced
                .iter()
                .map(|(product, quantity)| NewOrderItem {
                    product_id: product.id,
                    quantity: *quantity,
                    price_at_purchase: product.price,
                })
                .collect(),
        };

        match self.orders.insert(new_order).await {
            Ok(placed) => {
                tracing::info!(
                    order_ref = %placed.order.order_ref,
                    user_id,
                    total = %placed.order.total_amount,
                    "order placed"
                );
                Ok(placed)
            }
            Err(e) => {
                self.release(&reserved).await;
                Err(e)
            }
        }
    }

    pub async fn update_status(&self, order_id: i32, status: OrderStatus) -> Result<Order> {
        self.orders
            .update_status(order_id, status)
            .await?
            .ok_or(AppError::OrderNotFound(order_id))
    }

    pub fn orders(&self) -> &Arc<dyn OrderStore> {
        &self.orders
    }

    async fn release(&self, reserved: &[(i32, i32)]) {
        for (product_id, quantity) in reserved {
            if let Err(e) = self.catalog.restock(*product_id, *quantity).await {
                // Nothing left to do from here; the discrepancy needs an
                // operator, so make it loud.
                tracing::error!(
                    product_id,
                    quantity,
                    error = %e,
                    "failed to release reserved stock"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{InMemoryCatalogStore, InMemoryOrderStore};
    use async_trait::async_trait;
    use chrono::Utc;
    use rust_decimal_macros::dec;

    fn product(id: i32, price: Decimal, stock: i32) -> crate::models::Product {
        let now = Utc::now();
        crate::models::Product {
            id,
            name: format!("product-{}", id),
            description: None,
            price,
            stock,
            category: "test".to_string(),
            image: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn line(product_id: i32, quantity: i32) -> LineItem {
        LineItem {
            product_id,
            quantity,
        }
    }

    async fn engine_with(
        products: Vec<crate::models::Product>,
    ) -> (OrderEngine, InMemoryCatalogStore, Arc<InMemoryOrderStore>) {
        let catalog = InMemoryCatalogStore::new();
        for p in products {
            catalog.insert(p).await;
        }
        let orders = Arc::new(InMemoryOrderStore::new());
        let engine = OrderEngine::new(Arc::new(catalog.clone()), orders.clone());
        (engine, catalog, orders)
    }

    #[tokio::test]
    async fn placement_captures_prices_and_decrements_stock() {
        let (engine, catalog, _) =
            engine_with(vec![product(1, dec!(10.50), 5), product(2, dec!(3.00), 8)]).await;

        let placed = engine
            .place_order(1, &[line(1, 2), line(2, 3)])
            .await
            .unwrap();

        assert_eq!(placed.order.status, OrderStatus::Pending);
        assert_eq!(placed.order.total_amount, dec!(30.00));
        assert_eq!(placed.items.len(), 2);
        assert_eq!(placed.items[0].price_at_purchase, dec!(10.50));
        assert_eq!(catalog.stock_of(1).await, Some(3));
        assert_eq!(catalog.stock_of(2).await, Some(5));
    }

    #[tokio::test]
    async fn empty_order_is_rejected_without_creating_anything() {
        let (engine, _, orders) = engine_with(vec![product(1, dec!(1.00), 5)]).await;

        let err = engine.place_order(1, &[]).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert!(orders.find_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn non_positive_quantity_is_rejected() {
        let (engine, catalog, _) = engine_with(vec![product(1, dec!(1.00), 5)]).await;

        let err = engine.place_order(1, &[line(1, 0)]).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(catalog.stock_of(1).await, Some(5));
    }

    #[tokio::test]
    async fn unknown_product_fails_the_whole_order() {
        let (engine, catalog, orders) = engine_with(vec![product(1, dec!(1.00), 5)]).await;

        let err = engine
            .place_order(1, &[line(1, 2), line(99, 1)])
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::ProductUnavailable(99)));
        assert_eq!(catalog.stock_of(1).await, Some(5));
        assert!(orders.find_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn insufficient_stock_leaves_other_items_untouched() {
        let (engine, catalog, _) =
            engine_with(vec![product(1, dec!(1.00), 10), product(2, dec!(1.00), 1)]).await;

        let err = engine
            .place_order(1, &[line(1, 2), line(2, 5)])
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::InsufficientStock(2)));
        assert_eq!(catalog.stock_of(1).await, Some(10));
        assert_eq!(catalog.stock_of(2).await, Some(1));
    }

    #[tokio::test]
    async fn duplicate_lines_are_checked_against_combined_demand() {
        let (engine, catalog, _) = engine_with(vec![product(1, dec!(2.00), 5)]).await;

        // 3 + 4 = 7 > 5: must fail even though each line fits on its own
        let err = engine
            .place_order(1, &[line(1, 3), line(1, 4)])
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::InsufficientStock(1)));
        assert_eq!(catalog.stock_of(1).await, Some(5));
    }

    #[tokio::test]
    async fn duplicate_lines_that_fit_are_merged_into_one_item() {
        let (engine, catalog, _) = engine_with(vec![product(1, dec!(2.00), 5)]).await;

        let placed = engine
            .place_order(1, &[line(1, 2), line(1, 3)])
            .await
            .unwrap();

        assert_eq!(placed.items.len(), 1);
        assert_eq!(placed.items[0].quantity, 5);
        assert_eq!(placed.order.total_amount, dec!(10.00));
        assert_eq!(catalog.stock_of(1).await, Some(0));
    }

    #[tokio::test]
    async fn concurrent_placements_cannot_oversell() {
        let (engine, catalog, orders) = engine_with(vec![product(1, dec!(5.00), 10)]).await;

        let lines_a = [line(1, 6)];
        let lines_b = [line(1, 6)];
        let (a, b) = tokio::join!(
            engine.place_order(1, &lines_a),
            engine.place_order(2, &lines_b),
        );

        let successes = [&a, &b].iter().filter(|r| r.is_ok()).count();
        assert_eq!(successes, 1);
        let failure = if a.is_err() { a.unwrap_err() } else { b.unwrap_err() };
        assert!(matches!(failure, AppError::InsufficientStock(1)));
        assert_eq!(catalog.stock_of(1).await, Some(4));
        assert_eq!(orders.find_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn revenue_reconciles_with_decremented_stock() {
        let (engine, catalog, orders) = engine_with(vec![product(1, dec!(7.00), 10)]).await;

        let mut handles = Vec::new();
        for user_id in 0..20 {
            let engine = engine.clone();
            handles.push(tokio::spawn(async move {
                engine.place_order(user_id, &[line(1, 1)]).await
            }));
        }

        let mut succeeded = 0;
        for handle in handles {
            if handle.await.unwrap().is_ok() {
                succeeded += 1;
            }
        }

        // 10 units were available so exactly 10 placements can win.
        assert_eq!(succeeded, 10);
        let final_stock = catalog.stock_of(1).await.unwrap();
        assert_eq!(final_stock, 0);

        let total_revenue: Decimal = orders
            .find_all()
            .await
            .unwrap()
            .iter()
            .map(|o| o.order.total_amount)
            .sum();
        assert_eq!(total_revenue, dec!(7.00) * Decimal::from(10 - final_stock));
    }

    #[tokio::test]
    async fn totals_are_fixed_at_reservation_time() {
        let (engine, catalog, orders) = engine_with(vec![product(1, dec!(4.00), 10)]).await;

        let placed = engine.place_order(1, &[line(1, 2)]).await.unwrap();
        assert_eq!(placed.order.total_amount, dec!(8.00));

        catalog.set_price(1, dec!(9.99)).await;

        let stored = orders.find_by_id(placed.order.id).await.unwrap().unwrap();
        assert_eq!(stored.total_amount, dec!(8.00));
    }

    #[tokio::test]
    async fn update_status_transitions_and_reports_missing_orders() {
        let (engine, _, _) = engine_with(vec![product(1, dec!(1.00), 5)]).await;

        let placed = engine.place_order(1, &[line(1, 1)]).await.unwrap();
        let updated = engine
            .update_status(placed.order.id, OrderStatus::Shipped)
            .await
            .unwrap();
        assert_eq!(updated.status, OrderStatus::Shipped);

        let err = engine
            .update_status(9999, OrderStatus::Delivered)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::OrderNotFound(9999)));
    }

    /// Order store that always fails its insert, for exercising the release
    /// path after stock was already reserved.
    struct FailingOrderStore;

    #[async_trait]
    impl OrderStore for FailingOrderStore {
        async fn insert(&self, _order: NewOrder) -> Result<OrderResponse> {
            Err(AppError::TransientStore("connection reset".to_string()))
        }

        async fn find_by_id(&self, _id: i32) -> Result<Option<Order>> {
            Ok(None)
        }

        async fn find_by_user(&self, _user_id: i32) -> Result<Vec<OrderResponse>> {
            Ok(Vec::new())
        }

        async fn find_all(&self) -> Result<Vec<OrderResponse>> {
            Ok(Vec::new())
        }

        async fn update_status(
            &self,
            _id: i32,
            _status: OrderStatus,
        ) -> Result<Option<Order>> {
            Ok(None)
        }
    }

    #[tokio::test]
    async fn failed_insert_releases_reserved_stock() {
        let catalog = InMemoryCatalogStore::new();
        catalog.insert(product(1, dec!(5.00), 10)).await;
        catalog.insert(product(2, dec!(2.00), 4)).await;
        let engine = OrderEngine::new(Arc::new(catalog.clone()), Arc::new(FailingOrderStore));

        let err = engine
            .place_order(1, &[line(1, 3), line(2, 2)])
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::TransientStore(_)));
        assert_eq!(catalog.stock_of(1).await, Some(10));
        assert_eq!(catalog.stock_of(2).await, Some(4));
    }
}
