mod admin;
mod health;
mod login;
mod orders;
mod products;
mod register;

use axum::{
    Router,
    middleware::from_fn,
    routing::{get, post, put},
};

use crate::AppState;
use crate::middleware::{admin_middleware, auth_middleware};

pub fn create_router() -> Router<AppState> {
    let public = Router::new()
        .route("/health", get(health::health_check))
        .route("/health/ready", get(health::readiness_check))
        .route("/api/auth/register", post(register::register_user))
        .route("/api/auth/login", post(login::login_user))
        .route("/api/products", get(products::search_products))
        .route("/api/products/{id}", get(products::get_product));

    let authenticated = Router::new()
        .route("/api/orders", post(orders::place_order))
        .route("/api/orders/my", get(orders::get_my_orders))
        .route_layer(from_fn(auth_middleware));

    let admin_only = Router::new()
        .route("/api/products", post(products::create_product))
        .route("/api/products/stats", get(admin::get_product_stats))
        .route(
            "/api/products/{id}",
            put(products::update_product).delete(products::delete_product),
        )
        .route("/api/orders", get(orders::search_orders))
        .route("/api/orders/low-stock", get(admin::get_low_stock))
        .route("/api/orders/analytics", get(admin::get_sales_summary))
        .route("/api/orders/{id}", put(orders::update_order_status))
        .route("/api/auth/users-with-stats", get(admin::get_users_with_stats))
        .route("/api/auth/analytics", get(admin::get_user_analytics))
        .route("/api/auth/users/{id}", get(admin::get_user_details))
        .route_layer(from_fn(admin_middleware));

    public.merge(authenticated).merge(admin_only)
}
