use axum::{
    Json,
    extract::{Path, State},
};
use rust_decimal::Decimal;

use crate::{
    AppState,
    error::{AppError, Result},
    models::{
        AnalyticsResponse, Product, ProductStats, SalesSummary, UserDetailResponse,
        UsersWithStatsResponse,
    },
    queries::{admin_queries, order_queries, user_queries},
};

pub async fn get_low_stock(State(state): State<AppState>) -> Result<Json<Vec<Product>>> {
    let products = admin_queries::low_stock_products(&state.db).await?;

    Ok(Json(products))
}

pub async fn get_sales_summary(State(state): State<AppState>) -> Result<Json<SalesSummary>> {
    let summary = admin_queries::sales_summary(&state.db).await?;

    Ok(Json(summary))
}

pub async fn get_product_stats(State(state): State<AppState>) -> Result<Json<ProductStats>> {
    let stats = admin_queries::product_stats(&state.db).await?;

    Ok(Json(stats))
}

pub async fn get_users_with_stats(
    State(state): State<AppState>,
) -> Result<Json<UsersWithStatsResponse>> {
    let response = admin_queries::users_with_stats(&state.db).await?;

    Ok(Json(response))
}

pub async fn get_user_analytics(State(state): State<AppState>) -> Result<Json<AnalyticsResponse>> {
    let response = admin_queries::analytics(&state.db).await?;

    Ok(Json(response))
}

pub async fn get_user_details(
    State(state): State<AppState>,
    Path(user_id): Path<i32>,
) -> Result<Json<UserDetailResponse>> {
    let user = user_queries::find_by_id(&state.db, user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User with id {} not found", user_id)))?;

    let orders = order_queries::get_user_orders(&state.db, user_id).await?;
    let order_count = orders.len() as i64;
    let total_spent: Decimal = orders.iter().map(|o| o.total_amount).sum();
    let average_order_value = if order_count > 0 {
        (total_spent / Decimal::from(order_count)).round_dp(2)
    } else {
        Decimal::ZERO
    };

    let favorite_products = admin_queries::favorite_products(&state.db, user_id).await?;

    let recent: Vec<_> = orders.into_iter().take(5).collect();
    let orders = order_queries::attach_items(&state.db, recent).await?;

    Ok(Json(UserDetailResponse {
        user,
        order_count,
        total_spent,
        average_order_value,
        favorite_products,
        orders,
    }))
}
