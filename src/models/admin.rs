use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::models::{OrderResponse, OrderStatus, User};

// Aggregate rows returned by the reporting queries.

#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct SalesSummary {
    pub total_orders: i64,
    pub total_revenue: Decimal,
}

#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct UserWithOrderStats {
    pub id: i32,
    pub name: String,
    pub mobile: String,
    pub is_admin: bool,
    pub last_login: Option<DateTime<Utc>>,
    pub registration_source: String,
    pub created_at: DateTime<Utc>,
    pub order_count: i64,
    pub total_spent: Decimal,
    pub last_order_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct SourceCount {
    pub source: String,
    pub count: i64,
}

#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct StatusCount {
    pub status: OrderStatus,
    pub count: i64,
}

#[derive(Debug, Serialize)]
pub struct UserStatsSummary {
    pub total_users: i64,
    pub active_users: i64,
    pub users_with_orders: i64,
    pub registration_sources: Vec<SourceCount>,
    pub order_status_distribution: Vec<StatusCount>,
}

#[derive(Debug, Serialize)]
pub struct UsersWithStatsResponse {
    pub users: Vec<UserWithOrderStats>,
    pub stats: UserStatsSummary,
    pub recent_orders: Vec<OrderResponse>,
}

#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct DailyRegistrations {
    pub day: NaiveDate,
    pub count: i64,
}

#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct MonthlyActivity {
    pub month: i32,
    pub active_users: i64,
    pub total_users: i64,
}

#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct OrderValueBucket {
    pub bucket: String,
    pub count: i64,
    pub average: Decimal,
}

#[derive(Debug, Serialize)]
pub struct AnalyticsResponse {
    pub registration_over_time: Vec<DailyRegistrations>,
    pub user_activity: Vec<MonthlyActivity>,
    pub order_value_distribution: Vec<OrderValueBucket>,
}

#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct FavoriteProduct {
    pub product_id: i32,
    pub name: String,
    pub count: i64,
}

#[derive(Debug, Serialize)]
pub struct UserDetailResponse {
    pub user: User,
    pub order_count: i64,
    pub total_spent: Decimal,
    pub average_order_value: Decimal,
    pub favorite_products: Vec<FavoriteProduct>,
    pub orders: Vec<OrderResponse>,
}
