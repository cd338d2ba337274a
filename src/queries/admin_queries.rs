use sqlx::PgPool;

use crate::{
    error::Result,
    models::{
        AnalyticsResponse, DailyRegistrations, FavoriteProduct, MonthlyActivity, Order,
        OrderQuery, OrderSearchResponse, OrderValueBucket, Product, ProductStats, SalesSummary,
        SourceCount, StatusCount, UserStatsSummary, UserWithOrderStats, UsersWithStatsResponse,
    },
    queries::order_queries,
};

const DEFAULT_PAGE_SIZE: i64 = 20;
const MAX_PAGE_SIZE: i64 = 100;

pub const LOW_STOCK_THRESHOLD: i32 = 10;

pub async fn search_orders(pool: &PgPool, params: OrderQuery) -> Result<OrderSearchResponse> {
    let limit = params.limit.unwrap_or(DEFAULT_PAGE_SIZE).min(MAX_PAGE_SIZE);
    let offset = params.offset.unwrap_or(0);

    let mut query_builder = sqlx::QueryBuilder::<sqlx::Postgres>::new(
        "SELECT *, COUNT(*) OVER() as total_count FROM orders WHERE 1=1",
    );

    if let Some(id) = params.id {
        query_builder.push(" AND id = ");
        query_builder.push_bind(id);
    }

    if let Some(user_id) = params.user_id {
        query_builder.push(" AND user_id = ");
        query_builder.push_bind(user_id);
    }

    if let Some(status) = params.status {
        query_builder.push(" AND status = ");
        query_builder.push_bind(status);
    }

    query_builder.push(" ORDER BY created_at DESC");
    query_builder.push(" LIMIT ");
    query_builder.push_bind(limit);
    query_builder.push(" OFFSET ");
    query_builder.push_bind(offset);

    #[derive(sqlx::FromRow)]
    struct SearchResult {
        #[sqlx(flatten)]
        order: Order,
        total_count: i64,
    }

    let results = query_builder
        .build_query_as::<SearchResult>()
        .fetch_all(pool)
        .await?;

    let total = results.first().map(|r| r.total_count).unwrap_or(0);
    let orders: Vec<Order> = results.into_iter().map(|r| r.order).collect();
    let orders = order_queries::attach_items(pool, orders).await?;

    Ok(OrderSearchResponse {
        orders,
        total,
        limit,
        offset,
    })
}

pub async fn sales_summary(pool: &PgPool) -> Result<SalesSummary> {
    let summary = sqlx::query_as::<_, SalesSummary>(
        "SELECT COUNT(*) AS total_orders, COALESCE(SUM(total_amount), 0) AS total_revenue
         FROM orders",
    )
    .fetch_one(pool)
    .await?;

    Ok(summary)
}

pub async fn low_stock_products(pool: &PgPool) -> Result<Vec<Product>> {
    let products = sqlx::query_as::<_, Product>(
        "SELECT * FROM products WHERE stock <= $1 ORDER BY stock ASC, name ASC",
    )
    .bind(LOW_STOCK_THRESHOLD)
    .fetch_all(pool)
    .await?;

    Ok(products)
}

pub async fn product_stats(pool: &PgPool) -> Result<ProductStats> {
    let stats = sqlx::query_as::<_, ProductStats>(
        "SELECT COUNT(*) AS total,
                COUNT(*) FILTER (WHERE stock <= $1) AS low_stock
         FROM products",
    )
    .bind(LOW_STOCK_THRESHOLD)
    .fetch_one(pool)
    .await?;

    Ok(stats)
}

pub async fn users_with_stats(pool: &PgPool) -> Result<UsersWithStatsResponse> {
    let users = sqlx::query_as::<_, UserWithOrderStats>(
        "SELECT u.id, u.name, u.mobile, u.is_admin, u.last_login, u.registration_source,
                u.created_at,
                COUNT(o.id) AS order_count,
                COALESCE(SUM(o.total_amount), 0) AS total_spent,
                MAX(o.created_at) AS last_order_date
         FROM users u
         LEFT JOIN orders o ON o.user_id = u.id
         GROUP BY u.id
         ORDER BY u.created_at DESC",
    )
    .fetch_all(pool)
    .await?;

    let total_users: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
        .fetch_one(pool)
        .await?;

    let active_users: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM users WHERE last_login >= NOW() - INTERVAL '30 days'",
    )
    .fetch_one(pool)
    .await?;

    let users_with_orders: i64 = sqlx::query_scalar("SELECT COUNT(DISTINCT user_id) FROM orders")
        .fetch_one(pool)
        .await?;

    let registration_sources = sqlx::query_as::<_, SourceCount>(
        "SELECT registration_source AS source, COUNT(*) AS count
         FROM users
         GROUP BY registration_source
         ORDER BY count DESC",
    )
    .fetch_all(pool)
    .await?;

    let order_status_distribution = sqlx::query_as::<_, StatusCount>(
        "SELECT status, COUNT(*) AS count FROM orders GROUP BY status",
    )
    .fetch_all(pool)
    .await?;

    let recent =
        sqlx::query_as::<_, Order>("SELECT * FROM orders ORDER BY created_at DESC LIMIT 10")
            .fetch_all(pool)
            .await?;
    let recent_orders = order_queries::attach_items(pool, recent).await?;

    Ok(UsersWithStatsResponse {
        users,
        stats: UserStatsSummary {
            total_users,
            active_users,
            users_with_orders,
            registration_sources,
            order_status_distribution,
        },
        recent_orders,
    })
}

pub async fn analytics(pool: &PgPool) -> Result<AnalyticsResponse> {
    let registration_over_time = sqlx::query_as::<_, DailyRegistrations>(
        "SELECT created_at::date AS day, COUNT(*) AS count
         FROM users
         GROUP BY day
         ORDER BY day DESC
         LIMIT 30",
    )
    .fetch_all(pool)
    .await?;

    let user_activity = sqlx::query_as::<_, MonthlyActivity>(
        "SELECT EXTRACT(MONTH FROM last_login)::int AS month,
                COUNT(*) FILTER (WHERE last_login >= NOW() - INTERVAL '30 days') AS active_users,
                COUNT(*) AS total_users
         FROM users
         WHERE last_login IS NOT NULL
         GROUP BY month
         ORDER BY month",
    )
    .fetch_all(pool)
    .await?;

    let order_value_distribution = sqlx::query_as::<_, OrderValueBucket>(
        "SELECT CASE
                    WHEN total_amount < 500 THEN '0-500'
                    WHEN total_amount < 1000 THEN '500-1000'
                    WHEN total_amount < 1500 THEN '1000-1500'
                    WHEN total_amount < 2000 THEN '1500-2000'
                    WHEN total_amount < 3000 THEN '2000-3000'
                    WHEN total_amount < 5000 THEN '3000-5000'
                    ELSE '5000+'
                END AS bucket,
                COUNT(*) AS count,
                AVG(total_amount) AS average
         FROM orders
         GROUP BY bucket
         ORDER BY MIN(total_amount)",
    )
    .fetch_all(pool)
    .await?;

    Ok(AnalyticsResponse {
        registration_over_time,
        user_activity,
        order_value_distribution,
    })
}

pub async fn favorite_products(pool: &PgPool, user_id: i32) -> Result<Vec<FavoriteProduct>> {
    let favorites = sqlx::query_as::<_, FavoriteProduct>(
        "SELECT oi.product_id, p.name, SUM(oi.quantity)::bigint AS count
         FROM order_items oi
         JOIN orders o ON o.id = oi.order_id
         JOIN products p ON p.id = oi.product_id
         WHERE o.user_id = $1
         GROUP BY oi.product_id, p.name
         ORDER BY count DESC
         LIMIT 3",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(favorites)
}
