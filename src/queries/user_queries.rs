use sqlx::PgPool;

use crate::{error::Result, models::User};

pub async fn create_user(
    pool: &PgPool,
    name: &str,
    mobile: &str,
    password_hash: &str,
    is_admin: bool,
) -> Result<User> {
    let user = sqlx::query_as::<_, User>(
        "INSERT INTO users (name, mobile, password, is_admin) VALUES ($1, $2, $3, $4) RETURNING *",
    )
    .bind(name)
    .bind(mobile)
    .bind(password_hash)
    .bind(is_admin)
    .fetch_one(pool)
    .await?;

    Ok(user)
}

pub async fn find_by_mobile(pool: &PgPool, mobile: &str) -> Result<Option<User>> {
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE mobile = $1")
        .bind(mobile)
        .fetch_optional(pool)
        .await?;

    Ok(user)
}

pub async fn find_by_id(pool: &PgPool, id: i32) -> Result<Option<User>> {
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;

    Ok(user)
}

pub async fn touch_last_login(pool: &PgPool, id: i32) -> Result<()> {
    sqlx::query("UPDATE users SET last_login = NOW(), updated_at = NOW() WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(())
}
