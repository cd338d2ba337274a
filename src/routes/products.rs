use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};

use crate::{
    AppState,
    error::{AppError, Result},
    models::{Product, ProductQuery, ProductRequest},
    queries::product_queries,
};

pub async fn search_products(
    State(state): State<AppState>,
    Query(params): Query<ProductQuery>,
) -> Result<Json<Vec<Product>>> {
    let products = product_queries::search_products(&state.db, params).await?;

    Ok(Json(products))
}

pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<Product>> {
    let product = product_queries::find_by_id(&state.db, id)
        .await?
        .ok_or(AppError::ProductUnavailable(id))?;

    Ok(Json(product))
}

pub async fn create_product(
    State(state): State<AppState>,
    Json(payload): Json<ProductRequest>,
) -> Result<(StatusCode, Json<Product>)> {
    validate_product(&payload, true)?;

    let product = product_queries::create_product(&state.db, &payload).await?;

    Ok((StatusCode::CREATED, Json(product)))
}

pub async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<ProductRequest>,
) -> Result<Json<Product>> {
    validate_product(&payload, false)?;

    if product_queries::find_by_id(&state.db, id).await?.is_none() {
        return Err(AppError::NotFound(format!(
            "Product with id {} not found",
            id
        )));
    }

    let product = product_queries::update_product(&state.db, id, &payload).await?;

    Ok(Json(product))
}

pub async fn delete_product(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<StatusCode> {
    if product_queries::delete_product(&state.db, id).await? == 0 {
        return Err(AppError::NotFound(format!(
            "Product with id {} not found",
            id
        )));
    }

    Ok(StatusCode::NO_CONTENT)
}

fn validate_product(payload: &ProductRequest, creating: bool) -> Result<()> {
    if creating && payload.name.as_deref().map_or(true, |n| n.trim().is_empty()) {
        return Err(AppError::Validation("name is required".to_string()));
    }

    if creating && payload.price.is_none() {
        return Err(AppError::Validation("price is required".to_string()));
    }

    if let Some(price) = payload.price {
        if price.is_sign_negative() {
            return Err(AppError::Validation("price must be non-negative".to_string()));
        }
    }

    if let Some(stock) = payload.stock {
        if stock < 0 {
            return Err(AppError::Validation("stock must be non-negative".to_string()));
        }
    }

    Ok(())
}
