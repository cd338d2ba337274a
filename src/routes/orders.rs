use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};

use crate::{
    AppState,
    error::Result,
    models::{
        Order, OrderQuery, OrderResponse, OrderSearchResponse, PlaceOrderRequest,
        UpdateStatusRequest,
    },
    queries::admin_queries,
    utils::extractors::extract_user_id,
    utils::jwt::Claims,
};

pub async fn place_order(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<PlaceOrderRequest>,
) -> Result<(StatusCode, Json<OrderResponse>)> {
    let user_id = extract_user_id(&claims)?;

    let placed = state.engine.place_order(user_id, &payload.items).await?;

    Ok((StatusCode::CREATED, Json(placed)))
}

pub async fn get_my_orders(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Vec<OrderResponse>>> {
    let user_id = extract_user_id(&claims)?;
    let orders = state.engine.orders().find_by_user(user_id).await?;

    Ok(Json(orders))
}

pub async fn search_orders(
    State(state): State<AppState>,
    Query(params): Query<OrderQuery>,
) -> Result<Json<OrderSearchResponse>> {
    let response = admin_queries::search_orders(&state.db, params).await?;

    Ok(Json(response))
}

pub async fn update_order_status(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateStatusRequest>,
) -> Result<Json<Order>> {
    let order = state.engine.update_status(id, payload.status).await?;

    Ok(Json(order))
}
