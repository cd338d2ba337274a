use std::sync::Arc;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method},
};
use sqlx::PgPool;
use tower_http::cors::CorsLayer;

use crate::{
    config::AppConfig,
    database,
    error::Result,
    routes,
    services::OrderEngine,
    store::{PgCatalogStore, PgOrderStore},
};

#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub engine: OrderEngine,
}

impl AppState {
    pub fn new(db: PgPool) -> Self {
        let catalog = Arc::new(PgCatalogStore::new(db.clone()));
        let orders = Arc::new(PgOrderStore::new(db.clone()));
        let engine = OrderEngine::new(catalog, orders);

        Self { db, engine }
    }
}

pub async fn build(config: &AppConfig) -> Result<Router> {
    let pool = database::create_pool(&config.database).await?;
    let state = AppState::new(pool);

    let allowed_origins: Vec<HeaderValue> = config
        .cors
        .allowed_origins
        .iter()
        .map(|origin| {
            origin.parse::<HeaderValue>().map_err(|_| {
                crate::error::AppError::ConfigError(format!("Invalid CORS origin: {}", origin))
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([http::header::CONTENT_TYPE, http::header::AUTHORIZATION])
        .allow_origin(allowed_origins);

    let app = routes::create_router()
        .layer(DefaultBodyLimit::max(config.server.max_body_size))
        .layer(cors)
        .with_state(state);

    Ok(app)
}
