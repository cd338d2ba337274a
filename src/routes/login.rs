use axum::{Json, extract::State};

use crate::{
    AppState,
    error::{AppError, Result},
    models::{AuthResponse, LoginRequest},
    queries::user_queries,
    utils::jwt,
};

pub async fn login_user(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<AuthResponse>> {
    let user = user_queries::find_by_mobile(&state.db, &payload.mobile)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Invalid mobile or password".to_string()))?;

    let password_hash = user
        .password
        .as_ref()
        .ok_or_else(|| AppError::Unauthorized("Invalid mobile or password".to_string()))?;

    let is_valid = bcrypt::verify(&payload.password, password_hash)
        .map_err(|e| AppError::InternalError(format!("Password verification failed: {}", e)))?;

    if !is_valid {
        return Err(AppError::Unauthorized(
            "Invalid mobile or password".to_string(),
        ));
    }

    user_queries::touch_last_login(&state.db, user.id).await?;

    let token = jwt::generate_token(user.id, user.is_admin)?;

    Ok(Json(AuthResponse {
        id: user.id,
        name: user.name,
        mobile: user.mobile,
        is_admin: user.is_admin,
        token,
    }))
}
