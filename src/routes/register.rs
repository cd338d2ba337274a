use axum::{Json, extract::State, http::StatusCode};

use crate::{
    AppState,
    error::{AppError, Result},
    models::{AuthResponse, RegisterRequest},
    queries::user_queries,
    utils::jwt,
};

pub async fn register_user(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>)> {
    validate_registration(&payload)?;

    if user_queries::find_by_mobile(&state.db, &payload.mobile)
        .await?
        .is_some()
    {
        return Err(AppError::Conflict("User already exists".to_string()));
    }

    let password_hash = bcrypt::hash(&payload.password, bcrypt::DEFAULT_COST)
        .map_err(|e| AppError::InternalError(format!("Password hashing failed: {}", e)))?;

    let name = payload.name.trim();
    let is_admin = name.to_lowercase().starts_with("admin");

    let user =
        user_queries::create_user(&state.db, name, &payload.mobile, &password_hash, is_admin)
            .await?;

    let token = jwt::generate_token(user.id, user.is_admin)?;

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            id: user.id,
            name: user.name,
            mobile: user.mobile,
            is_admin: user.is_admin,
            token,
        }),
    ))
}

fn validate_registration(payload: &RegisterRequest) -> Result<()> {
    if payload.name.trim().is_empty()
        || payload.mobile.trim().is_empty()
        || payload.password.is_empty()
    {
        return Err(AppError::Validation("All fields are required".to_string()));
    }

    if payload.mobile.trim().len() < 7 || !payload.mobile.trim().chars().all(|c| c.is_ascii_digit())
    {
        return Err(AppError::Validation("Invalid mobile number".to_string()));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(name: &str, mobile: &str, password: &str) -> RegisterRequest {
        RegisterRequest {
            name: name.to_string(),
            mobile: mobile.to_string(),
            password: password.to_string(),
        }
    }

    #[test]
    fn rejects_missing_fields() {
        assert!(validate_registration(&request("", "5551234567", "pw")).is_err());
        assert!(validate_registration(&request("Ana", "", "pw")).is_err());
        assert!(validate_registration(&request("Ana", "5551234567", "")).is_err());
    }

    #[test]
    fn rejects_malformed_mobile() {
        assert!(validate_registration(&request("Ana", "not-a-number", "pw")).is_err());
        assert!(validate_registration(&request("Ana", "123", "pw")).is_err());
    }

    #[test]
    fn accepts_complete_input() {
        assert!(validate_registration(&request("Ana", "5551234567", "pw")).is_ok());
    }
}
