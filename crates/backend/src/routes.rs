use std::sync::Arc;

use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use pinmap_shared::models::{
    is_valid_rating, LoginRequest, NewPin, Pin, RegisterRequest, UserResponse,
};

use crate::error::ApiError;
use crate::storage::{Storage, StoredUser};

#[derive(Clone)]
pub struct AppState {
    pub storage: Arc<Storage>,
    pub bcrypt_cost: u32,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/pins", get(list_pins).post(create_pin))
        .route("/users/register", post(register))
        .route("/users/login", post(login))
        .with_state(state)
}

fn now_rfc3339() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

async fn list_pins(State(state): State<AppState>) -> Result<Json<Vec<Pin>>, ApiError> {
    Ok(Json(state.storage.list_pins()?))
}

/// Check a create request and turn it into a stored pin.
fn build_pin(input: NewPin) -> Result<Pin, ApiError> {
    if input.username.trim().is_empty() {
        return Err(ApiError::BadRequest("username is required".to_string()));
    }
    if !is_valid_rating(input.rating) {
        return Err(ApiError::BadRequest(format!(
            "rating must be between 1 and 5, got {}",
            input.rating
        )));
    }
    if !input.lat.is_finite() || !input.long.is_finite() {
        return Err(ApiError::BadRequest("coordinates must be numbers".to_string()));
    }
    Ok(Pin {
        id: uuid::Uuid::new_v4().simple().to_string(),
        username: input.username,
        title: input.title.unwrap_or_default(),
        desc: input.desc.unwrap_or_default(),
        rating: input.rating,
        lat: input.lat,
        long: input.long,
        created_at: now_rfc3339(),
    })
}

async fn create_pin(
    State(state): State<AppState>,
    Json(input): Json<NewPin>,
) -> Result<Json<Pin>, ApiError> {
    let pin = build_pin(input)?;
    state.storage.save_pin(&pin)?;
    tracing::info!(id = %pin.id, username = %pin.username, "pin created");
    Ok(Json(pin))
}

async fn register(
    State(state): State<AppState>,
    Json(input): Json<RegisterRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    let username = input.username.trim().to_string();
    if username.is_empty() || input.password.is_empty() {
        return Err(ApiError::BadRequest(
            "username and password are required".to_string(),
        ));
    }

    let cost = state.bcrypt_cost;
    let password = input.password;
    let password_hash = tokio::task::spawn_blocking(move || bcrypt::hash(password, cost)).await??;

    let user = StoredUser {
        id: uuid::Uuid::new_v4().simple().to_string(),
        username,
        email: input.email,
        password_hash,
        created_at: now_rfc3339(),
    };
    if !state.storage.insert_user(&user)? {
        return Err(ApiError::Conflict(format!(
            "username {} is already taken",
            user.username
        )));
    }
    tracing::info!(username = %user.username, "user registered");
    Ok(Json(UserResponse {
        id: user.id,
        username: user.username,
    }))
}

async fn login(
    State(state): State<AppState>,
    Json(input): Json<LoginRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    let wrong = || ApiError::BadRequest("wrong username or password".to_string());

    let user = state.storage.get_user(input.username.trim())?.ok_or_else(wrong)?;
    let hash = user.password_hash.clone();
    let password = input.password;
    let valid = tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash)).await??;
    if !valid {
        return Err(wrong());
    }
    Ok(Json(UserResponse {
        id: user.id,
        username: user.username,
    }))
}
