// libs/identity-cell/src/handlers.rs
use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    Json,
};
use base64::{engine::general_purpose::STANDARD, Engine};
use chrono::Utc;
use serde_json::{json, Value};
use tracing::{debug, info};

use shared_models::auth::AuthUser;
use shared_models::error::AppError;
use shared_utils::jwt::issue_token;

use crate::models::{
    GalleryUploadRequest, IdentityError, LoginRequest, LoginResponse, NewGalleryImage,
    ProfileUpdate, RegisterRequest, WeeklyAvailability,
};
use crate::router::IdentityState;

impl From<IdentityError> for AppError {
    fn from(err: IdentityError) -> Self {
        match err {
            IdentityError::Validation(msg) => AppError::ValidationError(msg),
            IdentityError::InvalidImage(msg) => AppError::ValidationError(msg),
            IdentityError::UsernameTaken(_) => AppError::Conflict(err.to_string()),
            IdentityError::NotFound(_) | IdentityError::ImageNotFound(_) => {
                AppError::NotFound(err.to_string())
            }
            IdentityError::NotAProvider(_) => AppError::Forbidden(err.to_string()),
            IdentityError::PasswordHash(msg) => AppError::Internal(msg),
            IdentityError::Storage(e) => AppError::Storage(e.to_string()),
        }
    }
}

// ==============================================================================
// PUBLIC HANDLERS
// ==============================================================================

pub async fn register(
    State(state): State<IdentityState>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    debug!("Registration request for {}", request.username);

    let new_user = request.into_new_user()?;
    let user = state.identity.create_user(new_user).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "user": user,
            "message": "Account created"
        })),
    ))
}

pub async fn login(
    State(state): State<IdentityState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    if !state.config.is_configured() {
        return Err(AppError::Internal("Token signing is not configured".to_string()));
    }

    let user = state
        .identity
        .authenticate(&request.username, &request.password)
        .await
        .ok_or_else(|| AppError::Auth("Invalid username or password".to_string()))?;

    let auth_user = AuthUser {
        id: user.id,
        username: user.username.clone(),
        role: user.role(),
    };
    let token = issue_token(&auth_user, &state.config.jwt_secret, state.config.token_ttl_hours)
        .map_err(AppError::Internal)?;

    info!("User {} logged in", user.id);

    Ok(Json(LoginResponse {
        token,
        token_type: "Bearer".to_string(),
        expires_in: (state.config.token_ttl_hours.max(0) as u64).saturating_mul(3600),
        user,
    }))
}

// ==============================================================================
// PROTECTED HANDLERS
// ==============================================================================

pub async fn get_me(
    State(state): State<IdentityState>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Value>, AppError> {
    let profile = state
        .identity
        .get_user(user.id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", user.id)))?;

    Ok(Json(json!({ "user": profile })))
}

pub async fn update_me(
    State(state): State<IdentityState>,
    Extension(user): Extension<AuthUser>,
    Json(update): Json<ProfileUpdate>,
) -> Result<Json<Value>, AppError> {
    let profile = state.identity.update_profile(user.id, update).await?;

    Ok(Json(json!({
        "success": true,
        "user": profile,
        "message": "Profile updated"
    })))
}

pub async fn update_availability(
    State(state): State<IdentityState>,
    Extension(user): Extension<AuthUser>,
    Json(availability): Json<WeeklyAvailability>,
) -> Result<Json<Value>, AppError> {
    if !user.is_provider() {
        return Err(AppError::Forbidden("Only providers have availability".to_string()));
    }

    let profile = state.identity.update_availability(user.id, availability).await?;

    Ok(Json(json!({
        "success": true,
        "user": profile
    })))
}

pub async fn upload_gallery_image(
    State(state): State<IdentityState>,
    Extension(user): Extension<AuthUser>,
    Json(request): Json<GalleryUploadRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    if !user.is_provider() {
        return Err(AppError::Forbidden("Only providers have a gallery".to_string()));
    }

    let bytes = STANDARD
        .decode(request.content_base64.trim())
        .map_err(|_| AppError::BadRequest("Image content is not valid base64".to_string()))?;

    let image = state
        .identity
        .add_gallery_image(
            user.id,
            NewGalleryImage {
                filename: request.filename,
                bytes,
                description: request.description,
            },
            Utc::now(),
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "image": image
        })),
    ))
}

pub async fn delete_gallery_image(
    State(state): State<IdentityState>,
    Extension(user): Extension<AuthUser>,
    Path(image_id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    let profile = state.identity.remove_gallery_image(user.id, image_id).await?;

    Ok(Json(json!({
        "success": true,
        "user": profile
    })))
}
