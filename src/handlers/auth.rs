use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    error::{AppError, Result},
    middleware_layer::auth::AuthUser,
    models::{
        tariff::{Tariff, TariffSet},
        user::User,
    },
    repositories::user as user_repo,
    services::credentials,
    state::AppState,
    validation::auth::*,
};

/// The request payload for user registration.
#[derive(Deserialize, Debug)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
}

/// The request payload for user login.
#[derive(Deserialize, Debug)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// The response payload carrying a freshly issued session token.
#[derive(Serialize)]
pub struct TokenResponse {
    pub token: String,
    pub user_id: Uuid,
}

/// The response payload for the authenticated profile endpoint.
#[derive(Serialize)]
pub struct MeResponse {
    pub user_id: Uuid,
    pub email: String,
    pub lamp_ids: Vec<String>,
    pub tariffs: Vec<Tariff>,
}

/// Handles user registration.
#[axum::debug_handler]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<impl IntoResponse> {
    let email = normalize_email(&payload.email);
    validate_credentials(&email, &payload.password)?;

    tracing::info!("📝 Register attempt for {}", email);

    if user_repo::find_by_email(&state.db, &email).await?.is_some() {
        return Err(AppError::AlreadyExists);
    }

    let password_hash = credentials::hash_password(&payload.password)?;
    // Every account starts with an (encrypted) empty tariff list, so the
    // read paths never have to special-case a missing blob.
    let tariffs_enc = state.envelope.encrypt(&TariffSet::default())?;

    let user = User {
        user_id: Uuid::new_v4(),
        email,
        password_hash,
        lamp_ids: Vec::new(),
        tariffs_enc,
    };
    user_repo::create_user(&state.db, &user).await?;

    let token = state.tokens.issue(user.user_id)?;
    tracing::info!("✅ User registered: {}", user.user_id);

    Ok((
        StatusCode::CREATED,
        Json(TokenResponse {
            token,
            user_id: user.user_id,
        }),
    ))
}

/// Handles user login. Unknown email and wrong password produce the same
/// response, so the endpoint cannot be used to enumerate accounts.
#[axum::debug_handler]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse> {
    let email = normalize_email(&payload.email);
    validate_credentials(&email, &payload.password)?;

    tracing::info!("🔐 Login attempt for {}", email);

    let user = user_repo::find_by_email(&state.db, &email)
        .await?
        .ok_or_else(|| AppError::Authentication("Invalid email or password".to_string()))?;

    if !credentials::verify_password(&payload.password, &user.password_hash)? {
        return Err(AppError::Authentication(
            "Invalid email or password".to_string(),
        ));
    }

    let token = state.tokens.issue(user.user_id)?;
    tracing::info!("✅ User logged in: {}", user.user_id);

    Ok(Json(TokenResponse {
        token,
        user_id: user.user_id,
    }))
}

/// Returns the authenticated user's profile, tariffs decrypted.
///
/// A tariff blob that fails authentication is surfaced as an error rather
/// than silently read as an empty list.
#[axum::debug_handler]
pub async fn me(
    State(state): State<AppState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
) -> Result<impl IntoResponse> {
    let user = user_repo::find_by_id(&state.db, &user_id)
        .await?
        .ok_or_else(|| {
            tracing::warn!("Valid token for missing user {}", user_id);
            AppError::Unauthorized
        })?;

    let tariffs: TariffSet = state.envelope.decrypt(&user.tariffs_enc)?;

    Ok(Json(MeResponse {
        user_id: user.user_id,
        email: user.email,
        lamp_ids: user.lamp_ids,
        tariffs: tariffs.tariffs,
    }))
}
