use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    error::{AppError, Result},
    middleware_layer::auth::AuthUser,
    models::lamp::Lamp,
    repositories::{lamp as lamp_repo, user as user_repo},
    services::energy,
    state::AppState,
    validation::auth::{validate_brightness, validate_power},
};

/// The request payload for lamp registration. Everything is optional; the
/// defaults mirror a factory-fresh lamp.
#[derive(Deserialize, Debug)]
pub struct CreateLampRequest {
    pub lamp_id: Option<String>,
    pub name: Option<String>,
    pub state: Option<bool>,
    pub brightness: Option<i32>,
    pub power_w: Option<f64>,
    pub work_time_min: Option<i64>,
    pub energy_kwh: Option<f64>,
}

/// The request payload for a lamp update. Only the supplied fields change.
#[derive(Deserialize, Debug)]
pub struct UpdateLampRequest {
    pub name: Option<String>,
    pub state: Option<bool>,
    pub brightness: Option<i32>,
    pub power_w: Option<f64>,
    pub work_time_min: Option<i64>,
    pub energy_kwh: Option<f64>,
}

/// The response payload for lamp registration.
#[derive(Serialize)]
pub struct CreateLampResponse {
    pub lamp_id: String,
}

/// A bare acknowledgement.
#[derive(Serialize)]
pub struct OkResponse {
    pub ok: bool,
}

/// Lists the caller's lamps, accruing one usage quantum on every lamp that
/// is on before the listing is built.
#[axum::debug_handler]
pub async fn list_lamps(
    State(state): State<AppState>,
    Extension(AuthUser(owner_id)): Extension<AuthUser>,
) -> Result<impl IntoResponse> {
    energy::accrue_owned_lamps(&state.db, &owner_id).await?;

    let lamps = lamp_repo::list_by_owner(&state.db, &owner_id).await?;
    Ok(Json(lamps))
}

/// Registers a new lamp for the caller.
#[axum::debug_handler]
pub async fn create_lamp(
    State(state): State<AppState>,
    Extension(AuthUser(owner_id)): Extension<AuthUser>,
    Json(payload): Json<CreateLampRequest>,
) -> Result<impl IntoResponse> {
    let brightness = payload.brightness.unwrap_or(50);
    let power_w = payload.power_w.unwrap_or(8.5);
    validate_brightness(brightness)?;
    validate_power(power_w)?;

    let work_time_min = payload.work_time_min.unwrap_or(0);
    let energy_kwh = payload.energy_kwh.unwrap_or(0.0);
    if work_time_min < 0 || !(energy_kwh >= 0.0) {
        return Err(AppError::Validation(
            "Usage counters must be non-negative".to_string(),
        ));
    }

    let lamp = Lamp {
        lamp_id: payload
            .lamp_id
            .filter(|id| !id.is_empty())
            .unwrap_or_else(|| Uuid::new_v4().to_string()),
        owner_id,
        name: payload.name.unwrap_or_default(),
        state: payload.state.unwrap_or(false),
        brightness,
        power_w,
        work_time_min,
        energy_kwh,
    };

    lamp_repo::create_lamp(&state.db, &lamp).await?;
    user_repo::add_lamp(&state.db, &owner_id, &lamp.lamp_id).await?;

    tracing::info!("✅ Lamp {} registered for user {}", lamp.lamp_id, owner_id);

    Ok(Json(CreateLampResponse {
        lamp_id: lamp.lamp_id,
    }))
}

/// Returns a single owned lamp.
#[axum::debug_handler]
pub async fn get_lamp(
    State(state): State<AppState>,
    Extension(AuthUser(owner_id)): Extension<AuthUser>,
    Path(lamp_id): Path<String>,
) -> Result<impl IntoResponse> {
    let lamp = lamp_repo::find_owned(&state.db, &lamp_id, &owner_id)
        .await?
        .ok_or(AppError::NotFound)?;

    Ok(Json(lamp))
}

/// Updates the writable fields of an owned lamp.
#[axum::debug_handler]
pub async fn update_lamp(
    State(state): State<AppState>,
    Extension(AuthUser(owner_id)): Extension<AuthUser>,
    Path(lamp_id): Path<String>,
    Json(payload): Json<UpdateLampRequest>,
) -> Result<impl IntoResponse> {
    if let Some(brightness) = payload.brightness {
        validate_brightness(brightness)?;
    }
    if let Some(power_w) = payload.power_w {
        validate_power(power_w)?;
    }
    if payload.work_time_min.is_some_and(|t| t < 0)
        || payload.energy_kwh.is_some_and(|e| !(e >= 0.0))
    {
        return Err(AppError::Validation(
            "Usage counters must be non-negative".to_string(),
        ));
    }

    let matched = lamp_repo::update_fields(
        &state.db,
        &lamp_id,
        &owner_id,
        payload.name,
        payload.state,
        payload.brightness,
        payload.power_w,
        payload.work_time_min,
        payload.energy_kwh,
    )
    .await?;

    if matched == 0 {
        return Err(AppError::NotFound);
    }

    Ok(Json(OkResponse { ok: true }))
}

/// Deletes an owned lamp and drops it from the owner's lamp set. Deleting
/// a lamp that is already gone still succeeds.
#[axum::debug_handler]
pub async fn delete_lamp(
    State(state): State<AppState>,
    Extension(AuthUser(owner_id)): Extension<AuthUser>,
    Path(lamp_id): Path<String>,
) -> Result<impl IntoResponse> {
    lamp_repo::delete_lamp(&state.db, &lamp_id, &owner_id).await?;
    user_repo::remove_lamp(&state.db, &owner_id, &lamp_id).await?;

    tracing::info!("🗑️ Lamp {} deleted for user {}", lamp_id, owner_id);

    Ok(Json(OkResponse { ok: true }))
}
