use axum::{extract::State, response::IntoResponse, Extension, Json};
use serde::Serialize;

use crate::{
    error::{AppError, Result},
    handlers::lamps::OkResponse,
    middleware_layer::auth::AuthUser,
    models::tariff::{Tariff, TariffSet},
    repositories::{lamp as lamp_repo, user as user_repo},
    services::energy,
    state::AppState,
    validation::auth::validate_price,
};

/// The response payload for the consumption endpoint.
#[derive(Serialize)]
pub struct ConsumptionResponse {
    pub total_kwh: f64,
    pub estimated_cost: f64,
}

/// Returns the caller's tariff list, decrypted. A blob that fails
/// authentication is an error, never an empty list.
#[axum::debug_handler]
pub async fn get_tariffs(
    State(state): State<AppState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
) -> Result<impl IntoResponse> {
    let user = user_repo::find_by_id(&state.db, &user_id)
        .await?
        .ok_or(AppError::Unauthorized)?;

    let tariffs: TariffSet = state.envelope.decrypt(&user.tariffs_enc)?;

    Ok(Json(tariffs.tariffs))
}

/// Replaces the caller's tariff list. Only the ciphertext form is ever
/// persisted.
#[axum::debug_handler]
pub async fn put_tariffs(
    State(state): State<AppState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    Json(tariffs): Json<Vec<Tariff>>,
) -> Result<impl IntoResponse> {
    for tariff in &tariffs {
        validate_price(tariff.price)?;
    }

    let blob = state.envelope.encrypt(&TariffSet { tariffs })?;
    user_repo::set_tariffs(&state.db, &user_id, &blob).await?;

    tracing::info!("✅ Tariffs updated for user {}", user_id);

    Ok(Json(OkResponse { ok: true }))
}

/// Returns total energy across the caller's lamps and the cost estimate at
/// the mean tariff price.
#[axum::debug_handler]
pub async fn consumption(
    State(state): State<AppState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
) -> Result<impl IntoResponse> {
    let lamps = lamp_repo::list_by_owner(&state.db, &user_id).await?;
    let energies: Vec<f64> = lamps.iter().map(|l| l.energy_kwh).collect();

    let user = user_repo::find_by_id(&state.db, &user_id)
        .await?
        .ok_or(AppError::Unauthorized)?;
    let tariffs: TariffSet = state.envelope.decrypt(&user.tariffs_enc)?;
    let prices: Vec<f64> = tariffs.tariffs.iter().map(|t| t.price).collect();

    let (total_kwh, estimated_cost) = energy::aggregate(&energies, &prices);

    Ok(Json(ConsumptionResponse {
        total_kwh,
        estimated_cost,
    }))
}
