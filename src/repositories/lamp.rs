use deadpool_postgres::Pool;
use tokio_postgres::Row;
use uuid::Uuid;

use crate::{
    error::Result,
    models::lamp::Lamp,
    services::energy::Accrual,
};

/// A helper function to map a `tokio_postgres::Row` to a `Lamp`.
fn row_to_lamp(row: &Row) -> Result<Lamp> {
    Ok(Lamp {
        lamp_id: row.try_get("lamp_id")?,
        owner_id: row.try_get("owner_id")?,
        name: row.try_get("name")?,
        state: row.try_get("state")?,
        brightness: row.try_get("brightness")?,
        power_w: row.try_get("power_w")?,
        work_time_min: row.try_get("work_time_min")?,
        energy_kwh: row.try_get("energy_kwh")?,
    })
}

/// Creates a new lamp.
pub async fn create_lamp(pool: &Pool, lamp: &Lamp) -> Result<()> {
    let client = pool.get().await?;
    client
        .execute(
            r#"
            INSERT INTO lamps (lamp_id, owner_id, name, state, brightness, power_w, work_time_min, energy_kwh)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
            &[
                &lamp.lamp_id,
                &lamp.owner_id,
                &lamp.name,
                &lamp.state,
                &lamp.brightness,
                &lamp.power_w,
                &lamp.work_time_min,
                &lamp.energy_kwh,
            ],
        )
        .await?;
    Ok(())
}

/// Finds a lamp owned by the given user.
pub async fn find_owned(pool: &Pool, lamp_id: &str, owner_id: &Uuid) -> Result<Option<Lamp>> {
    let client = pool.get().await?;
    let row = client
        .query_opt(
            r#"
            SELECT lamp_id, owner_id, name, state, brightness, power_w, work_time_min, energy_kwh
            FROM lamps
            WHERE lamp_id = $1 AND owner_id = $2
            "#,
            &[&lamp_id, owner_id],
        )
        .await?;
    row.map(|r| row_to_lamp(&r)).transpose()
}

/// Finds a lamp by id alone. Used by the accrual driver to re-read current
/// state after losing a conditional update; ownership was already checked.
pub async fn find_by_id(pool: &Pool, lamp_id: &str) -> Result<Option<Lamp>> {
    let client = pool.get().await?;
    let row = client
        .query_opt(
            r#"
            SELECT lamp_id, owner_id, name, state, brightness, power_w, work_time_min, energy_kwh
            FROM lamps
            WHERE lamp_id = $1
            "#,
            &[&lamp_id],
        )
        .await?;
    row.map(|r| row_to_lamp(&r)).transpose()
}

/// Lists all lamps owned by the given user.
pub async fn list_by_owner(pool: &Pool, owner_id: &Uuid) -> Result<Vec<Lamp>> {
    let client = pool.get().await?;
    let rows = client
        .query(
            r#"
            SELECT lamp_id, owner_id, name, state, brightness, power_w, work_time_min, energy_kwh
            FROM lamps
            WHERE owner_id = $1
            ORDER BY lamp_id
            "#,
            &[owner_id],
        )
        .await?;
    rows.iter().map(row_to_lamp).collect()
}

/// Updates the client-writable fields of an owned lamp. `None` fields keep
/// their current value. Returns the number of rows matched (0 means the
/// lamp is absent or not owned by the caller).
#[allow(clippy::too_many_arguments)]
pub async fn update_fields(
    pool: &Pool,
    lamp_id: &str,
    owner_id: &Uuid,
    name: Option<String>,
    state: Option<bool>,
    brightness: Option<i32>,
    power_w: Option<f64>,
    work_time_min: Option<i64>,
    energy_kwh: Option<f64>,
) -> Result<u64> {
    let client = pool.get().await?;
    let rows = client
        .execute(
            r#"
            UPDATE lamps
            SET
                name          = COALESCE($3, name),
                state         = COALESCE($4, state),
                brightness    = COALESCE($5, brightness),
                power_w       = COALESCE($6, power_w),
                work_time_min = COALESCE($7, work_time_min),
                energy_kwh    = COALESCE($8, energy_kwh)
            WHERE lamp_id = $1 AND owner_id = $2
            "#,
            &[
                &lamp_id,
                owner_id,
                &name,
                &state,
                &brightness,
                &power_w,
                &work_time_min,
                &energy_kwh,
            ],
        )
        .await?;
    Ok(rows)
}

/// Applies an accrual as a single atomic conditional update.
///
/// The write only lands if `work_time_min` still equals the value the
/// accrual was computed from; returns `false` when a concurrent writer got
/// there first, in which case the caller re-reads and retries. This is what
/// keeps concurrent listings from losing or double-counting a quantum.
pub async fn apply_accrual(
    pool: &Pool,
    lamp_id: &str,
    observed_work_time_min: i64,
    accrual: &Accrual,
) -> Result<bool> {
    let client = pool.get().await?;
    let rows = client
        .execute(
            r#"
            UPDATE lamps
            SET work_time_min = $1, energy_kwh = $2
            WHERE lamp_id = $3 AND work_time_min = $4
            "#,
            &[
                &accrual.work_time_min,
                &accrual.energy_kwh,
                &lamp_id,
                &observed_work_time_min,
            ],
        )
        .await?;
    Ok(rows == 1)
}

/// Deletes an owned lamp. Deleting an absent lamp is a no-op, so the
/// operation is safe to retry.
pub async fn delete_lamp(pool: &Pool, lamp_id: &str, owner_id: &Uuid) -> Result<()> {
    let client = pool.get().await?;
    client
        .execute(
            r#"
            DELETE FROM lamps
            WHERE lamp_id = $1 AND owner_id = $2
            "#,
            &[&lamp_id, owner_id],
        )
        .await?;
    Ok(())
}
