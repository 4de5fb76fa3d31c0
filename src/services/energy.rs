use deadpool_postgres::Pool;
use uuid::Uuid;

use crate::{
    error::{AppError, Result},
    models::lamp::Lamp,
    repositories::lamp as lamp_repo,
};

/// Minutes of runtime credited per accrual call. One poll interval of the
/// source telemetry, not wall-clock elapsed time.
pub const ACCRUAL_QUANTUM_MIN: i64 = 2;

/// How many times a lost conditional update is retried before giving up.
const MAX_ACCRUAL_ATTEMPTS: u32 = 5;

/// The result of advancing a lamp by one quantum.
#[derive(Clone, Debug, PartialEq)]
pub struct Accrual {
    pub work_time_min: i64,
    pub energy_kwh: f64,
}

/// Advances a lamp's usage by one quantum. Returns `None` for a lamp that
/// is off: repeated calls leave an off lamp untouched.
///
/// Total energy is recomputed from the cumulative runtime rather than
/// incremented, so prior rounding never compounds. That assumes power and
/// brightness were constant over the whole window, as the source telemetry
/// model does.
pub fn tick(lamp: &Lamp) -> Option<Accrual> {
    if !lamp.state {
        return None;
    }

    let work_time_min = lamp.work_time_min + ACCRUAL_QUANTUM_MIN;
    let energy_kwh = round4(
        lamp.power_w * lamp.brightness as f64 * work_time_min as f64 / (100.0 * 60.0 * 1000.0),
    );

    Some(Accrual {
        work_time_min,
        energy_kwh,
    })
}

/// Sums per-lamp energies and estimates cost at the mean tariff price.
/// An empty tariff list prices everything at zero.
pub fn aggregate(energies: &[f64], prices: &[f64]) -> (f64, f64) {
    let total_kwh: f64 = energies.iter().sum();
    let avg_price = if prices.is_empty() {
        0.0
    } else {
        prices.iter().sum::<f64>() / prices.len() as f64
    };
    (total_kwh, round4(total_kwh * avg_price))
}

fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

/// Accrues one quantum on every lamp the user owns. Called before a lamp
/// listing is served.
pub async fn accrue_owned_lamps(pool: &Pool, owner_id: &Uuid) -> Result<()> {
    let lamps = lamp_repo::list_by_owner(pool, owner_id).await?;
    for lamp in lamps {
        accrue_lamp(pool, lamp).await?;
    }
    Ok(())
}

/// Applies one quantum to a single lamp through the conditional update.
///
/// Losing the update means another request accrued (or mutated) the lamp
/// between our read and write; the lamp is re-read and this call's quantum
/// is applied on top of the new state, so no invocation's quantum is lost.
async fn accrue_lamp(pool: &Pool, mut lamp: Lamp) -> Result<()> {
    for _ in 0..MAX_ACCRUAL_ATTEMPTS {
        let Some(accrual) = tick(&lamp) else {
            return Ok(());
        };

        if lamp_repo::apply_accrual(pool, &lamp.lamp_id, lamp.work_time_min, &accrual).await? {
            return Ok(());
        }

        tracing::debug!("Accrual conflict on lamp {}, retrying", lamp.lamp_id);
        match lamp_repo::find_by_id(pool, &lamp.lamp_id).await? {
            Some(current) => lamp = current,
            // Deleted out from under us; nothing left to accrue.
            None => return Ok(()),
        }
    }

    Err(AppError::Internal(format!(
        "Accrual update for lamp {} kept losing to concurrent writers",
        lamp.lamp_id
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lamp(state: bool, power_w: f64, brightness: i32, work_time_min: i64) -> Lamp {
        Lamp {
            lamp_id: "lamp-1".to_string(),
            owner_id: Uuid::new_v4(),
            name: "desk".to_string(),
            state,
            brightness,
            power_w,
            work_time_min,
            energy_kwh: 0.0,
        }
    }

    #[test]
    fn first_tick_from_zero() {
        let accrual = tick(&lamp(true, 10.0, 50, 0)).unwrap();

        assert_eq!(accrual.work_time_min, 2);
        // 10 W * 50% * 2 min / 6_000_000 = 0.000166..., rounded to 4 places.
        assert_eq!(accrual.energy_kwh, 0.0002);
    }

    #[test]
    fn off_lamp_is_untouched() {
        let mut subject = lamp(false, 10.0, 50, 5);
        subject.energy_kwh = 0.001;

        for _ in 0..3 {
            assert!(tick(&subject).is_none());
        }
        assert_eq!(subject.work_time_min, 5);
        assert_eq!(subject.energy_kwh, 0.001);
    }

    #[test]
    fn energy_is_non_decreasing_while_on() {
        let mut subject = lamp(true, 8.5, 75, 0);
        let mut previous = 0.0;

        for _ in 0..200 {
            let accrual = tick(&subject).unwrap();
            assert!(accrual.energy_kwh >= previous);
            previous = accrual.energy_kwh;
            subject.work_time_min = accrual.work_time_min;
            subject.energy_kwh = accrual.energy_kwh;
        }
        assert_eq!(subject.work_time_min, 400);
    }

    #[test]
    fn energy_recomputed_from_cumulative_runtime() {
        // A lamp with pre-existing runtime accrues from the total, not from
        // its possibly-rounded stored energy.
        let accrual = tick(&lamp(true, 60.0, 100, 58)).unwrap();

        assert_eq!(accrual.work_time_min, 60);
        // 60 W at full brightness for one hour is 0.06 kWh.
        assert_eq!(accrual.energy_kwh, 0.06);
    }

    #[test]
    fn aggregate_uses_mean_price() {
        let (total, cost) = aggregate(&[0.5, 1.5], &[0.2, 0.4]);

        assert_eq!(total, 2.0);
        assert_eq!(cost, 0.6);
    }

    #[test]
    fn aggregate_with_no_tariffs_costs_nothing() {
        let (total, cost) = aggregate(&[0.5, 1.5], &[]);

        assert_eq!(total, 2.0);
        assert_eq!(cost, 0.0);
    }

    #[test]
    fn aggregate_of_nothing() {
        let (total, cost) = aggregate(&[], &[0.3]);

        assert_eq!(total, 0.0);
        assert_eq!(cost, 0.0);
    }
}
