use serde::Serialize;
use uuid::Uuid;

/// Represents a smart lamp and its accumulated usage.
///
/// `work_time_min` and `energy_kwh` are advanced by the accrual engine;
/// `energy_kwh` never decreases while the lamp stays on.
#[derive(Clone, Debug, Serialize)]
pub struct Lamp {
    /// The unique identifier for the lamp. May be supplied by the client at
    /// registration, otherwise generated.
    pub lamp_id: String,
    /// The user who owns this lamp.
    pub owner_id: Uuid,
    /// A display name.
    pub name: String,
    /// Whether the lamp is currently on.
    pub state: bool,
    /// Brightness in percent, 0-100.
    pub brightness: i32,
    /// Rated power draw in watts, non-negative.
    pub power_w: f64,
    /// Cumulative minutes the lamp has been observed on.
    pub work_time_min: i64,
    /// Cumulative energy in kWh, derived from the fields above.
    pub energy_kwh: f64,
}
