use serde::{Deserialize, Serialize};

/// A price-per-kWh configuration entry.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Tariff {
    /// A display name for the tariff.
    pub name: String,
    /// The price per kWh.
    pub price: f64,
}

/// The payload that gets envelope-encrypted before persistence. Plaintext
/// tariffs never touch storage in any other form.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct TariffSet {
    pub tariffs: Vec<Tariff>,
}
