use crate::error::{AppError, Result};

/// Normalizes an email for storage and lookup: surrounding whitespace is
/// stripped and the address is lowercased.
pub fn normalize_email(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Validates registration/login credentials. The only hard rule the system
/// imposes is presence; everything else is the user's business.
pub fn validate_credentials(email: &str, password: &str) -> Result<()> {
    if email.is_empty() || password.is_empty() {
        return Err(AppError::Validation(
            "Email and password are required".to_string(),
        ));
    }

    Ok(())
}

/// Validates a brightness value.
pub fn validate_brightness(brightness: i32) -> Result<()> {
    if !(0..=100).contains(&brightness) {
        return Err(AppError::Validation(
            "Brightness must be between 0 and 100".to_string(),
        ));
    }

    Ok(())
}

/// Validates a power rating.
pub fn validate_power(power_w: f64) -> Result<()> {
    if !power_w.is_finite() || power_w < 0.0 {
        return Err(AppError::Validation(
            "Power must be a non-negative number".to_string(),
        ));
    }

    Ok(())
}

/// Validates a tariff price.
pub fn validate_price(price: f64) -> Result<()> {
    if !price.is_finite() || price < 0.0 {
        return Err(AppError::Validation(
            "Tariff price must be a non-negative number".to_string(),
        ));
    }

    Ok(())
}
