use std::env;
use anyhow::{Context, Result};
use zeroize::{Zeroize, Zeroizing};

use crate::crypto::envelope::KEY_SIZE;

/// The application's configuration.
#[derive(Clone)]
pub struct Config {
    /// The URL of the PostgreSQL database.
    pub database_url: String,
    /// The address the HTTP server binds to.
    pub bind_addr: String,
    /// The secret used to sign and verify session tokens.
    pub jwt_secret: String,
    /// The AES-256 key used to envelope-encrypt tariff data.
    pub aes_key: Zeroizing<Vec<u8>>,
}

impl Config {
    /// Creates a new `Config` from environment variables.
    ///
    /// A missing or wrong-sized `AES_KEY` is a fatal configuration error:
    /// the service refuses to start rather than failing on first use.
    ///
    /// # Returns
    ///
    /// A `Result` containing the `Config`.
    pub fn from_env() -> Result<Self> {
        let mut aes_key_hex = env::var("AES_KEY")
            .context("AES_KEY must be set (generate with: openssl rand -hex 32)")?;

        let aes_key_bytes = hex::decode(&aes_key_hex)
            .context("AES_KEY must be valid hexadecimal")?;

        aes_key_hex.zeroize();

        if aes_key_bytes.len() != KEY_SIZE {
            anyhow::bail!("AES_KEY must be exactly 32 bytes (64 hex characters)");
        }

        Ok(Self {
            database_url: env::var("DATABASE_URL")
                .context("DATABASE_URL must be set")?,
            bind_addr: env::var("BIND_ADDR")
                .unwrap_or_else(|_| "0.0.0.0:5000".to_string()),
            jwt_secret: env::var("JWT_SECRET")
                .context("JWT_SECRET must be set")?,
            aes_key: Zeroizing::new(aes_key_bytes),
        })
    }
}
