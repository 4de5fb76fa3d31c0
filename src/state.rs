use deadpool_postgres::Pool;

use crate::config::Config;
use crate::crypto::envelope::{EnvelopeCipher, KEY_SIZE};
use crate::error::{AppError, Result};
use crate::services::tokens::SessionTokenService;

/// The application's state. Every core service is constructed exactly once
/// here with its dependencies injected; nothing reaches for globals.
#[derive(Clone)]
pub struct AppState {
    /// The database connection pool.
    pub db: Pool,
    /// The envelope cipher for tariff data.
    pub envelope: EnvelopeCipher,
    /// The session token service.
    pub tokens: SessionTokenService,
}

impl AppState {
    /// Creates a new `AppState`.
    ///
    /// # Arguments
    ///
    /// * `config` - The application's configuration.
    ///
    /// # Returns
    ///
    /// A `Result` containing the `AppState`.
    pub async fn new(config: &Config) -> Result<Self> {
        let db = crate::db::create_pool(&config.database_url)?;
        crate::db::init_schema(&db).await?;
        tracing::info!("✅ PostgreSQL pool initialized");

        // Key sizing was already enforced when the config loaded; a mismatch
        // here means the config type itself changed underneath us.
        let key: [u8; KEY_SIZE] = config
            .aes_key
            .as_slice()
            .try_into()
            .map_err(|_| AppError::Encryption("AES key must be exactly 32 bytes".to_string()))?;
        let envelope = EnvelopeCipher::new(&key);
        tracing::info!("✅ Envelope cipher initialized");

        let tokens = SessionTokenService::new(&config.jwt_secret);
        tracing::info!("✅ Session token service initialized");

        Ok(AppState {
            db,
            envelope,
            tokens,
        })
    }
}
