use deadpool_postgres::{Config, ManagerConfig, Pool, PoolConfig, RecyclingMethod, Runtime};
use tokio_postgres::NoTls;
use crate::error::{AppError, Result};
use std::time::Duration;

/// Creates a new database connection pool.
///
/// # Arguments
///
/// * `database_url` - The URL of the PostgreSQL database.
///
/// # Returns
///
/// A `Result` containing the `Pool`.
pub fn create_pool(database_url: &str) -> Result<Pool> {
    let mut cfg = Config::new();
    let pg_config: tokio_postgres::Config = database_url.parse()?;

    if let Some(host) = pg_config.get_hosts().first() {
        match host {
            tokio_postgres::config::Host::Tcp(hostname) => {
                cfg.host = Some(hostname.clone());
            }
            #[cfg(unix)]
            tokio_postgres::config::Host::Unix(path) => {
                cfg.host = Some(path.to_string_lossy().into_owned());
            }
        }
    }
    if let Some(port) = pg_config.get_ports().first() {
        cfg.port = Some(*port);
    }

    if let Some(dbname) = pg_config.get_dbname() {
        cfg.dbname = Some(dbname.to_string());
    }

    if let Some(user) = pg_config.get_user() {
        cfg.user = Some(user.to_string());
    }

    if let Some(password) = pg_config.get_password() {
        cfg.password = Some(String::from_utf8_lossy(password).to_string());
    }

    cfg.manager = Some(ManagerConfig {
        recycling_method: RecyclingMethod::Fast,
    });

    cfg.pool = Some(PoolConfig {
        max_size: 100,
        timeouts: deadpool_postgres::Timeouts {
            wait: Some(Duration::from_secs(5)),
            create: Some(Duration::from_secs(2)),
            recycle: Some(Duration::from_secs(1)),
        },
        ..Default::default()
    });

    cfg.create_pool(Some(Runtime::Tokio1), NoTls)
        .map_err(|e| AppError::Internal(format!("Failed to create pool: {}", e)))
}

/// Bootstraps the schema. Idempotent, run at startup.
///
/// The lamp record stays plain numeric/boolean columns; only the tariff
/// blob on the user record is encrypted at rest.
pub async fn init_schema(pool: &Pool) -> Result<()> {
    let client = pool.get().await?;
    client
        .batch_execute(
            r#"
            CREATE TABLE IF NOT EXISTS users (
                user_id        UUID PRIMARY KEY,
                email          TEXT NOT NULL UNIQUE,
                password_hash  TEXT NOT NULL,
                lamp_ids       TEXT[] NOT NULL DEFAULT '{}',
                tariffs_nonce  TEXT NOT NULL,
                tariffs_ct     TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS lamps (
                lamp_id        TEXT PRIMARY KEY,
                owner_id       UUID NOT NULL REFERENCES users(user_id) ON DELETE CASCADE,
                name           TEXT NOT NULL DEFAULT '',
                state          BOOLEAN NOT NULL DEFAULT FALSE,
                brightness     INTEGER NOT NULL DEFAULT 50,
                power_w        DOUBLE PRECISION NOT NULL DEFAULT 8.5,
                work_time_min  BIGINT NOT NULL DEFAULT 0,
                energy_kwh     DOUBLE PRECISION NOT NULL DEFAULT 0
            );

            CREATE INDEX IF NOT EXISTS idx_lamps_owner ON lamps(owner_id);
            "#,
        )
        .await?;

    tracing::info!("✅ Database schema ready");
    Ok(())
}
