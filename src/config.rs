// src/config.rs

use std::{env, net::SocketAddr, time::Duration};

use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::{db::Repositories, services::Services};

/// Parâmetros lidos do ambiente (e do `.env`, se existir).
#[derive(Debug, Clone)]
pub struct Settings {
    pub database_url: String,
    pub bind_addr: SocketAddr,
    pub db_max_connections: u32,
    pub db_acquire_timeout: Duration,
}

impl Settings {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL").context("DATABASE_URL deve ser definida")?;

        let bind_addr = env::var("BIND_ADDR")
            .unwrap_or_else(|_| "0.0.0.0:3000".to_string())
            .parse()
            .context("BIND_ADDR inválido")?;

        let db_max_connections = parse_or("DB_MAX_CONNECTIONS", 5)?;
        let acquire_secs: u64 = parse_or("DB_ACQUIRE_TIMEOUT_SECS", 3)?;

        Ok(Self {
            database_url,
            bind_addr,
            db_max_connections,
            db_acquire_timeout: Duration::from_secs(acquire_secs),
        })
    }
}

fn parse_or<T>(key: &str, default: T) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(raw) => raw.trim().parse().with_context(|| format!("{key} inválido: '{raw}'")),
        Err(_) => Ok(default),
    }
}

#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub services: Services,
}

impl AppState {
    pub async fn new(settings: &Settings) -> anyhow::Result<Self> {
        let db_pool = PgPoolOptions::new()
            .max_connections(settings.db_max_connections)
            .acquire_timeout(settings.db_acquire_timeout)
            .connect(&settings.database_url)
            .await?;

        tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");

        // --- Monta o gráfico de dependências ---
        let services = Services::new(Repositories::postgres(db_pool.clone()));

        Ok(Self { db_pool, services })
    }
}
