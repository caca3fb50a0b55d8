//! ScholarDesk command-line runtime.

#![forbid(unsafe_code)]

mod cli_config;
mod command;
mod dev_seed;
mod record_commands;

use std::env;
use std::sync::Arc;

use scholardesk_application::RecordRepository;
use scholardesk_core::{AppError, AppResult};
use scholardesk_infrastructure::{InMemoryRecordRepository, PostgresRecordRepository};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tracing::info;

use crate::cli_config::{CliConfig, init_tracing};
use crate::command::Command;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let command = Command::parse(env::args().skip(1))?;
    let config = CliConfig::load()?;
    let pool = match config.database_url.as_deref() {
        Some(database_url) => Some(connect_pool(database_url, config.db_max_connections).await?),
        None => None,
    };

    let record_command = match command {
        Command::Migrate => {
            let Some(pool) = pool else {
                return Err(AppError::Validation(
                    "DATABASE_URL is required for migrate".to_owned(),
                ));
            };
            run_migrations(&pool).await?;
            info!("database migrations applied");
            return Ok(());
        }
        Command::Records(record_command) => record_command,
    };

    let repository: Arc<dyn RecordRepository> = match pool {
        Some(pool) => Arc::new(PostgresRecordRepository::new(pool)),
        None => {
            let repository = InMemoryRecordRepository::new();
            dev_seed::run(&repository, config.owner_id).await?;
            info!("DATABASE_URL not set; using in-memory records with dev seed");
            Arc::new(repository)
        }
    };

    info!(
        owner_id = %config.owner_id,
        kind = record_command.kind.as_str(),
        "running record command"
    );
    for line in record_commands::run(record_command, &config, repository).await? {
        println!("{line}");
    }

    Ok(())
}

async fn connect_pool(database_url: &str, max_connections: u32) -> AppResult<PgPool> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await
        .map_err(|error| AppError::Internal(format!("failed to connect to database: {error}")))
}

async fn run_migrations(pool: &PgPool) -> AppResult<()> {
    sqlx::migrate!("../../crates/infrastructure/migrations")
        .run(pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to run migrations: {error}")))
}
