use std::env;
use std::fmt::Display;
use std::str::FromStr;
use std::time::Duration;

use scholardesk_core::{AppError, AppResult, OwnerId};
use tracing_subscriber::EnvFilter;

/// Owner used when `SCHOLARDESK_OWNER_ID` is not set.
pub const DEV_OWNER_ID: &str = "5c7e0a52-3a4e-4d8b-9b8e-2f1d6f3c9a10";

#[derive(Debug, Clone)]
pub struct CliConfig {
    pub database_url: Option<String>,
    pub owner_id: OwnerId,
    pub request_timeout: Duration,
    pub list_limit: usize,
    pub db_max_connections: u32,
}

impl CliConfig {
    pub fn load() -> AppResult<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> AppResult<Self> {
        let database_url = lookup("DATABASE_URL")
            .map(|value| value.trim().to_owned())
            .filter(|value| !value.is_empty());

        let owner_id = match lookup("SCHOLARDESK_OWNER_ID").filter(|value| !value.trim().is_empty())
        {
            Some(value) => OwnerId::from_str(value.as_str()).map_err(|error| {
                AppError::Validation(format!("invalid SCHOLARDESK_OWNER_ID: {error}"))
            })?,
            None => OwnerId::from_str(DEV_OWNER_ID)?,
        };

        let request_timeout_ms = parse_positive(&lookup, "SCHOLARDESK_REQUEST_TIMEOUT_MS", 30_000_u64)?;
        let list_limit = parse_positive(&lookup, "SCHOLARDESK_LIST_LIMIT", 50_usize)?;
        let db_max_connections = parse_positive(&lookup, "SCHOLARDESK_DB_MAX_CONNECTIONS", 5_u32)?;

        Ok(Self {
            database_url,
            owner_id,
            request_timeout: Duration::from_millis(request_timeout_ms),
            list_limit,
            db_max_connections,
        })
    }
}

pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();
}

fn parse_positive<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &str,
    default: T,
) -> AppResult<T>
where
    T: FromStr + PartialOrd + Default,
    T::Err: Display,
{
    let Some(value) = lookup(name) else {
        return Ok(default);
    };

    let parsed = value.trim().parse::<T>().map_err(|error| {
        AppError::Validation(format!("invalid {name} value '{value}': {error}"))
    })?;
    if parsed <= T::default() {
        return Err(AppError::Validation(format!(
            "{name} must be greater than zero"
        )));
    }

    Ok(parsed)
}
