use crate::auth::TokenConfig;
use color_eyre::eyre::{self, eyre, WrapErr};
use std::str::FromStr;

const DEFAULT_DATABASE_URL: &str = "sqlite::memory:";
const DEFAULT_WEB_URL: &str = "0.0.0.0:8000";
const DEFAULT_ACCESS_MINUTES: u64 = 30;
const DEFAULT_REFRESH_DAYS: u64 = 7;
const DEFAULT_WORKERS: usize = 4;

/// Everything the service needs to start
#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub web_url: String,
    pub jwt_key: String,
    pub token_config: TokenConfig,
    pub workers: usize,
}

impl Config {
    /// Read the configs from Env Variable and then fall back to the .env file.
    pub fn from_env() -> Result<Self, eyre::Error> {
        Config::from_lookup(|name: &str| {
            std::env::var(name)
                .or_else(|_| dotenvy::var(name))
                .ok()
        })
    }

    /// Build the config from any source of named values
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, eyre::Error> {
        let database_url =
            lookup("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string());
        let web_url = lookup("WEB_URL").unwrap_or_else(|| DEFAULT_WEB_URL.to_string());

        // No default secret, tokens would be forgeable
        let jwt_key = lookup("JWT_KEY")
            .filter(|jwt_key| !jwt_key.is_empty())
            .ok_or_else(|| eyre!("JWT_KEY must be set"))?;

        let access_minutes: u64 = parse_var(
            &lookup,
            "ACCESS_TOKEN_EXPIRE_MINUTES",
            DEFAULT_ACCESS_MINUTES,
        )?;
        let refresh_days: u64 =
            parse_var(&lookup, "REFRESH_TOKEN_EXPIRE_DAYS", DEFAULT_REFRESH_DAYS)?;

        let workers: usize = parse_var(&lookup, "WORKERS", DEFAULT_WORKERS)?;
        if workers == 0 {
            return Err(eyre!("WORKERS must be at least 1"));
        }

        let access_ttl = access_minutes
            .checked_mul(60)
            .ok_or_else(|| eyre!("ACCESS_TOKEN_EXPIRE_MINUTES is too large"))?;
        let refresh_ttl = refresh_days
            .checked_mul(60 * 60 * 24)
            .ok_or_else(|| eyre!("REFRESH_TOKEN_EXPIRE_DAYS is too large"))?;

        Ok(Config {
            database_url,
            web_url,
            jwt_key,
            token_config: TokenConfig {
                access_ttl,
                refresh_ttl,
            },
            workers,
        })
    }
}

/// Parse a named value, or use the default when it is not set
fn parse_var<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &str,
    default: T,
) -> Result<T, eyre::Error>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(name) {
        Some(value) => value
            .trim()
            .parse()
            .wrap_err_with(|| format!("{name} is not valid: `{value}`")),
        None => Ok(default),
    }
}
