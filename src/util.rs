use poem::http::StatusCode;
use poem_openapi::Object;
use sqlx::{
    migrate,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    SqlitePool,
};
use std::str::FromStr;
use validator::ValidationErrors;

const MAX_CONNECTIONS: u32 = 10;

/// Simple message to return via the API
#[derive(Debug, Object, PartialEq)]
pub struct MessageResponse {
    /// Response message
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: &str) -> Self {
        MessageResponse {
            message: message.to_string(),
        }
    }
}

/// Payloads that fail their field rules are reported as 422 Unprocessable Entity.
pub fn unprocessable(err: ValidationErrors) -> poem::Error {
    poem::Error::from_string(err.to_string(), StatusCode::UNPROCESSABLE_ENTITY)
}

/// Connect to the database and bring the schema up to date.
pub async fn db_connect(database_url: &str) -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);

    // An in-memory database only lives as long as its one connection.
    let pool_options = if database_url.contains(":memory:") {
        SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
    } else {
        SqlitePoolOptions::new().max_connections(MAX_CONNECTIONS)
    };

    let pool = pool_options.connect_with(options).await?;
    migrate!().run(&pool).await?;

    Ok(pool)
}
