use std::env;

use mongodb::options::ClientOptions;

use super::error::{MongoDaoError, MongoResult};

const DEFAULT_DB: &str = "bracket_back";
const APP_NAME: &str = "bracket-back";
/// Pings attempted before the initial connection is declared failed.
const DEFAULT_PING_ATTEMPTS: u32 = 10;

/// Connection settings for the MongoDB backend.
#[derive(Clone)]
pub struct MongoConfig {
    pub(super) options: ClientOptions,
    pub(super) database_name: String,
    pub(super) ping_attempts: u32,
}

impl MongoConfig {
    /// Parse a connection URI; the database defaults to `bracket_back`.
    pub async fn from_uri(uri: &str, db_name: Option<&str>) -> MongoResult<Self> {
        let mut options =
            ClientOptions::parse(uri)
                .await
                .map_err(|source| MongoDaoError::InvalidUri {
                    uri: uri.to_owned(),
                    source,
                })?;
        if options.app_name.is_none() {
            options.app_name = Some(APP_NAME.to_owned());
        }

        Ok(Self {
            options,
            database_name: db_name.unwrap_or(DEFAULT_DB).to_owned(),
            ping_attempts: DEFAULT_PING_ATTEMPTS,
        })
    }

    /// Read `MONGO_URI` (required), `MONGO_DB` and `MONGO_PING_ATTEMPTS`.
    pub async fn from_env() -> MongoResult<Self> {
        let uri =
            env::var("MONGO_URI").map_err(|_| MongoDaoError::MissingEnvVar { var: "MONGO_URI" })?;
        let db = env::var("MONGO_DB").ok();
        let config = Self::from_uri(&uri, db.as_deref()).await?;

        Ok(match env::var("MONGO_PING_ATTEMPTS").ok().and_then(|v| v.parse().ok()) {
            Some(attempts) => config.with_ping_attempts(attempts),
            None => config,
        })
    }

    /// Override how many pings the initial connection may spend; at least one is made.
    pub fn with_ping_attempts(mut self, attempts: u32) -> Self {
        self.ping_attempts = attempts.max(1);
        self
    }
}
