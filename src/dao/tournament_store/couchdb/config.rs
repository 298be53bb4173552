use std::{env, time::Duration};

use super::error::{CouchDaoError, CouchResult};

const DEFAULT_DB: &str = "bracket_back";
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Where the tournament database lives and how to authenticate against it.
#[derive(Debug, Clone)]
pub struct CouchConfig {
    /// Server root without a trailing slash.
    pub base_url: String,
    /// Database holding one document per tournament.
    pub database: String,
    /// Basic-auth user.
    pub username: Option<String>,
    /// Basic-auth password.
    pub password: Option<String>,
    /// Applied to every HTTP request sent to CouchDB.
    pub request_timeout: Duration,
}

impl CouchConfig {
    /// Settings for `database` on the server at `base_url`.
    pub fn new(base_url: impl Into<String>, database: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        base_url.truncate(base_url.trim_end_matches('/').len());

        Self {
            base_url,
            database: database.into(),
            username: None,
            password: None,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    /// Authenticate with HTTP basic auth.
    pub fn with_credentials(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    /// Read `COUCH_BASE_URL` (required), `COUCH_DB` (defaults to `bracket_back`) and the
    /// `COUCH_USERNAME`/`COUCH_PASSWORD` pair.
    pub fn from_env() -> CouchResult<Self> {
        let base_url = env::var("COUCH_BASE_URL").map_err(|_| CouchDaoError::MissingEnvVar {
            var: "COUCH_BASE_URL",
        })?;
        let database = env::var("COUCH_DB").unwrap_or_else(|_| DEFAULT_DB.to_owned());
        let config = Self::new(base_url, database);

        Ok(match (env::var("COUCH_USERNAME"), env::var("COUCH_PASSWORD")) {
            (Ok(username), Ok(password)) => config.with_credentials(username, password),
            _ => config,
        })
    }
}
