use std::time::Duration;

use mongodb::{Client, Database, bson::doc};
use tokio::time::sleep;
use tracing::debug;

use super::{
    config::MongoConfig,
    error::{MongoDaoError, MongoResult},
};

const FIRST_PING_DELAY: Duration = Duration::from_millis(250);
const MAX_PING_DELAY: Duration = Duration::from_secs(5);

/// Build a client and wait until the tournament database answers a ping.
pub async fn establish_connection(config: &MongoConfig) -> MongoResult<(Client, Database)> {
    let client = Client::with_options(config.options.clone())
        .map_err(|source| MongoDaoError::ClientConstruction { source })?;
    let database = client.database(&config.database_name);

    let mut delay = FIRST_PING_DELAY;
    let mut attempt = 1;
    loop {
        match database.run_command(doc! { "ping": 1 }).await {
            Ok(_) => return Ok((client, database)),
            Err(source) if attempt >= config.ping_attempts => {
                return Err(MongoDaoError::InitialPing {
                    attempts: attempt,
                    source,
                });
            }
            Err(err) => {
                debug!(
                    attempt,
                    database = %config.database_name,
                    error = %err,
                    "MongoDB not reachable yet; retrying"
                );
                sleep(delay).await;
                delay = (delay * 2).min(MAX_PING_DELAY);
                attempt += 1;
            }
        }
    }
}
