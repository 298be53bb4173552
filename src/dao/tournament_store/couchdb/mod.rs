mod config;
mod error;
mod models;
mod store;

pub use config::CouchConfig;
pub use error::{CouchDaoError, TournamentAction};
pub use store::CouchTournamentStore;

use crate::dao::storage::StorageError;

impl From<CouchDaoError> for StorageError {
    fn from(err: CouchDaoError) -> Self {
        match err {
            CouchDaoError::Unreadable {
                action: TournamentAction::Find(id),
                ref source,
            } => StorageError::Corrupted {
                id,
                reason: source.to_string(),
            },
            err => StorageError::unavailable(err.to_string(), err),
        }
    }
}
