use std::fmt;

use reqwest::StatusCode;
use thiserror::Error;
use uuid::Uuid;

/// Result of a CouchDB store operation.
pub type CouchResult<T> = Result<T, CouchDaoError>;

/// Store operation a CouchDB request was made for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TournamentAction {
    /// Upserting a tournament.
    Save(Uuid),
    /// Loading one tournament.
    Find(Uuid),
    /// Removing one tournament.
    Delete(Uuid),
    /// Listing the tournaments of one owner.
    List(Uuid),
    /// Checking or creating the tournament database.
    Bootstrap,
}

impl fmt::Display for TournamentAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TournamentAction::Save(id) => write!(f, "saving tournament `{id}`"),
            TournamentAction::Find(id) => write!(f, "loading tournament `{id}`"),
            TournamentAction::Delete(id) => write!(f, "deleting tournament `{id}`"),
            TournamentAction::List(owner) => write!(f, "listing tournaments of `{owner}`"),
            TournamentAction::Bootstrap => f.write_str("preparing the tournament database"),
        }
    }
}

/// Failures of the CouchDB tournament store.
#[derive(Debug, Error)]
pub enum CouchDaoError {
    /// A required environment variable is not set.
    #[error("missing CouchDB environment variable `{var}`")]
    MissingEnvVar {
        /// Name of the variable.
        var: &'static str,
    },
    /// The HTTP client could not be built.
    #[error("failed to build CouchDB client")]
    ClientBuilder {
        /// Underlying error.
        #[source]
        source: reqwest::Error,
    },
    /// CouchDB could not be reached or the body could not be read.
    #[error("CouchDB unreachable while {action}")]
    Transport {
        /// Operation in progress.
        action: TournamentAction,
        /// Underlying error.
        #[source]
        source: reqwest::Error,
    },
    /// CouchDB answered with a status the store does not expect.
    #[error("CouchDB answered {status} while {action}")]
    Rejected {
        /// Operation in progress.
        action: TournamentAction,
        /// Status returned by CouchDB.
        status: StatusCode,
    },
    /// Another writer replaced the document between revision lookup and write.
    #[error("tournament `{id}` was modified concurrently")]
    RevisionConflict {
        /// Tournament identifier.
        id: Uuid,
    },
    /// The stored JSON does not match the tournament layout.
    #[error("unreadable CouchDB document while {action}")]
    Unreadable {
        /// Operation in progress.
        action: TournamentAction,
        /// Underlying error.
        #[source]
        source: serde_json::Error,
    },
    /// A document id does not carry a tournament UUID.
    #[error("invalid document ID `{doc_id}`: {kind}")]
    InvalidDocId {
        /// Raw document id.
        doc_id: String,
        /// What is wrong with it.
        kind: &'static str,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_tournament() {
        let id = Uuid::new_v4();
        let err = CouchDaoError::Rejected {
            action: TournamentAction::Delete(id),
            status: StatusCode::FORBIDDEN,
        };
        assert_eq!(
            err.to_string(),
            format!("CouchDB answered 403 Forbidden while deleting tournament `{id}`")
        );
    }
}
