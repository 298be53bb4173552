use mongodb::error::Error as MongoError;
use thiserror::Error;
use uuid::Uuid;

/// Result of a MongoDB store operation.
pub type MongoResult<T> = std::result::Result<T, MongoDaoError>;

/// Failures raised by the MongoDB backend.
#[derive(Debug, Error)]
pub enum MongoDaoError {
    /// Required environment variable is missing.
    #[error("missing MongoDB environment variable `{var}`")]
    MissingEnvVar {
        /// Name of the variable.
        var: &'static str,
    },
    /// The connection URI could not be parsed.
    #[error("failed to parse MongoDB connection URI `{uri}`")]
    InvalidUri {
        /// URI as configured.
        uri: String,
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// The driver rejected the client options.
    #[error("failed to build MongoDB client from options")]
    ClientConstruction {
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// The database never answered the startup ping.
    #[error("MongoDB ping failed during initial connection after {attempts} attempt(s)")]
    InitialPing {
        /// Pings sent before giving up.
        attempts: u32,
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// A periodic health ping failed.
    #[error("MongoDB ping health check failed")]
    HealthPing {
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// The owner index could not be created.
    #[error("failed to ensure index `{index}` on collection `{collection}`")]
    EnsureIndex {
        /// Collection name.
        collection: &'static str,
        /// Index name.
        index: &'static str,
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// Upserting a tournament failed.
    #[error("failed to save tournament `{id}`")]
    SaveTournament {
        /// Tournament identifier.
        id: Uuid,
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// Loading a tournament failed.
    #[error("failed to load tournament `{id}`")]
    LoadTournament {
        /// Tournament identifier.
        id: Uuid,
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// Listing an owner's tournaments failed.
    #[error("failed to list tournaments of account `{owner}`")]
    ListTournaments {
        /// Account whose tournaments were listed.
        owner: Uuid,
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// A stored document carries a malformed id.
    #[error("invalid tournament document `{id}`: {kind}")]
    InvalidDocument {
        /// Raw id as stored.
        id: String,
        /// What is wrong with it.
        kind: &'static str,
    },
    /// Deleting a tournament failed.
    #[error("failed to delete tournament `{id}`")]
    DeleteTournament {
        /// Tournament identifier.
        id: Uuid,
        /// Driver error.
        #[source]
        source: MongoError,
    },
}
