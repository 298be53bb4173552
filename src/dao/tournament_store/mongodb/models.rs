use mongodb::bson::{DateTime, Document, doc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::MongoDaoError;
use crate::{
    bracket::{BracketStyle, TournamentStatus},
    dao::models::{MatchEntity, TournamentEntity},
};

/// Tournament as stored in MongoDB, keyed by its UUID string.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoTournamentDocument {
    #[serde(rename = "_id")]
    id: String,
    owner: String,
    name: String,
    game: String,
    max_participants: u32,
    style: BracketStyle,
    status: TournamentStatus,
    participants: Vec<String>,
    matches: Vec<MatchEntity>,
    created_at: DateTime,
    updated_at: DateTime,
}

impl From<TournamentEntity> for MongoTournamentDocument {
    fn from(value: TournamentEntity) -> Self {
        Self {
            id: value.id.to_string(),
            owner: value.owner.to_string(),
            name: value.name,
            game: value.game,
            max_participants: value.max_participants,
            style: value.style,
            status: value.status,
            participants: value.participants,
            matches: value.matches,
            created_at: DateTime::from_system_time(value.created_at),
            updated_at: DateTime::from_system_time(value.updated_at),
        }
    }
}

impl TryFrom<MongoTournamentDocument> for TournamentEntity {
    type Error = MongoDaoError;

    fn try_from(value: MongoTournamentDocument) -> Result<Self, Self::Error> {
        let id = parse_uuid(&value.id)?;
        let owner = parse_uuid(&value.owner)?;
        Ok(Self {
            id,
            owner,
            name: value.name,
            game: value.game,
            max_participants: value.max_participants,
            style: value.style,
            status: value.status,
            participants: value.participants,
            matches: value.matches,
            created_at: value.created_at.to_system_time(),
            updated_at: value.updated_at.to_system_time(),
        })
    }
}

fn parse_uuid(raw: &str) -> Result<Uuid, MongoDaoError> {
    Uuid::parse_str(raw).map_err(|_| MongoDaoError::InvalidDocument {
        id: raw.to_owned(),
        kind: "invalid UUID",
    })
}

/// Filter matching one tournament of one owner.
pub fn owned_doc_id(owner: Uuid, id: Uuid) -> Document {
    doc! {"_id": id.to_string(), "owner": owner.to_string()}
}

/// Filter matching every tournament of one owner.
pub fn owner_filter(owner: Uuid) -> Document {
    doc! {"owner": owner.to_string()}
}

/// Filter matching one tournament by id.
pub fn doc_id(id: Uuid) -> Document {
    doc! {"_id": id.to_string()}
}
