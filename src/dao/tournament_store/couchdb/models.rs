use std::time::SystemTime;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::CouchDaoError;
use crate::{
    bracket::{BracketStyle, TournamentStatus},
    dao::models::{MatchEntity, TournamentEntity},
};

/// Prefix of every tournament document id.
pub const TOURNAMENT_PREFIX: &str = "tournament::";
/// Sorts after every id sharing a prefix, closing `_all_docs` key ranges.
pub const END_SUFFIX: &str = "\u{ffff}";

/// `_all_docs?include_docs=true` payload; rows of deleted documents carry no `doc`.
#[derive(Debug, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct AllDocsResponse<T> {
    pub rows: Vec<AllDocsRow<T>>,
}

/// One `_all_docs` row.
#[derive(Debug, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct AllDocsRow<T> {
    #[serde(default)]
    pub doc: Option<T>,
}

/// Minimal view used to fetch the current revision before a write or delete.
#[derive(Debug, Deserialize)]
pub struct RevisionOnly {
    #[serde(rename = "_rev")]
    pub rev: String,
    pub owner: Uuid,
}

/// Tournament as stored in CouchDB.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CouchTournamentDocument {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "_rev", skip_serializing_if = "Option::is_none")]
    pub rev: Option<String>,
    #[serde(flatten)]
    pub tournament: TournamentBody,
}

/// Tournament fields stored next to `_id` and `_rev`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TournamentBody {
    pub owner: Uuid,
    pub name: String,
    pub game: String,
    pub max_participants: u32,
    pub style: BracketStyle,
    pub status: TournamentStatus,
    pub participants: Vec<String>,
    pub matches: Vec<MatchEntity>,
    pub created_at: SystemTime,
    pub updated_at: SystemTime,
}

impl From<(TournamentEntity, Option<String>)> for CouchTournamentDocument {
    fn from((value, rev): (TournamentEntity, Option<String>)) -> Self {
        Self {
            id: tournament_doc_id(value.id),
            rev,
            tournament: TournamentBody {
                owner: value.owner,
                name: value.name,
                game: value.game,
                max_participants: value.max_participants,
                style: value.style,
                status: value.status,
                participants: value.participants,
                matches: value.matches,
                created_at: value.created_at,
                updated_at: value.updated_at,
            },
        }
    }
}

impl TryFrom<CouchTournamentDocument> for TournamentEntity {
    type Error = CouchDaoError;

    fn try_from(doc: CouchTournamentDocument) -> Result<Self, Self::Error> {
        let body = doc.tournament;
        Ok(Self {
            id: extract_uuid(&doc.id)?,
            owner: body.owner,
            name: body.name,
            game: body.game,
            max_participants: body.max_participants,
            style: body.style,
            status: body.status,
            participants: body.participants,
            matches: body.matches,
            created_at: body.created_at,
            updated_at: body.updated_at,
        })
    }
}

/// Document id of tournament `id`.
pub fn tournament_doc_id(id: Uuid) -> String {
    format!("{}{}", TOURNAMENT_PREFIX, id)
}

/// Tournament UUID carried by a document id.
pub fn extract_uuid(doc_id: &str) -> Result<Uuid, CouchDaoError> {
    let (_, id) = doc_id
        .split_once("::")
        .ok_or_else(|| CouchDaoError::InvalidDocId {
            doc_id: doc_id.to_string(),
            kind: "missing separator",
        })?;

    Uuid::parse_str(id).map_err(|_| CouchDaoError::InvalidDocId {
        doc_id: doc_id.to_string(),
        kind: "invalid UUID",
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_ids_round_trip_through_the_prefix() {
        let id = Uuid::new_v4();
        let doc_id = tournament_doc_id(id);
        assert!(doc_id.starts_with(TOURNAMENT_PREFIX));
        assert_eq!(extract_uuid(&doc_id).unwrap(), id);
    }

    #[test]
    fn listing_skips_rows_without_documents() {
        let payload: AllDocsResponse<RevisionOnly> = serde_json::from_str(&format!(
            r#"{{"rows": [{{"id": "a"}}, {{"id": "b", "doc": {{"_rev": "1-x", "owner": "{}"}}}}]}}"#,
            Uuid::nil()
        ))
        .unwrap();
        let docs: Vec<_> = payload.rows.into_iter().filter_map(|row| row.doc).collect();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].rev, "1-x");
    }

    #[test]
    fn malformed_ids_are_rejected() {
        assert!(matches!(
            extract_uuid("tournament-123"),
            Err(CouchDaoError::InvalidDocId {
                kind: "missing separator",
                ..
            })
        ));
        assert!(matches!(
            extract_uuid("tournament::nope"),
            Err(CouchDaoError::InvalidDocId {
                kind: "invalid UUID",
                ..
            })
        ));
    }
}
