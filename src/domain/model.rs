use crate::utils::error::Result;
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Outcome of one subrequest. Any HTTP status is a resolved response,
/// only transport failures are reported as errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubrequestResponse {
    pub status: u16,
    pub body: String,
}

impl SubrequestResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == 200
    }
}

/// Pet identifier as sent by the owner service, either a string or an integer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PetId {
    Text(String),
    Number(u64),
}

impl fmt::Display for PetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PetId::Text(id) => f.write_str(id),
            PetId::Number(id) => write!(f, "{}", id),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PetRef {
    pub id: PetId,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

/// Upstream owner record. Only `pets` is interpreted, every other field is
/// carried through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Owner {
    pub pets: Vec<PetRef>,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Owner {
    pub fn pet_ids(&self) -> impl Iterator<Item = &PetId> {
        self.pets.iter().map(|pet| &pet.id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Visit(pub Map<String, Value>);

/// Owner annotated with the visits of all of its pets.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnrichedOwner {
    #[serde(flatten)]
    pub owner: Owner,
    pub visits: Vec<Visit>,
}

impl EnrichedOwner {
    pub fn new(mut owner: Owner, visits: Vec<Visit>) -> Self {
        // `visits` belongs to the aggregator; drop whatever the owner service sent.
        owner.fields.remove("visits");
        Self { owner, visits }
    }
}

pub type AggregatedOwnerList = Vec<EnrichedOwner>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    pub message: String,
    pub timestamp: String,
}

impl ErrorEnvelope {
    pub fn now(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            timestamp: iso_timestamp(),
        }
    }

    pub fn method_not_allowed(method: &str) -> Self {
        Self::now(format!("Method {} not allowed", method))
    }
}

/// Current UTC time as ISO-8601 with millisecond precision, e.g. `2026-10-19T08:00:00.000Z`.
pub fn iso_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub fn parse_owner_collection(body: &str) -> Result<Vec<Owner>> {
    Ok(serde_json::from_str(body)?)
}

pub fn parse_visits(body: &str) -> Result<Vec<Visit>> {
    Ok(serde_json::from_str(body)?)
}
