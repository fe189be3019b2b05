//! Creature record and the inputs that create or modify it.

use chrono::{DateTime, Utc};
use pokedex_id::{CreatureId, SequenceNumber};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

/// Longest accepted creature name, in characters.
pub const MAX_NAME_LEN: u64 = 100;

/// A persisted creature record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Creature {
    /// Store-assigned id, immutable after insert.
    pub id: CreatureId,

    /// Caller-facing number, unique when present.
    pub no: Option<SequenceNumber>,

    /// Unique name, always stored normalized (see [`normalize_name`]).
    pub name: String,

    /// Starts at 1 and is bumped by every successful update.
    pub revision: i32,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request to create a creature.
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct CreatureDraft {
    #[validate(
        length(min = 1, max = MAX_NAME_LEN),
        custom(function = "not_blank")
    )]
    pub name: String,

    #[serde(default)]
    pub no: Option<SequenceNumber>,
}

/// Partial update: only the fields present are written.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct CreaturePatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(
        length(min = 1, max = MAX_NAME_LEN),
        custom(function = "not_blank")
    )]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub no: Option<SequenceNumber>,
}

impl CreaturePatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.no.is_none()
    }

    /// Returns the patch with its name normalized.
    #[must_use]
    pub fn normalized(mut self) -> Self {
        self.name = self.name.as_deref().map(normalize_name);
        self
    }
}

/// A normalized draft, ready for insertion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCreature {
    pub id: CreatureId,
    pub no: Option<SequenceNumber>,
    pub name: String,
}

impl From<CreatureDraft> for NewCreature {
    fn from(draft: CreatureDraft) -> Self {
        Self {
            id: CreatureId::new(),
            no: draft.no,
            name: normalize_name(&draft.name),
        }
    }
}

/// Canonical form used for every name write and lookup.
pub fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}

fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank"));
    }
    Ok(())
}
