//! Persistence port for creature records.
//!
//! Adapters live in [`crate::db`]: Postgres for deployments and an in-memory
//! map for tests and local runs. Both signal uniqueness violations as
//! [`DbError::UniqueViolation`].

use async_trait::async_trait;
use pokedex_id::{CreatureId, SequenceNumber};

use super::model::{Creature, CreaturePatch, NewCreature};
use crate::db::DbError;

/// Single-field equality filter for [`CreatureStore::find_one`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreatureFilter {
    No(SequenceNumber),
    /// Matched exactly; callers pass an already normalized name.
    Name(String),
}

/// Result of a revision-guarded update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// The patch was written; carries the stored row after the write.
    Updated(Creature),
    /// The record exists but its revision moved on since it was read.
    RevisionMismatch { current: i32 },
    /// No record with that id exists any more.
    Missing,
}

#[async_trait]
pub trait CreatureStore: Send + Sync {
    /// Inserts a new record.
    async fn create(&self, creature: NewCreature) -> Result<Creature, DbError>;

    async fn find_one(&self, filter: &CreatureFilter) -> Result<Option<Creature>, DbError>;

    async fn find_by_id(&self, id: CreatureId) -> Result<Option<Creature>, DbError>;

    /// Writes the fields present in `patch` to the record `id`, but only if
    /// its revision is still `expected_revision`.
    async fn update_one(
        &self,
        id: CreatureId,
        expected_revision: i32,
        patch: &CreaturePatch,
    ) -> Result<UpdateOutcome, DbError>;

    /// Deletes the record `id`; returns the number of records removed.
    async fn delete_one(&self, id: CreatureId) -> Result<u64, DbError>;

    /// Checks that the store is reachable.
    async fn health_check(&self) -> Result<(), DbError>;
}
