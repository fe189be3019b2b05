//! In-memory creature store.
//!
//! Enforces the same uniqueness rules as the Postgres schema. Used by tests
//! and by `POKEDEX_STORE=memory` for local runs.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use pokedex_id::{CreatureId, SequenceNumber};
use tokio::sync::RwLock;

use super::DbError;
use crate::creatures::{
    Creature, CreatureFilter, CreaturePatch, CreatureStore, NewCreature, UpdateOutcome,
};

#[derive(Default)]
pub struct MemoryCreatureStore {
    creatures: RwLock<HashMap<CreatureId, Creature>>,
}

impl MemoryCreatureStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.creatures.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.creatures.read().await.is_empty()
    }
}

/// Rejects `name`/`no` values already held by a record other than `owner`.
fn check_unique(
    creatures: &HashMap<CreatureId, Creature>,
    owner: CreatureId,
    name: Option<&str>,
    no: Option<SequenceNumber>,
) -> Result<(), DbError> {
    for other in creatures.values().filter(|c| c.id != owner) {
        if let Some(name) = name {
            if other.name == name {
                return Err(DbError::unique("name", name));
            }
        }
        if let Some(no) = no {
            if other.no == Some(no) {
                return Err(DbError::unique("no", no.value()));
            }
        }
    }
    Ok(())
}

#[async_trait]
impl CreatureStore for MemoryCreatureStore {
    async fn create(&self, new: NewCreature) -> Result<Creature, DbError> {
        let mut creatures = self.creatures.write().await;
        if creatures.contains_key(&new.id) {
            return Err(DbError::unique("id", new.id.to_string()));
        }
        check_unique(&creatures, new.id, Some(&new.name), new.no)?;

        let now = Utc::now();
        let creature = Creature {
            id: new.id,
            no: new.no,
            name: new.name,
            revision: 1,
            created_at: now,
            updated_at: now,
        };
        creatures.insert(creature.id, creature.clone());
        Ok(creature)
    }

    async fn find_one(&self, filter: &CreatureFilter) -> Result<Option<Creature>, DbError> {
        let creatures = self.creatures.read().await;
        let found = creatures.values().find(|c| match filter {
            CreatureFilter::No(no) => c.no == Some(*no),
            CreatureFilter::Name(name) => &c.name == name,
        });
        Ok(found.cloned())
    }

    async fn find_by_id(&self, id: CreatureId) -> Result<Option<Creature>, DbError> {
        Ok(self.creatures.read().await.get(&id).cloned())
    }

    async fn update_one(
        &self,
        id: CreatureId,
        expected_revision: i32,
        patch: &CreaturePatch,
    ) -> Result<UpdateOutcome, DbError> {
        let mut creatures = self.creatures.write().await;
        let current = match creatures.get(&id) {
            Some(creature) => creature.revision,
            None => return Ok(UpdateOutcome::Missing),
        };
        if current != expected_revision {
            return Ok(UpdateOutcome::RevisionMismatch { current });
        }
        check_unique(&creatures, id, patch.name.as_deref(), patch.no)?;

        let Some(creature) = creatures.get_mut(&id) else {
            return Ok(UpdateOutcome::Missing);
        };
        if let Some(name) = &patch.name {
            creature.name = name.clone();
        }
        if let Some(no) = patch.no {
            creature.no = Some(no);
        }
        creature.revision += 1;
        creature.updated_at = Utc::now();
        Ok(UpdateOutcome::Updated(creature.clone()))
    }

    async fn delete_one(&self, id: CreatureId) -> Result<u64, DbError> {
        let removed = self.creatures.write().await.remove(&id);
        Ok(u64::from(removed.is_some()))
    }

    async fn health_check(&self) -> Result<(), DbError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new(no: Option<i32>, name: &str) -> NewCreature {
        NewCreature {
            id: CreatureId::new(),
            no: no.map(|n| SequenceNumber::new(n).unwrap()),
            name: name.to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_assigns_first_revision() {
        let store = MemoryCreatureStore::new();
        let creature = store.create(new(Some(1), "bulbasaur")).await.unwrap();
        assert_eq!(creature.revision, 1);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_creatures_without_number_do_not_collide() {
        let store = MemoryCreatureStore::new();
        store.create(new(None, "missingno")).await.unwrap();
        store.create(new(None, "ditto")).await.unwrap();
        assert_eq!(store.len().await, 2);
    }

    #[tokio::test]
    async fn test_duplicate_name_is_unique_violation() {
        let store = MemoryCreatureStore::new();
        store.create(new(Some(1), "bulbasaur")).await.unwrap();
        let err = store.create(new(Some(2), "bulbasaur")).await.unwrap_err();
        let duplicate = err.duplicate_key().unwrap();
        assert_eq!(duplicate.key, "name");
        assert_eq!(duplicate.value, "bulbasaur");
    }

    #[tokio::test]
    async fn test_update_checks_revision() {
        let store = MemoryCreatureStore::new();
        let creature = store.create(new(Some(1), "bulbasaur")).await.unwrap();
        let patch = CreaturePatch {
            name: Some("ivysaur".to_string()),
            no: None,
        };

        let outcome = store.update_one(creature.id, 1, &patch).await.unwrap();
        assert!(matches!(outcome, UpdateOutcome::Updated(ref c) if c.revision == 2));

        let stale = store.update_one(creature.id, 1, &patch).await.unwrap();
        assert_eq!(stale, UpdateOutcome::RevisionMismatch { current: 2 });

        let missing = store.update_one(CreatureId::new(), 1, &patch).await.unwrap();
        assert_eq!(missing, UpdateOutcome::Missing);
    }

    #[tokio::test]
    async fn test_update_may_keep_own_name() {
        let store = MemoryCreatureStore::new();
        let creature = store.create(new(Some(1), "bulbasaur")).await.unwrap();
        let patch = CreaturePatch {
            name: Some("bulbasaur".to_string()),
            no: SequenceNumber::new(2).ok(),
        };
        let outcome = store.update_one(creature.id, 1, &patch).await.unwrap();
        assert!(matches!(outcome, UpdateOutcome::Updated(_)));
    }

    #[tokio::test]
    async fn test_delete_counts() {
        let store = MemoryCreatureStore::new();
        let creature = store.create(new(None, "eevee")).await.unwrap();
        assert_eq!(store.delete_one(creature.id).await.unwrap(), 1);
        assert_eq!(store.delete_one(creature.id).await.unwrap(), 0);
        assert!(store.is_empty().await);
    }
}
